use crate::error::Result;
use crate::rest::StakingHttpClient;
use crate::types::*;

/// Page size the dashboard uses for contract lists.
pub const CONTRACTS_PAGE_SIZE: u32 = 15;

impl StakingHttpClient {
    /// POST /private/account/contracts/buy - Open a staking position.
    pub async fn buy_contract(
        &self,
        contract_type: ContractType,
        amount: f64,
    ) -> Result<ApiResponse<Contract>> {
        let req = BuyContractRequest {
            contract_type,
            amount,
        };
        self.post("/private/account/contracts/buy", &req).await
    }

    /// POST /private/account/contracts/unstake - Start the cooling-off window of a flexible contract.
    pub async fn unstake_contract(&self, puid: &str) -> Result<ApiResponse<ContractStateChange>> {
        let req = ContractRef {
            puid: puid.to_string(),
        };
        self.post("/private/account/contracts/unstake", &req).await
    }

    /// POST /private/account/contracts/resume-unstaked-contract - Cancel an unstake inside its window.
    pub async fn resume_unstaked_contract(
        &self,
        puid: &str,
    ) -> Result<ApiResponse<ContractStateChange>> {
        let req = ContractRef {
            puid: puid.to_string(),
        };
        self.post("/private/account/contracts/resume-unstaked-contract", &req)
            .await
    }

    /// GET /private/account/contracts/active - Running contracts.
    pub async fn active_contracts(&self, page: PageQuery) -> Result<ApiResponse<Page<Contract>>> {
        self.get("/private/account/contracts/active", &page.to_query())
            .await
    }

    /// GET /private/account/contracts/completed - Finished contracts.
    pub async fn completed_contracts(
        &self,
        page: PageQuery,
    ) -> Result<ApiResponse<Page<Contract>>> {
        self.get("/private/account/contracts/completed", &page.to_query())
            .await
    }

    /// GET /private/account/contracts/statistic - Totals across all contracts.
    pub async fn contract_statistic(&self) -> Result<ApiResponse<ContractStatistic>> {
        self.get("/private/account/contracts/statistic", &[]).await
    }
}
