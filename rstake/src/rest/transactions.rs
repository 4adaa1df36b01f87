use crate::error::Result;
use crate::rest::StakingHttpClient;
use crate::types::*;

impl StakingHttpClient {
    /// GET /private/account/inner-transactions/history - Ledger of balance movements.
    pub async fn inner_transactions(
        &self,
        page: PageQuery,
    ) -> Result<ApiResponse<Page<InnerTransaction>>> {
        self.get("/private/account/inner-transactions/history", &page.to_query())
            .await
    }
}
