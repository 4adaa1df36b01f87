use crate::error::Result;
use crate::rest::StakingHttpClient;
use crate::types::*;

/// Default page size of the withdrawal history.
pub const WITHDRAW_PAGE_SIZE: u32 = 20;

impl StakingHttpClient {
    /// POST /private/account/withdraw-requests/request - Ask for a payout.
    pub async fn request_withdraw(&self, req: &WithdrawRequest) -> Result<ApiResponse<WithdrawReceipt>> {
        self.post("/private/account/withdraw-requests/request", req)
            .await
    }

    /// POST /private/account/withdraw-requests/cancel - Cancel a pending payout.
    pub async fn cancel_withdraw(&self, puid: &str) -> Result<ApiResponse<CancelWithdrawReceipt>> {
        let req = CancelWithdrawRequest {
            puid: puid.to_string(),
        };
        self.post("/private/account/withdraw-requests/cancel", &req)
            .await
    }

    /// GET /private/account/withdraw-requests/history - Past payout requests.
    pub async fn withdraw_history(
        &self,
        page: PageQuery,
    ) -> Result<ApiResponse<Page<WithdrawHistoryItem>>> {
        self.get("/private/account/withdraw-requests/history", &page.to_query())
            .await
    }
}
