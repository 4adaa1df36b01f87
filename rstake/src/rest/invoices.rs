use crate::error::Result;
use crate::rest::StakingHttpClient;
use crate::types::*;

impl StakingHttpClient {
    /// POST /private/account/invoices/request - Ask for a deposit address/memo for an amount.
    pub async fn request_invoice(&self, amount: f64) -> Result<ApiResponse<Invoice>> {
        self.post("/private/account/invoices/request", &InvoiceRequest { amount })
            .await
    }

    /// POST /private/account/invoices/invoice/by/id - Current state of one invoice.
    pub async fn invoice_by_id(&self, puid: &str) -> Result<ApiResponse<Invoice>> {
        let req = InvoiceById {
            puid: puid.to_string(),
        };
        self.post("/private/account/invoices/invoice/by/id", &req)
            .await
    }

    /// Same endpoint as [`invoice_by_id`](Self::invoice_by_id), decoding only the status.
    pub async fn invoice_status(&self, puid: &str) -> Result<ApiResponse<InvoiceStatus>> {
        let req = InvoiceById {
            puid: puid.to_string(),
        };
        self.post("/private/account/invoices/invoice/by/id", &req)
            .await
    }

    /// GET /private/account/invoices/request - The most recent invoice of the user.
    pub async fn latest_invoice(&self) -> Result<ApiResponse<Invoice>> {
        self.get("/private/account/invoices/request", &[]).await
    }
}
