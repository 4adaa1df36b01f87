//! The calls background components make, behind a trait so they can run
//! against something other than the live API.

use std::future::Future;

use crate::error::Result;
use crate::rest::StakingHttpClient;
use crate::types::{ApiResponse, Balance, InvoiceStatus, Profile};

pub trait StakingBackend: Send + Sync + 'static {
    fn current_balance(&self) -> impl Future<Output = Result<ApiResponse<Balance>>> + Send;

    fn profile(&self) -> impl Future<Output = Result<ApiResponse<Profile>>> + Send;

    /// Status of one deposit invoice.
    fn invoice_status(
        &self,
        puid: &str,
    ) -> impl Future<Output = Result<ApiResponse<InvoiceStatus>>> + Send;
}

impl StakingBackend for StakingHttpClient {
    fn current_balance(&self) -> impl Future<Output = Result<ApiResponse<Balance>>> + Send {
        StakingHttpClient::current_balance(self)
    }

    fn profile(&self) -> impl Future<Output = Result<ApiResponse<Profile>>> + Send {
        StakingHttpClient::profile(self)
    }

    fn invoice_status(
        &self,
        puid: &str,
    ) -> impl Future<Output = Result<ApiResponse<InvoiceStatus>>> + Send {
        StakingHttpClient::invoice_status(self, puid)
    }
}
