use crate::error::Result;
use crate::rest::StakingHttpClient;
use crate::types::*;

impl StakingHttpClient {
    /// GET /system/healthcheck - Backend liveness.
    pub async fn healthcheck(&self) -> Result<ApiResponse<serde_json::Value>> {
        self.get(
            "/system/healthcheck",
            &[("symbol", "pax".to_string()), ("isTrusted", "true".to_string())],
        )
        .await
    }
}
