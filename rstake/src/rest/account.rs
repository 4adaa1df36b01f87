use crate::error::Result;
use crate::rest::StakingHttpClient;
use crate::types::*;

impl StakingHttpClient {
    /// GET /private/account/balance/current - Current balance.
    pub async fn current_balance(&self) -> Result<ApiResponse<Balance>> {
        self.get("/private/account/balance/current", &[]).await
    }

    /// GET /private/account/profile/get - Profile of the logged-in user.
    pub async fn profile(&self) -> Result<ApiResponse<Profile>> {
        self.get("/private/account/profile/get", &[]).await
    }

    /// POST /private/account/profile/lang - Change the preferred language.
    pub async fn set_lang(&self, lang: &str) -> Result<ApiResponse<Empty>> {
        let req = SetLangRequest {
            lang: lang.to_string(),
        };
        self.post("/private/account/profile/lang", &req).await
    }

    /// POST /private/account/profile/2fa/generate - Start 2FA setup and get the secret.
    pub async fn generate_2fa(&self) -> Result<ApiResponse<TwoFactorSecret>> {
        self.post("/private/account/profile/2fa/generate", &Empty {})
            .await
    }

    /// POST /private/account/profile/2fa/set - Confirm 2FA setup with a code.
    pub async fn set_2fa(&self, code: &str) -> Result<ApiResponse<Empty>> {
        let req = SetTwoFactorRequest {
            two_fa_token: code.to_string(),
        };
        self.post("/private/account/profile/2fa/set", &req).await
    }

    /// GET /private/account/session/active - Sessions open on this account.
    pub async fn active_sessions(&self) -> Result<ApiResponse<Vec<ActiveSession>>> {
        self.get("/private/account/session/active", &[]).await
    }
}
