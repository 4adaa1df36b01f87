use crate::error::Result;
use crate::rest::StakingHttpClient;
use crate::types::*;

impl StakingHttpClient {
    /// POST /public/account/login - Exchange credentials (and optional 2FA code) for tokens.
    pub async fn login(&self, req: &LoginRequest) -> Result<ApiResponse<AuthTokens>> {
        self.post("/public/account/login", req).await
    }

    /// POST /public/account/create - Register a new account.
    pub async fn register(&self, req: &RegisterRequest) -> Result<ApiResponse<Empty>> {
        self.post("/public/account/create", req).await
    }

    /// POST /private/account/session/logout - End the current session.
    pub async fn logout(&self) -> Result<ApiResponse<Empty>> {
        self.post("/private/account/session/logout", &Empty {}).await
    }

    /// POST /public/account/reset-password/request - Email a reset code.
    pub async fn reset_password_request(
        &self,
        req: &ResetPasswordRequest,
    ) -> Result<ApiResponse<Empty>> {
        self.post("/public/account/reset-password/request", req)
            .await
    }

    /// POST /public/account/reset-password/verify - Set a new password with the emailed code.
    pub async fn reset_password_verify(
        &self,
        req: &ResetPasswordVerify,
    ) -> Result<ApiResponse<Empty>> {
        self.post("/public/account/reset-password/verify", req)
            .await
    }

    /// POST /public/account/request-email-verification - Resend the verification email.
    pub async fn request_email_verification(
        &self,
        req: &EmailVerificationRequest,
    ) -> Result<ApiResponse<Empty>> {
        self.post("/public/account/request-email-verification", req)
            .await
    }
}
