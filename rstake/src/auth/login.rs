use crate::error::{RstakeError, ValidationError};
use crate::types::{ApiResponse, AuthTokens};

/// Status the server uses to ask for a second factor.
pub const STATUS_SECOND_FACTOR: u16 = 202;
/// Status the server uses for logins of accounts with an unverified email.
pub const STATUS_EMAIL_NOT_VERIFIED: u16 = 417;

const EMAIL_NOT_VERIFIED_MESSAGE: &str = "Please verify your email address";

/// What a login attempt ended in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Credentials accepted; the access token has been stored.
    Authenticated(AuthTokens),
    /// Credentials accepted but a 6-digit 2FA code is needed.
    SecondFactorRequired,
    /// The account exists but its email is not verified yet.
    EmailNotVerified(String),
    /// Anything else; carries the message for the user.
    Rejected(String),
}

impl LoginOutcome {
    /// Classify a login envelope.
    ///
    /// Second factor is signalled by status 202 or by a message mentioning
    /// "2fa"; an unverified email only by the server's fixed message, which a
    /// 417 carries. Other 417 answers are plain rejections.
    pub fn classify(resp: ApiResponse<AuthTokens>) -> Self {
        if let Err(RstakeError::Http { status, message }) = check_status(&resp) {
            return match status {
                STATUS_SECOND_FACTOR => LoginOutcome::SecondFactorRequired,
                _ if message == EMAIL_NOT_VERIFIED_MESSAGE => LoginOutcome::EmailNotVerified(message),
                _ if message.is_empty() => LoginOutcome::Rejected("Login failed".into()),
                _ => LoginOutcome::Rejected(message),
            };
        }

        if resp.message.to_lowercase().contains("2fa") {
            return LoginOutcome::SecondFactorRequired;
        }

        match resp.data {
            Some(tokens) if resp.success && !tokens.access.is_empty() => {
                LoginOutcome::Authenticated(tokens)
            }
            _ if resp.message == EMAIL_NOT_VERIFIED_MESSAGE => {
                LoginOutcome::EmailNotVerified(resp.message)
            }
            _ if resp.message.is_empty() => LoginOutcome::Rejected("Login failed".into()),
            _ => LoginOutcome::Rejected(resp.message),
        }
    }
}

/// Raise the statuses the login flow must branch on as typed HTTP errors.
fn check_status(resp: &ApiResponse<AuthTokens>) -> Result<(), RstakeError> {
    match resp.status {
        STATUS_SECOND_FACTOR | STATUS_EMAIL_NOT_VERIFIED => Err(RstakeError::Http {
            status: resp.status,
            message: resp.message.clone(),
        }),
        _ => Ok(()),
    }
}

/// A 2FA code must be exactly six characters.
pub fn validate_two_fa_code(code: &str) -> Result<(), ValidationError> {
    if code.chars().count() == 6 {
        Ok(())
    } else {
        Err(ValidationError::InvalidTwoFactorCode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(status: u16, body: serde_json::Value) -> ApiResponse<AuthTokens> {
        ApiResponse::from_value(status, body)
    }

    #[test]
    fn test_success_with_access_token() {
        let outcome = LoginOutcome::classify(envelope(
            200,
            json!({"success": true, "message": "ok", "data": {"access": "a", "refresh": "r"}}),
        ));
        assert_eq!(
            outcome,
            LoginOutcome::Authenticated(AuthTokens {
                access: "a".into(),
                refresh: "r".into()
            })
        );
    }

    #[test]
    fn test_accepted_status_requires_second_factor() {
        let outcome = LoginOutcome::classify(envelope(
            202,
            json!({"success": false, "message": "Enter code", "data": {}}),
        ));
        assert_eq!(outcome, LoginOutcome::SecondFactorRequired);
    }

    #[test]
    fn test_message_mentioning_2fa_requires_second_factor() {
        let outcome = LoginOutcome::classify(envelope(
            200,
            json!({"success": false, "message": "2FA token is required", "data": {}}),
        ));
        assert_eq!(outcome, LoginOutcome::SecondFactorRequired);
    }

    #[test]
    fn test_expectation_failed_means_unverified_email() {
        let outcome = LoginOutcome::classify(envelope(
            417,
            json!({"success": false, "message": "Please verify your email address", "data": {}}),
        ));
        assert_eq!(
            outcome,
            LoginOutcome::EmailNotVerified("Please verify your email address".into())
        );
    }

    #[test]
    fn test_expectation_failed_with_other_message_is_rejected() {
        let outcome = LoginOutcome::classify(envelope(
            417,
            json!({"success": false, "message": "Account is locked", "data": {}}),
        ));
        assert_eq!(outcome, LoginOutcome::Rejected("Account is locked".into()));

        let outcome = LoginOutcome::classify(envelope(417, json!({"success": false})));
        assert_eq!(outcome, LoginOutcome::Rejected("Login failed".into()));
    }

    #[test]
    fn test_unverified_message_on_plain_failure() {
        let outcome = LoginOutcome::classify(envelope(
            400,
            json!({"success": false, "message": "Please verify your email address"}),
        ));
        assert!(matches!(outcome, LoginOutcome::EmailNotVerified(_)));
    }

    #[test]
    fn test_rejection_defaults_message() {
        let outcome = LoginOutcome::classify(ApiResponse::empty(200));
        assert_eq!(outcome, LoginOutcome::Rejected("Login failed".into()));

        let outcome = LoginOutcome::classify(envelope(
            401,
            json!({"success": false, "message": "Wrong password", "data": {}}),
        ));
        assert_eq!(outcome, LoginOutcome::Rejected("Wrong password".into()));
    }

    #[test]
    fn test_two_fa_code_length() {
        assert!(validate_two_fa_code("123456").is_ok());
        assert!(validate_two_fa_code("12345").is_err());
        assert!(validate_two_fa_code("1234567").is_err());
    }
}
