use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RstakeError {
    /// A response whose HTTP status the caller has to branch on
    /// (202 second factor, 417 unverified email).
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// An envelope that came back with `success: false` (or no data).
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("not logged in")]
    Unauthenticated,
}

/// Client-side checks that reject an action before any request is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Minimum is {minimum} XRP")]
    BelowPlanMinimum { plan: String, minimum: Decimal },

    #[error("Minimum is {minimum} XRP")]
    BelowWithdrawMinimum { minimum: Decimal },

    #[error("Insufficient balance")]
    InsufficientBalance { requested: Decimal, available: Decimal },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid destination address")]
    InvalidAddress,

    #[error("2FA code must be 6 characters")]
    InvalidTwoFactorCode,
}

pub type Result<T> = std::result::Result<T, RstakeError>;
