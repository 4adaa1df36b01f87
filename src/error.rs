use rstake::RstakeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Client(#[from] RstakeError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Login did not produce a session.
    #[error("{0}")]
    Login(String),
}

impl CliError {
    /// One-line hint printed after the error, if any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            CliError::Client(RstakeError::Unauthenticated) => Some("run `rstake login` first"),
            _ => None,
        }
    }
}
