use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    #[error("version has invalid format, should be major.minor.patch")]
    InvalidVersion,
    #[error("{0}")]
    Provider(String),
    #[error("authentication timed out")]
    Timeout,
    #[error("no active session")]
    NoSession,
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidConfig(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
