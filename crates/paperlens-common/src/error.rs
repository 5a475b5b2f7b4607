use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommonError {
    #[error("Network capabilities capped: {0}")]
    Security(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CommonError>;
