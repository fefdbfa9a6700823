use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, EnvelopeError>;
