use thiserror::Error;

pub type Result<T> = std::result::Result<T, GitIntakeError>;

#[derive(Error, Debug)]
pub enum GitIntakeError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Home directory unavailable")]
    HomeDirUnavailable,
}
