use thiserror::Error;

#[derive(Debug, Error)]
pub enum AsfError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected end of input at offset {offset} (wanted {wanted} bytes)")]
    Truncated { offset: u64, wanted: u64 },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    #[error("Inconsistent totals: {0}")]
    Inconsistent(String),
}

pub type Result<T> = std::result::Result<T, AsfError>;
