use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("invalid serial configuration: {0}")]
    InvalidConfig(String),
    #[error("serial device unavailable: {0}")]
    Unavailable(String),
    #[error("serial write timeout")]
    Timeout,
    #[error("serial port closed")]
    Closed,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl HwError {
    /// Map a write/flush failure, singling out timeouts.
    pub fn from_io(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::TimedOut {
            HwError::Timeout
        } else {
            HwError::Io(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, HwError>;
