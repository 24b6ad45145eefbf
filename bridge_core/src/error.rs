use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum BridgeError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid player number: {0} (expected 1 or 2)")]
    InvalidPlayer(u8),
    #[error("shutdown requested")]
    Shutdown,
}

/// Failure of a packet write; either way the channel must be reopened.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("serial transport fault: {0}")]
    Fault(String),
    #[error("serial write timed out")]
    Timeout,
}

/// Arithmetic fault while turning a sample into a channel byte.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum EncodingFault {
    #[error("channel mean is not finite ({0})")]
    NonFiniteMean(f64),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
