//! Maps `Box<dyn Error>` from trait boundaries to typed transport errors.
//!
//! The traits in `bridge_traits` use `Box<dyn Error + Send + Sync>`; this
//! module turns those into `TransportError` (for writes) and `OpenFailure`
//! (for opens), with a feature-gated path for `bridge_hardware::HwError`.

use crate::error::TransportError;

/// Why a serial open failed, as far as the retry policy is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenFailure {
    /// Bad port name or baud rate; retrying cannot help.
    InvalidConfig(String),
    /// Device busy, missing or otherwise not ready yet.
    Transient(String),
}

/// Map a write/flush error to a typed `TransportError`.
pub fn map_transport_error(e: &(dyn std::error::Error + 'static)) -> TransportError {
    #[cfg(feature = "hardware-errors")]
    {
        use bridge_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout => TransportError::Timeout,
                other => TransportError::Fault(other.to_string()),
            };
        }
    }

    if let Some(io) = e.downcast_ref::<std::io::Error>() {
        return if io.kind() == std::io::ErrorKind::TimedOut {
            TransportError::Timeout
        } else {
            TransportError::Fault(io.to_string())
        };
    }

    // Fallback: string-based detection
    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        TransportError::Timeout
    } else {
        TransportError::Fault(s)
    }
}

/// Classify an open error into fatal vs. retryable.
pub fn classify_open_error(e: &(dyn std::error::Error + 'static)) -> OpenFailure {
    #[cfg(feature = "hardware-errors")]
    {
        use bridge_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::InvalidConfig(msg) => OpenFailure::InvalidConfig(msg.clone()),
                other => OpenFailure::Transient(other.to_string()),
            };
        }
    }

    if let Some(io) = e.downcast_ref::<std::io::Error>() {
        return if io.kind() == std::io::ErrorKind::InvalidInput {
            OpenFailure::InvalidConfig(io.to_string())
        } else {
            OpenFailure::Transient(io.to_string())
        };
    }

    let s = e.to_string();
    if s.to_lowercase().contains("invalid") {
        OpenFailure::InvalidConfig(s)
    } else {
        OpenFailure::Transient(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn io_timeout_maps_to_timeout() {
        let e = io::Error::new(io::ErrorKind::TimedOut, "write timed out");
        assert_eq!(map_transport_error(&e), TransportError::Timeout);
    }

    #[test]
    fn io_broken_pipe_maps_to_fault() {
        let e = io::Error::new(io::ErrorKind::BrokenPipe, "device gone");
        assert!(matches!(map_transport_error(&e), TransportError::Fault(m) if m.contains("device gone")));
    }

    #[test]
    fn opaque_errors_use_message_heuristics() {
        let boxed: Box<dyn std::error::Error + Send + Sync> = "Operation timed out".into();
        assert_eq!(map_transport_error(&*boxed), TransportError::Timeout);

        let boxed: Box<dyn std::error::Error + Send + Sync> = "invalid baud rate".into();
        assert!(matches!(classify_open_error(&*boxed), OpenFailure::InvalidConfig(_)));

        let boxed: Box<dyn std::error::Error + Send + Sync> = "device or resource busy".into();
        assert!(matches!(classify_open_error(&*boxed), OpenFailure::Transient(_)));
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn hw_errors_are_downcast() {
        use bridge_hardware::error::HwError;
        assert_eq!(map_transport_error(&HwError::Timeout), TransportError::Timeout);
        assert!(matches!(
            classify_open_error(&HwError::InvalidConfig("baud rate must be > 0".into())),
            OpenFailure::InvalidConfig(m) if m.contains("baud")
        ));
        assert!(matches!(
            classify_open_error(&HwError::Unavailable("busy".into())),
            OpenFailure::Transient(_)
        ));
    }
}
