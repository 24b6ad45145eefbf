//! Outcomes returned from each tick of the session.

use crate::driver::Packet;
use crate::error::TransportError;

/// Global session mode, derived from both players' forehead contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// At least one headset is not on properly; nothing is sent.
    Waiting,
    /// Both headsets are on; packets flow at the configured rate.
    Active,
}

/// Result of the send decision for one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Waiting,
    NoChannel,
    ChannelClosed,
    /// Too soon after the previous attempt.
    RateLimited,
    Sent(Packet),
    /// The write failed; the caller must reopen the channel.
    NeedsReconnect(TransportError),
}

impl SendOutcome {
    pub fn needs_reconnect(&self) -> bool {
        matches!(self, SendOutcome::NeedsReconnect(_))
    }

    pub fn sent(&self) -> Option<&Packet> {
        match self {
            SendOutcome::Sent(p) => Some(p),
            _ => None,
        }
    }
}

/// Everything one `SessionState::tick` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub mode: SessionMode,
    /// A status report pass ran (and cleared every change flag).
    pub status_reported: bool,
    pub send: SendOutcome,
}
