//! `From` implementations bridging `bridge_config` types to `bridge_core` types.

use std::time::Duration;

use crate::driver::DriverCfg;
use crate::reconnect::ReconnectPolicy;

// ── DriverCfg ────────────────────────────────────────────────────────────────

impl From<&bridge_config::OutputCfg> for DriverCfg {
    fn from(c: &bridge_config::OutputCfg) -> Self {
        Self {
            min_send_interval: Duration::from_millis(c.min_send_interval_ms),
        }
    }
}

// ── ReconnectPolicy ──────────────────────────────────────────────────────────

impl From<&bridge_config::ReconnectCfg> for ReconnectPolicy {
    fn from(c: &bridge_config::ReconnectCfg) -> Self {
        Self {
            initial: Duration::from_millis(c.initial_backoff_ms),
            step: Duration::from_millis(c.backoff_step_ms),
            max: Duration::from_millis(c.max_backoff_ms),
        }
    }
}
