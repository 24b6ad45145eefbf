//! Serial (re)connection with capped linear backoff.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bridge_traits::clock::Clock;
use bridge_traits::{SerialChannel, SerialConnector};

use crate::error::{BridgeError, Report, Result};
use crate::transport_error::{OpenFailure, classify_open_error};

/// Longest single sleep between shutdown checks while backing off.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Retry delays: `initial`, then `+step` per failure, never above `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial: Duration,
    pub step: Duration,
    pub max: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            step: Duration::from_secs(1),
            max: Duration::from_secs(10),
        }
    }
}

impl ReconnectPolicy {
    pub fn delays(&self) -> Backoff {
        Backoff {
            next: self.initial.min(self.max),
            step: self.step,
            max: self.max,
        }
    }
}

/// Endless iterator of retry delays.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    step: Duration,
    max: Duration,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        self.next = self.next.saturating_add(self.step).min(self.max);
        Some(current)
    }
}

/// Open a channel, retrying transient failures forever.
///
/// Returns `BridgeError::Config` as soon as the connector reports an invalid
/// configuration, and `BridgeError::Shutdown` once `shutdown` is set.
pub fn connect_with_backoff<K, C>(
    connector: &mut K,
    clock: &C,
    policy: &ReconnectPolicy,
    shutdown: &AtomicBool,
) -> Result<K::Channel>
where
    K: SerialConnector,
    C: Clock,
{
    let mut delays = policy.delays();
    loop {
        if shutdown.load(Ordering::Relaxed) {
            return Err(Report::new(BridgeError::Shutdown));
        }

        tracing::info!(port = %connector.describe(), "opening serial connection");
        match connector.open() {
            Ok(channel) if channel.is_open() => {
                tracing::info!(port = %connector.describe(), "serial connection open");
                return Ok(channel);
            }
            Ok(_) => {
                tracing::warn!("serial port reported closed right after open");
            }
            Err(e) => match classify_open_error(&*e) {
                OpenFailure::InvalidConfig(msg) => {
                    tracing::error!(error = %msg, "invalid serial configuration");
                    return Err(Report::new(BridgeError::Config(msg)));
                }
                OpenFailure::Transient(msg) => {
                    tracing::warn!(error = %msg, "error setting up serial connection");
                }
            },
        }

        let delay = delays.next().unwrap_or(policy.max);
        tracing::info!(delay_ms = delay.as_millis() as u64, "retrying serial connection");
        sleep_unless_shutdown(clock, delay, shutdown);
    }
}

fn sleep_unless_shutdown<C: Clock>(clock: &C, delay: Duration, shutdown: &AtomicBool) {
    let mut remaining = delay;
    while !remaining.is_zero() && !shutdown.load(Ordering::Relaxed) {
        let slice = remaining.min(SHUTDOWN_POLL);
        clock.sleep(slice);
        remaining = remaining.saturating_sub(slice);
    }
}
