#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the headset bridge.
//!
//! Every section is optional; a missing file or section yields the defaults
//! below. `Config::validate` rejects values the runtime cannot honour.
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SerialCfg {
    /// Read/write timeout applied when the port is opened (ms).
    pub timeout_ms: u64,
}

impl Default for SerialCfg {
    fn default() -> Self {
        Self { timeout_ms: 3000 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputCfg {
    /// Minimum spacing between two serial send attempts (ms).
    pub min_send_interval_ms: u64,
}

impl Default for OutputCfg {
    fn default() -> Self {
        Self {
            min_send_interval_ms: 50,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReconnectCfg {
    /// Delay before the first retry (ms)
    pub initial_backoff_ms: u64,
    /// Added to the delay after every failed attempt (ms)
    pub backoff_step_ms: u64,
    /// Upper bound on the delay (ms)
    pub max_backoff_ms: u64,
}

impl Default for ReconnectCfg {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 1000,
            backoff_step_ms: 1000,
            max_backoff_ms: 10_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ListenerCfg {
    /// Address the per-player UDP listeners bind to.
    pub bind_addr: String,
    /// Datagrams drained per listener per poll cycle.
    pub max_messages_per_poll: usize,
    /// Sleep when a poll cycle received nothing (ms, 0 = spin).
    pub idle_sleep_ms: u64,
}

impl Default for ListenerCfg {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            max_messages_per_poll: 64,
            idle_sleep_ms: 1,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub serial: SerialCfg,
    pub output: OutputCfg,
    pub reconnect: ReconnectCfg,
    pub listener: ListenerCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Serial
        if self.serial.timeout_ms == 0 {
            eyre::bail!("serial.timeout_ms must be >= 1");
        }

        // Output
        if self.output.min_send_interval_ms == 0 {
            eyre::bail!("output.min_send_interval_ms must be >= 1");
        }
        if self.output.min_send_interval_ms > 60 * 1000 {
            eyre::bail!("output.min_send_interval_ms is unreasonably large (>1min)");
        }

        // Reconnect
        if self.reconnect.initial_backoff_ms == 0 {
            eyre::bail!("reconnect.initial_backoff_ms must be >= 1");
        }
        if self.reconnect.max_backoff_ms < self.reconnect.initial_backoff_ms {
            eyre::bail!("reconnect.max_backoff_ms must be >= reconnect.initial_backoff_ms");
        }

        // Listener
        if self.listener.bind_addr.parse::<std::net::IpAddr>().is_err() {
            eyre::bail!(
                "listener.bind_addr must be an IP address, got {:?}",
                self.listener.bind_addr
            );
        }
        if self.listener.max_messages_per_poll == 0 {
            eyre::bail!("listener.max_messages_per_poll must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = load_toml("").expect("parse");
        assert_eq!(cfg.output.min_send_interval_ms, 50);
        assert_eq!(cfg.serial.timeout_ms, 3000);
        assert_eq!(cfg.reconnect.initial_backoff_ms, 1000);
        assert_eq!(cfg.reconnect.max_backoff_ms, 10_000);
        assert_eq!(cfg.listener.bind_addr, "0.0.0.0");
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg = load_toml("[reconnect]\nmax_backoff_ms = 5000\n").expect("parse");
        assert_eq!(cfg.reconnect.max_backoff_ms, 5000);
        assert_eq!(cfg.reconnect.backoff_step_ms, 1000);
    }
}
