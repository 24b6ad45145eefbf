//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Forward two headsets' band power to a serial device.
///
/// Each headset streams OSC over UDP to its own port. Once both report
/// forehead contact, a 5-byte packet `[0, p1_alpha, p1_beta, p2_alpha,
/// p2_beta]` is written to the serial device at most every 50 ms.
#[derive(Parser, Debug)]
#[command(name = "bridge_cli", version, about = "Headset to serial bridge")]
pub struct Cli {
    /// UDP port receiving player 1's OSC stream
    #[arg(value_name = "P1_PORT")]
    pub p1_port: Option<u16>,

    /// UDP port receiving player 2's OSC stream
    #[arg(value_name = "P2_PORT")]
    pub p2_port: Option<u16>,

    /// Serial device path (e.g. /dev/ttyACM0 or COM3)
    #[arg(value_name = "SERIAL_DEVICE")]
    pub serial_device: Option<String>,

    /// Serial baud rate
    #[arg(value_name = "BAUD")]
    pub baud: Option<u32>,

    /// Path to config TOML (optional; defaults apply when omitted)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides logging.level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,
}

/// Fully specified run target, available once all positionals are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub ports: [u16; 2],
    pub serial_device: String,
    pub baud: u32,
}

impl Cli {
    pub fn target(&self) -> Option<Target> {
        Some(Target {
            ports: [self.p1_port?, self.p2_port?],
            serial_device: self.serial_device.clone()?,
            baud: self.baud?,
        })
    }
}
