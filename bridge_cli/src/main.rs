mod bridge;
mod cli;
mod error_fmt;
mod osc;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bridge_config::Config;
use bridge_traits::SerialConnector;
use clap::{CommandFactory, Parser};
use eyre::{Result, WrapErr, eyre};

use crate::bridge::{Bridge, LoopCfg};
use crate::cli::{Cli, FILE_GUARD, JSON_MODE, Target};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

/// Use the in-memory serial port instead of a device (integration tests).
const ENV_SIM_SERIAL: &str = "BRIDGE_TEST_SIM_SERIAL";
/// Request shutdown after this many milliseconds (integration tests).
const ENV_EXIT_AFTER_MS: &str = "BRIDGE_TEST_EXIT_AFTER_MS";

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = run(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        tracing::error!(error = %e, "bridge failed");
        std::process::exit(exit_code_for_error(&e));
    }
}

fn run(cli: Cli) -> Result<()> {
    let Some(target) = cli.target() else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    // load_file validates; defaults are checked the same way.
    let cfg = match &cli.config {
        Some(path) => bridge_config::load_file(path),
        None => {
            let cfg = Config::default();
            cfg.validate().map(|()| cfg)
        }
    }
    .wrap_err("invalid configuration")?;

    let level = cli
        .log_level
        .clone()
        .or_else(|| cfg.logging.level.clone())
        .unwrap_or_else(|| "info".to_string());
    init_tracing(cli.json, &level, &cfg.logging)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Relaxed);
        })
        .wrap_err("install Ctrl-C handler")?;
    }
    if let Some(ms) = std::env::var(ENV_EXIT_AFTER_MS)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
    {
        let shutdown = shutdown.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(ms));
            shutdown.store(true, Ordering::Relaxed);
        });
    }

    let loop_cfg = LoopCfg::from_config(&cfg)?;
    let timeout = Duration::from_millis(cfg.serial.timeout_ms);
    if std::env::var(ENV_SIM_SERIAL).is_ok_and(|v| v == "1") {
        tracing::info!("using simulated serial port");
        let connector = bridge_hardware::SimulatedConnector::new(bridge_hardware::SimulatedLog::new());
        serve(&target, connector, loop_cfg, shutdown)
    } else {
        real_serial(&target, timeout, loop_cfg, shutdown)
    }
}

#[cfg(feature = "serial")]
fn real_serial(
    target: &Target,
    timeout: Duration,
    loop_cfg: LoopCfg,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    let connector =
        bridge_hardware::SerialPortConnector::new(target.serial_device.clone(), target.baud, timeout);
    serve(target, connector, loop_cfg, shutdown)
}

#[cfg(not(feature = "serial"))]
fn real_serial(
    target: &Target,
    _timeout: Duration,
    loop_cfg: LoopCfg,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    tracing::warn!(
        device = %target.serial_device,
        "built without the `serial` feature; writing to a simulated port"
    );
    let connector = bridge_hardware::SimulatedConnector::new(bridge_hardware::SimulatedLog::new());
    serve(target, connector, loop_cfg, shutdown)
}

fn serve<K: SerialConnector>(
    target: &Target,
    connector: K,
    loop_cfg: LoopCfg,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    tracing::info!(
        p1_port = target.ports[0],
        p2_port = target.ports[1],
        device = %target.serial_device,
        baud = target.baud,
        "configuration"
    );
    let mut bridge = Bridge::bind(target.ports, connector, loop_cfg, shutdown)?;
    bridge.run()
}

fn init_tracing(json: bool, level: &str, logging: &bridge_config::Logging) -> Result<()> {
    use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err_with(|| format!("invalid log level {level:?}"))?;

    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file = match logging.file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre!("logging.file has no file name: {}", path.display()))?;
            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| eyre!("init tracing: {e}"))
}
