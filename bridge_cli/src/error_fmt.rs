//! Human-readable error descriptions and structured JSON error formatting.

use bridge_core::BridgeError;

use crate::osc::ListenerError;

/// Exit code for an invalid serial configuration (bad path or baud).
pub const EXIT_SERIAL_CONFIG: i32 = 3;
/// Exit code when a UDP listener cannot be bound.
pub const EXIT_LISTENER_BIND: i32 = 4;

/// Stable machine-readable name for the error class.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(BridgeError::Config(_)) = err.downcast_ref::<BridgeError>() {
        return "SerialConfig";
    }
    if let Some(ListenerError::Bind { .. }) = err.downcast_ref::<ListenerError>() {
        return "ListenerBind";
    }
    if chain_text(err).to_ascii_lowercase().contains("config") {
        return "Config";
    }
    "Error"
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = err.downcast_ref::<BridgeError>() {
        return match be {
            BridgeError::Config(msg) => format!(
                "What happened: The serial port could not be opened with the given settings ({msg}).\nLikely causes: Empty or malformed device path, a baud rate of 0, or a setting the driver rejects.\nHow to fix: Check the SERIAL_DEVICE and BAUD arguments (e.g. /dev/ttyACM0 9600)."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if let Some(ListenerError::Bind { player, addr, source }) = err.downcast_ref::<ListenerError>() {
        return format!(
            "What happened: Could not listen for player {player} on {addr} ({source}).\nLikely causes: Another program (or the other player's listener) already uses that port, or the address is not local.\nHow to fix: Pick two distinct free ports, or change listener.bind_addr in the config."
        );
    }

    // String-based heuristics for errors coming from config loading
    let msg = chain_text(err);
    let lower = msg.to_ascii_lowercase();

    if lower.contains("read config") {
        return format!(
            "What happened: The config file could not be read.\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Check the path and rerun. Original: {msg}"
        );
    }

    if lower.contains("parse config") || lower.contains("invalid configuration") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: A typo in the TOML or an out-of-range value.\nHow to fix: Edit the config file and try again; every section may be omitted to use defaults."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Exit code for a failed run; anything unclassified is 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match reason_name(err) {
        "SerialConfig" => EXIT_SERIAL_CONFIG,
        "ListenerBind" => EXIT_LISTENER_BIND,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

fn chain_text(err: &eyre::Report) -> String {
    err.chain()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}
