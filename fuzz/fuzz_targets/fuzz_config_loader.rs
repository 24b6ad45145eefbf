#![no_main]
use bridge_core::{DriverCfg, ReconnectPolicy};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are fine; panics are not.
    let Ok(cfg) = bridge_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        let driver = DriverCfg::from(&cfg.output);
        let policy = ReconnectPolicy::from(&cfg.reconnect);
        assert!(!driver.min_send_interval.is_zero());
        assert!(policy.delays().take(64).all(|d| d <= policy.max));
    }
});
