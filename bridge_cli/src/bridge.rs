//! The poll loop: listeners in, serial packets out.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bridge_core::{
    BridgeError, DriverCfg, OutputDriver, PlayerId, ReconnectPolicy, SendOutcome, SessionState,
    connect_with_backoff,
};
use bridge_traits::clock::{Clock, MonotonicClock};
use bridge_traits::{SerialChannel, SerialConnector};
use eyre::{Result, WrapErr};

use crate::osc::OscListener;

/// Loop settings derived from the config file.
#[derive(Debug, Clone)]
pub struct LoopCfg {
    pub bind_addr: IpAddr,
    pub max_messages_per_poll: usize,
    pub idle_sleep: Duration,
    pub driver: DriverCfg,
    pub reconnect: ReconnectPolicy,
}

impl LoopCfg {
    pub fn from_config(cfg: &bridge_config::Config) -> Result<Self> {
        let bind_addr = cfg
            .listener
            .bind_addr
            .parse::<IpAddr>()
            .wrap_err_with(|| format!("listener.bind_addr {:?}", cfg.listener.bind_addr))?;
        Ok(Self {
            bind_addr,
            max_messages_per_poll: cfg.listener.max_messages_per_poll,
            idle_sleep: Duration::from_millis(cfg.listener.idle_sleep_ms),
            driver: (&cfg.output).into(),
            reconnect: (&cfg.reconnect).into(),
        })
    }
}

pub struct Bridge<K: SerialConnector> {
    listeners: Vec<OscListener>,
    session: SessionState,
    driver: OutputDriver,
    connector: K,
    channel: Option<K::Channel>,
    cfg: LoopCfg,
    clock: MonotonicClock,
    shutdown: Arc<AtomicBool>,
}

impl<K: SerialConnector> Bridge<K> {
    /// Bind one listener per player. Nothing is opened on the serial side yet.
    pub fn bind(
        ports: [u16; 2],
        connector: K,
        cfg: LoopCfg,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self> {
        let mut listeners = Vec::with_capacity(ports.len());
        for (player, port) in PlayerId::ALL.into_iter().zip(ports) {
            let listener = OscListener::bind(player, SocketAddr::new(cfg.bind_addr, port))?;
            if let Ok(addr) = listener.local_addr() {
                tracing::info!(player = %player, addr = %addr, "listening for OSC");
            }
            listeners.push(listener);
        }
        Ok(Self {
            listeners,
            session: SessionState::new(),
            driver: OutputDriver::new(cfg.driver),
            connector,
            channel: None,
            cfg,
            clock: MonotonicClock::new(),
            shutdown,
        })
    }

    #[cfg(test)]
    pub fn listeners(&self) -> &[OscListener] {
        &self.listeners
    }

    /// Run until shutdown is requested. Only a fatal serial configuration
    /// error ends the run with an error.
    pub fn run(&mut self) -> Result<()> {
        tracing::info!(port = %self.connector.describe(), "starting bridge");
        if !self.connect()? {
            return Ok(());
        }

        while !self.shutdown.load(Ordering::Relaxed) {
            let received = self.drain_listeners();
            if self.channel.as_ref().is_none_or(|c| !c.is_open()) {
                tracing::warn!("serial connection lost; reinitializing");
                if !self.connect()? {
                    break;
                }
            }
            let report = self.session.tick(&mut self.driver, self.channel.as_mut());
            if let SendOutcome::NeedsReconnect(err) = report.send {
                tracing::warn!(error = %err, "reinitializing serial connection");
                if !self.connect()? {
                    break;
                }
            }
            if received == 0 && !self.cfg.idle_sleep.is_zero() {
                self.clock.sleep(self.cfg.idle_sleep);
            }
        }

        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
        tracing::info!("bridge stopped");
        Ok(())
    }

    /// Drop any current channel and open a fresh one. `Ok(false)` means
    /// shutdown was requested while connecting.
    fn connect(&mut self) -> Result<bool> {
        if let Some(mut old) = self.channel.take() {
            old.close();
        }
        match connect_with_backoff(
            &mut self.connector,
            &self.clock,
            &self.cfg.reconnect,
            &self.shutdown,
        ) {
            Ok(channel) => {
                self.channel = Some(channel);
                Ok(true)
            }
            Err(e) if matches!(e.downcast_ref::<BridgeError>(), Some(BridgeError::Shutdown)) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Apply everything pending on every listener; returns datagrams read.
    fn drain_listeners(&mut self) -> usize {
        let mut total = 0;
        for listener in &mut self.listeners {
            let (messages, read) = listener.poll(self.cfg.max_messages_per_poll);
            total += read;
            for msg in messages {
                self.session.apply(listener.player(), msg);
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::Endpoint;
    use bridge_hardware::{SimulatedConnector, SimulatedLog};
    use rosc::{OscMessage, OscPacket, OscType, encoder};
    use std::net::UdpSocket;

    fn loopback_cfg() -> LoopCfg {
        let mut cfg = LoopCfg::from_config(&bridge_config::Config::default()).unwrap();
        cfg.bind_addr = "127.0.0.1".parse().unwrap();
        cfg
    }

    fn send(sock: &UdpSocket, to: SocketAddr, addr: &str, args: Vec<OscType>) {
        let bytes = encoder::encode(&OscPacket::Message(OscMessage {
            addr: addr.into(),
            args,
        }))
        .unwrap();
        sock.send_to(&bytes, to).unwrap();
    }

    #[test]
    fn default_config_maps_to_loop_settings() {
        let cfg = LoopCfg::from_config(&bridge_config::Config::default()).unwrap();
        assert_eq!(cfg.bind_addr, IpAddr::from([0, 0, 0, 0]));
        assert_eq!(cfg.max_messages_per_poll, 64);
        assert_eq!(cfg.idle_sleep, Duration::from_millis(1));
        assert_eq!(cfg.driver, DriverCfg::default());
        assert_eq!(cfg.reconnect, ReconnectPolicy::default());
    }

    #[test]
    fn shutdown_before_run_opens_nothing() {
        let log = SimulatedLog::new();
        let connector = SimulatedConnector::new(log.clone());
        let shutdown = Arc::new(AtomicBool::new(true));
        let mut bridge = Bridge::bind([0, 0], connector, loopback_cfg(), shutdown).unwrap();
        bridge.run().unwrap();
        assert_eq!(bridge.connector.opens(), 0);
        assert_eq!(log.frame_count(), 0);
    }

    #[test]
    fn fitted_headsets_reach_the_serial_port() {
        let log = SimulatedLog::new();
        let connector = SimulatedConnector::new(log.clone());
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut bridge =
            Bridge::bind([0, 0], connector, loopback_cfg(), shutdown.clone()).unwrap();
        let targets: Vec<SocketAddr> = bridge
            .listeners()
            .iter()
            .map(|l| l.local_addr().unwrap())
            .collect();

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        for &to in &targets {
            send(&sender, to, Endpoint::ForeheadContact.path(), vec![OscType::Int(1)]);
        }
        // Let the contact messages land before the band data.
        std::thread::sleep(Duration::from_millis(50));
        send(&sender, targets[0], Endpoint::Alpha.path(), vec![OscType::Float(0.4); 4]);
        std::thread::sleep(Duration::from_millis(50));

        let stopper = {
            let shutdown = shutdown.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(300));
                shutdown.store(true, Ordering::Relaxed);
            })
        };
        bridge.run().unwrap();
        stopper.join().unwrap();

        assert_eq!(bridge.connector.opens(), 1);
        let frames = log.frames();
        assert!(!frames.is_empty(), "no packet was written");
        assert_eq!(frames.last().unwrap(), &vec![0, 255, 0, 0, 0]);
    }

    /// Serial port that reports itself closed after its first frame.
    struct ClosesAfterFrame {
        inner: bridge_hardware::SimulatedSerial,
        flushed: bool,
    }

    impl SerialChannel for ClosesAfterFrame {
        fn write(&mut self, bytes: &[u8]) -> std::result::Result<(), bridge_traits::BoxError> {
            self.inner.write(bytes)
        }

        fn flush(&mut self) -> std::result::Result<(), bridge_traits::BoxError> {
            self.inner.flush()?;
            self.flushed = true;
            Ok(())
        }

        fn is_open(&self) -> bool {
            self.inner.is_open() && !self.flushed
        }

        fn close(&mut self) {
            self.inner.close();
        }
    }

    struct ClosingConnector(SimulatedConnector);

    impl SerialConnector for ClosingConnector {
        type Channel = ClosesAfterFrame;

        fn open(&mut self) -> std::result::Result<ClosesAfterFrame, bridge_traits::BoxError> {
            Ok(ClosesAfterFrame {
                inner: self.0.open()?,
                flushed: false,
            })
        }

        fn describe(&self) -> String {
            "self-closing serial".to_string()
        }
    }

    #[test]
    fn closed_port_is_reopened_without_a_write_error() {
        let log = SimulatedLog::new();
        let connector = ClosingConnector(SimulatedConnector::new(log.clone()));
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut bridge =
            Bridge::bind([0, 0], connector, loopback_cfg(), shutdown.clone()).unwrap();
        let targets: Vec<SocketAddr> = bridge
            .listeners()
            .iter()
            .map(|l| l.local_addr().unwrap())
            .collect();

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        for &to in &targets {
            send(&sender, to, Endpoint::ForeheadContact.path(), vec![OscType::Int(1)]);
        }
        std::thread::sleep(Duration::from_millis(50));

        let stopper = {
            let shutdown = shutdown.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(300));
                shutdown.store(true, Ordering::Relaxed);
            })
        };
        bridge.run().unwrap();
        stopper.join().unwrap();

        // Each frame closes the port; the loop must reopen it to send again.
        assert!(bridge.connector.0.opens() >= 2, "opens = {}", bridge.connector.0.opens());
        assert!(log.frame_count() >= 2);
    }
}
