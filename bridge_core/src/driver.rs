//! Rate-limited packet output over a serial channel.

use std::fmt;
use std::time::{Duration, Instant};

use bridge_traits::SerialChannel;
use bridge_traits::clock::{Clock, MonotonicClock};

use crate::error::TransportError;
use crate::player::{PLAYER_COUNT, PlayerState};
use crate::session::SessionState;
use crate::status::SendOutcome;
use crate::transport_error::map_transport_error;

/// First byte of every packet; lets the receiver resynchronise.
pub const PACKET_MARKER: u8 = 0x00;
/// Marker plus an alpha and a beta byte per player.
pub const PACKET_LEN: usize = 1 + 2 * PLAYER_COUNT;
/// Default minimum spacing between send attempts.
pub const DEFAULT_MIN_SEND_INTERVAL: Duration = Duration::from_millis(50);

/// `[0x00, p1_alpha, p1_beta, p2_alpha, p2_beta]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet([u8; PACKET_LEN]);

impl Packet {
    pub fn from_players(players: &[PlayerState; PLAYER_COUNT]) -> Self {
        let mut bytes = [PACKET_MARKER; PACKET_LEN];
        for (i, player) in players.iter().enumerate() {
            let [alpha, beta] = player.output_bytes();
            bytes[1 + 2 * i] = alpha;
            bytes[2 + 2 * i] = beta;
        }
        Packet(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PACKET_LEN] {
        &self.0
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{b}")?;
        }
        Ok(())
    }
}

/// Runtime output configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverCfg {
    pub min_send_interval: Duration,
}

impl Default for DriverCfg {
    fn default() -> Self {
        Self {
            min_send_interval: DEFAULT_MIN_SEND_INTERVAL,
        }
    }
}

/// Owns the send pacing state. One instance per process; the channel is
/// lent to each call and never retained.
pub struct OutputDriver<C: Clock = MonotonicClock> {
    cfg: DriverCfg,
    clock: C,
    last_attempt: Option<Instant>,
}

impl OutputDriver<MonotonicClock> {
    pub fn new(cfg: DriverCfg) -> Self {
        Self::with_clock(cfg, MonotonicClock::new())
    }
}

impl<C: Clock> OutputDriver<C> {
    pub fn with_clock(cfg: DriverCfg, clock: C) -> Self {
        Self {
            cfg,
            clock,
            last_attempt: None,
        }
    }

    pub fn cfg(&self) -> &DriverCfg {
        &self.cfg
    }

    /// Time of the last send attempt, successful or not.
    pub fn last_attempt(&self) -> Option<Instant> {
        self.last_attempt
    }

    fn is_due(&self, now: Instant) -> bool {
        match self.last_attempt {
            None => true,
            Some(prev) => now.saturating_duration_since(prev) >= self.cfg.min_send_interval,
        }
    }

    /// Send the session's packet if the session is active, the channel is
    /// usable and the minimum interval has elapsed.
    ///
    /// Once a write is attempted the attempt time is recorded whatever the
    /// result, so a failing channel is not retried faster than the interval.
    pub fn send_if_due<S>(
        &mut self,
        session: &SessionState,
        channel: Option<&mut S>,
    ) -> SendOutcome
    where
        S: SerialChannel + ?Sized,
    {
        if session.waiting_for_headsets() {
            return SendOutcome::Waiting;
        }
        let Some(channel) = channel else {
            return SendOutcome::NoChannel;
        };
        if !channel.is_open() {
            return SendOutcome::ChannelClosed;
        }
        let now = self.clock.now();
        if !self.is_due(now) {
            return SendOutcome::RateLimited;
        }

        let packet = session.packet();
        let result = write_packet(channel, &packet);
        self.last_attempt = Some(now);

        match result {
            Ok(()) => {
                tracing::info!(packet = %packet, "sent serial packet");
                SendOutcome::Sent(packet)
            }
            Err(TransportError::Timeout) => {
                tracing::warn!("serial write timed out; connection will be reinitialized");
                SendOutcome::NeedsReconnect(TransportError::Timeout)
            }
            Err(e) => {
                tracing::warn!(error = %e, "serial write failed; connection will be reinitialized");
                SendOutcome::NeedsReconnect(e)
            }
        }
    }
}

/// Write then flush as one logical send.
fn write_packet<S>(channel: &mut S, packet: &Packet) -> Result<(), TransportError>
where
    S: SerialChannel + ?Sized,
{
    channel
        .write(packet.as_bytes())
        .map_err(|e| map_transport_error(&*e))?;
    channel.flush().map_err(|e| map_transport_error(&*e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerId;

    #[test]
    fn packet_layout_is_marker_then_player_pairs() {
        let mut players = [
            PlayerState::new(PlayerId::Player1),
            PlayerState::new(PlayerId::Player2),
        ];
        players[0].set_alpha([0.195; 4]);
        players[1].set_beta([0.0975; 4]);
        let p = Packet::from_players(&players);
        assert_eq!(p.as_bytes(), &[0, 255, 0, 0, 127]);
        assert_eq!(p.to_string(), "0 255 0 0 127");
    }

    #[test]
    fn fresh_driver_is_due() {
        let d = OutputDriver::new(DriverCfg::default());
        assert!(d.last_attempt().is_none());
        assert!(d.is_due(Instant::now()));
        assert_eq!(d.cfg().min_send_interval, Duration::from_millis(50));
    }
}
