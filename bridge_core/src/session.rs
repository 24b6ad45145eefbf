//! Two-player session: message routing, fit gating and the per-tick pass.

use bridge_traits::SerialChannel;
use bridge_traits::clock::Clock;

use crate::driver::{OutputDriver, Packet};
use crate::message::{Disposition, SensorMessage};
use crate::player::{PLAYER_COUNT, PlayerId, PlayerState};
use crate::status::{SessionMode, TickReport};

/// Both players' state plus the derived waiting flag.
#[derive(Debug, Clone)]
pub struct SessionState {
    players: [PlayerState; PLAYER_COUNT],
    waiting_for_headsets: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            players: PlayerId::ALL.map(PlayerState::new),
            waiting_for_headsets: true,
        }
    }

    pub fn player(&self, id: PlayerId) -> &PlayerState {
        &self.players[id.index()]
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut PlayerState {
        &mut self.players[id.index()]
    }

    /// Value computed by the last `refresh_mode` (or `tick`).
    pub fn waiting_for_headsets(&self) -> bool {
        self.waiting_for_headsets
    }

    pub fn mode(&self) -> SessionMode {
        if self.waiting_for_headsets {
            SessionMode::Waiting
        } else {
            SessionMode::Active
        }
    }

    /// Route one inbound message to `id`'s state.
    ///
    /// Band samples are only stored while that player's headset touches the
    /// forehead; otherwise they are dropped and `Gated` is returned.
    pub fn apply(&mut self, id: PlayerId, msg: SensorMessage) -> Disposition {
        let player = self.player_mut(id);
        match msg {
            SensorMessage::ContactQuality(points) => {
                player.fit_mut().update_contact_points(points);
            }
            SensorMessage::ForeheadContact(raw) => {
                player.fit_mut().update_forehead_contact(raw);
            }
            SensorMessage::Alpha(readings) => {
                if !player.fit().touching_forehead() {
                    tracing::trace!(player = %id, "alpha dropped, headset not fitted");
                    return Disposition::Gated;
                }
                player.set_alpha(readings);
            }
            SensorMessage::Beta(readings) => {
                if !player.fit().touching_forehead() {
                    tracing::trace!(player = %id, "beta dropped, headset not fitted");
                    return Disposition::Gated;
                }
                player.set_beta(readings);
            }
        }
        Disposition::Applied
    }

    /// Recompute `waiting_for_headsets` from both players' forehead contact.
    pub fn refresh_mode(&mut self) -> SessionMode {
        let all_fitted = self.players.iter().all(|p| p.fit().touching_forehead());
        self.waiting_for_headsets = !all_fitted;
        self.mode()
    }

    /// Header line of every report pass.
    pub const REPORT_HEADER: &'static str = "Waiting for headsets...";

    /// If any player's fit changed, log the header and a status line per
    /// player, then clear every player's flag. Returns the lines logged.
    ///
    /// The header is emitted on every pass, even once both players are
    /// fitted; the per-player lines show the actual state.
    pub fn report_pass(&mut self) -> Option<Vec<String>> {
        if !self.players.iter().any(|p| p.fit().status_changed()) {
            return None;
        }
        tracing::info!(waiting = self.waiting_for_headsets, "{}", Self::REPORT_HEADER);
        let mut lines = Vec::with_capacity(PLAYER_COUNT + 1);
        lines.push(Self::REPORT_HEADER.to_string());
        for player in &mut self.players {
            let fit = player.fit();
            let line = fit.report();
            tracing::info!(
                player = %fit.player(),
                touching_forehead = fit.touching_forehead(),
                "{line}"
            );
            lines.push(line);
            player.fit_mut().clear_status_changed();
        }
        Some(lines)
    }

    /// Current output packet from both players' samples.
    pub fn packet(&self) -> Packet {
        Packet::from_players(&self.players)
    }

    /// One evaluation cycle: refresh mode, run the report pass, then let the
    /// driver decide whether to send.
    pub fn tick<C, S>(&mut self, driver: &mut OutputDriver<C>, channel: Option<&mut S>) -> TickReport
    where
        C: Clock,
        S: SerialChannel + ?Sized,
    {
        let mode = self.refresh_mode();
        let status_reported = self.report_pass().is_some();
        let send = driver.send_if_due(self, channel);
        TickReport {
            mode,
            status_reported,
            send,
        }
    }
}
