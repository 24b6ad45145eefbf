//! Player identity and per-player state.

use std::fmt;

use crate::error::{BridgeError, EncodingFault};
use crate::fit::FitStatus;
use crate::sample::SensorSample;

/// Number of players a session tracks.
pub const PLAYER_COUNT: usize = 2;

/// Which headset a message or state belongs to.
///
/// External interfaces number players from 1; `TryFrom<u8>` and `number()`
/// are the only places that numbering appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlayerId {
    Player1,
    Player2,
}

impl PlayerId {
    pub const ALL: [PlayerId; PLAYER_COUNT] = [PlayerId::Player1, PlayerId::Player2];

    pub fn number(self) -> u8 {
        match self {
            PlayerId::Player1 => 1,
            PlayerId::Player2 => 2,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            PlayerId::Player1 => 0,
            PlayerId::Player2 => 1,
        }
    }
}

impl TryFrom<u8> for PlayerId {
    type Error = BridgeError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(PlayerId::Player1),
            2 => Ok(PlayerId::Player2),
            other => Err(BridgeError::InvalidPlayer(other)),
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Fit status plus the latest alpha and beta samples of one player.
///
/// Fit gating of sample updates is the caller's job (see
/// `SessionState::apply`); the setters here always store.
#[derive(Debug, Clone)]
pub struct PlayerState {
    fit: FitStatus,
    alpha: SensorSample,
    beta: SensorSample,
}

impl PlayerState {
    pub fn new(id: PlayerId) -> Self {
        Self {
            fit: FitStatus::new(id),
            alpha: SensorSample::default(),
            beta: SensorSample::default(),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.fit.player()
    }

    pub fn fit(&self) -> &FitStatus {
        &self.fit
    }

    pub fn fit_mut(&mut self) -> &mut FitStatus {
        &mut self.fit
    }

    pub fn alpha(&self) -> &SensorSample {
        &self.alpha
    }

    pub fn beta(&self) -> &SensorSample {
        &self.beta
    }

    pub fn set_alpha(&mut self, readings: [f32; 4]) {
        self.alpha.set(readings);
    }

    pub fn set_beta(&mut self, readings: [f32; 4]) {
        self.beta.set(readings);
    }

    pub fn try_encode_alpha_byte(&self) -> Result<u8, EncodingFault> {
        self.alpha.try_encode()
    }

    pub fn try_encode_beta_byte(&self) -> Result<u8, EncodingFault> {
        self.beta.try_encode()
    }

    pub fn encode_alpha_byte(&self) -> u8 {
        self.alpha.encode()
    }

    pub fn encode_beta_byte(&self) -> u8 {
        self.beta.encode()
    }

    /// `[alpha, beta]`, in packet order.
    pub fn output_bytes(&self) -> [u8; 2] {
        [self.encode_alpha_byte(), self.encode_beta_byte()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_numbers_round_trip_through_the_edge() {
        for id in PlayerId::ALL {
            assert_eq!(PlayerId::try_from(id.number()).unwrap(), id);
        }
        assert!(matches!(
            PlayerId::try_from(0),
            Err(BridgeError::InvalidPlayer(0))
        ));
        assert!(matches!(
            PlayerId::try_from(3),
            Err(BridgeError::InvalidPlayer(3))
        ));
    }

    #[test]
    fn setters_store_regardless_of_fit() {
        let mut p = PlayerState::new(PlayerId::Player2);
        assert!(!p.fit().touching_forehead());
        p.set_alpha([0.195; 4]);
        p.set_beta([f32::NAN, 0.0, 0.0, 0.0]);
        assert_eq!(p.output_bytes(), [255, 0]);
        assert_eq!(p.beta().readings(), [0.0; 4]);
    }

    #[test]
    fn encode_fault_is_visible_through_try_variant() {
        let mut p = PlayerState::new(PlayerId::Player1);
        p.set_beta([f32::INFINITY, 0.0, 0.0, 0.0]);
        assert!(p.try_encode_beta_byte().is_err());
        assert_eq!(p.encode_beta_byte(), 0);
        assert_eq!(p.try_encode_alpha_byte(), Ok(0));
    }
}
