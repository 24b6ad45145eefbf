//! Inbound headset messages, independent of the wire protocol.

use crate::fit::ContactQuality;

/// Named inbound endpoints and their OSC addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Per-electrode fit ("horseshoe"), 4 values.
    ContactQuality,
    /// Whole-headset forehead contact, 1 value.
    ForeheadContact,
    /// Alpha band power, 4 channels.
    Alpha,
    /// Beta band power, 4 channels.
    Beta,
}

impl Endpoint {
    pub const ALL: [Endpoint; 4] = [
        Endpoint::ContactQuality,
        Endpoint::ForeheadContact,
        Endpoint::Alpha,
        Endpoint::Beta,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Endpoint::ContactQuality => "/muse/dsp/elements/horseshoe",
            Endpoint::ForeheadContact => "/muse/dsp/elements/touching_forehead",
            Endpoint::Alpha => "/muse/dsp/elements/alpha",
            Endpoint::Beta => "/muse/dsp/elements/beta",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.path() == path)
    }

    /// Number of arguments the endpoint carries.
    pub fn arity(self) -> usize {
        match self {
            Endpoint::ForeheadContact => 1,
            _ => 4,
        }
    }
}

/// A decoded inbound message for one player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorMessage {
    ContactQuality([ContactQuality; 4]),
    ForeheadContact(i32),
    Alpha([f32; 4]),
    Beta([f32; 4]),
}

impl SensorMessage {
    /// Build a message from numeric arguments; `None` on wrong arity.
    pub fn from_args(endpoint: Endpoint, args: &[f64]) -> Option<Self> {
        if args.len() != endpoint.arity() {
            return None;
        }
        let quad = || [args[0] as f32, args[1] as f32, args[2] as f32, args[3] as f32];
        Some(match endpoint {
            Endpoint::ContactQuality => {
                SensorMessage::ContactQuality(quad().map(ContactQuality::from_reading))
            }
            // Saturating cast; NaN becomes 0 (not touching).
            Endpoint::ForeheadContact => SensorMessage::ForeheadContact(args[0] as i32),
            Endpoint::Alpha => SensorMessage::Alpha(quad()),
            Endpoint::Beta => SensorMessage::Beta(quad()),
        })
    }

    pub fn endpoint(&self) -> Endpoint {
        match self {
            SensorMessage::ContactQuality(_) => Endpoint::ContactQuality,
            SensorMessage::ForeheadContact(_) => Endpoint::ForeheadContact,
            SensorMessage::Alpha(_) => Endpoint::Alpha,
            SensorMessage::Beta(_) => Endpoint::Beta,
        }
    }
}

/// What `SessionState::apply` did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Applied,
    /// Band data dropped because the headset is not on the forehead.
    Gated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_round_trip() {
        for e in Endpoint::ALL {
            assert_eq!(Endpoint::from_path(e.path()), Some(e));
        }
        assert_eq!(Endpoint::from_path("/muse/eeg"), None);
    }

    #[test]
    fn wrong_arity_is_rejected() {
        assert_eq!(SensorMessage::from_args(Endpoint::Alpha, &[0.1, 0.2]), None);
        assert_eq!(
            SensorMessage::from_args(Endpoint::ForeheadContact, &[1.0, 1.0]),
            None
        );
    }

    #[test]
    fn numeric_args_are_converted() {
        assert_eq!(
            SensorMessage::from_args(Endpoint::ForeheadContact, &[1.0]),
            Some(SensorMessage::ForeheadContact(1))
        );
        assert_eq!(
            SensorMessage::from_args(Endpoint::ForeheadContact, &[f64::NAN]),
            Some(SensorMessage::ForeheadContact(0))
        );
        assert_eq!(
            SensorMessage::from_args(Endpoint::ContactQuality, &[1.0, 2.0, 4.0, 0.0]),
            Some(SensorMessage::ContactQuality([
                ContactQuality::Good,
                ContactQuality::Ok,
                ContactQuality::Bad,
                ContactQuality::Unrecognized(0.0),
            ]))
        );
        let msg = SensorMessage::from_args(Endpoint::Beta, &[0.5, 0.25, 0.0, 1.0]).unwrap();
        assert_eq!(msg, SensorMessage::Beta([0.5, 0.25, 0.0, 1.0]));
        assert_eq!(msg.endpoint(), Endpoint::Beta);
    }
}
