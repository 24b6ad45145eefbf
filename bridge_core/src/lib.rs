#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Headset-to-serial bridge core (hardware-agnostic).
//!
//! Tracks two players' headset fit and band-power samples and turns them
//! into a 5-byte serial packet at a bounded rate. All I/O goes through
//! `bridge_traits::SerialChannel` / `SerialConnector`.
//!
//! ## Architecture
//!
//! - **Fit**: per-electrode quality, forehead contact, change flag (`fit`)
//! - **Samples**: NaN-sanitized 4-channel bands and byte encoding (`sample`)
//! - **Players**: `PlayerId` and `PlayerState` (`player`)
//! - **Messages**: protocol-neutral inbound messages (`message`)
//! - **Session**: gating, waiting/active mode, status reports, tick (`session`)
//! - **Output**: packet layout and rate-limited sends (`driver`)
//! - **Reconnect**: capped linear backoff for opening the port (`reconnect`)
//!
//! ## Tick
//!
//! Single-threaded and poll-driven: the caller drains inbound messages into
//! `SessionState::apply`, then calls `SessionState::tick` once per cycle.

pub mod conversions;
pub mod driver;
pub mod error;
pub mod fit;
pub mod message;
pub mod player;
pub mod reconnect;
pub mod sample;
pub mod session;
pub mod status;
pub mod transport_error;

pub use driver::{DriverCfg, OutputDriver, PACKET_LEN, Packet};
pub use error::{BridgeError, EncodingFault, TransportError};
pub use fit::{ContactPoints, ContactQuality, FitStatus};
pub use message::{Disposition, Endpoint, SensorMessage};
pub use player::{PlayerId, PlayerState};
pub use reconnect::{ReconnectPolicy, connect_with_backoff};
pub use sample::SensorSample;
pub use session::SessionState;
pub use status::{SendOutcome, SessionMode, TickReport};
