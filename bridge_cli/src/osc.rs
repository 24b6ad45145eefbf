//! Per-player OSC listeners on non-blocking UDP sockets.

use std::io;
use std::net::{SocketAddr, UdpSocket};

use bridge_core::{Endpoint, PlayerId, SensorMessage};
use rosc::{OscMessage, OscPacket, OscType};

/// Large enough for any single OSC datagram the headset app sends.
const RECV_BUF_LEN: usize = 4096;

#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("bind OSC listener for player {player} on {addr}: {source}")]
    Bind {
        player: PlayerId,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// What to do after a failed `recv_from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecvStep {
    /// Nothing pending.
    Drained,
    /// Try the same read again.
    Retry,
    /// One datagram is lost; keep reading.
    Dropped,
}

fn recv_step(player: PlayerId, e: &io::Error) -> RecvStep {
    match e.kind() {
        io::ErrorKind::WouldBlock => RecvStep::Drained,
        io::ErrorKind::Interrupted => RecvStep::Retry,
        // Windows reports ICMP port-unreachable on UDP sockets this way.
        io::ErrorKind::ConnectionReset => {
            tracing::debug!(player = %player, error = %e, "ignoring connection reset");
            RecvStep::Dropped
        }
        // e.g. WSAEMSGSIZE for a datagram larger than the buffer on Windows.
        _ => {
            tracing::warn!(player = %player, error = %e, "dropping unreadable datagram");
            RecvStep::Dropped
        }
    }
}

/// One player's UDP endpoint.
pub struct OscListener {
    player: PlayerId,
    socket: UdpSocket,
    buf: Vec<u8>,
}

impl OscListener {
    pub fn bind(player: PlayerId, addr: SocketAddr) -> Result<Self, ListenerError> {
        let bind_err = |source| ListenerError::Bind {
            player,
            addr,
            source,
        };
        let socket = UdpSocket::bind(addr).map_err(bind_err)?;
        socket.set_nonblocking(true).map_err(bind_err)?;
        Ok(Self {
            player,
            socket,
            buf: vec![0; RECV_BUF_LEN],
        })
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Read at most `max_datagrams` pending datagrams without blocking.
    ///
    /// Returns the decoded messages and how many datagrams were consumed.
    /// Receive errors cost the datagram, never the listener.
    pub fn poll(&mut self, max_datagrams: usize) -> (Vec<SensorMessage>, usize) {
        let mut out = Vec::new();
        let mut read = 0;
        while read < max_datagrams {
            match self.socket.recv_from(&mut self.buf) {
                Ok((n, _src)) => {
                    read += 1;
                    decode_datagram(&self.buf[..n], &mut out);
                }
                Err(e) => match recv_step(self.player, &e) {
                    RecvStep::Drained => break,
                    RecvStep::Retry => continue,
                    RecvStep::Dropped => read += 1,
                },
            }
        }
        (out, read)
    }
}

/// Decode one datagram, appending every recognised message to `out`.
///
/// Malformed packets, unknown addresses and bad argument lists are dropped.
pub fn decode_datagram(bytes: &[u8], out: &mut Vec<SensorMessage>) {
    match rosc::decoder::decode_udp(bytes) {
        Ok((_rest, packet)) => flatten(packet, out),
        Err(e) => tracing::debug!(error = ?e, len = bytes.len(), "dropping malformed OSC datagram"),
    }
}

fn flatten(packet: OscPacket, out: &mut Vec<SensorMessage>) {
    match packet {
        OscPacket::Message(msg) => {
            if let Some(m) = to_sensor_message(&msg) {
                out.push(m);
            }
        }
        OscPacket::Bundle(bundle) => {
            for inner in bundle.content {
                flatten(inner, out);
            }
        }
    }
}

fn to_sensor_message(msg: &OscMessage) -> Option<SensorMessage> {
    let Some(endpoint) = Endpoint::from_path(&msg.addr) else {
        tracing::trace!(addr = %msg.addr, "ignoring OSC address");
        return None;
    };
    let args: Option<Vec<f64>> = msg.args.iter().map(|a| numeric(endpoint, a)).collect();
    let decoded = args.and_then(|args| SensorMessage::from_args(endpoint, &args));
    if decoded.is_none() {
        tracing::debug!(addr = %msg.addr, args = ?msg.args, "unexpected OSC arguments");
    }
    decoded
}

fn numeric(endpoint: Endpoint, arg: &OscType) -> Option<f64> {
    match arg {
        OscType::Float(f) => Some(f64::from(*f)),
        OscType::Double(d) => Some(*d),
        OscType::Int(i) => Some(f64::from(*i)),
        OscType::Long(l) => Some(*l as f64),
        OscType::Bool(b) if endpoint == Endpoint::ForeheadContact => Some(f64::from(u8::from(*b))),
        _ => None,
    }
}
