//! The pairing/streaming state machine shared by both roles.
//!
//! The machine itself ([`TransceiverMachine`]) is pure: every external
//! stimulus (a user action, an arriving datagram, a timer expiration, a
//! bind outcome) is a [`Stimulus`] value, and every consequence (a socket
//! operation, a timer re-arm, a notification for the GUI layer) is an
//! [`Effect`] value for the owning runtime to interpret. This keeps
//! exactly-one-active-state and teardown-before-construct ordering explicit
//! and testable without ever opening a socket.

mod machine;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

pub use machine::TransceiverMachine;

/// The fixed well-known UDP port both roles use.
pub const DEFAULT_PORT: u16 = 45800;

/// How often an unpaired slave announces itself.
pub const BROADCAST_PERIOD: Duration = Duration::from_millis(200);

/// How long a streaming slave tolerates silence before giving its master up.
pub const LIVENESS_TIMEOUT: Duration = Duration::from_millis(1000);

/// Which side of the pairing this transceiver plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Discovers slaves and chooses one to pair with.
    Master,
    /// Announces itself and streams events once paired.
    Slave,
}

/// The externally visible state, as reported by `Notification::StateChanged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    InitMaster,
    Listen,
    MasterStream,
    InitSlave,
    Broadcast,
    SlaveStream,
}

impl State {
    /// Whether gamepad events can flow in this state.
    pub fn is_streaming(self) -> bool {
        matches!(self, State::MasterStream | State::SlaveStream)
    }
}

/// Recoverable faults reported to the GUI layer as data, never thrown.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransceiverError {
    /// `start()` was called before an interface was selected.
    #[error("no interface selected")]
    NoInterfaceSelected,

    /// The master's `start()` was called in Listen with no peer chosen.
    #[error("no target device selected")]
    NoTargetSelected,

    /// The OS refused the socket bind.
    #[error("failed to bind {addr}: {message}")]
    BindFailed { addr: SocketAddr, message: String },
}

/// Notifications produced for the GUI layer.
///
/// They fire synchronously within the triggering transition, in order,
/// never batched.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    StateChanged(State),
    /// A previously unseen peer announced itself (master, Listen only).
    HostFound(SocketAddr),
    Connected,
    Disconnected(String),
    /// One datagram's payload, to be decoded by the event codec downstream.
    DataArrived(Vec<u8>),
    Error(TransceiverError),
    /// `stop()` was called with nothing left to tear down; the application
    /// may exit.
    Closed,
}

/// The timers a state may own. At most one state's timers are live at a
/// time, and a state stops its timers in its exit effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Repeating announce tick (slave, Broadcast). Re-armed on every fire.
    Broadcast,
    /// Single-shot silence deadline (slave, streaming). Re-armed on every
    /// inbound datagram.
    Liveness,
}

/// An external stimulus driving the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Stimulus {
    /// User asked to advance (bind, or pair with the chosen peer).
    Start,
    /// User asked to retreat (quit streaming, release the socket).
    Stop,
    /// The application wants this payload sent to the paired peer.
    Send(Vec<u8>),
    /// One datagram was read off the socket.
    Datagram { from: SocketAddr, payload: Vec<u8> },
    /// A previously armed timer expired.
    TimerFired(TimerKind),
    /// Runtime answer to [`Effect::Bind`]: the socket is bound.
    SocketBound,
    /// Runtime answer to [`Effect::Bind`]: the bind was refused.
    BindFailed(String),
}

/// A consequence for the owning runtime to interpret, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Bind the UDP socket; answer with `SocketBound` or `BindFailed`.
    Bind(SocketAddr),
    /// Release the socket entirely.
    CloseSocket,
    /// Logically connect the socket to this peer: fix the send destination
    /// and drop inbound datagrams from anyone else.
    ConnectPeer(SocketAddr),
    /// Undo [`Effect::ConnectPeer`].
    DisconnectPeer,
    /// Send one datagram to an explicit destination.
    SendTo { dest: SocketAddr, payload: Vec<u8> },
    /// Send one datagram to the connected peer.
    SendToPeer { payload: Vec<u8> },
    /// Arm (or re-arm) a single-shot timer.
    StartTimer { kind: TimerKind, period: Duration },
    /// Disarm a timer if armed.
    StopTimer(TimerKind),
    /// Surface a notification to the GUI layer.
    Notify(Notification),
}

/// Runtime-tunable transport parameters.
///
/// In-memory only; the defaults are the deployed contract and the
/// overrides exist so integration tests can run two roles on loopback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransceiverConfig {
    /// Local UDP port to bind.
    pub port: u16,
    /// Destination of the slave's announce datagrams.
    pub broadcast_addr: SocketAddr,
}

impl Default for TransceiverConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            broadcast_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::BROADCAST), DEFAULT_PORT),
        }
    }
}
