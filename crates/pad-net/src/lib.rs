//! Async networking runtime for Pad-Over-IP.
//!
//! [`pad_core`] defines the pairing/streaming state machine as a pure
//! function from stimuli to effects; this crate supplies the Tokio event
//! loop that owns the UDP socket and the timers, executes those effects,
//! and feeds datagrams and timer expirations back in as stimuli.
//!
//! Applications interact through [`Transceiver`], a cheap-to-clone handle
//! whose commands cross an mpsc channel into the runtime task, and read
//! [`pad_core::Notification`]s from the receiver returned at spawn time.

pub mod transceiver;

pub use transceiver::{Transceiver, TransceiverGone};
