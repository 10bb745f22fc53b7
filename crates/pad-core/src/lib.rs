//! # pad-core
//!
//! Shared library for Pad-Over-IP containing the gamepad domain model, the
//! binary wire codec, and the transceiver state machine.
//!
//! This crate is used by both the master (host) and slave (controller)
//! applications. It has zero dependencies on OS APIs, UI frameworks, or
//! network sockets.
//!
//! # Architecture overview
//!
//! Pad-Over-IP turns a handheld touch device into a wireless gamepad: the
//! host computer (the "master") discovers controllers on the local network,
//! pairs with one, and the controller (the "slave") streams button and stick
//! events which the host injects into a virtual gamepad device.
//!
//! This crate defines:
//!
//! - **`domain`** – the button vocabulary shared by every layer: one
//!   power-of-two flag per physical control, plus the sentinel used for
//!   keep-alive frames.
//!
//! - **`protocol`** – how events travel over the network. Each datagram
//!   carries exactly one [`GamepadEvent`] encoded in a compact binary
//!   layout, decoded back into a typed value on the other end.
//!
//! - **`transceiver`** – the pairing/streaming state machine. It is pure:
//!   socket reads, timer expirations, and user actions come in as
//!   [`transceiver::Stimulus`] values and leave as [`transceiver::Effect`]
//!   values for a runtime to interpret, so every transition can be tested
//!   without a socket.

pub mod domain;
pub mod protocol;
pub mod transceiver;

// Re-export the most-used types at the crate root so callers can write
// `pad_core::GamepadEvent` instead of `pad_core::protocol::event::GamepadEvent`.
pub use domain::button::Button;
pub use protocol::codec::{decode_event, encode_event, DecodeError};
pub use protocol::event::{EventKind, GamepadEvent, StickVector};
pub use transceiver::{
    Notification, Role, State, TransceiverConfig, TransceiverError, TransceiverMachine,
};
