//! The wire protocol: one gamepad event per UDP datagram.
//!
//! The codec is pure and stateless; decoding a datagram has no side effects,
//! which keeps round-trip testing deterministic.

pub mod codec;
pub mod event;

pub use codec::{decode_event, encode_event, is_quit_frame, quit_frame, DecodeError};
pub use event::{EventKind, GamepadEvent, StickVector};
