//! Binary codec for gamepad event frames.
//!
//! Wire format (all multi-byte values big-endian):
//! ```text
//! [kind:1][button:1]                      -- ButtonPress / ButtonRelease
//! [kind:1][button:1][x:f32][y:f32]        -- every other kind
//! ```
//! The axis bytes are present if and only if the kind carries a value, so a
//! button frame is 2 bytes and a stick or keep-alive frame is 10.
//!
//! A second, fixed frame is the *quit marker* a slave sends its master when
//! it stops streaming: a 2-byte length prefix followed by the UTF-8 bytes
//! of `"quit"`. Both directions use the same two helpers so the frames
//! always match byte-for-byte.

use thiserror::Error;

use crate::domain::button::Button;
use crate::protocol::event::{EventKind, GamepadEvent, StickVector};

/// Frame length of a button press/release event.
pub const BUTTON_FRAME_LEN: usize = 2;
/// Frame length of every kind that carries the axis value.
pub const STICK_FRAME_LEN: usize = 10;

const QUIT_TOKEN: &[u8] = b"quit";

/// Errors that can occur while decoding an event frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer is shorter than the decoded kind requires.
    #[error("truncated frame: need at least {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },

    /// A tag byte is not a recognized enumerator.
    #[error("unknown {field} tag: 0x{value:02X}")]
    UnknownTag { field: &'static str, value: u8 },
}

/// Encodes one event into its wire frame.
///
/// # Examples
///
/// ```rust
/// use pad_core::{encode_event, decode_event, Button, GamepadEvent};
///
/// let event = GamepadEvent::button_press(Button::A);
/// let bytes = encode_event(&event);
/// assert_eq!(bytes.len(), 2);
/// assert_eq!(decode_event(&bytes).unwrap(), event);
/// ```
pub fn encode_event(event: &GamepadEvent) -> Vec<u8> {
    let mut buf = Vec::with_capacity(STICK_FRAME_LEN);
    buf.push(event.kind as u8);
    buf.push(event.button.wire_tag());
    if event.kind.carries_value() {
        buf.extend_from_slice(&event.value.x.to_be_bytes());
        buf.extend_from_slice(&event.value.y.to_be_bytes());
    }
    buf
}

/// Decodes one event from the beginning of `bytes`.
///
/// Trailing bytes beyond what the kind requires are ignored; in particular
/// a button frame with extra bytes decodes without touching them.
///
/// # Errors
///
/// Returns [`DecodeError`] if the frame is truncated or a tag byte is not
/// a recognized enumerator.
pub fn decode_event(bytes: &[u8]) -> Result<GamepadEvent, DecodeError> {
    if bytes.len() < BUTTON_FRAME_LEN {
        return Err(DecodeError::Truncated {
            needed: BUTTON_FRAME_LEN,
            available: bytes.len(),
        });
    }

    let kind = EventKind::try_from(bytes[0]).map_err(|_| DecodeError::UnknownTag {
        field: "kind",
        value: bytes[0],
    })?;
    let button = Button::from_wire_tag(bytes[1]).ok_or(DecodeError::UnknownTag {
        field: "button",
        value: bytes[1],
    })?;

    let value = if kind.carries_value() {
        if bytes.len() < STICK_FRAME_LEN {
            return Err(DecodeError::Truncated {
                needed: STICK_FRAME_LEN,
                available: bytes.len(),
            });
        }
        let x = f32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);
        let y = f32::from_be_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
        StickVector::new(x, y)
    } else {
        StickVector::ZERO
    };

    Ok(GamepadEvent { kind, button, value })
}

/// The quit marker datagram: `[len:u16 BE]["quit"]`.
pub fn quit_frame() -> Vec<u8> {
    let mut buf = Vec::with_capacity(2 + QUIT_TOKEN.len());
    buf.extend_from_slice(&(QUIT_TOKEN.len() as u16).to_be_bytes());
    buf.extend_from_slice(QUIT_TOKEN);
    buf
}

/// Whether a received datagram is the quit marker.
pub fn is_quit_frame(bytes: &[u8]) -> bool {
    bytes == quit_frame()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
