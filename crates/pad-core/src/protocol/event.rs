//! The gamepad event value type.

use crate::domain::button::Button;

/// What happened to a control.
///
/// The discriminants are the wire tags and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventKind {
    /// Carries no semantic payload; sent periodically to keep the peer's
    /// liveness timer from expiring.
    Dummy = 0,
    ButtonPress = 1,
    ButtonRelease = 2,
    StickMove = 3,
    StickPress = 4,
    StickRelease = 5,
}

impl TryFrom<u8> for EventKind {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0 => Ok(EventKind::Dummy),
            1 => Ok(EventKind::ButtonPress),
            2 => Ok(EventKind::ButtonRelease),
            3 => Ok(EventKind::StickMove),
            4 => Ok(EventKind::StickPress),
            5 => Ok(EventKind::StickRelease),
            _ => Err(()),
        }
    }
}

impl EventKind {
    /// Whether the wire encoding of this kind includes the axis value.
    ///
    /// Button press/release frames stop after the button byte; everything
    /// else carries the two-axis vector.
    pub fn carries_value(self) -> bool {
        !matches!(self, EventKind::ButtonPress | EventKind::ButtonRelease)
    }
}

/// A 2-D stick deflection, normalized to `[-1, 1]` per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StickVector {
    pub x: f32,
    pub y: f32,
}

impl StickVector {
    pub const ZERO: StickVector = StickVector { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One discrete gamepad event: a button changed, a stick moved, or a
/// keep-alive tick. Immutable value type; exactly one per datagram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GamepadEvent {
    pub kind: EventKind,
    /// Which control the event concerns. `Button::Count` for [`EventKind::Dummy`].
    pub button: Button,
    /// Stick deflection; meaningful only when the kind carries a value.
    pub value: StickVector,
}

impl GamepadEvent {
    pub fn button_press(button: Button) -> Self {
        Self { kind: EventKind::ButtonPress, button, value: StickVector::ZERO }
    }

    pub fn button_release(button: Button) -> Self {
        Self { kind: EventKind::ButtonRelease, button, value: StickVector::ZERO }
    }

    pub fn stick_move(stick: Button, value: StickVector) -> Self {
        Self { kind: EventKind::StickMove, button: stick, value }
    }

    /// A stick clicked in; pressing happens at rest, so the value is the
    /// origin.
    pub fn stick_press(stick: Button) -> Self {
        Self { kind: EventKind::StickPress, button: stick, value: StickVector::ZERO }
    }

    /// A stick returning to rest; the value is always the origin.
    pub fn stick_release(stick: Button) -> Self {
        Self { kind: EventKind::StickRelease, button: stick, value: StickVector::ZERO }
    }

    /// The keep-alive frame. No button, no deflection.
    pub fn dummy() -> Self {
        Self { kind: EventKind::Dummy, button: Button::Count, value: StickVector::ZERO }
    }
}
