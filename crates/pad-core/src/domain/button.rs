//! The gamepad button vocabulary.
//!
//! Each physical control is a distinct power-of-two flag so sets of held
//! buttons can be expressed as a plain bitmask ("no button" is `0`). The
//! `Count` variant is a sentinel: it terminates the flag space and doubles
//! as the "no button" marker carried by keep-alive frames. It is not a
//! control.
//!
//! On the wire a button is a single byte: the *bit index* of its flag
//! (`X` = 0 … `DPad` = 17, `Count` = 18), not the flag itself.

/// A physical gamepad control, represented as a bit flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Button {
    X = 1 << 0,
    Y = 1 << 1,
    B = 1 << 2,
    A = 1 << 3,
    Start = 1 << 4,
    Back = 1 << 5,
    Guide = 1 << 6,
    LeftTrigger = 1 << 7,
    RightTrigger = 1 << 8,
    LeftBumper = 1 << 9,
    RightBumper = 1 << 10,
    Up = 1 << 11,
    Down = 1 << 12,
    Left = 1 << 13,
    Right = 1 << 14,
    LeftStick = 1 << 15,
    RightStick = 1 << 16,
    DPad = 1 << 17,
    /// Sentinel terminating the flag space; stands for "no button".
    Count = 1 << 18,
}

impl Button {
    /// Every real control, in flag order. Excludes the `Count` sentinel.
    pub const ALL: [Button; 18] = [
        Button::X,
        Button::Y,
        Button::B,
        Button::A,
        Button::Start,
        Button::Back,
        Button::Guide,
        Button::LeftTrigger,
        Button::RightTrigger,
        Button::LeftBumper,
        Button::RightBumper,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::LeftStick,
        Button::RightStick,
        Button::DPad,
    ];

    /// The bit flag for this button, suitable for bitmask accumulation.
    pub fn flag(self) -> u32 {
        self as u32
    }

    /// The one-byte wire representation: the index of the flag bit.
    pub fn wire_tag(self) -> u8 {
        (self as u32).trailing_zeros() as u8
    }

    /// Parses the one-byte wire representation back into a button.
    ///
    /// Returns `None` for indices past the `Count` sentinel.
    pub fn from_wire_tag(tag: u8) -> Option<Button> {
        let button = match tag {
            0 => Button::X,
            1 => Button::Y,
            2 => Button::B,
            3 => Button::A,
            4 => Button::Start,
            5 => Button::Back,
            6 => Button::Guide,
            7 => Button::LeftTrigger,
            8 => Button::RightTrigger,
            9 => Button::LeftBumper,
            10 => Button::RightBumper,
            11 => Button::Up,
            12 => Button::Down,
            13 => Button::Left,
            14 => Button::Right,
            15 => Button::LeftStick,
            16 => Button::RightStick,
            17 => Button::DPad,
            18 => Button::Count,
            _ => return None,
        };
        Some(button)
    }

    /// Stable upper-case label, used for logging and by the widget layer
    /// to locate button artwork.
    pub fn label(self) -> &'static str {
        match self {
            Button::X => "X",
            Button::Y => "Y",
            Button::B => "B",
            Button::A => "A",
            Button::Start => "START",
            Button::Back => "BACK",
            Button::Guide => "GUIDE",
            Button::LeftTrigger => "LEFTTRIGGER",
            Button::RightTrigger => "RIGHTTRIGGER",
            Button::LeftBumper => "LEFTBUMPER",
            Button::RightBumper => "RIGHTBUMPER",
            Button::Up => "UP",
            Button::Down => "DOWN",
            Button::Left => "LEFT",
            Button::Right => "RIGHT",
            Button::LeftStick => "LEFTSTICK",
            Button::RightStick => "RIGHTSTICK",
            Button::DPad => "DPAD",
            Button::Count => "COUNT",
        }
    }

    /// Inverse of [`label`](Self::label). Unknown labels map to `None`.
    pub fn from_label(label: &str) -> Option<Button> {
        Button::ALL
            .into_iter()
            .chain(std::iter::once(Button::Count))
            .find(|b| b.label() == label)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
