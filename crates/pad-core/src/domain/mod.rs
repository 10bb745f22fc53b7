//! Domain entities shared by every layer: the gamepad button vocabulary.

pub mod button;

pub use button::Button;
