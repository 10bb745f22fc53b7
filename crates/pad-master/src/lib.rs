//! Pad-Over-IP master (host side).
//!
//! Receives gamepad events streamed by a paired slave and injects them
//! into the host as a virtual gamepad device. The [`driver`] module holds
//! the device seam ([`driver::VirtualGamepad`]), the Linux uinput
//! implementation, and the injection service that batches writes behind a
//! short sync-report debounce.

pub mod driver;
