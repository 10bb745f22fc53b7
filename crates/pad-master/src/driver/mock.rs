//! Mock virtual gamepad for unit testing.
//!
//! The real device writes evdev events into the kernel, which requires
//! `/dev/uinput` access and cannot be observed from test code. The mock
//! records every call into a shared [`Recording`] so tests can assert on
//! exactly what was written and in what order.
//!
//! # `fail_writes` flag
//!
//! Set `fail_writes = true` on the recording to make every subsequent
//! device method return [`DriverError::Write`], for exercising the
//! error-handling paths of callers.

use std::sync::{Arc, Mutex};

use pad_core::Button;

use super::{DriverError, VirtualGamepad};

/// Everything the mock device was asked to do.
#[derive(Debug, Default)]
pub struct Recording {
    /// Each (button, pressed) pair passed to `write_key`.
    pub keys: Vec<(Button, bool)>,
    /// Each (stick, x, y) triple passed to `write_axes`.
    pub axes: Vec<(Button, i32, i32)>,
    /// How many sync reports were written.
    pub sync_reports: usize,
    /// Flag set of buttons currently held, updated by `write_key`.
    pub held: u32,
    /// When set, every device method fails with a broken-pipe write error.
    pub fail_writes: bool,
}

/// A virtual gamepad that records calls instead of touching the kernel.
pub struct MockGamepad {
    recording: Arc<Mutex<Recording>>,
}

impl MockGamepad {
    /// Creates a mock and the shared recording tests assert against.
    pub fn new() -> (Self, Arc<Mutex<Recording>>) {
        let recording = Arc::new(Mutex::new(Recording::default()));
        (Self { recording: Arc::clone(&recording) }, recording)
    }

    fn fail() -> DriverError {
        DriverError::Write(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "mock failure"))
    }
}

impl VirtualGamepad for MockGamepad {
    fn write_key(&mut self, button: Button, pressed: bool) -> Result<(), DriverError> {
        let mut rec = self.recording.lock().unwrap();
        if rec.fail_writes {
            return Err(Self::fail());
        }
        if pressed {
            rec.held |= button.flag();
        } else {
            rec.held &= !button.flag();
        }
        rec.keys.push((button, pressed));
        Ok(())
    }

    fn write_axes(&mut self, stick: Button, x: i32, y: i32) -> Result<(), DriverError> {
        let mut rec = self.recording.lock().unwrap();
        if rec.fail_writes {
            return Err(Self::fail());
        }
        rec.axes.push((stick, x, y));
        Ok(())
    }

    fn write_sync_report(&mut self) -> Result<(), DriverError> {
        let mut rec = self.recording.lock().unwrap();
        if rec.fail_writes {
            return Err(Self::fail());
        }
        rec.sync_reports += 1;
        Ok(())
    }

    fn held_mask(&self) -> u32 {
        self.recording.lock().unwrap().held
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
