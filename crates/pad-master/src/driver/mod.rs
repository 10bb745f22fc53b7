//! Virtual gamepad drivers.
//!
//! [`VirtualGamepad`] is the device seam: the Linux implementation writes
//! evdev events through uinput, the mock records them for tests. The
//! correct implementation is selected at compile time via
//! `#[cfg(target_os = ...)]`.
//!
//! [`InjectionService`] sits above the device. Incoming events often
//! arrive in bursts (a stick move and a button edge from the same input
//! frame), so instead of emitting a sync report per write the service
//! arms a 1 ms one-shot deadline on the first state-changing write and
//! flushes exactly one report when it expires.

pub mod mock;

#[cfg(target_os = "linux")]
pub mod uinput;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

use pad_core::{Button, EventKind, GamepadEvent};

/// Full deflection of a stick axis on the virtual device.
pub const STICK_MAX: i32 = 1024;

/// How long a state-changing write may wait for companions before the
/// sync report flushes the batch to readers.
pub const SYNC_DEBOUNCE: Duration = Duration::from_millis(1);

/// Error type for virtual device operations.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The device could not be opened and registered with the kernel.
    #[error("failed to register virtual gamepad: {0}")]
    Registration(#[source] std::io::Error),
    /// Writing an event to the device failed.
    #[error("device write failed: {0}")]
    Write(#[source] std::io::Error),
}

/// A device that accepts gamepad state writes.
///
/// Writes are buffered by the kernel (or the mock) until
/// [`write_sync_report`](VirtualGamepad::write_sync_report) marks the end
/// of a batch.
pub trait VirtualGamepad: Send {
    /// Writes a button edge (pressed or released).
    fn write_key(&mut self, button: Button, pressed: bool) -> Result<(), DriverError>;

    /// Writes both axes of `stick` in device units.
    fn write_axes(&mut self, stick: Button, x: i32, y: i32) -> Result<(), DriverError>;

    /// Marks the end of a batch so readers see a consistent state.
    fn write_sync_report(&mut self) -> Result<(), DriverError>;

    /// Flag set of buttons currently held down on the device.
    fn held_mask(&self) -> u32;
}

/// Commands the application feeds into the injection service.
#[derive(Debug, Clone, Copy)]
pub enum DriverCommand {
    /// A decoded event from the paired slave.
    Event(GamepadEvent),
    /// The stream came up.
    Connected,
    /// The stream went down; held buttons are released.
    Disconnected,
}

/// Converts a normalized stick coordinate into device units.
fn scale_axis(value: f32) -> i32 {
    (value.clamp(-1.0, 1.0) * STICK_MAX as f32).round() as i32
}

/// Drives a [`VirtualGamepad`] from a stream of [`DriverCommand`]s.
pub struct InjectionService {
    device: Box<dyn VirtualGamepad>,
    sync_at: Option<Instant>,
}

impl InjectionService {
    pub fn new(device: Box<dyn VirtualGamepad>) -> Self {
        Self { device, sync_at: None }
    }

    /// Runs until the command channel closes.
    ///
    /// Device write failures are logged and skipped; a gamepad that drops
    /// an event is more useful than one that kills the session.
    pub async fn run(mut self, mut commands: mpsc::Receiver<DriverCommand>) {
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.apply(cmd),
                    None => {
                        debug!("driver command channel closed");
                        return;
                    }
                },
                _ = sync_deadline(self.sync_at) => {
                    self.sync_at = None;
                    self.flush();
                }
            }
        }
    }

    fn apply(&mut self, cmd: DriverCommand) {
        match cmd {
            DriverCommand::Event(event) => self.apply_event(&event),
            DriverCommand::Connected => self.arm_sync(),
            DriverCommand::Disconnected => {
                self.release_held();
                self.sync_at = None;
            }
        }
    }

    fn apply_event(&mut self, event: &GamepadEvent) {
        let result = match event.kind {
            EventKind::ButtonPress => self.device.write_key(event.button, true),
            EventKind::ButtonRelease => self.device.write_key(event.button, false),
            EventKind::StickMove | EventKind::StickPress => self.device.write_axes(
                event.button,
                scale_axis(event.value.x),
                scale_axis(event.value.y),
            ),
            EventKind::StickRelease => self.device.write_axes(event.button, 0, 0),
            // Keep-alive only, no device state change.
            EventKind::Dummy => return,
        };
        match result {
            Ok(()) => self.arm_sync(),
            Err(e) => warn!("dropping {:?}: {e}", event.kind),
        }
    }

    /// Arms the sync deadline unless an earlier write already did.
    fn arm_sync(&mut self) {
        if self.sync_at.is_none() {
            self.sync_at = Some(Instant::now() + SYNC_DEBOUNCE);
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.device.write_sync_report() {
            warn!("sync report failed: {e}");
        }
    }

    /// Releases every button the device still reports as held, then syncs
    /// immediately so the host never keeps a phantom press after the
    /// remote goes away.
    fn release_held(&mut self) {
        let held = self.device.held_mask();
        if held == 0 {
            return;
        }
        for &button in Button::ALL.iter() {
            if held & button.flag() != 0 {
                if let Err(e) = self.device.write_key(button, false) {
                    warn!("failed to release {button:?}: {e}");
                }
            }
        }
        self.flush();
    }
}

/// Pends while no sync is scheduled, so the select arm stays inert.
async fn sync_deadline(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::mock::MockGamepad;
    use super::*;
    use pad_core::StickVector;

    fn service() -> (
        mpsc::Sender<DriverCommand>,
        std::sync::Arc<std::sync::Mutex<super::mock::Recording>>,
        tokio::task::JoinHandle<()>,
    ) {
        let (device, recording) = MockGamepad::new();
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(InjectionService::new(Box::new(device)).run(rx));
        (tx, recording, handle)
    }

    /// Lets the paused clock run the service past the debounce window.
    async fn settle() {
        tokio::time::sleep(SYNC_DEBOUNCE * 5).await;
    }

    #[test]
    fn test_scale_axis_maps_unit_range_to_device_units() {
        assert_eq!(scale_axis(1.0), STICK_MAX);
        assert_eq!(scale_axis(-1.0), -STICK_MAX);
        assert_eq!(scale_axis(0.0), 0);
        assert_eq!(scale_axis(0.5), 512);
    }

    #[test]
    fn test_scale_axis_clamps_out_of_range_input() {
        assert_eq!(scale_axis(3.5), STICK_MAX);
        assert_eq!(scale_axis(-2.0), -STICK_MAX);
        assert_eq!(scale_axis(f32::NAN), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_writes_yields_exactly_one_sync_report() {
        let (tx, recording, _task) = service();

        tx.send(DriverCommand::Event(GamepadEvent::button_press(Button::A)))
            .await
            .unwrap();
        tx.send(DriverCommand::Event(GamepadEvent::stick_move(
            Button::LeftStick,
            StickVector::new(0.5, -0.5),
        )))
        .await
        .unwrap();
        settle().await;

        let rec = recording.lock().unwrap();
        assert_eq!(rec.keys, vec![(Button::A, true)]);
        assert_eq!(rec.axes, vec![(Button::LeftStick, 512, -512)]);
        assert_eq!(rec.sync_reports, 1, "one report per burst");
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_each_get_a_sync_report() {
        let (tx, recording, _task) = service();

        tx.send(DriverCommand::Event(GamepadEvent::button_press(Button::B)))
            .await
            .unwrap();
        settle().await;
        tx.send(DriverCommand::Event(GamepadEvent::button_release(Button::B)))
            .await
            .unwrap();
        settle().await;

        assert_eq!(recording.lock().unwrap().sync_reports, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dummy_keepalive_touches_nothing() {
        let (tx, recording, _task) = service();

        tx.send(DriverCommand::Event(GamepadEvent::dummy())).await.unwrap();
        settle().await;

        let rec = recording.lock().unwrap();
        assert!(rec.keys.is_empty());
        assert!(rec.axes.is_empty());
        assert_eq!(rec.sync_reports, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stick_release_recenters_both_axes() {
        let (tx, recording, _task) = service();

        tx.send(DriverCommand::Event(GamepadEvent::stick_move(
            Button::RightStick,
            StickVector::new(1.0, 1.0),
        )))
        .await
        .unwrap();
        tx.send(DriverCommand::Event(GamepadEvent::stick_release(Button::RightStick)))
            .await
            .unwrap();
        settle().await;

        let rec = recording.lock().unwrap();
        assert_eq!(
            rec.axes,
            vec![(Button::RightStick, STICK_MAX, STICK_MAX), (Button::RightStick, 0, 0)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_connected_flushes_an_initial_sync_report() {
        let (tx, recording, _task) = service();

        tx.send(DriverCommand::Connected).await.unwrap();
        settle().await;

        assert_eq!(recording.lock().unwrap().sync_reports, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_releases_held_buttons() {
        let (tx, recording, _task) = service();

        tx.send(DriverCommand::Event(GamepadEvent::button_press(Button::A)))
            .await
            .unwrap();
        tx.send(DriverCommand::Event(GamepadEvent::button_press(Button::X)))
            .await
            .unwrap();
        settle().await;
        tx.send(DriverCommand::Disconnected).await.unwrap();
        settle().await;

        let rec = recording.lock().unwrap();
        assert_eq!(rec.held, 0, "no button may stay held after disconnect");
        assert!(rec.keys.contains(&(Button::A, false)));
        assert!(rec.keys.contains(&(Button::X, false)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_with_nothing_held_writes_nothing() {
        let (tx, recording, _task) = service();

        tx.send(DriverCommand::Disconnected).await.unwrap();
        settle().await;

        let rec = recording.lock().unwrap();
        assert!(rec.keys.is_empty());
        assert_eq!(rec.sync_reports, 0);
    }
}
