//! Linux virtual gamepad backed by uinput.
//!
//! Registers a gamepad device with the kernel through `/dev/uinput`: key
//! bits for every mapped button, absolute axes for both sticks with a
//! symmetric ±[`STICK_MAX`] range, then `UI_DEV_CREATE`. From then on the
//! device is a real input node that games and joystick tools read like
//! hardware. Dropping the device destroys the node.

use std::ffi::c_int;
use std::mem;

use tracing::{debug, info};

use pad_core::Button;
use uinput_sys::{
    input_event, ui_dev_create, ui_dev_destroy, ui_set_absbit, ui_set_evbit, ui_set_keybit,
    uinput_user_dev, ABS_RX, ABS_RY, ABS_X, ABS_Y, BTN_A, BTN_B, BTN_DPAD_DOWN, BTN_DPAD_LEFT,
    BTN_DPAD_RIGHT, BTN_DPAD_UP, BTN_MODE, BTN_SELECT, BTN_START, BTN_THUMBL, BTN_THUMBR, BTN_TL,
    BTN_TL2, BTN_TR, BTN_TR2, BTN_X, BTN_Y, EV_ABS, EV_KEY, EV_SYN, SYN_REPORT,
};

use super::{DriverError, VirtualGamepad, STICK_MAX};

const DEVICE_NAME: &[u8] = b"Pad-Over-IP Gamepad";
const UINPUT_PATH: &[u8] = b"/dev/uinput\0";

/// Maps a button to its evdev key code.
///
/// The composite directional-pad flag has no key of its own (its four
/// directions do), so it maps to nothing and callers drop it.
fn evdev_key(button: Button) -> Option<c_int> {
    match button {
        Button::X => Some(BTN_X),
        Button::Y => Some(BTN_Y),
        Button::A => Some(BTN_A),
        Button::B => Some(BTN_B),
        Button::Up => Some(BTN_DPAD_UP),
        Button::Down => Some(BTN_DPAD_DOWN),
        Button::Left => Some(BTN_DPAD_LEFT),
        Button::Right => Some(BTN_DPAD_RIGHT),
        Button::Back => Some(BTN_SELECT),
        Button::Start => Some(BTN_START),
        Button::LeftTrigger => Some(BTN_TL),
        Button::RightTrigger => Some(BTN_TR),
        Button::LeftBumper => Some(BTN_TL2),
        Button::RightBumper => Some(BTN_TR2),
        Button::LeftStick => Some(BTN_THUMBL),
        Button::RightStick => Some(BTN_THUMBR),
        Button::Guide => Some(BTN_MODE),
        Button::DPad | Button::Count => None,
    }
}

/// A registered uinput gamepad device.
pub struct UinputGamepad {
    fd: c_int,
    held: u32,
}

impl UinputGamepad {
    /// Opens `/dev/uinput` and registers the device.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Registration`] when the node cannot be
    /// opened (typically a permissions problem) or any setup ioctl fails.
    pub fn open() -> Result<Self, DriverError> {
        let fd = unsafe {
            libc::open(
                UINPUT_PATH.as_ptr().cast(),
                libc::O_WRONLY | libc::O_NONBLOCK,
            )
        };
        if fd < 0 {
            return Err(DriverError::Registration(std::io::Error::last_os_error()));
        }
        let device = Self { fd, held: 0 };
        device.register()?;
        info!("virtual gamepad device registered");
        Ok(device)
    }

    fn register(&self) -> Result<(), DriverError> {
        setup_ioctl(unsafe { ui_set_evbit(self.fd, EV_KEY) })?;
        for &button in Button::ALL.iter() {
            if let Some(key) = evdev_key(button) {
                setup_ioctl(unsafe { ui_set_keybit(self.fd, key) })?;
            }
        }
        setup_ioctl(unsafe { ui_set_evbit(self.fd, EV_ABS) })?;
        for axis in [ABS_X, ABS_Y, ABS_RX, ABS_RY] {
            setup_ioctl(unsafe { ui_set_absbit(self.fd, axis) })?;
        }

        let mut setup: uinput_user_dev = unsafe { mem::zeroed() };
        for (dst, src) in setup.name.iter_mut().zip(DEVICE_NAME.iter()) {
            *dst = *src as _;
        }
        setup.id.bustype = 0x03; // BUS_USB
        setup.id.vendor = 0x3;
        setup.id.product = 0x3;
        setup.id.version = 2;
        for axis in [ABS_X, ABS_Y, ABS_RX, ABS_RY] {
            setup.absmax[axis as usize] = STICK_MAX;
            setup.absmin[axis as usize] = -STICK_MAX;
            setup.absfuzz[axis as usize] = 0;
            setup.absflat[axis as usize] = 0;
        }

        let written = unsafe {
            libc::write(
                self.fd,
                (&setup as *const uinput_user_dev).cast(),
                mem::size_of::<uinput_user_dev>(),
            )
        };
        if written < 0 {
            return Err(DriverError::Registration(std::io::Error::last_os_error()));
        }
        setup_ioctl(unsafe { ui_dev_create(self.fd) })
    }

    fn write_event(&mut self, kind: c_int, code: c_int, value: i32) -> Result<(), DriverError> {
        let mut event: input_event = unsafe { mem::zeroed() };
        event.kind = kind as _;
        event.code = code as _;
        event.value = value;
        let written = unsafe {
            libc::write(
                self.fd,
                (&event as *const input_event).cast(),
                mem::size_of::<input_event>(),
            )
        };
        if written < 0 {
            return Err(DriverError::Write(std::io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl VirtualGamepad for UinputGamepad {
    fn write_key(&mut self, button: Button, pressed: bool) -> Result<(), DriverError> {
        let Some(key) = evdev_key(button) else {
            debug!(?button, "no evdev key for button, dropping");
            return Ok(());
        };
        self.write_event(EV_KEY, key, i32::from(pressed))?;
        if pressed {
            self.held |= button.flag();
        } else {
            self.held &= !button.flag();
        }
        Ok(())
    }

    fn write_axes(&mut self, stick: Button, x: i32, y: i32) -> Result<(), DriverError> {
        let (x_axis, y_axis) = if stick == Button::LeftStick {
            (ABS_X, ABS_Y)
        } else {
            (ABS_RX, ABS_RY)
        };
        self.write_event(EV_ABS, x_axis, x)?;
        self.write_event(EV_ABS, y_axis, y)
    }

    fn write_sync_report(&mut self) -> Result<(), DriverError> {
        self.write_event(EV_SYN, SYN_REPORT, 0)
    }

    fn held_mask(&self) -> u32 {
        self.held
    }
}

impl Drop for UinputGamepad {
    fn drop(&mut self) {
        unsafe {
            ui_dev_destroy(self.fd);
            libc::close(self.fd);
        }
    }
}

fn setup_ioctl(result: c_int) -> Result<(), DriverError> {
    if result < 0 {
        return Err(DriverError::Registration(std::io::Error::last_os_error()));
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
