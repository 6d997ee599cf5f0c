//! Raw event drain from the physical keyboard and pointer.

use std::os::unix::io::{AsRawFd, RawFd};
use std::path::PathBuf;

use evdev::{Device, InputEventKind, Key, RelativeAxisType};
use tracing::{debug, info, warn};

use openwheel_errors::{DeviceError, DeviceResult, SetupError};

/// Most events drained from one device per tick; bounds tick latency when a
/// device floods.
pub const EVENT_BUDGET_PER_DEVICE: usize = 256;

/// Size of the dense key-state vector, covering every `KEY_*`/`BTN_*` code.
const KEY_SLOTS: usize = 0x300;

struct OpenDevice {
    path: PathBuf,
    device: Device,
}

/// Rising-edge detector for a held chord.
#[derive(Debug, Default)]
pub struct ToggleDetector {
    prev: bool,
}

impl ToggleDetector {
    /// True exactly when the chord transitions from released to held.
    pub fn update(&mut self, chord_held: bool) -> bool {
        let edge = chord_held && !self.prev;
        self.prev = chord_held;
        edge
    }
}

/// Presents the two physical device streams as a key-state vector plus a
/// per-tick pointer delta, with rising-edge detection for the enable chord.
pub struct InputReader {
    keyboard: Option<OpenDevice>,
    pointer: Option<OpenDevice>,
    keys: Box<[bool; KEY_SLOTS]>,
    toggle: ToggleDetector,
    grabbed: bool,
}

impl InputReader {
    /// Wrap the discovered devices. A single device is acceptable; with
    /// neither, the pipeline refuses to start.
    pub fn new(
        keyboard: Option<(PathBuf, Device)>,
        pointer: Option<(PathBuf, Device)>,
    ) -> Result<Self, SetupError> {
        if keyboard.is_none() && pointer.is_none() {
            return Err(SetupError::NoInputDevices);
        }
        let wrap = |(path, device): (PathBuf, Device)| {
            set_nonblocking(device.as_raw_fd());
            OpenDevice { path, device }
        };
        Ok(Self {
            keyboard: keyboard.map(wrap),
            pointer: pointer.map(wrap),
            keys: Box::new([false; KEY_SLOTS]),
            toggle: ToggleDetector::default(),
            grabbed: false,
        })
    }

    /// Drain pending events from both devices, bounded per device, and
    /// return the accumulated horizontal pointer delta.
    ///
    /// Short reads and `EAGAIN`/`EINTR` are not errors.
    pub fn read(&mut self) -> i32 {
        let mut mouse_dx = 0;

        if let Some(keyboard) = self.keyboard.as_mut() {
            drain(keyboard, |kind, value| {
                if let InputEventKind::Key(key) = kind {
                    let code = key.code() as usize;
                    if code < KEY_SLOTS {
                        self.keys[code] = value != 0;
                    }
                }
            });
        }

        if let Some(pointer) = self.pointer.as_mut() {
            drain(pointer, |kind, value| {
                if kind == InputEventKind::RelAxis(RelativeAxisType::REL_X) {
                    mouse_dx += value;
                }
            });
        }

        mouse_dx
    }

    /// Whether a key is currently held.
    pub fn key_held(&self, code: u16) -> bool {
        self.keys.get(code as usize).copied().unwrap_or(false)
    }

    /// Rising-edge detector for the enable/disable chord
    /// `(LeftCtrl | RightCtrl) + M`.
    pub fn check_toggle(&mut self) -> bool {
        let ctrl =
            self.key_held(Key::KEY_LEFTCTRL.code()) || self.key_held(Key::KEY_RIGHTCTRL.code());
        self.toggle.update(ctrl && self.key_held(Key::KEY_M.code()))
    }

    /// Acquire or release exclusive access to both devices.
    ///
    /// Acquisition failure is reported to the caller (after releasing any
    /// partial grab); release failures are logged and absorbed.
    pub fn grab(&mut self, enable: bool) -> DeviceResult<()> {
        if !enable {
            if self.grabbed {
                self.release_all();
                self.grabbed = false;
                info!("input devices released");
            }
            return Ok(());
        }

        let mut failed = None;
        for slot in [&mut self.keyboard, &mut self.pointer] {
            if let Some(open) = slot.as_mut() {
                if let Err(err) = open.device.grab() {
                    warn!(path = %open.path.display(), error = %err, "exclusive grab failed");
                    failed = Some(open.path.display().to_string());
                    break;
                }
                debug!(path = %open.path.display(), "grabbed");
            }
        }
        if let Some(path) = failed {
            // Roll back any partial grab before reporting.
            self.release_all();
            return Err(DeviceError::GrabFailed(path));
        }
        self.grabbed = true;
        info!("input devices grabbed");
        Ok(())
    }

    fn release_all(&mut self) {
        for slot in [&mut self.keyboard, &mut self.pointer] {
            if let Some(open) = slot.as_mut() {
                if let Err(err) = open.device.ungrab() {
                    warn!(path = %open.path.display(), error = %err, "ungrab failed");
                }
            }
        }
    }

    /// Raw fds for the caller's readiness poll.
    pub fn poll_fds(&self) -> Vec<RawFd> {
        [self.keyboard.as_ref(), self.pointer.as_ref()]
            .into_iter()
            .flatten()
            .map(|open| open.device.as_raw_fd())
            .collect()
    }
}

impl Drop for InputReader {
    fn drop(&mut self) {
        if self.grabbed {
            self.release_all();
        }
    }
}

fn drain(open: &mut OpenDevice, mut handle: impl FnMut(InputEventKind, i32)) {
    let mut seen = 0;
    while seen < EVENT_BUDGET_PER_DEVICE {
        match open.device.fetch_events() {
            Ok(events) => {
                let before = seen;
                for event in events {
                    seen += 1;
                    handle(event.kind(), event.value());
                    if seen >= EVENT_BUDGET_PER_DEVICE {
                        break;
                    }
                }
                if seen == before {
                    break;
                }
            }
            Err(err)
                if err.kind() == std::io::ErrorKind::WouldBlock
                    || err.kind() == std::io::ErrorKind::Interrupted =>
            {
                break;
            }
            Err(err) => {
                warn!(path = %open.path.display(), error = %err, "device read failed");
                break;
            }
        }
    }
}

fn set_nonblocking(fd: RawFd) {
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        if flags >= 0 {
            libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_fires_once_per_hold() {
        let mut toggle = ToggleDetector::default();
        assert!(!toggle.update(false));
        assert!(toggle.update(true), "rising edge fires");
        for _ in 0..10 {
            assert!(!toggle.update(true), "held chord stays quiet");
        }
        assert!(!toggle.update(false), "release is silent");
        assert!(toggle.update(true), "next press fires again");
    }
}
