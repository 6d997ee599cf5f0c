//! Kernel uinput backend.
//!
//! Creates a virtual G29-class joystick through `/dev/uinput` and renders
//! the kernel's force-feedback traffic (constant-effect upload/play/stop,
//! autocenter, gain) into the canonical command packets the engine's parser
//! understands. A backend-owned reader thread polls the uinput fd so FFB
//! delivery never blocks report emission.

use std::collections::BTreeSet;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use evdev::uinput::{UInputEvent, VirtualDevice, VirtualDeviceBuilder};
use evdev::{
    AbsInfo, AbsoluteAxisType, AttributeSet, BusType, EventType, FFEffectKind, FFEffectType,
    InputEvent, InputEventKind, InputId, Key, UInputEventType, UinputAbsSetup,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use hid_wheel_protocol::{
    commands, encode_input_report, WheelButton, WheelReport, WHEEL_PRODUCT_ID, WHEEL_VENDOR_ID,
    BUTTON_COUNT, INPUT_REPORT_LEN,
};
use openwheel_errors::{DeviceError, DeviceResult};

use super::{FfbCallback, HidBackend};

const DEVICE_NAME: &str = "OpenWheel Racing Wheel";
const MAX_EFFECTS: usize = 16;
const CANONICAL_PACKET_LEN: usize = 7;
const FFB_POLL_INTERVAL_MS: i32 = 100;

/// EV_FF codes carrying device-global parameters rather than effect ids.
const FF_GAIN_CODE: u16 = 0x60;
const FF_AUTOCENTER_CODE: u16 = 0x61;

struct Inner {
    device: Mutex<VirtualDevice>,
    fd: RawFd,
}

/// Virtual wheel bound through kernel uinput.
pub struct UinputBackend {
    inner: Option<Arc<Inner>>,
    callback: Option<FfbCallback>,
    reader: Option<thread::JoinHandle<()>>,
    running: Arc<AtomicBool>,
    last_report: Option<WheelReport>,
}

impl UinputBackend {
    /// Create an unbound backend; [`HidBackend::initialize`] performs the
    /// privileged work.
    pub fn new() -> Self {
        Self {
            inner: None,
            callback: None,
            reader: None,
            running: Arc::new(AtomicBool::new(false)),
            last_report: None,
        }
    }

    fn build_device() -> std::io::Result<VirtualDevice> {
        let mut keys = AttributeSet::<Key>::new();
        for button in WheelButton::ALL {
            keys.insert(button_key(button));
        }

        let steering = UinputAbsSetup::new(
            AbsoluteAxisType::ABS_X,
            AbsInfo::new(0x8000, 0, 65535, 16, 128, 0),
        );
        let pedal = |axis| UinputAbsSetup::new(axis, AbsInfo::new(65535, 0, 65535, 0, 0, 0));
        let hat = |axis| UinputAbsSetup::new(axis, AbsInfo::new(0, -1, 1, 0, 0, 0));

        VirtualDeviceBuilder::new()?
            .name(DEVICE_NAME)
            .input_id(InputId::new(
                BusType::BUS_USB,
                WHEEL_VENDOR_ID,
                WHEEL_PRODUCT_ID,
                0x0111,
            ))
            .with_keys(&keys)?
            .with_absolute_axis(&steering)?
            .with_absolute_axis(&pedal(AbsoluteAxisType::ABS_Y))?
            .with_absolute_axis(&pedal(AbsoluteAxisType::ABS_Z))?
            .with_absolute_axis(&pedal(AbsoluteAxisType::ABS_RZ))?
            .with_absolute_axis(&hat(AbsoluteAxisType::ABS_HAT0X))?
            .with_absolute_axis(&hat(AbsoluteAxisType::ABS_HAT0Y))?
            .with_ff(&AttributeSet::from_iter([
                FFEffectType::FF_CONSTANT,
                FFEffectType::FF_AUTOCENTER,
                FFEffectType::FF_GAIN,
            ]))?
            .with_ff_effects_max(MAX_EFFECTS as u32)
            .build()
    }

    fn spawn_reader(&mut self) {
        let (Some(inner), Some(callback)) = (self.inner.clone(), self.callback.clone()) else {
            return;
        };
        if self.reader.is_some() {
            return;
        }
        self.running.store(true, Ordering::Release);
        let running = self.running.clone();
        match thread::Builder::new()
            .name("uinput-ffb".into())
            .spawn(move || ffb_reader(inner, callback, running))
        {
            Ok(handle) => self.reader = Some(handle),
            Err(err) => warn!(error = %err, "failed to start FFB reader thread"),
        }
    }
}

impl Default for UinputBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HidBackend for UinputBackend {
    fn initialize(&mut self) -> DeviceResult<()> {
        if self.inner.is_some() {
            return Ok(());
        }
        let device = Self::build_device().map_err(|err| {
            if err.kind() == std::io::ErrorKind::PermissionDenied {
                DeviceError::permission_denied("/dev/uinput")
            } else {
                DeviceError::open("/dev/uinput", err)
            }
        })?;

        let fd = device.as_raw_fd();
        set_nonblocking(fd);

        info!(name = DEVICE_NAME, "virtual wheel created");
        self.inner = Some(Arc::new(Inner {
            device: Mutex::new(device),
            fd,
        }));
        self.spawn_reader();
        Ok(())
    }

    fn update(&mut self, report: &WheelReport) -> DeviceResult<()> {
        let inner = self
            .inner
            .as_ref()
            .ok_or_else(|| DeviceError::not_found("virtual wheel not initialized"))?;

        if self.last_report.as_ref() == Some(report) {
            return Ok(());
        }

        // Render through the wire encoder so uinput and the report
        // descriptor agree on scaling.
        let mut wire = [0u8; INPUT_REPORT_LEN];
        encode_input_report(report, &mut wire);
        let steering = u16::from_le_bytes([wire[0], wire[1]]) as i32;
        let clutch = u16::from_le_bytes([wire[2], wire[3]]) as i32;
        let throttle = u16::from_le_bytes([wire[4], wire[5]]) as i32;
        let brake = u16::from_le_bytes([wire[6], wire[7]]) as i32;
        let bits = u32::from_le_bytes([wire[9], wire[10], wire[11], wire[12]]);

        let mut events = Vec::with_capacity(BUTTON_COUNT + 6);
        let abs = EventType::ABSOLUTE;
        events.push(InputEvent::new(abs, AbsoluteAxisType::ABS_X.0, steering));
        events.push(InputEvent::new(abs, AbsoluteAxisType::ABS_Y.0, clutch));
        events.push(InputEvent::new(abs, AbsoluteAxisType::ABS_Z.0, throttle));
        events.push(InputEvent::new(abs, AbsoluteAxisType::ABS_RZ.0, brake));
        events.push(InputEvent::new(
            abs,
            AbsoluteAxisType::ABS_HAT0X.0,
            report.dpad_x as i32,
        ));
        events.push(InputEvent::new(
            abs,
            AbsoluteAxisType::ABS_HAT0Y.0,
            report.dpad_y as i32,
        ));
        for (slot, button) in WheelButton::ALL.iter().enumerate() {
            events.push(InputEvent::new(
                EventType::KEY,
                button_key(*button).code(),
                ((bits >> slot) & 1) as i32,
            ));
        }

        inner
            .device
            .lock()
            .emit(&events)
            .map_err(|err| DeviceError::io("uinput", err))?;
        self.last_report = Some(*report);
        Ok(())
    }

    fn register_ffb_callback(&mut self, callback: FfbCallback) {
        self.callback = Some(callback);
        self.spawn_reader();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
        if self.inner.take().is_some() {
            info!("virtual wheel released");
        }
        self.last_report = None;
    }
}

impl Drop for UinputBackend {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Translation state of the FFB reader thread.
struct EffectTranslator {
    free_ids: BTreeSet<u16>,
    /// Most recently uploaded constant-force level.
    level: i16,
    playing: bool,
}

impl EffectTranslator {
    fn new() -> Self {
        Self {
            free_ids: (0..MAX_EFFECTS as u16).collect(),
            level: 0,
            playing: false,
        }
    }

    fn constant_packet(&self) -> [u8; CANONICAL_PACKET_LEN] {
        // Same scaling as the kernel lg4ff driver: signed level to an
        // unsigned magnitude byte centered on 0x80.
        let magnitude = ((self.level as i32 + 0x8000) >> 8) as u8;
        [
            commands::CONSTANT_FORCE,
            0x08,
            magnitude,
            0x80,
            0x00,
            0x00,
            0x00,
        ]
    }
}

fn stop_packet() -> [u8; CANONICAL_PACKET_LEN] {
    [commands::STOP_FORCE, 0, 0, 0, 0, 0, 0]
}

fn autocenter_packet(value: i32) -> [u8; CANONICAL_PACKET_LEN] {
    if value <= 0 {
        return [commands::DISABLE_AUTOCENTER, 0, 0, 0, 0, 0, 0];
    }
    let strength = (value.clamp(0, 0xFFFF) >> 8) as u8;
    [
        commands::SET_AUTOCENTER,
        commands::SET_AUTOCENTER_SPRING,
        strength,
        strength,
        0x00,
        0x00,
        0x00,
    ]
}

fn ffb_reader(inner: Arc<Inner>, callback: FfbCallback, running: Arc<AtomicBool>) {
    let mut translator = EffectTranslator::new();

    while running.load(Ordering::Acquire) {
        if !wait_readable(inner.fd, FFB_POLL_INTERVAL_MS) {
            continue;
        }

        let mut packets: Vec<[u8; CANONICAL_PACKET_LEN]> = Vec::new();
        {
            let mut device = inner.device.lock();
            let events: Vec<UInputEvent> = match device.fetch_events() {
                Ok(events) => events.collect(),
                Err(err)
                    if err.kind() == std::io::ErrorKind::WouldBlock
                        || err.kind() == std::io::ErrorKind::Interrupted =>
                {
                    continue
                }
                Err(err) => {
                    warn!(error = %err, "FFB event read failed");
                    continue;
                }
            };

            for event in events {
                if let Err(err) = translate_event(&mut device, event, &mut translator, &mut packets)
                {
                    warn!(error = %err, "FFB event handling failed");
                }
            }
        }

        for packet in &packets {
            callback(packet);
        }
    }
}

fn ff_error_to_io(err: evdev::Error) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err)
}

fn translate_event(
    device: &mut VirtualDevice,
    event: UInputEvent,
    translator: &mut EffectTranslator,
    packets: &mut Vec<[u8; CANONICAL_PACKET_LEN]>,
) -> std::io::Result<()> {
    match event.kind() {
        InputEventKind::UInput(code) if code == UInputEventType::UI_FF_UPLOAD.0 => {
            let mut upload = device.process_ff_upload(event).map_err(ff_error_to_io)?;
            if let FFEffectKind::Constant { level, .. } = upload.effect().kind {
                translator.level = level;
                if translator.playing {
                    packets.push(translator.constant_packet());
                }
            } else {
                // Only constant force maps onto the canonical set; other
                // effect types are accepted as no-ops.
                debug!("accepting unsupported effect type as a no-op");
            }
            match translator.free_ids.iter().next().copied() {
                Some(id) => {
                    translator.free_ids.remove(&id);
                    upload.set_effect_id(id as i16);
                    upload.set_retval(0);
                }
                None => upload.set_retval(-1),
            }
        }
        InputEventKind::UInput(code) if code == UInputEventType::UI_FF_ERASE.0 => {
            let erase = device.process_ff_erase(event).map_err(ff_error_to_io)?;
            translator.free_ids.insert(erase.effect_id() as u16);
        }
        InputEventKind::ForceFeedback(code) if code == FF_AUTOCENTER_CODE => {
            packets.push(autocenter_packet(event.value()));
        }
        InputEventKind::ForceFeedback(code) if code == FF_GAIN_CODE => {
            // Global gain is fixed from configuration; the host's request is
            // acknowledged by the kernel and intentionally not rendered.
            debug!(value = event.value(), "ignoring host FF_GAIN request");
        }
        InputEventKind::ForceFeedback(_effect_id) => {
            if event.value() != 0 {
                translator.playing = true;
                packets.push(translator.constant_packet());
            } else {
                translator.playing = false;
                packets.push(stop_packet());
            }
        }
        _ => {}
    }
    Ok(())
}

fn button_key(button: WheelButton) -> Key {
    match button {
        WheelButton::Trigger => Key::BTN_TRIGGER,
        WheelButton::Thumb => Key::BTN_THUMB,
        WheelButton::Thumb2 => Key::BTN_THUMB2,
        WheelButton::Top => Key::BTN_TOP,
        WheelButton::Top2 => Key::BTN_TOP2,
        WheelButton::Pinkie => Key::BTN_PINKIE,
        WheelButton::Base => Key::BTN_BASE,
        WheelButton::Base2 => Key::BTN_BASE2,
        WheelButton::Base3 => Key::BTN_BASE3,
        WheelButton::Base4 => Key::BTN_BASE4,
        WheelButton::Base5 => Key::BTN_BASE5,
        WheelButton::Base6 => Key::BTN_BASE6,
        WheelButton::Dead => Key::BTN_DEAD,
        WheelButton::TriggerHappy1 => Key::BTN_TRIGGER_HAPPY1,
        WheelButton::TriggerHappy2 => Key::BTN_TRIGGER_HAPPY2,
        WheelButton::TriggerHappy3 => Key::BTN_TRIGGER_HAPPY3,
        WheelButton::TriggerHappy4 => Key::BTN_TRIGGER_HAPPY4,
        WheelButton::TriggerHappy5 => Key::BTN_TRIGGER_HAPPY5,
        WheelButton::TriggerHappy6 => Key::BTN_TRIGGER_HAPPY6,
        WheelButton::TriggerHappy7 => Key::BTN_TRIGGER_HAPPY7,
        WheelButton::TriggerHappy8 => Key::BTN_TRIGGER_HAPPY8,
        WheelButton::TriggerHappy9 => Key::BTN_TRIGGER_HAPPY9,
        WheelButton::TriggerHappy10 => Key::BTN_TRIGGER_HAPPY10,
        WheelButton::TriggerHappy11 => Key::BTN_TRIGGER_HAPPY11,
        WheelButton::TriggerHappy12 => Key::BTN_TRIGGER_HAPPY12,
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

fn wait_readable(fd: RawFd, timeout_ms: i32) -> bool {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let ret = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
    ret > 0 && (pfd.revents & libc::POLLIN) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_level_scaling_matches_parser() {
        let mut translator = EffectTranslator::new();

        translator.level = 0;
        assert_eq!(translator.constant_packet()[2], 0x80);

        translator.level = i16::MAX;
        assert_eq!(translator.constant_packet()[2], 0xFF);

        translator.level = i16::MIN;
        assert_eq!(translator.constant_packet()[2], 0x00);
    }

    #[test]
    fn test_autocenter_packet_scaling() {
        assert_eq!(autocenter_packet(0)[0], commands::DISABLE_AUTOCENTER);
        let full = autocenter_packet(0xFFFF);
        assert_eq!(full[0], commands::SET_AUTOCENTER);
        assert_eq!(full[1], commands::SET_AUTOCENTER_SPRING);
        assert_eq!(full[2], 0xFF);
        let half = autocenter_packet(0x8000);
        assert_eq!(half[2], 0x80);
    }

    #[test]
    fn test_stop_packet_shape() {
        assert_eq!(stop_packet()[0], commands::STOP_FORCE);
    }
}
