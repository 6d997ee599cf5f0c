//! Virtual HID backend abstraction.
//!
//! Two kinds of backend implement the same contract with differing FFB wire
//! encodings (kernel uinput here; a user-space feeder would slot in the same
//! way). The canonical command codes decoded by `hid_wheel_protocol` are the
//! lingua franca: platform-specific translation lives entirely inside the
//! backend, behind [`HidBackend::register_ffb_callback`].

use std::sync::Arc;

use hid_wheel_protocol::WheelReport;
use openwheel_errors::DeviceResult;

#[cfg(target_os = "linux")]
pub mod uinput;

#[cfg(target_os = "linux")]
pub use uinput::UinputBackend;

/// Sink for canonical FFB packets, invoked on a backend-owned context.
///
/// The callback must never call back into the backend; on some transports
/// delivery is synchronous with writes and re-entry would deadlock.
pub type FfbCallback = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Contract the engine consumes for virtual-device emission.
pub trait HidBackend: Send {
    /// Bind the virtual device.
    fn initialize(&mut self) -> DeviceResult<()>;

    /// Publish a single input report. Idempotent for unchanged state;
    /// transient write failures are absorbed by the caller and retried
    /// naturally on the next tick.
    fn update(&mut self, report: &WheelReport) -> DeviceResult<()>;

    /// Register the sink for FFB packets.
    fn register_ffb_callback(&mut self, callback: FfbCallback);

    /// Release the device. Idempotent.
    fn shutdown(&mut self);
}
