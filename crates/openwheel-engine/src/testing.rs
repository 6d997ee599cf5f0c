//! Test support: an in-memory HID backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use hid_wheel_protocol::WheelReport;
use openwheel_errors::{DeviceError, DeviceResult};

use crate::hid::{FfbCallback, HidBackend};

struct RecordingShared {
    reports: Mutex<Vec<WheelReport>>,
    callback: Mutex<Option<FfbCallback>>,
    initialized: AtomicBool,
}

/// Backend that records every published report and lets tests inject FFB
/// packets as if the host had written them.
pub struct RecordingBackend {
    shared: Arc<RecordingShared>,
}

/// Test-side handle to a [`RecordingBackend`] that has been moved into an
/// engine.
#[derive(Clone)]
pub struct RecordingHandle {
    shared: Arc<RecordingShared>,
}

impl RecordingBackend {
    /// Create a backend and its observation handle.
    pub fn new() -> (Self, RecordingHandle) {
        let shared = Arc::new(RecordingShared {
            reports: Mutex::new(Vec::new()),
            callback: Mutex::new(None),
            initialized: AtomicBool::new(false),
        });
        (
            Self {
                shared: shared.clone(),
            },
            RecordingHandle { shared },
        )
    }
}

impl HidBackend for RecordingBackend {
    fn initialize(&mut self) -> DeviceResult<()> {
        self.shared.initialized.store(true, Ordering::Release);
        Ok(())
    }

    fn update(&mut self, report: &WheelReport) -> DeviceResult<()> {
        if !self.shared.initialized.load(Ordering::Acquire) {
            return Err(DeviceError::not_found("recording backend not initialized"));
        }
        self.shared.reports.lock().push(*report);
        Ok(())
    }

    fn register_ffb_callback(&mut self, callback: FfbCallback) {
        *self.shared.callback.lock() = Some(callback);
    }

    fn shutdown(&mut self) {
        self.shared.initialized.store(false, Ordering::Release);
    }
}

impl RecordingHandle {
    /// Every report published so far.
    pub fn reports(&self) -> Vec<WheelReport> {
        self.shared.reports.lock().clone()
    }

    /// The most recent report, if any.
    pub fn last_report(&self) -> Option<WheelReport> {
        self.shared.reports.lock().last().copied()
    }

    /// Number of reports published so far.
    pub fn report_count(&self) -> usize {
        self.shared.reports.lock().len()
    }

    /// Drop all recorded reports.
    pub fn clear_reports(&self) {
        self.shared.reports.lock().clear();
    }

    /// Deliver an FFB packet through the registered callback, mimicking the
    /// backend's foreign delivery context.
    pub fn inject_ffb(&self, packet: &[u8]) {
        let callback = self.shared.callback.lock().clone();
        if let Some(callback) = callback {
            callback(packet);
        }
    }
}
