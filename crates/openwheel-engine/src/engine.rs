//! The wheel state engine and its physics thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{info, warn};

use hid_wheel_protocol::WheelReport;
use openwheel_errors::SetupError;

use crate::ffb::FfbReceiver;
use crate::hid::HidBackend;
use crate::physics::{FfbSnapshot, PhysicsParams, PhysicsState};
use crate::state::{FfbState, InputFrame, WheelState};

/// Interval of the physics thread's timed wait.
const PHYSICS_WAIT: Duration = Duration::from_millis(1);

pub(crate) struct EngineState {
    pub wheel: WheelState,
    pub ffb: FfbState,
    pub enabled: bool,
}

impl EngineState {
    fn snapshot(&self) -> FfbSnapshot {
        FfbSnapshot {
            force: self.ffb.force,
            autocenter: self.ffb.autocenter,
            gain: self.ffb.gain,
            offset: self.wheel.ffb_offset,
            velocity: self.wheel.ffb_velocity,
            steering: self.wheel.steering,
        }
    }
}

/// State mutex plus the physics thread's wakeup, shared with the FFB
/// receiver.
pub(crate) struct Shared {
    pub state: Mutex<EngineState>,
    pub physics_wakeup: Condvar,
}

/// Owns the authoritative wheel state, the FFB physics thread, and the HID
/// backend binding.
///
/// The engine starts disabled: frames are consumed but only neutral reports
/// reach the backend until [`WheelEngine::enable`] is called. Exclusive
/// device grabs belong to the input layer; the caller flips them alongside
/// enable/disable.
pub struct WheelEngine {
    shared: Arc<Shared>,
    backend: Arc<Mutex<Box<dyn HidBackend>>>,
    running: Arc<AtomicBool>,
    physics_thread: Option<thread::JoinHandle<()>>,
}

impl WheelEngine {
    /// Create an engine over the given backend with the configured FFB gain.
    pub fn new(backend: Box<dyn HidBackend>, ffb_gain: f32) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(EngineState {
                    wheel: WheelState::default(),
                    ffb: FfbState::new(ffb_gain),
                    enabled: false,
                }),
                physics_wakeup: Condvar::new(),
            }),
            backend: Arc::new(Mutex::new(backend)),
            running: Arc::new(AtomicBool::new(false)),
            physics_thread: None,
        }
    }

    /// Bind the backend, wire FFB delivery, and start the physics thread.
    pub fn start(&mut self) -> Result<(), SetupError> {
        {
            let mut backend = self.backend.lock();
            backend
                .initialize()
                .map_err(SetupError::BackendUnavailable)?;

            let receiver = FfbReceiver::new(self.shared.clone());
            backend.register_ffb_callback(Arc::new(move |packet| {
                receiver.handle_packet(packet);
            }));
        }

        self.running.store(true, Ordering::Release);
        let shared = self.shared.clone();
        let backend = self.backend.clone();
        let running = self.running.clone();
        let handle = thread::Builder::new()
            .name("ffb-physics".into())
            .spawn(move || physics_loop(shared, backend, running, PhysicsParams::default()))
            .map_err(|err| {
                SetupError::BackendUnavailable(openwheel_errors::DeviceError::io(
                    "ffb-physics thread",
                    err,
                ))
            })?;
        self.physics_thread = Some(handle);
        Ok(())
    }

    /// Whether emulation is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.shared.state.lock().enabled
    }

    /// Enter the enabled state. The caller has already grabbed the input
    /// devices.
    pub fn enable(&self) {
        self.shared.state.lock().enabled = true;
        info!("wheel emulation enabled");
    }

    /// Enter the disabled state and emit one neutral report.
    ///
    /// The report goes out under the state lock so no in-flight FFB report
    /// can land after it.
    pub fn disable(&self) {
        let mut state = self.shared.state.lock();
        state.enabled = false;
        state.wheel.throttle = 0.0;
        state.wheel.brake = 0.0;
        state.wheel.clutch = 0.0;
        state.wheel.buttons = [0; hid_wheel_protocol::BUTTON_COUNT];
        state.wheel.dpad_x = 0;
        state.wheel.dpad_y = 0;
        emit(&self.backend, &WheelReport::neutral());
        drop(state);
        info!("wheel emulation disabled");
    }

    /// Ingest one input frame.
    ///
    /// While disabled the frame's content is discarded and a neutral report
    /// keeps the host's view zeroed.
    pub fn process_frame(&self, frame: &InputFrame, sensitivity: i32) {
        let mut state = self.shared.state.lock();
        if !state.enabled {
            emit(&self.backend, &WheelReport::neutral());
            return;
        }
        state.wheel.accumulate_steering(frame.mouse_dx, sensitivity);
        state.wheel.throttle = frame.logical.throttle as u8 as f32;
        state.wheel.brake = frame.logical.brake as u8 as f32;
        state.wheel.clutch = frame.logical.clutch as u8 as f32;
        state.wheel.buttons = frame.logical.buttons;
        state.wheel.dpad_x = frame.dpad_x;
        state.wheel.dpad_y = frame.dpad_y;
        let report = state.wheel.report();
        emit(&self.backend, &report);
    }

    /// Copy of the current wheel state.
    pub fn wheel_state(&self) -> WheelState {
        self.shared.state.lock().wheel
    }

    /// Copy of the current FFB command state.
    pub fn ffb_state(&self) -> FfbState {
        self.shared.state.lock().ffb
    }

    /// Stop the physics thread, then release the backend.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);
        self.shared.physics_wakeup.notify_all();
        if let Some(handle) = self.physics_thread.take() {
            if handle.join().is_err() {
                warn!("physics thread panicked during shutdown");
            }
        }
        self.backend.lock().shutdown();
    }
}

/// Publish one report, absorbing transient failures; the next tick retries
/// naturally.
fn emit(backend: &Mutex<Box<dyn HidBackend>>, report: &WheelReport) {
    if let Err(err) = backend.lock().update(report) {
        if err.is_transient() {
            tracing::debug!(error = %err, "transient report failure, next tick retries");
        } else {
            warn!(error = %err, "failed to publish wheel report");
        }
    }
}

impl Drop for WheelEngine {
    fn drop(&mut self) {
        if self.physics_thread.is_some() {
            self.shutdown();
        }
    }
}

fn physics_loop(
    shared: Arc<Shared>,
    backend: Arc<Mutex<Box<dyn HidBackend>>>,
    running: Arc<AtomicBool>,
    params: PhysicsParams,
) {
    let mut physics = PhysicsState::new(params);
    let mut last = Instant::now();

    while running.load(Ordering::Acquire) {
        let snapshot = {
            let mut state = shared.state.lock();
            let _ = shared.physics_wakeup.wait_for(&mut state, PHYSICS_WAIT);
            if !running.load(Ordering::Acquire) {
                break;
            }
            state.snapshot()
        };

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        let (offset, velocity) = physics.step(&snapshot, dt);

        let mut state = shared.state.lock();
        state.wheel.ffb_offset = offset;
        state.wheel.ffb_velocity = velocity;
        let changed = state.wheel.apply_steering();
        if changed && state.enabled {
            let report = state.wheel.report();
            emit(&backend, &report);
        }
    }
}
