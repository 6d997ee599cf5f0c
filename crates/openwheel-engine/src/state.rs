//! Authoritative wheel and FFB state.

use hid_wheel_protocol::{WheelReport, BUTTON_COUNT};

/// Lower bound of the logical steering range.
pub const STEERING_MIN: f32 = -32768.0;
/// Upper bound of the logical steering range.
pub const STEERING_MAX: f32 = 32767.0;
/// Largest user-steering change a single tick may apply.
pub const MAX_STEP_PER_TICK: f32 = 2000.0;
/// Fixed multiplier between pointer counts and steering units.
pub const STEERING_BASE_GAIN: f32 = 0.05;
/// Steering changes below this magnitude are not re-reported.
pub const STEERING_EPSILON: f32 = 0.1;

/// Pedal and button states derived from the configured key map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalControls {
    /// Throttle key held.
    pub throttle: bool,
    /// Brake key held.
    pub brake: bool,
    /// Clutch key held.
    pub clutch: bool,
    /// One entry per virtual button slot, 0 or 1.
    pub buttons: [u8; BUTTON_COUNT],
}

impl Default for LogicalControls {
    fn default() -> Self {
        Self {
            throttle: false,
            brake: false,
            clutch: false,
            buttons: [0; BUTTON_COUNT],
        }
    }
}

/// One tick's worth of mapped input.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputFrame {
    /// Horizontal pointer motion accumulated since the previous tick.
    pub mouse_dx: i32,
    /// Mapped pedals and buttons.
    pub logical: LogicalControls,
    /// D-pad horizontal sign: -1, 0, +1.
    pub dpad_x: i8,
    /// D-pad vertical sign: -1, 0, +1.
    pub dpad_y: i8,
    /// True exactly on the tick the enable/disable chord was pressed.
    pub toggle_pressed: bool,
}

/// The singleton wheel state, mutated only by the engine.
#[derive(Debug, Clone, Copy)]
pub struct WheelState {
    /// User-commanded wheel angle accumulator.
    pub user_steering: f32,
    /// Torque-driven physical displacement.
    pub ffb_offset: f32,
    /// Rate of change of `ffb_offset`, units per second.
    pub ffb_velocity: f32,
    /// The reported angle: `clamp(user_steering + ffb_offset)`.
    pub steering: f32,
    /// Throttle in [0, 1].
    pub throttle: f32,
    /// Brake in [0, 1].
    pub brake: f32,
    /// Clutch in [0, 1].
    pub clutch: f32,
    /// Button slots, 0 or 1 each.
    pub buttons: [u8; BUTTON_COUNT],
    /// D-pad horizontal sign.
    pub dpad_x: i8,
    /// D-pad vertical sign.
    pub dpad_y: i8,
}

impl Default for WheelState {
    fn default() -> Self {
        Self {
            user_steering: 0.0,
            ffb_offset: 0.0,
            ffb_velocity: 0.0,
            steering: 0.0,
            throttle: 0.0,
            brake: 0.0,
            clutch: 0.0,
            buttons: [0; BUTTON_COUNT],
            dpad_x: 0,
            dpad_y: 0,
        }
    }
}

impl WheelState {
    /// Recompute the reported steering from the accumulator and the FFB
    /// offset. Returns false when the change is below [`STEERING_EPSILON`]
    /// and the previous value was kept.
    pub fn apply_steering(&mut self) -> bool {
        let combined = (self.user_steering + self.ffb_offset).clamp(STEERING_MIN, STEERING_MAX);
        if (combined - self.steering).abs() < STEERING_EPSILON {
            return false;
        }
        self.steering = combined;
        true
    }

    /// Advance the user-steering accumulator by one pointer delta.
    ///
    /// The step is scaled by the configured sensitivity, clamped to
    /// [`MAX_STEP_PER_TICK`] so pointer jumps cannot teleport the wheel, and
    /// the accumulator saturates at the logical range.
    pub fn accumulate_steering(&mut self, mouse_dx: i32, sensitivity: i32) {
        let delta = (mouse_dx as f32 * sensitivity as f32 * STEERING_BASE_GAIN)
            .clamp(-MAX_STEP_PER_TICK, MAX_STEP_PER_TICK);
        if delta != 0.0 {
            self.user_steering = (self.user_steering + delta).clamp(STEERING_MIN, STEERING_MAX);
            self.apply_steering();
        }
    }

    /// Snapshot the current state as a normalized HID report.
    pub fn report(&self) -> WheelReport {
        WheelReport {
            steering: (self.steering / 32768.0).clamp(-1.0, 1.0),
            throttle: self.throttle,
            brake: self.brake,
            clutch: self.clutch,
            buttons: self.buttons,
            dpad_x: self.dpad_x,
            dpad_y: self.dpad_y,
        }
    }
}

/// FFB command state shared between the receiver and the physics loop.
#[derive(Debug, Clone, Copy)]
pub struct FfbState {
    /// Current commanded constant force, pre-shaping.
    pub force: i16,
    /// Autocenter spring strength, 0 = disabled.
    pub autocenter: i16,
    /// Global FFB gain, fixed at startup.
    pub gain: f32,
}

impl FfbState {
    /// Smallest accepted gain.
    pub const MIN_GAIN: f32 = 0.1;
    /// Largest accepted gain.
    pub const MAX_GAIN: f32 = 4.0;

    /// Create the startup FFB state with the configured gain.
    pub fn new(gain: f32) -> Self {
        Self {
            force: 0,
            autocenter: 0,
            gain: gain.clamp(Self::MIN_GAIN, Self::MAX_GAIN),
        }
    }
}

impl Default for FfbState {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulator_saturates() {
        let mut state = WheelState::default();
        for _ in 0..40 {
            state.accumulate_steering(-1000, 50);
        }
        assert_eq!(state.user_steering, STEERING_MIN);
        assert_eq!(state.steering, STEERING_MIN);

        // Stays pinned under further input.
        state.accumulate_steering(-1000, 50);
        assert_eq!(state.user_steering, STEERING_MIN);
    }

    #[test]
    fn test_per_tick_step_clamped() {
        let mut state = WheelState::default();
        state.accumulate_steering(100_000, 100);
        assert_eq!(state.user_steering, MAX_STEP_PER_TICK);
    }

    #[test]
    fn test_steering_composition_clamped() {
        let mut state = WheelState {
            user_steering: 30000.0,
            ffb_offset: 22000.0,
            ..WheelState::default()
        };
        assert!(state.apply_steering());
        assert_eq!(state.steering, STEERING_MAX);
    }

    #[test]
    fn test_tiny_change_is_noop() {
        let mut state = WheelState::default();
        state.user_steering = 100.0;
        assert!(state.apply_steering());
        state.user_steering = 100.05;
        assert!(!state.apply_steering());
        assert_eq!(state.steering, 100.0);
    }

    #[test]
    fn test_gain_clamped_once_at_construction() {
        assert_eq!(FfbState::new(0.0).gain, FfbState::MIN_GAIN);
        assert_eq!(FfbState::new(9.0).gain, FfbState::MAX_GAIN);
        assert_eq!(FfbState::new(1.5).gain, 1.5);
    }

    #[test]
    fn test_report_normalizes_steering() {
        let mut state = WheelState::default();
        state.user_steering = STEERING_MIN;
        state.apply_steering();
        let report = state.report();
        assert_eq!(report.steering, -1.0);
    }
}
