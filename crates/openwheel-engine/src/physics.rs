//! FFB torque shaping and spring–damper integration.
//!
//! The pipeline per physics iteration: shape the commanded force, low-pass
//! it, add the autocenter spring, then chase the resulting target offset
//! with a semi-implicit Euler spring–damper. The low-pass keeps the host's
//! abrupt force edits from rattling the reported axis; the spring–damper
//! gives a settling feel instead of teleportation; and the offset limit
//! stays below the steering range so the user can always countersteer.
//!
//! Everything here is pure in `(snapshot, dt)` so the test suite can drive
//! it with deterministic time steps. The constants are empirical tunables,
//! not invariants.

/// Tunable constants of the FFB physics pipeline.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsParams {
    /// Force magnitudes below this blend linearly toward zero.
    pub deadzone: f32,
    /// Force magnitude where the heavy-force gain ramp begins.
    pub slip_knee: f32,
    /// Force magnitude treated as full scale by the shaping curve.
    pub slip_full: f32,
    /// Gain floor of the shaping curve.
    pub min_gain: f32,
    /// Overall boost applied after shaping.
    pub boost: f32,
    /// Low-pass corner frequency in Hz.
    pub filter_hz: f32,
    /// Spring stiffness of the offset integrator.
    pub stiffness: f32,
    /// Exponential damping rate of the offset integrator.
    pub damping: f32,
    /// Hard wall for the FFB offset, in steering units.
    pub offset_limit: f32,
    /// Velocity clamp, units per second.
    pub max_velocity: f32,
    /// Shortest accepted integration step, seconds.
    pub min_dt: f32,
    /// Longest accepted integration step, seconds.
    pub max_dt: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            deadzone: 80.0,
            slip_knee: 4000.0,
            slip_full: 14000.0,
            min_gain: 0.25,
            boost: 3.0,
            filter_hz: 38.0,
            stiffness: 120.0,
            damping: 8.0,
            offset_limit: 22000.0,
            max_velocity: 90000.0,
            min_dt: 0.001,
            max_dt: 0.010,
        }
    }
}

/// Snapshot of the shared state a physics iteration works from.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfbSnapshot {
    /// Commanded constant force, pre-shaping.
    pub force: i16,
    /// Autocenter spring strength, 0 = disabled.
    pub autocenter: i16,
    /// Global FFB gain.
    pub gain: f32,
    /// Current FFB offset.
    pub offset: f32,
    /// Current offset velocity.
    pub velocity: f32,
    /// Current reported steering.
    pub steering: f32,
}

/// Shape a raw commanded force into output torque.
///
/// Small forces blend linearly through the dead zone; above it the gain
/// rises quadratically with slip until the knee, then linearly to full
/// scale, and the whole curve is boosted.
pub fn shape_torque(raw: f32, params: &PhysicsParams) -> f32 {
    let magnitude = raw.abs();
    if magnitude < params.deadzone {
        return raw * (magnitude / params.deadzone);
    }

    let t = ((magnitude - params.deadzone) / (params.slip_full - params.deadzone)).clamp(0.0, 1.0);
    let slip_weight = t * t;

    let gain = if magnitude > params.slip_knee {
        let heavy =
            ((magnitude - params.slip_knee) / (params.slip_full - params.slip_knee)).clamp(0.0, 1.0);
        params.min_gain + (1.0 - params.min_gain) * heavy
    } else {
        params.min_gain + slip_weight * (1.0 - params.min_gain)
    };

    raw * gain * params.boost
}

/// Loop-local integrator state of the physics thread.
#[derive(Debug, Clone)]
pub struct PhysicsState {
    params: PhysicsParams,
    filtered: f32,
}

impl PhysicsState {
    /// Create a fresh integrator.
    pub fn new(params: PhysicsParams) -> Self {
        Self {
            params,
            filtered: 0.0,
        }
    }

    /// Run one physics iteration and return the new `(offset, velocity)`.
    ///
    /// `dt` is clamped to the configured window so long pauses cannot blow
    /// up the integrator.
    pub fn step(&mut self, snapshot: &FfbSnapshot, dt: f32) -> (f32, f32) {
        let params = &self.params;
        let dt = dt.clamp(params.min_dt, params.max_dt);

        let shaped = shape_torque(snapshot.force as f32, params);

        let alpha = (1.0 - (-dt * params.filter_hz).exp()).clamp(0.0, 1.0);
        self.filtered += (shaped - self.filtered) * alpha;

        let spring = if snapshot.autocenter > 0 {
            -(snapshot.steering * snapshot.autocenter as f32) / 32768.0
        } else {
            0.0
        };

        let target = ((self.filtered + spring) * snapshot.gain)
            .clamp(-params.offset_limit, params.offset_limit);

        let mut velocity = snapshot.velocity;
        let mut offset = snapshot.offset;

        let error = target - offset;
        velocity += error * params.stiffness * dt;
        velocity *= (-params.damping * dt).exp();
        velocity = velocity.clamp(-params.max_velocity, params.max_velocity);

        offset += velocity * dt;
        if offset >= params.offset_limit {
            offset = params.offset_limit;
            velocity = 0.0;
        } else if offset <= -params.offset_limit {
            offset = -params.offset_limit;
            velocity = 0.0;
        }

        (offset, velocity)
    }

    /// The tunables this integrator was built with.
    pub fn params(&self) -> &PhysicsParams {
        &self.params
    }
}
