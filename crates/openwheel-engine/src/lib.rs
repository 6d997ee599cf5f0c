//! Wheel state engine: input capture, FFB physics, and virtual device emission.
//!
//! The engine turns a keyboard and a pointer into a force-feedback racing
//! wheel. Raw events drain through [`input::InputReader`] into per-tick
//! [`state::InputFrame`]s; the host's FFB command stream arrives through
//! [`ffb::FfbReceiver`]; and [`engine::WheelEngine`] owns the authoritative
//! [`state::WheelState`], runs the fixed-cadence spring–damper loop in
//! [`physics`], and publishes reports through a [`hid::HidBackend`].
//!
//! Concurrency model: one mutex over the whole engine state, a condvar for
//! the physics thread's 1 ms timed wait, and an atomic running flag. Every
//! critical section is a handful of arithmetic operations; the HID backend
//! is never called from the FFB delivery context.

#![deny(static_mut_refs)]

pub mod engine;
pub mod ffb;
pub mod hid;
pub mod input;
pub mod physics;
pub mod state;
pub mod testing;

pub use engine::WheelEngine;
pub use hid::{FfbCallback, HidBackend};
pub use physics::{FfbSnapshot, PhysicsParams, PhysicsState};
pub use state::{FfbState, InputFrame, LogicalControls, WheelState};
