//! End-to-end scenarios through the engine with a recording backend.
//!
//! FFB traffic is left at zero in the steering scenarios so the physics
//! thread has nothing to report and the recorded stream stays
//! deterministic.

use hid_wheel_protocol::WheelButton;
use openwheel_engine::state::{LogicalControls, STEERING_MIN};
use openwheel_engine::testing::{RecordingBackend, RecordingHandle};
use openwheel_engine::{InputFrame, WheelEngine};

fn started_engine() -> (WheelEngine, RecordingHandle) {
    let (backend, handle) = RecordingBackend::new();
    let mut engine = WheelEngine::new(Box::new(backend), 1.0);
    engine.start().expect("recording backend always starts");
    (engine, handle)
}

fn steering_frame(mouse_dx: i32) -> InputFrame {
    InputFrame {
        mouse_dx,
        ..InputFrame::default()
    }
}

#[test]
fn hard_left_saturates_and_holds() {
    let (mut engine, handle) = started_engine();
    engine.enable();

    for _ in 0..40 {
        engine.process_frame(&steering_frame(-1000), 50);
    }
    let state = engine.wheel_state();
    assert_eq!(state.user_steering, STEERING_MIN, "accumulator saturates");

    for _ in 0..200 {
        engine.process_frame(&steering_frame(0), 50);
    }
    let state = engine.wheel_state();
    assert_eq!(state.user_steering, STEERING_MIN, "stays pinned with no input");
    assert_eq!(state.steering, state.user_steering, "no FFB, reported = user");

    let last = handle.last_report().expect("frames were reported");
    assert_eq!(last.steering, -1.0);

    engine.shutdown();
}

#[test]
fn button_mapping_reaches_reports_in_order() {
    let (mut engine, handle) = started_engine();
    engine.enable();
    handle.clear_reports();

    // Press Q (mapped to TRIGGER), then also E (mapped to THUMB).
    let mut logical = LogicalControls::default();
    logical.buttons[WheelButton::Trigger.index()] = 1;
    engine.process_frame(
        &InputFrame {
            logical,
            ..InputFrame::default()
        },
        50,
    );

    logical.buttons[WheelButton::Thumb.index()] = 1;
    engine.process_frame(
        &InputFrame {
            logical,
            ..InputFrame::default()
        },
        50,
    );

    let reports = handle.reports();
    assert!(reports.len() >= 2);
    assert_eq!(reports[0].buttons[WheelButton::Trigger.index()], 1);
    assert_eq!(reports[0].buttons[WheelButton::Thumb.index()], 0);
    assert_eq!(reports[1].buttons[WheelButton::Trigger.index()], 1);
    assert_eq!(reports[1].buttons[WheelButton::Thumb.index()], 1);

    engine.shutdown();
}

#[test]
fn disable_emits_neutral_report() {
    let (mut engine, handle) = started_engine();
    engine.enable();

    let mut logical = LogicalControls::default();
    logical.throttle = true;
    logical.buttons[WheelButton::Top.index()] = 1;
    engine.process_frame(
        &InputFrame {
            mouse_dx: 500,
            logical,
            ..InputFrame::default()
        },
        50,
    );
    let busy = handle.last_report().expect("enabled frame reported");
    assert!(busy.throttle > 0.0);

    engine.disable();
    let neutral = handle.last_report().expect("disable emits a report");
    assert_eq!(neutral.steering, 0.0);
    assert_eq!(neutral.throttle, 0.0);
    assert_eq!(neutral.brake, 0.0);
    assert_eq!(neutral.clutch, 0.0);
    assert!(neutral.buttons.iter().all(|b| *b == 0));
    assert_eq!(neutral.dpad_x, 0);
    assert_eq!(neutral.dpad_y, 0);

    // While disabled, frames keep the host's view zeroed.
    engine.process_frame(
        &InputFrame {
            mouse_dx: 500,
            logical,
            ..InputFrame::default()
        },
        50,
    );
    let still_neutral = handle.last_report().expect("disabled frame reported");
    assert_eq!(still_neutral.throttle, 0.0);
    assert!(still_neutral.buttons.iter().all(|b| *b == 0));

    engine.shutdown();
}

#[test]
fn stop_command_is_idempotent() {
    let (mut engine, handle) = started_engine();

    handle.inject_ffb(&[0x11, 0x08, 0x00]);
    assert_eq!(engine.ffb_state().force, 6144);

    handle.inject_ffb(&[0xFE, 0x0D, 0x20]);
    let before = engine.ffb_state();

    for _ in 0..5 {
        handle.inject_ffb(&[0x13]);
        let state = engine.ffb_state();
        assert_eq!(state.force, 0);
        assert_eq!(state.autocenter, before.autocenter, "stop leaves autocenter alone");
        assert_eq!(state.gain, before.gain, "stop leaves gain alone");
    }

    engine.shutdown();
}

#[test]
fn autocenter_round_trip() {
    let (mut engine, handle) = started_engine();

    handle.inject_ffb(&[0xFE, 0x0D, 0x40]);
    assert_eq!(engine.ffb_state().autocenter, 1024);

    handle.inject_ffb(&[0xF5]);
    assert_eq!(engine.ffb_state().autocenter, 0);

    // Re-enabling from zero applies the default strength.
    handle.inject_ffb(&[0x14]);
    assert_eq!(engine.ffb_state().autocenter, 1024);

    // With a configured strength in place, the default command is a no-op.
    handle.inject_ffb(&[0xFE, 0x0D, 0x20]);
    assert_eq!(engine.ffb_state().autocenter, 512);
    handle.inject_ffb(&[0x14]);
    assert_eq!(engine.ffb_state().autocenter, 512);

    engine.shutdown();
}

#[test]
fn malformed_packets_leave_state_untouched() {
    let (mut engine, handle) = started_engine();

    handle.inject_ffb(&[0x11, 0x08, 0x10]);
    let before = engine.ffb_state();

    handle.inject_ffb(&[]);
    handle.inject_ffb(&[0x11]);
    handle.inject_ffb(&[0xFE, 0x0C, 0x99]);
    handle.inject_ffb(&[0xAB, 0xCD]);

    let after = engine.ffb_state();
    assert_eq!(after.force, before.force);
    assert_eq!(after.autocenter, before.autocenter);

    engine.shutdown();
}

#[test]
fn gain_is_fixed_at_startup() {
    let (backend, handle) = RecordingBackend::new();
    let mut engine = WheelEngine::new(Box::new(backend), 2.5);
    engine.start().expect("recording backend always starts");

    assert_eq!(engine.ffb_state().gain, 2.5);
    handle.inject_ffb(&[0x11, 0x08, 0xFF]);
    handle.inject_ffb(&[0x13]);
    handle.inject_ffb(&[0x14]);
    assert_eq!(engine.ffb_state().gain, 2.5, "no command changes the gain");

    engine.shutdown();
}
