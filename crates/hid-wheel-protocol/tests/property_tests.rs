//! Property tests for the wheel wire codec.

use hid_wheel_protocol::{
    encode_input_report, parse_ffb_command, scaling, FfbCommand, WheelReport, BUTTON_COUNT,
    INPUT_REPORT_LEN,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Decoding any arbitrary byte sequence must never panic.
    #[test]
    fn prop_parse_never_panics(data in proptest::collection::vec(proptest::num::u8::ANY, 0..=32)) {
        let _ = parse_ffb_command(&data);
    }

    /// Every decoded constant force stays within the pre-shaping clamp.
    #[test]
    fn prop_constant_force_in_range(slot in proptest::num::u8::ANY, magnitude in proptest::num::u8::ANY) {
        if let Some(FfbCommand::ConstantForce { force }) =
            parse_ffb_command(&[0x11, slot, magnitude])
        {
            prop_assert!(force.unsigned_abs() <= scaling::FORCE_LIMIT as u16);
        } else {
            prop_assert!(false, "well-formed constant force packet must decode");
        }
    }

    /// Constant force is monotone decreasing in the raw magnitude byte.
    #[test]
    fn prop_constant_force_monotone(a in proptest::num::u8::ANY, b in proptest::num::u8::ANY) {
        let decoded = (
            parse_ffb_command(&[0x11, 0x08, a]),
            parse_ffb_command(&[0x11, 0x08, b]),
        );
        match decoded {
            (
                Some(FfbCommand::ConstantForce { force: fa }),
                Some(FfbCommand::ConstantForce { force: fb }),
            ) => {
                if a <= b {
                    prop_assert!(fa >= fb, "magnitude {} -> {} vs {} -> {}", a, fa, b, fb);
                }
            }
            other => prop_assert!(false, "expected constant forces, got {:?}", other),
        }
    }

    /// Autocenter strength is non-negative and proportional to the raw byte.
    #[test]
    fn prop_autocenter_strength_scaled(raw in proptest::num::u8::ANY) {
        match parse_ffb_command(&[0xFE, 0x0D, raw]) {
            Some(FfbCommand::SetAutocenter { strength }) => {
                prop_assert_eq!(strength, raw as i16 * scaling::AUTOCENTER_SCALE);
                prop_assert!(strength >= 0);
            }
            other => prop_assert!(false, "expected SetAutocenter, got {:?}", other),
        }
    }

    /// Report encoding never panics and always fills exactly 13 bytes.
    #[test]
    fn prop_encode_accepts_any_floats(
        steering in proptest::num::f32::ANY,
        throttle in proptest::num::f32::ANY,
        brake in proptest::num::f32::ANY,
        clutch in proptest::num::f32::ANY,
        dpad_x in -1i8..=1,
        dpad_y in -1i8..=1,
        pressed in proptest::collection::vec(proptest::bool::ANY, BUTTON_COUNT),
    ) {
        let mut buttons = [0u8; BUTTON_COUNT];
        for (slot, on) in pressed.iter().enumerate() {
            buttons[slot] = *on as u8;
        }
        let report = WheelReport {
            steering,
            throttle,
            brake,
            clutch,
            buttons,
            dpad_x,
            dpad_y,
        };
        let mut out = [0u8; INPUT_REPORT_LEN];
        let len = encode_input_report(&report, &mut out);
        prop_assert_eq!(len, INPUT_REPORT_LEN);

        // Only the low 25 bits of the button field may ever be set.
        let bits = u32::from_le_bytes([out[9], out[10], out[11], out[12]]);
        prop_assert_eq!(bits >> BUTTON_COUNT, 0);
    }

    /// Steering encoding is monotone over the valid range.
    #[test]
    fn prop_steering_monotone(a in -1.0f32..=1.0, b in -1.0f32..=1.0) {
        let mut report = WheelReport::neutral();
        let mut out_a = [0u8; INPUT_REPORT_LEN];
        let mut out_b = [0u8; INPUT_REPORT_LEN];
        report.steering = a;
        encode_input_report(&report, &mut out_a);
        report.steering = b;
        encode_input_report(&report, &mut out_b);
        let wa = u16::from_le_bytes([out_a[0], out_a[1]]);
        let wb = u16::from_le_bytes([out_b[0], out_b[1]]);
        if a <= b {
            prop_assert!(wa <= wb);
        }
    }
}

/// Repeated stop commands are idempotent at the decode layer.
#[test]
fn stop_decodes_identically_every_time() {
    for _ in 0..8 {
        assert_eq!(parse_ffb_command(&[0x13]), Some(FfbCommand::StopForce));
    }
}
