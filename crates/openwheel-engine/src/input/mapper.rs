//! Per-tick translation of key state into logical wheel input.

use evdev::Key;

use hid_wheel_protocol::WheelButton;

use crate::input::InputReader;
use crate::state::{InputFrame, LogicalControls};

/// The configured key map driving pedals, D-pad, and button slots.
#[derive(Debug, Clone)]
pub struct WheelMapping {
    /// Key held for full throttle.
    pub throttle_key: u16,
    /// Key held for full brake.
    pub brake_key: u16,
    /// Key held for full clutch.
    pub clutch_key: u16,
    /// D-pad up key.
    pub dpad_up: u16,
    /// D-pad down key.
    pub dpad_down: u16,
    /// D-pad left key.
    pub dpad_left: u16,
    /// D-pad right key.
    pub dpad_right: u16,
    /// `(keyboard key, virtual button slot)` pairs.
    pub buttons: Vec<(u16, WheelButton)>,
}

impl Default for WheelMapping {
    fn default() -> Self {
        Self {
            throttle_key: Key::KEY_W.code(),
            brake_key: Key::KEY_S.code(),
            clutch_key: Key::KEY_A.code(),
            dpad_up: Key::KEY_UP.code(),
            dpad_down: Key::KEY_DOWN.code(),
            dpad_left: Key::KEY_LEFT.code(),
            dpad_right: Key::KEY_RIGHT.code(),
            buttons: vec![
                (Key::KEY_Q.code(), WheelButton::Trigger),
                (Key::KEY_E.code(), WheelButton::Thumb),
                (Key::KEY_F.code(), WheelButton::Thumb2),
                (Key::KEY_G.code(), WheelButton::Top),
                (Key::KEY_H.code(), WheelButton::Top2),
            ],
        }
    }
}

/// Derives one [`InputFrame`] per tick from the reader's key state.
pub struct InputMapper {
    mapping: WheelMapping,
}

impl InputMapper {
    /// Build a mapper over the configured map.
    pub fn new(mapping: WheelMapping) -> Self {
        Self { mapping }
    }

    /// Map the current tick.
    pub fn frame(&self, reader: &InputReader, mouse_dx: i32, toggle_pressed: bool) -> InputFrame {
        self.frame_from_keys(&|code| reader.key_held(code), mouse_dx, toggle_pressed)
    }

    /// Map from an arbitrary key-state lookup.
    pub fn frame_from_keys(
        &self,
        key_held: &dyn Fn(u16) -> bool,
        mouse_dx: i32,
        toggle_pressed: bool,
    ) -> InputFrame {
        let mapping = &self.mapping;

        let mut logical = LogicalControls {
            throttle: key_held(mapping.throttle_key),
            brake: key_held(mapping.brake_key),
            clutch: key_held(mapping.clutch_key),
            ..LogicalControls::default()
        };
        for (key, button) in &mapping.buttons {
            logical.buttons[button.index()] = key_held(*key) as u8;
        }

        // Opposing keys held together cancel to zero on that axis.
        let dpad_x = key_held(mapping.dpad_right) as i8 - key_held(mapping.dpad_left) as i8;
        let dpad_y = key_held(mapping.dpad_down) as i8 - key_held(mapping.dpad_up) as i8;

        InputFrame {
            mouse_dx,
            logical,
            dpad_x,
            dpad_y,
            toggle_pressed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn held(codes: &[Key]) -> HashSet<u16> {
        codes.iter().map(|k| k.code()).collect()
    }

    #[test]
    fn test_pedals_follow_configured_keys() {
        let mapper = InputMapper::new(WheelMapping::default());
        let keys = held(&[Key::KEY_W, Key::KEY_A]);
        let frame = mapper.frame_from_keys(&|code| keys.contains(&code), 0, false);
        assert!(frame.logical.throttle);
        assert!(!frame.logical.brake);
        assert!(frame.logical.clutch);
    }

    #[test]
    fn test_buttons_follow_mapping() {
        let mapper = InputMapper::new(WheelMapping::default());
        let keys = held(&[Key::KEY_Q]);
        let frame = mapper.frame_from_keys(&|code| keys.contains(&code), 0, false);
        assert_eq!(frame.logical.buttons[WheelButton::Trigger.index()], 1);
        assert_eq!(frame.logical.buttons[WheelButton::Thumb.index()], 0);
    }

    #[test]
    fn test_opposing_dpad_keys_cancel() {
        let mapper = InputMapper::new(WheelMapping::default());
        let keys = held(&[Key::KEY_LEFT, Key::KEY_RIGHT, Key::KEY_UP]);
        let frame = mapper.frame_from_keys(&|code| keys.contains(&code), 0, false);
        assert_eq!(frame.dpad_x, 0);
        assert_eq!(frame.dpad_y, -1);
    }

    #[test]
    fn test_mouse_delta_passes_through() {
        let mapper = InputMapper::new(WheelMapping::default());
        let frame = mapper.frame_from_keys(&|_| false, -37, true);
        assert_eq!(frame.mouse_dx, -37);
        assert!(frame.toggle_pressed);
    }
}
