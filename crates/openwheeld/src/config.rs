//! INI configuration loading and rewriting.
//!
//! Search order: the user config (`~/.config/openwheel.conf`) wins over the
//! system config (`/etc/openwheel.conf`); when neither exists a commented
//! default file is written to the user path and built-in defaults are used
//! for the run. Configuration problems never abort startup: one warning,
//! default substituted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use evdev::Key;
use tracing::{info, warn};

use hid_wheel_protocol::WheelButton;
use openwheel_engine::input::WheelMapping;
use openwheel_errors::ConfigError;

/// System-wide config path, consulted after the user config.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/openwheel.conf";

const USER_CONFIG_RELATIVE: &str = ".config/openwheel.conf";

const DEFAULT_SENSITIVITY: i32 = 50;
const DEFAULT_FFB_GAIN: f32 = 1.0;

/// Runtime configuration of the daemon.
#[derive(Debug, Clone)]
pub struct Config {
    /// Explicit keyboard device path; `None` means auto-discover.
    pub keyboard: Option<PathBuf>,
    /// Explicit pointer device path; `None` means auto-discover.
    pub mouse: Option<PathBuf>,
    /// Steering sensitivity in 1..=100.
    pub sensitivity: i32,
    /// Global FFB gain in 0.1..=4.0, fixed for the run.
    pub ffb_gain: f32,
    /// Key map for pedals, D-pad, and button slots.
    pub mapping: WheelMapping,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keyboard: None,
            mouse: None,
            sensitivity: DEFAULT_SENSITIVITY,
            ffb_gain: DEFAULT_FFB_GAIN,
            mapping: WheelMapping::default(),
        }
    }
}

impl Config {
    /// Load configuration following the search order, or from an explicit
    /// path when given.
    pub fn load(explicit: Option<&Path>) -> Config {
        if let Some(path) = explicit {
            return match fs::read_to_string(path) {
                Ok(content) => {
                    info!(path = %path.display(), "loaded config");
                    Config::parse(&content)
                }
                Err(err) => {
                    warn!(error = %ConfigError::Read {
                        path: path.display().to_string(),
                        source: err,
                    }, "using built-in defaults");
                    Config::default()
                }
            };
        }

        for path in [user_config_path(), Some(PathBuf::from(SYSTEM_CONFIG_PATH))]
            .into_iter()
            .flatten()
        {
            if let Ok(content) = fs::read_to_string(&path) {
                info!(path = %path.display(), "loaded config");
                return Config::parse(&content);
            }
        }

        info!("no config found, writing defaults");
        if let Some(path) = user_config_path() {
            if let Err(err) = write_default(&path) {
                warn!(error = %err, "could not write default config");
            } else {
                info!(path = %path.display(), "default config written");
            }
        }
        Config::default()
    }

    /// Parse INI content. Unknown or malformed entries warn and fall back
    /// to defaults; they never fail the load.
    pub fn parse(content: &str) -> Config {
        let mut config = Config::default();
        let mut mapped_buttons: Vec<(u16, WheelButton)> = Vec::new();
        let mut section = String::new();

        for (index, raw_line) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                section = line[1..line.len() - 1].trim().to_lowercase();
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match section.as_str() {
                "devices" => match key {
                    "keyboard" => config.keyboard = non_empty_path(value),
                    "mouse" => config.mouse = non_empty_path(value),
                    _ => warn!(key, line = line_no, "unknown devices entry"),
                },
                "sensitivity" => {
                    if key == "sensitivity" {
                        match value.parse::<i32>() {
                            Ok(parsed) => config.sensitivity = parsed.clamp(1, 100),
                            Err(_) => warn!(
                                error = %ConfigError::invalid_value(key, value, line_no),
                                "keeping default sensitivity"
                            ),
                        }
                    }
                }
                "ffb" => {
                    if key == "gain" {
                        match value.parse::<f32>() {
                            Ok(parsed) if parsed.is_finite() => {
                                config.ffb_gain = parsed.clamp(0.1, 4.0)
                            }
                            _ => warn!(
                                error = %ConfigError::invalid_value(key, value, line_no),
                                "keeping default FFB gain"
                            ),
                        }
                    }
                }
                "pedals" => {
                    let Some(code) = key_code_from_name(value) else {
                        warn!(error = %ConfigError::unknown_name(value, line_no), "pedal not remapped");
                        continue;
                    };
                    match key {
                        "throttle" => config.mapping.throttle_key = code,
                        "brake" => config.mapping.brake_key = code,
                        "clutch" => config.mapping.clutch_key = code,
                        _ => warn!(key, line = line_no, "unknown pedal entry"),
                    }
                }
                "dpad" => {
                    let Some(code) = key_code_from_name(value) else {
                        warn!(error = %ConfigError::unknown_name(value, line_no), "d-pad not remapped");
                        continue;
                    };
                    match key {
                        "up" => config.mapping.dpad_up = code,
                        "down" => config.mapping.dpad_down = code,
                        "left" => config.mapping.dpad_left = code,
                        "right" => config.mapping.dpad_right = code,
                        _ => warn!(key, line = line_no, "unknown dpad entry"),
                    }
                }
                "button_mapping" => {
                    let Some(button) = WheelButton::from_name(key) else {
                        warn!(error = %ConfigError::unknown_name(key, line_no), "mapping ignored");
                        continue;
                    };
                    let Some(code) = key_code_from_name(value) else {
                        warn!(error = %ConfigError::unknown_name(value, line_no), "mapping ignored");
                        continue;
                    };
                    mapped_buttons.push((code, button));
                }
                _ => {}
            }
        }

        if !mapped_buttons.is_empty() {
            config.mapping.buttons = mapped_buttons;
        }
        config
    }
}

fn non_empty_path(value: &str) -> Option<PathBuf> {
    (!value.is_empty()).then(|| PathBuf::from(value))
}

/// The per-user config path, when `$HOME` is known.
pub fn user_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(USER_CONFIG_RELATIVE))
}

/// Write the commented default config.
pub fn write_default(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| write_error(path, err))?;
    }
    fs::write(path, default_file_contents()).map_err(|err| write_error(path, err))
}

fn write_error(path: &Path, source: io::Error) -> ConfigError {
    ConfigError::Write {
        path: path.display().to_string(),
        source,
    }
}

/// The default config file, fully commented.
pub fn default_file_contents() -> String {
    "\
# OpenWheel configuration

[devices]
# Absolute /dev/input/event* paths. Empty means auto-discover.
keyboard=
mouse=

[sensitivity]
# Steering sensitivity, 1..100.
sensitivity=50

[ffb]
# Global force-feedback gain, 0.1..4.0.
gain=1.0

[pedals]
throttle=KEY_W
brake=KEY_S
clutch=KEY_A

[dpad]
up=KEY_UP
down=KEY_DOWN
left=KEY_LEFT
right=KEY_RIGHT

[button_mapping]
# VIRTUAL_BUTTON=KEY_NAME
TRIGGER=KEY_Q
THUMB=KEY_E
THUMB2=KEY_F
TOP=KEY_G
TOP2=KEY_H
# PINKIE=KEY_R
# BASE=KEY_TAB
# BASE2=KEY_ENTER
"
    .to_string()
}

/// Replace only the `[devices]` section of an existing config, preserving
/// every other line. A missing section is appended.
pub fn rewrite_devices_section(content: &str, keyboard: &str, mouse: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut in_devices = false;
    let mut wrote_keyboard = false;
    let mut wrote_mouse = false;
    let mut had_section = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            if in_devices {
                // Leaving [devices]: add any entry the section lacked.
                if !wrote_keyboard {
                    out.push(format!("keyboard={keyboard}"));
                }
                if !wrote_mouse {
                    out.push(format!("mouse={mouse}"));
                }
            }
            in_devices = trimmed[1..trimmed.len() - 1].trim().eq_ignore_ascii_case("devices");
            had_section |= in_devices;
            out.push(line.to_string());
            continue;
        }
        if in_devices {
            if let Some((key, _)) = trimmed.split_once('=') {
                match key.trim() {
                    "keyboard" => {
                        out.push(format!("keyboard={keyboard}"));
                        wrote_keyboard = true;
                        continue;
                    }
                    "mouse" => {
                        out.push(format!("mouse={mouse}"));
                        wrote_mouse = true;
                        continue;
                    }
                    _ => {}
                }
            }
        }
        out.push(line.to_string());
    }

    if in_devices {
        if !wrote_keyboard {
            out.push(format!("keyboard={keyboard}"));
        }
        if !wrote_mouse {
            out.push(format!("mouse={mouse}"));
        }
    }
    if !had_section {
        out.push(String::new());
        out.push("[devices]".to_string());
        out.push(format!("keyboard={keyboard}"));
        out.push(format!("mouse={mouse}"));
    }

    let mut result = out.join("\n");
    result.push('\n');
    result
}

/// Resolve an evdev key name (e.g. `KEY_Q`) to its code.
///
/// Covers the keys a keyboard-as-wheel setup can plausibly bind; unknown
/// names are reported to the caller for a warning.
pub fn key_code_from_name(name: &str) -> Option<u16> {
    let key = match name {
        "KEY_A" => Key::KEY_A,
        "KEY_B" => Key::KEY_B,
        "KEY_C" => Key::KEY_C,
        "KEY_D" => Key::KEY_D,
        "KEY_E" => Key::KEY_E,
        "KEY_F" => Key::KEY_F,
        "KEY_G" => Key::KEY_G,
        "KEY_H" => Key::KEY_H,
        "KEY_I" => Key::KEY_I,
        "KEY_J" => Key::KEY_J,
        "KEY_K" => Key::KEY_K,
        "KEY_L" => Key::KEY_L,
        "KEY_M" => Key::KEY_M,
        "KEY_N" => Key::KEY_N,
        "KEY_O" => Key::KEY_O,
        "KEY_P" => Key::KEY_P,
        "KEY_Q" => Key::KEY_Q,
        "KEY_R" => Key::KEY_R,
        "KEY_S" => Key::KEY_S,
        "KEY_T" => Key::KEY_T,
        "KEY_U" => Key::KEY_U,
        "KEY_V" => Key::KEY_V,
        "KEY_W" => Key::KEY_W,
        "KEY_X" => Key::KEY_X,
        "KEY_Y" => Key::KEY_Y,
        "KEY_Z" => Key::KEY_Z,
        "KEY_0" => Key::KEY_0,
        "KEY_1" => Key::KEY_1,
        "KEY_2" => Key::KEY_2,
        "KEY_3" => Key::KEY_3,
        "KEY_4" => Key::KEY_4,
        "KEY_5" => Key::KEY_5,
        "KEY_6" => Key::KEY_6,
        "KEY_7" => Key::KEY_7,
        "KEY_8" => Key::KEY_8,
        "KEY_9" => Key::KEY_9,
        "KEY_UP" => Key::KEY_UP,
        "KEY_DOWN" => Key::KEY_DOWN,
        "KEY_LEFT" => Key::KEY_LEFT,
        "KEY_RIGHT" => Key::KEY_RIGHT,
        "KEY_SPACE" => Key::KEY_SPACE,
        "KEY_TAB" => Key::KEY_TAB,
        "KEY_ENTER" => Key::KEY_ENTER,
        "KEY_ESC" => Key::KEY_ESC,
        "KEY_BACKSPACE" => Key::KEY_BACKSPACE,
        "KEY_LEFTSHIFT" => Key::KEY_LEFTSHIFT,
        "KEY_RIGHTSHIFT" => Key::KEY_RIGHTSHIFT,
        "KEY_LEFTALT" => Key::KEY_LEFTALT,
        "KEY_RIGHTALT" => Key::KEY_RIGHTALT,
        "KEY_COMMA" => Key::KEY_COMMA,
        "KEY_DOT" => Key::KEY_DOT,
        "KEY_SLASH" => Key::KEY_SLASH,
        "KEY_SEMICOLON" => Key::KEY_SEMICOLON,
        "KEY_APOSTROPHE" => Key::KEY_APOSTROPHE,
        "KEY_MINUS" => Key::KEY_MINUS,
        "KEY_EQUAL" => Key::KEY_EQUAL,
        "KEY_GRAVE" => Key::KEY_GRAVE,
        "KEY_CAPSLOCK" => Key::KEY_CAPSLOCK,
        "KEY_F1" => Key::KEY_F1,
        "KEY_F2" => Key::KEY_F2,
        "KEY_F3" => Key::KEY_F3,
        "KEY_F4" => Key::KEY_F4,
        "KEY_F5" => Key::KEY_F5,
        "KEY_F6" => Key::KEY_F6,
        "KEY_F7" => Key::KEY_F7,
        "KEY_F8" => Key::KEY_F8,
        "KEY_F9" => Key::KEY_F9,
        "KEY_F10" => Key::KEY_F10,
        "KEY_F11" => Key::KEY_F11,
        "KEY_F12" => Key::KEY_F12,
        _ => return None,
    };
    Some(key.code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = Config::parse("");
        assert_eq!(config.sensitivity, 50);
        assert_eq!(config.ffb_gain, 1.0);
        assert!(config.keyboard.is_none());
        assert!(!config.mapping.buttons.is_empty());
    }

    #[test]
    fn test_comments_and_whitespace() {
        let config = Config::parse(
            "# comment\n; also a comment\n\n[sensitivity]\n  sensitivity =  80  \n",
        );
        assert_eq!(config.sensitivity, 80);
    }

    #[test]
    fn test_sensitivity_clamped_and_defaulted() {
        assert_eq!(Config::parse("[sensitivity]\nsensitivity=500\n").sensitivity, 100);
        assert_eq!(Config::parse("[sensitivity]\nsensitivity=-3\n").sensitivity, 1);
        assert_eq!(Config::parse("[sensitivity]\nsensitivity=fast\n").sensitivity, 50);
    }

    #[test]
    fn test_ffb_gain_clamped() {
        assert_eq!(Config::parse("[ffb]\ngain=9.0\n").ffb_gain, 4.0);
        assert_eq!(Config::parse("[ffb]\ngain=0.0\n").ffb_gain, 0.1);
        assert_eq!(Config::parse("[ffb]\ngain=oops\n").ffb_gain, 1.0);
    }

    #[test]
    fn test_devices_section() {
        let config = Config::parse("[devices]\nkeyboard=/dev/input/event3\nmouse=\n");
        assert_eq!(
            config.keyboard.as_deref(),
            Some(Path::new("/dev/input/event3"))
        );
        assert!(config.mouse.is_none(), "empty value means auto-discover");
    }

    #[test]
    fn test_button_mapping_replaces_defaults() {
        let config = Config::parse("[button_mapping]\nTRIGGER=KEY_Q\nBASE3=KEY_X\n");
        assert_eq!(config.mapping.buttons.len(), 2);
        assert_eq!(
            config.mapping.buttons[0],
            (key_code_from_name("KEY_Q").expect("known key"), WheelButton::Trigger)
        );
        assert_eq!(
            config.mapping.buttons[1],
            (key_code_from_name("KEY_X").expect("known key"), WheelButton::Base3)
        );
    }

    #[test]
    fn test_unknown_mapping_names_ignored() {
        let config = Config::parse(
            "[button_mapping]\nBTN_FNORD=KEY_Q\nTRIGGER=KEY_FNORD\nTHUMB=KEY_E\n",
        );
        assert_eq!(config.mapping.buttons.len(), 1, "only the valid entry survives");
        assert_eq!(config.mapping.buttons[0].1, WheelButton::Thumb);
    }

    #[test]
    fn test_pedal_remap() {
        let config = Config::parse("[pedals]\nthrottle=KEY_I\nbrake=KEY_K\n");
        assert_eq!(config.mapping.throttle_key, key_code_from_name("KEY_I").expect("known"));
        assert_eq!(config.mapping.brake_key, key_code_from_name("KEY_K").expect("known"));
        // Clutch keeps its default.
        assert_eq!(config.mapping.clutch_key, key_code_from_name("KEY_A").expect("known"));
    }

    #[test]
    fn test_rewrite_devices_preserves_other_sections() {
        let original = "\
# header comment
[sensitivity]
sensitivity=70

[devices]
keyboard=
mouse=/dev/input/event9

[button_mapping]
TRIGGER=KEY_Q
";
        let rewritten =
            rewrite_devices_section(original, "/dev/input/event2", "/dev/input/event5");
        assert!(rewritten.contains("# header comment"));
        assert!(rewritten.contains("sensitivity=70"));
        assert!(rewritten.contains("keyboard=/dev/input/event2"));
        assert!(rewritten.contains("mouse=/dev/input/event5"));
        assert!(rewritten.contains("TRIGGER=KEY_Q"));
        assert!(!rewritten.contains("event9"));
    }

    #[test]
    fn test_rewrite_devices_appends_missing_section() {
        let rewritten = rewrite_devices_section("[ffb]\ngain=2.0\n", "/dev/a", "/dev/b");
        assert!(rewritten.contains("[devices]"));
        assert!(rewritten.contains("keyboard=/dev/a"));
        assert!(rewritten.contains("gain=2.0"));
    }

    #[test]
    fn test_write_default_creates_parent_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".config").join("openwheel.conf");
        write_default(&path).expect("write default config");

        let written = fs::read_to_string(&path).expect("config readable");
        assert!(written.contains("[button_mapping]"));
        let config = Config::parse(&written);
        assert_eq!(config.sensitivity, 50);
    }

    #[test]
    fn test_default_file_round_trips() {
        let config = Config::parse(&default_file_contents());
        assert_eq!(config.sensitivity, 50);
        assert_eq!(config.ffb_gain, 1.0);
        assert!(config.keyboard.is_none());
        assert_eq!(config.mapping.buttons.len(), 5);
    }
}
