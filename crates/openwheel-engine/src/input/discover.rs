//! Input device discovery and ranking.
//!
//! Explicit paths from configuration always win. Otherwise every
//! `/dev/input/event*` node is scored: keyboards by key capability and a
//! name containing "keyboard", pointers by `REL_X` capability and a name
//! containing "mouse" or "wireless device". Touchpads and consumer-control
//! pseudo-devices advertise tempting capabilities but make terrible wheels,
//! so their names carry a strong penalty.

use std::fs;
use std::path::{Path, PathBuf};

use evdev::{Device, EventType, Key, RelativeAxisType};
use tracing::{debug, info};

use openwheel_errors::{DeviceError, DeviceResult};

const NAME_BONUS: i32 = 100;
const NAME_PENALTY: i32 = -1000;

const KEYBOARD_PENALTY_NAMES: [&str; 2] = ["consumer control", "system control"];
const POINTER_PENALTY_NAMES: [&str; 3] = ["touchpad", "synaptics", "elan"];

/// One scored `/dev/input` node.
#[derive(Debug, Clone)]
pub struct DeviceCandidate {
    /// Device node path.
    pub path: PathBuf,
    /// Kernel-reported device name.
    pub name: String,
    /// Ranking as a keyboard; `None` when it has no key capability.
    pub keyboard_score: Option<i32>,
    /// Ranking as a pointer; `None` when it lacks `REL_X`.
    pub pointer_score: Option<i32>,
}

/// Enumerate and score every readable event node.
pub fn enumerate_candidates() -> Vec<DeviceCandidate> {
    let mut candidates = Vec::new();
    let Ok(entries) = fs::read_dir("/dev/input") else {
        return candidates;
    };

    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let is_event_node = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("event"));
        if !is_event_node {
            continue;
        }
        let Ok(device) = Device::open(&path) else {
            continue;
        };
        candidates.push(score_device(path, &device));
    }

    candidates.sort_by(|a, b| a.path.cmp(&b.path));
    candidates
}

fn score_device(path: PathBuf, device: &Device) -> DeviceCandidate {
    let name = device.name().unwrap_or("Unknown").to_string();
    let lower = name.to_lowercase();

    let has_letter_keys = device
        .supported_keys()
        .is_some_and(|keys| keys.contains(Key::KEY_A) && keys.contains(Key::KEY_Z));
    let keyboard_score = has_letter_keys.then(|| {
        let mut score = 1;
        if lower.contains("keyboard") {
            score += NAME_BONUS;
        }
        if KEYBOARD_PENALTY_NAMES.iter().any(|n| lower.contains(n)) {
            score += NAME_PENALTY;
        }
        score
    });

    let has_rel_x = device.supported_events().contains(EventType::RELATIVE)
        && device
            .supported_relative_axes()
            .is_some_and(|axes| axes.contains(RelativeAxisType::REL_X));
    let pointer_score = has_rel_x.then(|| {
        let mut score = 1;
        if lower.contains("mouse") || lower.contains("wireless device") {
            score += NAME_BONUS;
        }
        if POINTER_PENALTY_NAMES.iter().any(|n| lower.contains(n)) {
            score += NAME_PENALTY;
        }
        score
    });

    DeviceCandidate {
        path,
        name,
        keyboard_score,
        pointer_score,
    }
}

/// Open the configured or best-ranked keyboard.
pub fn open_keyboard(explicit: Option<&Path>) -> DeviceResult<(PathBuf, Device)> {
    if let Some(path) = explicit {
        return open_node(path);
    }
    let best = enumerate_candidates()
        .into_iter()
        .filter_map(|c| c.keyboard_score.map(|s| (s, c)))
        .filter(|(score, _)| *score > 0)
        .max_by_key(|(score, _)| *score)
        .ok_or_else(|| DeviceError::not_found("keyboard"))?;
    info!(path = %best.1.path.display(), name = %best.1.name, "selected keyboard");
    open_node(&best.1.path)
}

/// Open the configured or best-ranked pointer.
pub fn open_pointer(explicit: Option<&Path>) -> DeviceResult<(PathBuf, Device)> {
    if let Some(path) = explicit {
        return open_node(path);
    }
    let best = enumerate_candidates()
        .into_iter()
        .filter_map(|c| c.pointer_score.map(|s| (s, c)))
        .filter(|(score, _)| *score > 0)
        .max_by_key(|(score, _)| *score)
        .ok_or_else(|| DeviceError::not_found("pointer"))?;
    info!(path = %best.1.path.display(), name = %best.1.name, "selected pointer");
    open_node(&best.1.path)
}

fn open_node(path: &Path) -> DeviceResult<(PathBuf, Device)> {
    match Device::open(path) {
        Ok(device) => {
            debug!(path = %path.display(), "opened input device");
            Ok((path.to_path_buf(), device))
        }
        Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(DeviceError::permission_denied(path.display().to_string()))
        }
        Err(err) => Err(DeviceError::open(path.display().to_string(), err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_penalty_names_lose_to_plain_devices() {
        // Scores are relative, so the ranking logic can be exercised with
        // synthetic candidates.
        let touchpad = 1 + NAME_PENALTY;
        let mouse = 1 + NAME_BONUS;
        let nondescript = 1;
        assert!(mouse > nondescript);
        assert!(nondescript > touchpad);
        assert!(touchpad < 0, "penalized devices never win the scan");
    }
}
