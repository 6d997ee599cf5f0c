//! Canonical FFB command decoding.
//!
//! All functions are pure and allocation-free.
//!
//! # Protocol notes
//!
//! The host addresses the virtual wheel with the classic Logitech slot
//! commands. Each packet is an opaque byte sequence whose first byte is the
//! command code:
//!
//! ```text
//! 0x11  constant force   byte 2 = magnitude (unsigned, 0x80 = center)
//! 0x13  stop force       no payload
//! 0x14  default autocenter
//! 0xF5  disable autocenter
//! 0xFE  set autocenter   byte 1 = 0x0D, byte 2 = strength (unsigned)
//! ```
//!
//! Unknown command codes and short packets decode to `None`; the stream is
//! never failed. Magnitudes above 0x80 pull left, below 0x80 pull right,
//! which is why the constant-force conversion negates.

#![deny(static_mut_refs)]

use crate::ids::{commands, scaling};

/// A decoded FFB command, in engine units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfbCommand {
    /// Apply a constant force. Positive pulls the wheel right.
    ConstantForce {
        /// Commanded force in engine units, within ±[`scaling::FORCE_LIMIT`].
        force: i16,
    },
    /// Stop force output immediately.
    StopForce,
    /// Enable the built-in autocenter spring at its default strength.
    DefaultAutocenter,
    /// Disable the autocenter spring.
    DisableAutocenter,
    /// Set the autocenter spring to an explicit strength.
    SetAutocenter {
        /// Spring strength in engine units, non-negative.
        strength: i16,
    },
}

/// Decode one FFB packet into a command.
///
/// Returns `None` for empty packets, packets shorter than their command's
/// payload, and unrecognized command codes. Out-of-range magnitudes are
/// clamped, never rejected.
pub fn parse_ffb_command(data: &[u8]) -> Option<FfbCommand> {
    match *data.first()? {
        commands::CONSTANT_FORCE => {
            let magnitude = *data.get(2)? as i32;
            let force = -((magnitude - 0x80) * scaling::FORCE_SCALE);
            let force = force.clamp(
                -(scaling::FORCE_LIMIT as i32),
                scaling::FORCE_LIMIT as i32,
            ) as i16;
            Some(FfbCommand::ConstantForce { force })
        }
        commands::STOP_FORCE => Some(FfbCommand::StopForce),
        commands::DEFAULT_AUTOCENTER => Some(FfbCommand::DefaultAutocenter),
        commands::DISABLE_AUTOCENTER => Some(FfbCommand::DisableAutocenter),
        commands::SET_AUTOCENTER => {
            if *data.get(1)? != commands::SET_AUTOCENTER_SPRING {
                return None;
            }
            let raw = *data.get(2)? as i16;
            Some(FfbCommand::SetAutocenter {
                strength: raw * scaling::AUTOCENTER_SCALE,
            })
        }
        _ => None,
    }
}
