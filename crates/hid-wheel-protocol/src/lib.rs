//! Wheel HID protocol: canonical FFB command decoding and input report encoding.
//!
//! This crate is intentionally I/O-free and allocation-free on hot paths.
//! It provides pure functions and types that can be tested without a kernel
//! uinput device behind them.
//!
//! The command set mirrors the classic Logitech wheel wire protocol: hosts
//! address the virtual wheel with the same output reports they would send a
//! real G29-class device, and backends whose native FFB transport is richer
//! (kernel PID effects, vJoy packets) translate down to this set before
//! handing bytes to [`parse_ffb_command`].

#![deny(static_mut_refs)]

pub mod command;
pub mod ids;
pub mod report;
pub mod types;

pub use command::{parse_ffb_command, FfbCommand};
pub use ids::{commands, scaling, WHEEL_PRODUCT_ID, WHEEL_VENDOR_ID};
pub use report::{encode_input_report, WheelReport, INPUT_REPORT_LEN};
pub use types::{WheelButton, BUTTON_COUNT};
