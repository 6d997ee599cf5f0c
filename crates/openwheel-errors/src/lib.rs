//! Centralized error types for OpenWheel
//!
//! This crate provides the unified error handling system for the OpenWheel
//! project, split along the failure taxonomy the daemon enforces:
//!
//! - [`setup`]: fatal startup failures, reported once with exit code 1
//! - [`device`]: input-device and HID-backend errors, with transient/fatal
//!   classification so readers and emitters can absorb what the next tick
//!   will naturally retry
//! - [`config`]: configuration problems, logged at warn with defaults
//!   substituted while startup proceeds
//!
//! Protocol-level problems (short or unknown FFB packets) are deliberately
//! not modeled here: the parser drops them without constructing an error.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod device;
pub mod setup;

pub use config::ConfigError;
pub use device::DeviceError;
pub use setup::SetupError;

/// A specialized `Result` for OpenWheel device operations.
pub type DeviceResult<T = ()> = std::result::Result<T, DeviceError>;
