//! Fatal startup errors.
//!
//! Every variant here terminates the daemon with exit code 1 and a single
//! human-readable message; none is retried.

/// Errors that prevent the pipeline from starting.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// The process lacks the privileges needed for uinput and device grabs.
    #[error(
        "insufficient privileges: access to /dev/uinput and exclusive input-device \
         grabs require root (run with sudo)"
    )]
    InsufficientPrivileges,

    /// Neither a keyboard nor a pointer could be opened.
    #[error("no usable input devices found under /dev/input")]
    NoInputDevices,

    /// The virtual HID backend could not be created.
    #[error("failed to create virtual wheel device: {0}")]
    BackendUnavailable(#[source] crate::DeviceError),
}

impl SetupError {
    /// Exit code the daemon reports for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeviceError;

    #[test]
    fn test_setup_errors_exit_one() {
        assert_eq!(SetupError::InsufficientPrivileges.exit_code(), 1);
        assert_eq!(SetupError::NoInputDevices.exit_code(), 1);
    }

    #[test]
    fn test_backend_error_carries_source() {
        let err = SetupError::BackendUnavailable(DeviceError::permission_denied("/dev/uinput"));
        let msg = err.to_string();
        assert!(msg.contains("virtual wheel"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
