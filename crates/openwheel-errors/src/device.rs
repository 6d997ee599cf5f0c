//! Input-device and HID-backend error types.

/// Errors raised by physical input devices and the virtual HID backend.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// No device matched the requested path or discovery ranking.
    #[error("device not found: {0}")]
    NotFound(String),

    /// Opening or configuring a device node failed.
    #[error("failed to open {path}: {source}")]
    Open {
        /// Device node path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The process may not access the device node.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// An exclusive grab could not be acquired.
    #[error("failed to grab {0} exclusively")]
    GrabFailed(String),

    /// Reading or writing the device failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Device node path or backend name.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl DeviceError {
    /// Whether the next tick will naturally retry this failure.
    ///
    /// Transient errors are absorbed at the reader/emitter boundary;
    /// everything else propagates.
    pub fn is_transient(&self) -> bool {
        match self {
            DeviceError::Io { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Create a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        DeviceError::NotFound(what.into())
    }

    /// Create a permission-denied error.
    pub fn permission_denied(path: impl Into<String>) -> Self {
        DeviceError::PermissionDenied(path.into())
    }

    /// Create an open error.
    pub fn open(path: impl Into<String>, source: std::io::Error) -> Self {
        DeviceError::Open {
            path: path.into(),
            source,
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        DeviceError::Io {
            path: path.into(),
            source,
        }
    }
}
