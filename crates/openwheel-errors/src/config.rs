//! Configuration error types.
//!
//! Configuration problems never abort startup: the loader logs one warning,
//! substitutes the built-in default, and proceeds. These types exist so the
//! warning can say precisely what was wrong.

/// Problems found while loading or rewriting the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Config file path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Config file path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A value failed to parse.
    #[error("invalid value `{value}` for {key} (line {line})")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Offending value.
        value: String,
        /// 1-based line number.
        line: usize,
    },

    /// A button-mapping entry named an unknown button or key.
    #[error("unknown name `{name}` in button mapping (line {line})")]
    UnknownName {
        /// The unrecognized name.
        name: String,
        /// 1-based line number.
        line: usize,
    },
}

impl ConfigError {
    /// Create an invalid-value error.
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        line: usize,
    ) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            value: value.into(),
            line,
        }
    }

    /// Create an unknown-name error.
    pub fn unknown_name(name: impl Into<String>, line: usize) -> Self {
        ConfigError::UnknownName {
            name: name.into(),
            line,
        }
    }
}
