//! Error handling for pzip
//!
//! Error types with context preservation and chain support.

use thiserror::Error;

/// Result type alias for pzip operations
pub type Result<T> = std::result::Result<T, PzipError>;

/// Error type for all pzip operations
#[derive(Error, Debug)]
pub enum PzipError {
    /// I/O related errors (stat, open, map, read, write)
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// No input files were given
    #[error("{usage}")]
    Usage { usage: String },

    /// CLI argument parsing errors
    #[error("CLI error: {message}")]
    Cli {
        message: String,
        #[source]
        source: Option<clap::Error>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        file_path: Option<std::path::PathBuf>,
    },

    /// Permission/access errors
    #[error("Permission denied: {message}")]
    Permission {
        message: String,
        path: Option<std::path::PathBuf>,
    },

    /// Invalid input errors
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        input: Option<String>,
    },

    /// Malformed compressed stream
    #[error("Format error: {message}")]
    Format {
        message: String,
        offset: Option<u64>,
    },

    /// Threading errors
    #[error("Threading error: {message}")]
    Threading {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal invariant violations (should not normally occur)
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        location: Option<&'static str>,
    },
}

impl PzipError {
    /// Create a new I/O error with context
    pub fn io_error<S: Into<String>>(message: S, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create an I/O error for an operation on `path`.
    ///
    /// A `PermissionDenied` source becomes a permission error.
    pub fn path_error<S: Into<String>>(
        message: S,
        path: &std::path::Path,
        source: std::io::Error,
    ) -> Self {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            return Self::permission_error(
                format!("{}: {}", message.into(), path.display()),
                Some(path.to_path_buf()),
            );
        }
        Self::io_error(format!("{}: {}", message.into(), path.display()), source)
    }

    /// Create the usage error shown when no input files are given
    pub fn usage_error<S: Into<String>>(usage: S) -> Self {
        Self::Usage {
            usage: usage.into(),
        }
    }

    /// Create a new CLI error
    pub fn cli_error<S: Into<String>>(message: S, source: Option<clap::Error>) -> Self {
        Self::Cli {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config_error<S: Into<String>>(
        message: S,
        file_path: Option<std::path::PathBuf>,
    ) -> Self {
        Self::Config {
            message: message.into(),
            file_path,
        }
    }

    /// Create a new permission error
    pub fn permission_error<S: Into<String>>(
        message: S,
        path: Option<std::path::PathBuf>,
    ) -> Self {
        Self::Permission {
            message: message.into(),
            path,
        }
    }

    /// Create a new invalid input error
    pub fn invalid_input<S: Into<String>>(message: S, input: Option<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            input,
        }
    }

    /// Create a new format error
    pub fn format_error<S: Into<String>>(message: S, offset: Option<u64>) -> Self {
        Self::Format {
            message: message.into(),
            offset,
        }
    }

    /// Create a new threading error with optional source
    pub fn threading_error<S: Into<String>>(
        message: S,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Threading {
            message: message.into(),
            source,
        }
    }

    /// Create a new internal error
    pub fn internal_error<S: Into<String>>(message: S, location: Option<&'static str>) -> Self {
        Self::Internal {
            message: message.into(),
            location,
        }
    }

    /// Get error category for reporting
    pub fn category(&self) -> &'static str {
        match self {
            PzipError::Io { .. } => "io",
            PzipError::Usage { .. } => "usage",
            PzipError::Cli { .. } => "cli",
            PzipError::Config { .. } => "config",
            PzipError::Permission { .. } => "permission",
            PzipError::InvalidInput { .. } => "input",
            PzipError::Format { .. } => "format",
            PzipError::Threading { .. } => "threading",
            PzipError::Internal { .. } => "internal",
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            "permission" => 13,
            "input" => 22,
            "config" => 78,
            _ => 1,
        }
    }
}

// Conversion implementations for common error types
impl From<std::io::Error> for PzipError {
    fn from(err: std::io::Error) -> Self {
        Self::io_error("I/O operation failed", err)
    }
}

impl From<clap::Error> for PzipError {
    fn from(err: clap::Error) -> Self {
        Self::cli_error("Command line parsing failed", Some(err))
    }
}

impl From<toml::de::Error> for PzipError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_error(format!("TOML parsing failed: {}", err), None)
    }
}
