/// Error types for the datx library
use std::fmt;

/// Result type alias for datx operations
pub type Result<T> = std::result::Result<T, DatxError>;

/// Main error type for datx operations
///
/// Addresses that are not IPv4, or that fall outside every indexed range,
/// are not errors: lookups report them as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatxError {
    /// I/O errors (missing file, permission denied, truncated read)
    Io(String),

    /// Hostname could not be resolved to an address
    Resolve {
        /// The hostname that was queried
        host: String,
        /// Resolver failure message
        reason: String,
    },

    /// A read fell outside the index buffer
    Format(String),
}

impl DatxError {
    /// True for failures of the underlying file
    pub fn is_io(&self) -> bool {
        matches!(self, DatxError::Io(_))
    }
}

impl fmt::Display for DatxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatxError::Io(msg) => write!(f, "I/O error: {}", msg),
            DatxError::Resolve { host, reason } => {
                write!(f, "Failed to resolve {}: {}", host, reason)
            }
            DatxError::Format(msg) => write!(f, "Format error: {}", msg),
        }
    }
}

impl std::error::Error for DatxError {}

impl From<std::io::Error> for DatxError {
    fn from(err: std::io::Error) -> Self {
        DatxError::Io(err.to_string())
    }
}
