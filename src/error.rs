//! Error types for the commission engine and its caching layer.

use std::fmt;

/// Result type for SistemaV operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for SistemaV.
///
/// A sale that matches no commission rule is not an error: the calculator
/// returns `Ok(None)` for it. The variants below cover real failures only.
#[derive(Debug, Clone)]
pub enum Error {
    /// A monetary field could not be parsed as a decimal amount.
    ///
    /// Raised by the calculator when `Sale::value` or `Attendant::earnings`
    /// holds something like `"abc"` or an empty string. Callers are expected
    /// to validate payloads before they reach the calculator; this is the
    /// defensive fallback.
    ComputationError(String),

    /// An inbound payload or a configured rule failed validation.
    ///
    /// Produced by `Validate` implementations and surfaced by the
    /// validation middleware as a `400` response.
    ValidationError(String),

    /// Serialization failed when encoding a value for the cache.
    SerializationError(String),

    /// Deserialization failed when decoding cached bytes.
    ///
    /// **Recovery:** the cache drops the entry and reports a miss.
    DeserializationError(String),

    /// Cached bytes do not carry the expected envelope magic.
    InvalidCacheEntry(String),

    /// Schema version mismatch between code and cached data.
    ///
    /// Expected after a deployment that changed a cached type; the entry is
    /// evicted and recomputed on next access.
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from cached entry)
        found: u32,
    },

    /// The external data source failed to load sales, attendants or rules.
    RepositoryError(String),

    /// Invalid configuration (bad environment value, zero-sized cache, ...).
    ConfigError(String),

    /// Generic error with custom message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ComputationError(msg) => write!(f, "Computation error: {}", msg),
            Error::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::InvalidCacheEntry(msg) => write!(f, "Invalid cache entry: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Cache version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Whether the error came from caller-supplied data rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::ComputationError(_) | Error::ValidationError(_))
    }
}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::ValidationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<rust_decimal::Error> for Error {
    fn from(e: rust_decimal::Error) -> Self {
        Error::ComputationError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}
