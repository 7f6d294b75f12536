//! Error types and handling for tabpanels-core operations.
//!
//! Every fallible public function in this crate returns [`Result<T>`]. The
//! variants map to the failure taxonomy of the system: malformed input is
//! recovered locally and never surfaces here, missing host objects surface as
//! [`Error::NotFound`], persistence problems as [`Error::Storage`], and
//! invalid settings as [`Error::Config`]. Nothing in this crate is fatal to
//! the host process; a failed operation degrades one document's enhanced
//! behavior and leaves baseline rendering intact.

use thiserror::Error;

/// The main error type for tabpanels-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Covers file system operations like reading or writing snapshot files.
    /// The underlying `std::io::Error` is preserved for detail.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing operation failed.
    ///
    /// Occurs when a pattern required for splitting or extraction cannot be
    /// built, for example from a pathological user-configured tab marker.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Snapshot storage operation failed.
    ///
    /// Covers persistence beyond basic file I/O: serializing the snapshot,
    /// committing the temp file, re-keying entries on rename.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource was not found.
    ///
    /// Used for documents missing from the host's document set and snapshot
    /// entries that do not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through retry logic.
    ///
    /// Transient I/O conditions (interruptions, timeouts) may succeed on a
    /// later attempt; parse and configuration failures are permanent.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
            ),
            Self::Parse(_)
            | Self::Storage(_)
            | Self::Config(_)
            | Self::NotFound(_)
            | Self::Serialization(_) => false,
        }
    }

    /// Human-readable category name, used in log lines.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Parse(_) => "parse",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Result alias used throughout tabpanels-core.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_timeouts_are_recoverable() {
        let err = Error::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout"));
        assert!(err.is_recoverable());

        let err = Error::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn parse_errors_are_permanent() {
        let err = Error::Parse("bad marker".into());
        assert!(!err.is_recoverable());
        assert_eq!(err.category(), "parse");
    }

    #[test]
    fn serde_json_errors_convert() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.category(), "serialization");
    }
}
