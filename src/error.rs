use crate::message::MessageKind;
use std::fmt;
use thiserror::Error;

/// A single problem found while validating configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Unified error type for the wire protocol, the server roles and the client.
#[derive(Error, Debug, Clone)]
pub enum SwarmError {
    /// Frame discriminant outside the known variant range
    #[error("Unknown message type: {0}")]
    UnknownType(u8),

    /// Payload checksum does not match the header
    #[error("Checksum mismatch: header {expected:#010x}, payload {actual:#010x}")]
    Integrity { expected: u32, actual: u32 },

    /// Declared payload length is above the frame limit
    #[error("Frame payload of {0} bytes exceeds limit")]
    FrameTooLarge(u64),

    /// Response discriminant differs from the one the caller expected
    #[error("Response type mismatch: expected {expected}, got {actual}")]
    ProtocolMismatch {
        expected: MessageKind,
        actual: MessageKind,
    },

    /// Peer closed the stream, possibly in the middle of a frame
    #[error("Peer disconnected")]
    Disconnected,

    /// Local or remote storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Operation timed out
    #[error("Operation timed out: {0}")]
    TimedOut(String),

    /// Work abandoned because the surrounding batch was cancelled
    #[error("Transfer cancelled")]
    Cancelled,

    /// Reassembled file does not match the declared torrent
    #[error("Verification failed: {0}")]
    Verification(String),

    /// Tracker knows no seeder for the requested torrent
    #[error("No seeders for torrent {0}")]
    NoSeeders(String),

    /// Chunk response is well-formed but does not describe the requested range
    #[error("Invalid chunk: {0}")]
    InvalidChunk(String),

    /// Network error - refused, reset, unreachable
    #[error("Network error: {0}")]
    NetworkError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),

    /// Parse/serialization error
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Validation error with every issue found
    #[error("Validation error: {}", join_issues(.0))]
    ValidationError(Vec<ValidationIssue>),
}

impl SwarmError {
    /// Build a storage error that names the path it concerns.
    pub fn storage(path: &std::path::Path, err: impl fmt::Display) -> Self {
        SwarmError::Storage(format!("{}: {}", path.display(), err))
    }

    /// True when the peer simply went away between frames.
    pub fn is_clean_disconnect(&self) -> bool {
        matches!(self, SwarmError::Disconnected)
    }

    /// True when the stream can no longer be trusted to carry frames.
    pub fn is_connection_fatal(&self) -> bool {
        matches!(
            self,
            SwarmError::UnknownType(_)
                | SwarmError::Integrity { .. }
                | SwarmError::FrameTooLarge(_)
                | SwarmError::Disconnected
                | SwarmError::NetworkError(_)
                | SwarmError::IoError(_)
        )
    }
}

// === Conversion Implementations ===

macro_rules! impl_from_error {
    ($err_type:ty, $arm:pat => $body:expr) => {
        impl From<$err_type> for SwarmError {
            fn from(err: $err_type) -> Self {
                match err {
                    $arm => $body,
                }
            }
        }
    };
}

impl_from_error!(std::io::Error, e => match e.kind() {
    std::io::ErrorKind::UnexpectedEof => SwarmError::Disconnected,
    std::io::ErrorKind::TimedOut => SwarmError::TimedOut(e.to_string()),
    std::io::ErrorKind::ConnectionRefused
    | std::io::ErrorKind::ConnectionReset
    | std::io::ErrorKind::ConnectionAborted
    | std::io::ErrorKind::NotConnected
    | std::io::ErrorKind::BrokenPipe
    | std::io::ErrorKind::AddrNotAvailable => SwarmError::NetworkError(e.to_string()),
    std::io::ErrorKind::InvalidInput => SwarmError::InvalidArgument(e.to_string()),
    _ => SwarmError::IoError(e.to_string()),
});

impl_from_error!(serde_json::Error, e => SwarmError::ParseError(e.to_string()));
impl_from_error!(toml::de::Error, e => SwarmError::ParseError(e.to_string()));

/// Result type alias for operations that can fail with SwarmError.
pub type SwarmResult<T> = Result<T, SwarmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mapping() {
        let eof = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "early eof");
        assert!(SwarmError::from(eof).is_clean_disconnect());

        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(
            SwarmError::from(refused),
            SwarmError::NetworkError(_)
        ));

        let timed_out = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        assert!(matches!(SwarmError::from(timed_out), SwarmError::TimedOut(_)));

        let other = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert!(matches!(SwarmError::from(other), SwarmError::IoError(_)));
    }

    #[test]
    fn test_connection_fatal() {
        assert!(SwarmError::UnknownType(9).is_connection_fatal());
        assert!(SwarmError::Integrity {
            expected: 1,
            actual: 2
        }
        .is_connection_fatal());
        assert!(SwarmError::Disconnected.is_connection_fatal());

        // Reported in-band or decided by the caller
        assert!(!SwarmError::Storage("missing".to_string()).is_connection_fatal());
        assert!(!SwarmError::ProtocolMismatch {
            expected: MessageKind::SeederList,
            actual: MessageKind::Torrent,
        }
        .is_connection_fatal());
    }

    #[test]
    fn test_display_formatting() {
        assert_eq!(
            format!("{}", SwarmError::UnknownType(42)),
            "Unknown message type: 42"
        );
        assert_eq!(
            format!(
                "{}",
                SwarmError::ProtocolMismatch {
                    expected: MessageKind::SeederList,
                    actual: MessageKind::ChunkResponse,
                }
            ),
            "Response type mismatch: expected SeederList, got ChunkResponse"
        );
        assert_eq!(
            format!(
                "{}",
                SwarmError::ValidationError(vec![
                    ValidationIssue {
                        field: "client.chunk_size".to_string(),
                        message: "must be positive".to_string(),
                    },
                    ValidationIssue {
                        field: "logging.level".to_string(),
                        message: "unknown".to_string(),
                    },
                ])
            ),
            "Validation error: client.chunk_size: must be positive; logging.level: unknown"
        );
    }
}
