//! Error taxonomy for the ingestion pipeline.
//!
//! Validation problems are not errors: they are reported as data through
//! [`ValidationResult`](crate::validation::ValidationResult).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unknown line: {0}")]
    UnknownLine(String),
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Feed request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("Protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("Storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IngestError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IngestError::Storage {
            path: path.into(),
            source,
        }
    }

    /// `true` for caller mistakes (unknown line, channel or bad table), which
    /// are surfaced immediately and have no side effects.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            IngestError::UnknownLine(_)
                | IngestError::UnknownChannel(_)
                | IngestError::Configuration(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_unknown_line() {
        let err = IngestError::UnknownLine("X".into());
        assert_eq!(err.to_string(), "Unknown line: X");
        assert!(err.is_configuration());
    }

    #[test]
    fn error_display_storage_includes_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = IngestError::storage("/tmp/raw/ace_20240101_000000.pb", io_err);
        let msg = err.to_string();
        assert!(msg.contains("/tmp/raw/ace_20240101_000000.pb"));
        assert!(msg.contains("denied"));
        assert!(!err.is_configuration());
    }

    #[test]
    fn error_from_prost_decode_error() {
        let bad_bytes: &[u8] = &[0xFF, 0xFE, 0x00, 0x01];
        let decode_err = <crate::gtfs_rt::FeedMessage as prost::Message>::decode(bad_bytes)
            .unwrap_err();
        let err: IngestError = decode_err.into();
        assert!(matches!(err, IngestError::Decode(_)));
    }

    #[test]
    fn error_from_json_error() {
        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: IngestError = result.unwrap_err().into();
        assert!(matches!(err, IngestError::Json(_)));
    }
}
