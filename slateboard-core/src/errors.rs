/*
    errors.rs - Error taxonomy for the sync core

    Three failure classes, none of them fatal to the process:
    - Transport: network/HTTP failure; the operation is abandoned and
      retried implicitly by the next poll tick or local edit.
    - Codec: corrupt or undecodable content blob; fatal to that one
      snapshot only, which is logged and skipped.
    - Protocol: unexpected or null-shaped response; logged and ignored,
      the previously known version state is retained.
*/

use crate::codec::CodecError;
use thiserror::Error;

/// Errors that can occur in the sync core
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network or HTTP failure against the document store
    #[error("Transport error (status {status:?}): {cause}")]
    Transport { status: Option<u16>, cause: String },

    /// Corrupt or undecodable content blob
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Unexpected or null-shaped store response
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Editing surface failure
    #[error("Surface error: {0}")]
    Surface(String),
}

impl SyncError {
    /// Build a transport error with no HTTP status (connection-level failure)
    pub fn transport(cause: impl Into<String>) -> Self {
        SyncError::Transport { status: None, cause: cause.into() }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Transport {
            status: err.status().map(|s| s.as_u16()),
            cause: err.to_string(),
        }
    }
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = SyncError::Transport {
            status: Some(500),
            cause: "internal server error".to_string(),
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("internal server error"));
    }

    #[test]
    fn test_codec_error_conversion() {
        let codec_err = CodecError::Base64("bad padding".to_string());
        let sync_err: SyncError = codec_err.into();
        assert!(matches!(sync_err, SyncError::Codec(_)));
    }

    #[test]
    fn test_transport_helper_has_no_status() {
        let err = SyncError::transport("connection refused");
        assert!(matches!(err, SyncError::Transport { status: None, .. }));
    }
}
