//! Error types for checkin.
//!
//! This module defines the crate-wide error type used for storage, configuration,
//! decoding, rendering and workflow failures. Field-level validation problems are
//! not errors in this sense; they live in [`crate::validate`] and are handed back
//! to the caller for re-prompting.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for checkin operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A record could not be read from or written to the local store.
    #[error("storage error on record '{key}': {message}")]
    Storage {
        /// Record key.
        key: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Share Token Errors ===
    /// A shareable link token could not be decoded.
    #[error("malformed share token: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },

    // === Workflow Errors ===
    /// An operation was attempted in a step that does not accept it.
    #[error("cannot {action} while in the {from} step")]
    InvalidTransition {
        /// The step the workflow was in.
        from: &'static str,
        /// The attempted operation.
        action: &'static str,
    },

    // === Rendering Errors ===
    /// The signature raster could not be encoded.
    #[error("failed to encode signature image: {0}")]
    ImageEncode(#[from] png::EncodingError),

    /// The signature surface size is zero or too large to allocate.
    #[error(
        "unsupported signature surface size {width}x{height} (max {max}x{max})",
        max = crate::signature::MAX_DIMENSION
    )]
    SurfaceSize {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// The registration report could not be rendered.
    #[error("failed to render report: {0}")]
    Report(#[from] lopdf::Error),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for checkin operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new share token decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a new storage error for the given record.
    #[must_use]
    pub fn storage(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error comes from a malformed share token.
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Check if this error is a local persistence failure.
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. }
                | Self::DatabaseOpen { .. }
                | Self::DatabaseQuery(_)
                | Self::DatabaseMigration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = Error::decode("not base64");
        assert_eq!(err.to_string(), "malformed share token: not base64");
        assert!(err.is_decode_error());
        assert!(!err.is_storage_error());
    }

    #[test]
    fn test_storage_error_display() {
        let err = Error::storage("driveLinks", "disk full");
        let msg = err.to_string();
        assert!(msg.contains("driveLinks"));
        assert!(msg.contains("disk full"));
        assert!(err.is_storage_error());
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = Error::InvalidTransition {
            from: "registration",
            action: "save the signature",
        };
        assert_eq!(
            err.to_string(),
            "cannot save the signature while in the registration step"
        );
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
            assert!(err.is_storage_error());
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<Vec<String>, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "signature width must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("signature width"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
