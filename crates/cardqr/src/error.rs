//! Error types for cardqr.
//!
//! This module defines all error types used throughout the cardqr crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for cardqr operations.
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

    // === Profile Errors ===
    /// No profile with the given id exists.
    #[error("profile not found: {id}")]
    ProfileNotFound {
        /// The id that was looked up.
        id: String,
    },

    /// The only remaining profile cannot be deleted.
    #[error("cannot delete the last profile")]
    LastProfile,

    // === Photo Errors ===
    /// The selected photo is not one of the accepted image formats.
    #[error("unsupported photo format {detected} (expected PNG, JPEG or GIF)")]
    PhotoFormat {
        /// What the file was detected as.
        detected: String,
    },

    // === QR Errors ===
    /// The payload could not be encoded as a QR code.
    #[error("failed to encode QR code: {message}")]
    QrEncode {
        /// Description of what went wrong.
        message: String,
    },

    /// Image encoding or decoding failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    // === Scan Errors ===
    /// The scanner failed to start.
    #[error("failed to start scanner: {message}")]
    ScanStart {
        /// Description of what went wrong.
        message: String,
    },

    /// A frame could not be read from the frame source.
    #[error("failed to read frame: {message}")]
    ScanFrame {
        /// Description of what went wrong.
        message: String,
    },

    /// The frame source ran out of frames without a successful decode.
    #[error("no QR code found")]
    ScanExhausted,

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read a file.
    #[error("failed to read {path}: {source}")]
    FileRead {
        /// Path that couldn't be read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

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
    /// An operation timed out.
    #[error("operation timed out: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
    },

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for cardqr operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a profile-not-found error.
    #[must_use]
    pub fn profile_not_found(id: impl Into<String>) -> Self {
        Self::ProfileNotFound { id: id.into() }
    }

    /// Create a QR encoding error.
    #[must_use]
    pub fn qr_encode(message: impl Into<String>) -> Self {
        Self::QrEncode {
            message: message.into(),
        }
    }

    /// Create a scanner start error.
    #[must_use]
    pub fn scan_start(message: impl Into<String>) -> Self {
        Self::ScanStart {
            message: message.into(),
        }
    }

    /// Create a frame read error.
    #[must_use]
    pub fn scan_frame(message: impl Into<String>) -> Self {
        Self::ScanFrame {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    #[must_use]
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Check if this error is the last-profile rejection.
    #[must_use]
    pub fn is_last_profile(&self) -> bool {
        matches!(self, Self::LastProfile)
    }

    /// Check if this error ends a scan without a result.
    #[must_use]
    pub fn is_scan_exhausted(&self) -> bool {
        matches!(self, Self::ScanExhausted)
    }

    /// Check if this error is a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
