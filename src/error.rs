// src/error.rs

use thiserror::Error;

/// Core error types for Taproom
#[derive(Error, Debug)]
pub enum Error {
    /// No artifact is published for the requested platform
    #[error("no artifact for platform {os}/{arch} (supported: {supported})")]
    UnsupportedPlatform {
        os: String,
        arch: String,
        supported: String,
    },

    /// Formula failed to parse or violates a structural invariant
    #[error("invalid formula: {0}")]
    InvalidFormula(String),

    /// Declared checksum does not look like a SHA-256 digest
    #[error("invalid checksum for {target}: {reason}")]
    InvalidChecksum { target: String, reason: String },

    /// Declared checksum is the all-zero placeholder left by an unfinished release
    #[error("checksum for {0} is an unfilled placeholder; artifact cannot be verified")]
    UnverifiableChecksum(String),

    /// Downloaded artifact does not match its declared digest
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// Network failure or HTTP error status during download
    #[error("download error: {0}")]
    Download(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Install destination exists but is not a replaceable file
    #[error("install path collision: {0} exists and is not a regular file")]
    InstallCollision(String),

    /// The archive did not contain the binary the formula names
    #[error("binary '{binary}' not found in archive {archive}")]
    BinaryNotInArchive { binary: String, archive: String },

    /// A runtime dependency is not resolvable on PATH
    #[error("required dependency '{0}' not found on PATH")]
    DependencyMissing(String),

    /// Installed binary failed its version smoke test
    #[error("self-test failed for {binary}: {reason}")]
    SelfTestFailure { binary: String, reason: String },
}

/// Result type alias using Taproom's Error type
pub type Result<T> = std::result::Result<T, Error>;
