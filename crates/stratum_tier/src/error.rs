// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for tier operations.

use std::fmt;

use recoverable::{Recovery, RecoveryInfo};

/// The tier operation that was running when a medium failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierOperation {
    /// Reading an entry.
    Get,
    /// Writing an entry.
    Insert,
    /// Deleting an entry.
    Invalidate,
    /// Deleting every entry.
    Clear,
    /// Removing expired entries.
    Purge,
    /// Preparing the medium for first use (opening directories, scanning state).
    Open,
}

impl TierOperation {
    /// Returns a stable, lower-case name for the operation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Insert => "insert",
            Self::Invalidate => "invalidate",
            Self::Clear => "clear",
            Self::Purge => "purge",
            Self::Open => "open",
        }
    }
}

impl fmt::Display for TierOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure of the backing medium.
///
/// Raised when a tier cannot complete an operation (storage exhausted, corrupt
/// files, I/O errors). The failure is local to the call that observed it. Use
/// [`std::error::Error::source()`] to reach the underlying cause.
///
/// # Example
///
/// ```
/// use stratum_tier::{Error, TierOperation};
///
/// let error = Error::from_message(TierOperation::Insert, "disk full");
/// assert_eq!(error.operation(), TierOperation::Insert);
/// ```
#[ohno::error]
#[display("storage medium failed during {operation}")]
pub struct Error {
    operation: TierOperation,
}

impl Error {
    /// Creates a new error from any cause.
    ///
    /// This is the entry point for tier implementations living in other crates.
    pub fn from_message(operation: TierOperation, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(operation, cause)
    }

    /// Returns the operation that failed.
    #[must_use]
    pub fn operation(&self) -> TierOperation {
        self.operation
    }
}

impl Recovery for Error {
    fn recovery(&self) -> RecoveryInfo {
        RecoveryInfo::retry()
    }
}

/// A specialized [`Result`] type for tier operations.
pub type Result<T> = std::result::Result<T, Error>;
