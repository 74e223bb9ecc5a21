// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Errors raised by the catalog cache.

use std::fmt;

use recoverable::{Recovery, RecoveryInfo};

/// What went wrong in a catalog cache operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A storage tier could not complete the operation.
    Medium,
    /// Stored bytes do not decode as the shape expected for their key.
    DecodeMismatch,
    /// A record could not be serialized.
    Encode,
    /// An item's shape differs from the shape its category dispatches to.
    ShapeMismatch,
}

impl ErrorKind {
    /// Returns a stable, lower-case name for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Medium => "medium",
            Self::DecodeMismatch => "decode_mismatch",
            Self::Encode => "encode",
            Self::ShapeMismatch => "shape_mismatch",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed catalog cache operation.
///
/// Use [`kind`](Self::kind) to branch on the failure and
/// [`std::error::Error::source()`] to reach the underlying cause.
#[ohno::error]
#[display("catalog cache operation failed: {kind}")]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Returns what went wrong.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<stratum_tier::Error> for Error {
    fn from(error: stratum_tier::Error) -> Self {
        Self::caused_by(ErrorKind::Medium, error)
    }
}

impl Recovery for Error {
    fn recovery(&self) -> RecoveryInfo {
        match self.kind {
            ErrorKind::Medium => RecoveryInfo::retry(),
            ErrorKind::DecodeMismatch | ErrorKind::Encode | ErrorKind::ShapeMismatch => RecoveryInfo::never(),
        }
    }
}

/// A specialized [`Result`] type for catalog cache operations.
pub type Result<T> = std::result::Result<T, Error>;
