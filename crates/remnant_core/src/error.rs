//! Codec-level failures.
//!
//! Everything below the `core_api` facade reports problems through
//! [`FormatError`]. The facade folds these into a `CoreError` with a stable
//! code for callers.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("truncated input at offset {offset:#x}: needed {needed} bytes, {remaining} remaining")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("malformed length at offset {offset:#x}: declared {declared}, decoded {actual}")]
    MalformedLength {
        offset: usize,
        declared: usize,
        actual: usize,
    },

    #[error("invalid string at offset {offset:#x}: {reason}")]
    InvalidString { offset: usize, reason: &'static str },

    #[error("name index {index} at offset {offset:#x} out of range ({len} names)")]
    NameIndex {
        offset: usize,
        index: u16,
        len: usize,
    },

    #[error("unsupported layout at offset {offset:#x}: {message}")]
    UnsupportedLayout { offset: usize, message: String },

    #[error("encoded length {length} does not fit its length field")]
    LengthOverflow { length: usize },

    #[error("compression error: {0}")]
    Compression(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl FormatError {
    pub fn layout(offset: usize, message: impl Into<String>) -> Self {
        Self::UnsupportedLayout {
            offset,
            message: message.into(),
        }
    }
}

pub type FormatResult<T> = Result<T, FormatError>;
