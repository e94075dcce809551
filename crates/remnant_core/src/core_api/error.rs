use std::error::Error;
use std::fmt;

use crate::error::FormatError;
use crate::prism::SegmentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorCode {
    TruncatedInput,
    MalformedLength,
    Parse,
    PathNotFound,
    UnknownSegmentName,
    SegmentNotFound,
    Io,
    UnsupportedOperation,
}

impl CoreErrorCode {
    pub(crate) fn of_format(error: &FormatError) -> Self {
        match error {
            FormatError::TruncatedInput { .. } => Self::TruncatedInput,
            FormatError::MalformedLength { .. } => Self::MalformedLength,
            FormatError::Io(_) => Self::Io,
            _ => Self::Parse,
        }
    }

    pub(crate) fn of_segment(error: &SegmentError) -> Self {
        match error {
            SegmentError::UnknownSegmentName(_) => Self::UnknownSegmentName,
            SegmentError::SegmentNotFound(_) => Self::SegmentNotFound,
            SegmentError::Path(_) => Self::PathNotFound,
            SegmentError::NotAName(_) => Self::UnsupportedOperation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreError {
    pub code: CoreErrorCode,
    pub message: String,
}

impl CoreError {
    pub fn new(code: CoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for CoreError {}
