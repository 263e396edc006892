//! Protocol decode errors.

/// A status line that could not be decoded.
///
/// This is a per-line signal, never fatal to the tail loop.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to decode status line {line:?}: {reason}")]
pub struct DecodeError {
    /// The offending line.
    pub line: String,
    /// Why decoding failed.
    pub reason: String,
}

impl DecodeError {
    pub(crate) fn new(line: &str, reason: impl ToString) -> Self {
        Self {
            line: line.to_string(),
            reason: reason.to_string(),
        }
    }
}
