//! Status line classifier.

use super::entry::{Cursor, LogEntry};
use super::error::DecodeError;

/// Decode one status line into the cursor following it and its log entry.
///
/// A line is a two-element JSON array `[nextCursor, rawEntry]` where
/// `rawEntry` is a string holding the JSON-encoded entry.
///
/// # Errors
///
/// Returns `DecodeError` if the line is not a two-element array, the cursor
/// is not a non-negative integer, or the entry payload is not valid entry JSON.
pub fn classify_line(line: &str) -> Result<(Cursor, LogEntry), DecodeError> {
    let trimmed = line.trim();
    let (cursor, raw_entry): (Cursor, String) =
        serde_json::from_str(trimmed).map_err(|e| DecodeError::new(line, e))?;
    let entry: LogEntry = serde_json::from_str(&raw_entry)
        .map_err(|e| DecodeError::new(line, format!("invalid entry payload: {e}")))?;
    Ok((cursor, entry))
}
