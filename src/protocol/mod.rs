//! Deployment status stream protocol.
//!
//! Decodes the line-oriented log format returned by the status endpoint.

mod classify;
mod entry;
mod error;

pub use classify::classify_line;
pub use entry::{Cursor, EntryKind, LogEntry};
pub use error::DecodeError;
