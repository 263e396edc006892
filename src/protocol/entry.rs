//! Log entry types for the deployment status stream.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::events::Severity;
use crate::tail::TailStatus;

/// Offset into the server-side log stream of one deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(pub u64);

impl Cursor {
    /// Cursor presented on the first status request.
    pub const START: Self = Self(0);

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Cursor {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Entry type vocabulary of the status stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Build error.
    #[serde(rename = "err")]
    Error,
    /// Unexpected server-side failure, reported like an error.
    #[serde(rename = "omg")]
    Omg,
    #[serde(rename = "inf")]
    Info,
    #[serde(rename = "wrn")]
    Warning,
    #[serde(rename = "not")]
    Notice,
    /// Deployment finished and failed.
    #[serde(rename = "DED")]
    Dead,
    /// Deployment finished successfully.
    #[serde(rename = "OKI")]
    Ok,
    /// Catch-all for entry types this client does not know yet, or absent.
    #[default]
    #[serde(other)]
    Unknown,
}

impl EntryKind {
    /// Severity of the event this entry produces, if any.
    ///
    /// `Unknown` entries produce no event.
    #[must_use]
    pub fn severity(self) -> Option<Severity> {
        match self {
            Self::Error | Self::Omg | Self::Dead => Some(Severity::Error),
            Self::Info | Self::Ok => Some(Severity::Info),
            Self::Warning => Some(Severity::Warning),
            Self::Notice => Some(Severity::Notice),
            Self::Unknown => None,
        }
    }

    /// Terminal status this entry resolves the deployment to, if any.
    #[must_use]
    pub fn terminal_status(self) -> Option<TailStatus> {
        match self {
            Self::Dead => Some(TailStatus::Fail),
            Self::Ok => Some(TailStatus::Success),
            _ => None,
        }
    }

    /// Returns true if this entry ends the deployment.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.terminal_status().is_some()
    }
}

/// A decoded entry of the deployment log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "type", default)]
    pub kind: EntryKind,
    #[serde(default)]
    pub msg: String,
}

impl LogEntry {
    #[must_use]
    pub fn new(kind: EntryKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            msg: msg.into(),
        }
    }

    /// Message with surrounding whitespace removed, as shown to the operator.
    #[must_use]
    pub fn message(&self) -> &str {
        self.msg.trim()
    }
}
