//! Tail state machine.
//!
//! Folds decoded status lines into events, cursor advances and the terminal
//! status of a deployment. No I/O happens here.

use serde::{Deserialize, Serialize};

use crate::events::DeployEvent;
use crate::protocol::{classify_line, Cursor, DecodeError};

/// Progress of a tailed deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TailStatus {
    #[default]
    Running,
    Success,
    Fail,
}

impl TailStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Result of applying one response batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Events in emission order.
    pub events: Vec<DeployEvent>,
    /// Lines decoded and applied.
    pub applied: usize,
    /// Decode failure that abandoned the rest of the batch.
    pub decode_error: Option<DecodeError>,
}

/// Cursor and status of one tail operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailState {
    cursor: Cursor,
    status: TailStatus,
    failure: Option<String>,
}

impl TailState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a cursor other than the beginning of the stream.
    #[must_use]
    pub fn with_cursor(cursor: Cursor) -> Self {
        Self {
            cursor,
            ..Self::default()
        }
    }

    /// Cursor to present on the next status request.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    #[must_use]
    pub fn status(&self) -> TailStatus {
        self.status
    }

    /// Message of the entry that failed the deployment.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Apply one raw status line.
    ///
    /// Returns the event the line produces, if any. Once the status is
    /// terminal, further lines are ignored.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if the line is malformed. The cursor is left
    /// untouched in that case.
    pub fn apply_line(&mut self, line: &str) -> Result<Option<DeployEvent>, DecodeError> {
        if self.status.is_terminal() {
            return Ok(None);
        }

        let (next_cursor, entry) = classify_line(line)?;
        let message = entry.message();
        let event = entry
            .kind
            .severity()
            .map(|severity| DeployEvent::new(severity, message));

        if let Some(status) = entry.kind.terminal_status() {
            tracing::debug!(from = ?self.status, to = ?status, "Tail status transition");
            self.status = status;
            if status == TailStatus::Fail {
                self.failure = Some(message.to_string());
            }
        }

        if next_cursor < self.cursor {
            tracing::warn!(
                cursor = %self.cursor,
                next_cursor = %next_cursor,
                "Server moved the cursor backwards"
            );
        }
        tracing::debug!(cursor = %next_cursor, "Cursor advanced");
        self.cursor = next_cursor;

        Ok(event)
    }

    /// Apply a response batch line by line, in order.
    ///
    /// Stops at the first terminal entry or the first malformed line; lines
    /// after that point are neither applied nor cursor-advanced.
    pub fn apply_batch<S: AsRef<str>>(&mut self, lines: &[S]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for line in lines {
            if self.status.is_terminal() {
                break;
            }
            let line = line.as_ref();
            tracing::debug!(line = %line, "Received status line");
            match self.apply_line(line) {
                Ok(event) => {
                    outcome.applied += 1;
                    outcome.events.extend(event);
                }
                Err(e) => {
                    outcome.decode_error = Some(e);
                    break;
                }
            }
        }

        outcome
    }
}
