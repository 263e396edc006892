//! Tail loop driver.
//!
//! Repeats status polls until the deployment reaches a terminal state,
//! feeding every batch through [`TailState`].

use std::time::Duration;

use async_trait::async_trait;

use crate::client::{poll_cycle, ClientError, DeployApi, DeploymentId};
use crate::config::{SessionConfig, TailConfig};
use crate::events::{DeployEvent, EventSink, Severity};
use crate::protocol::Cursor;

use super::{TailState, TailStatus};

/// Default wait between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Suspension between polls.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Error type for tail operations.
#[derive(thiserror::Error, Debug)]
pub enum TailError {
    /// A status request failed at the transport level.
    #[error("Status poll failed: {0}")]
    Transport(#[from] ClientError),
    /// The configured poll limit ran out before a terminal entry arrived.
    #[error("No terminal status after {polls} polls (cursor {cursor})")]
    PollLimitExceeded { polls: u32, cursor: Cursor },
}

/// Summary of a finished tail operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailReport {
    /// Terminal status reached.
    pub status: TailStatus,
    /// Cursor after the last applied line.
    pub cursor: Cursor,
    /// Number of status requests issued.
    pub polls: u32,
    /// Message of the failing entry when `status` is `Fail`.
    pub failure: Option<String>,
}

impl TailReport {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status == TailStatus::Success
    }
}

/// Drives status polls for one deployment.
pub struct Tailer {
    interval: Duration,
    max_polls: Option<u32>,
    sleeper: Box<dyn Sleeper>,
}

impl Default for Tailer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Tailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tailer")
            .field("interval", &self.interval)
            .field("max_polls", &self.max_polls)
            .finish_non_exhaustive()
    }
}

impl Tailer {
    /// Unbounded tailer polling every [`DEFAULT_POLL_INTERVAL`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_polls: None,
            sleeper: Box::new(TokioSleeper),
        }
    }

    #[must_use]
    pub fn from_config(config: &TailConfig) -> Self {
        Self::new()
            .with_interval(config.poll_interval())
            .with_max_polls(config.max_polls)
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Limit the number of status requests. `None` polls forever.
    #[must_use]
    pub fn with_max_polls(mut self, max_polls: Option<u32>) -> Self {
        self.max_polls = max_polls;
        self
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn max_polls(&self) -> Option<u32> {
        self.max_polls
    }

    fn limit_reached(&self, polls: u32) -> bool {
        self.max_polls.is_some_and(|max| polls >= max)
    }

    /// Tail `deployment_id` until it succeeds or fails.
    ///
    /// Events go to `sink` as they are decoded; a failed deployment also
    /// raises `sink.operation_failed` with the failing message. Empty
    /// responses and malformed lines are waited out.
    ///
    /// # Errors
    ///
    /// Returns `TailError::Transport` if a status request fails and
    /// `TailError::PollLimitExceeded` if the poll limit runs out.
    pub async fn run<A>(
        &self,
        api: &A,
        config: &SessionConfig,
        deployment_id: &DeploymentId,
        sink: &mut dyn EventSink,
    ) -> Result<TailReport, TailError>
    where
        A: DeployApi + ?Sized,
    {
        let mut state = TailState::new();
        let mut polls: u32 = 0;

        loop {
            if self.limit_reached(polls) {
                return Err(TailError::PollLimitExceeded {
                    polls,
                    cursor: state.cursor(),
                });
            }
            if polls > 0 {
                self.sleeper.sleep(self.interval).await;
            }

            let lines = poll_cycle(api, config, deployment_id, state.cursor()).await?;
            polls = polls.saturating_add(1);

            if lines.is_empty() {
                tracing::debug!(cursor = %state.cursor(), "No new log lines yet");
                continue;
            }

            let outcome = state.apply_batch(&lines);
            for event in &outcome.events {
                sink.emit(event);
            }
            if let Some(e) = &outcome.decode_error {
                tracing::warn!(
                    line = %e.line,
                    reason = %e.reason,
                    cursor = %state.cursor(),
                    "Failed to parse status line, retrying"
                );
                sink.emit(&DeployEvent::new(
                    Severity::Warning,
                    format!("Failed to parse status line: {}", e.line),
                ));
            }

            if state.status().is_terminal() {
                if let Some(reason) = state.failure() {
                    sink.operation_failed(reason);
                }
                tracing::debug!(
                    status = ?state.status(),
                    cursor = %state.cursor(),
                    polls,
                    "Tail finished"
                );
                return Ok(TailReport {
                    status: state.status(),
                    cursor: state.cursor(),
                    polls,
                    failure: state.failure().map(str::to_string),
                });
            }
        }
    }
}
