//! Deployment session orchestration.
//!
//! A session triggers one deployment, tails it to a terminal state and then
//! clears the server-side deployment state, whatever the outcome.

use crate::client::{ClientError, DeployApi, DeploymentId};
use crate::config::SessionConfig;
use crate::events::EventSink;
use crate::tail::{TailError, TailReport, Tailer};

/// Error type for session operations.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// The deployment could not be started.
    #[error("Failed to start deployment: {0}")]
    Deploy(#[source] ClientError),
    /// Tailing stopped before a terminal status.
    #[error(transparent)]
    Tail(#[from] TailError),
}

/// Result of a completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The deployment reported success.
    Succeeded {
        deployment_id: DeploymentId,
        report: TailReport,
    },
    /// The deployment reported failure.
    Failed {
        deployment_id: DeploymentId,
        /// Message of the failing entry.
        reason: String,
        report: TailReport,
    },
}

impl SessionOutcome {
    fn from_report(deployment_id: DeploymentId, report: TailReport) -> Self {
        if report.succeeded() {
            Self::Succeeded {
                deployment_id,
                report,
            }
        } else {
            Self::Failed {
                deployment_id,
                reason: report.failure.clone().unwrap_or_default(),
                report,
            }
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    #[must_use]
    pub fn deployment_id(&self) -> &DeploymentId {
        match self {
            Self::Succeeded { deployment_id, .. } | Self::Failed { deployment_id, .. } => {
                deployment_id
            }
        }
    }

    #[must_use]
    pub fn report(&self) -> &TailReport {
        match self {
            Self::Succeeded { report, .. } | Self::Failed { report, .. } => report,
        }
    }
}

/// One deploy, tail, clear lifecycle against a deployment endpoint.
#[derive(Debug)]
pub struct DeploymentSession<'a, A: ?Sized> {
    api: &'a A,
    config: SessionConfig,
    tailer: Tailer,
}

impl<'a, A> DeploymentSession<'a, A>
where
    A: DeployApi + ?Sized,
{
    /// Create a session with an unbounded default tailer.
    #[must_use]
    pub fn new(api: &'a A, config: SessionConfig) -> Self {
        Self {
            api,
            config,
            tailer: Tailer::new(),
        }
    }

    /// Replace the tailer (poll interval, poll limit, sleeper).
    #[must_use]
    pub fn with_tailer(mut self, tailer: Tailer) -> Self {
        self.tailer = tailer;
        self
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run the whole session.
    ///
    /// Cleanup runs after tailing ends, including when tailing fails; a
    /// cleanup failure is only logged.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Deploy` if the deployment cannot be started and
    /// `SessionError::Tail` if tailing stops before a terminal status.
    pub async fn run(&self, sink: &mut dyn EventSink) -> Result<SessionOutcome, SessionError> {
        tracing::debug!(
            url = %self.config.base_url,
            app_name = %self.config.app_name,
            "Connecting to deployment endpoint"
        );
        let deployment_id = self
            .api
            .deploy(&self.config)
            .await
            .map_err(SessionError::Deploy)?;
        tracing::info!(deployment_id = %deployment_id, "Deployment started, tailing status");
        sink.deployment_started(&self.config.app_name, &deployment_id.to_string());

        let tail_result = self
            .tailer
            .run(self.api, &self.config, &deployment_id, sink)
            .await;

        self.clear(&deployment_id).await;

        let report = tail_result?;
        Ok(SessionOutcome::from_report(deployment_id, report))
    }

    /// Release server-side deployment state, best effort.
    async fn clear(&self, deployment_id: &DeploymentId) {
        tracing::debug!(deployment_id = %deployment_id, "Clearing deployment");
        match self.api.clear_deployment(&self.config, deployment_id).await {
            Ok(()) => tracing::debug!(deployment_id = %deployment_id, "Deployment cleared"),
            Err(e) => tracing::warn!(
                deployment_id = %deployment_id,
                error = %e,
                "Failed to clear deployment"
            ),
        }
    }
}
