//! Output sinks for deployment events.

use std::io::{self, Write};

use crate::display;

use super::types::{DeployEvent, Severity};

/// Destination for events produced while tailing a deployment.
pub trait EventSink: Send {
    /// Surface one severity-tagged event.
    fn emit(&mut self, event: &DeployEvent);

    /// Signal that the whole operation failed, with the failure reason.
    fn operation_failed(&mut self, reason: &str);

    /// Called once the deployment has been accepted, before tailing starts.
    fn deployment_started(&mut self, _app_name: &str, _deployment_id: &str) {}
}

/// Forwards events to `tracing` at the matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: &DeployEvent) {
        let message = event.message.as_str();
        match event.severity {
            Severity::Debug => tracing::debug!(target: "deploy", "{message}"),
            Severity::Info | Severity::Notice => tracing::info!(target: "deploy", "{message}"),
            Severity::Warning => tracing::warn!(target: "deploy", "{message}"),
            Severity::Error => tracing::error!(target: "deploy", "{message}"),
        }
    }

    fn operation_failed(&mut self, reason: &str) {
        tracing::error!(target: "deploy", reason = %reason, "Deployment failed");
    }
}

/// Colored, timestamped terminal output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn emit(&mut self, event: &DeployEvent) {
        display::print_log_line(event.severity, &event.message);
    }

    fn operation_failed(&mut self, reason: &str) {
        display::print_failure(reason);
    }

    fn deployment_started(&mut self, app_name: &str, deployment_id: &str) {
        display::print_deploy_start(app_name, deployment_id);
    }
}

/// GitHub Actions workflow-command output.
///
/// Info lines are written as plain text, other severities as `::level::`
/// commands so the runner annotates them.
#[derive(Debug)]
pub struct GithubSink<W: Write + Send> {
    out: W,
}

impl GithubSink<io::Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write + Send> GithubSink<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the sink and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            tracing::warn!(error = %e, "Failed to write workflow command");
        }
    }
}

/// Escape data for a workflow command.
#[must_use]
pub fn escape_workflow_data(data: &str) -> String {
    data.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

impl<W: Write + Send> EventSink for GithubSink<W> {
    fn emit(&mut self, event: &DeployEvent) {
        let data = escape_workflow_data(&event.message);
        let line = match event.severity {
            Severity::Info => data,
            Severity::Debug => format!("::debug::{data}"),
            Severity::Notice => format!("::notice::{data}"),
            Severity::Warning => format!("::warning::{data}"),
            Severity::Error => format!("::error::{data}"),
        };
        self.write_line(&line);
    }

    fn operation_failed(&mut self, reason: &str) {
        let line = format!("::error::{}", escape_workflow_data(reason));
        self.write_line(&line);
    }
}

/// Keeps every event in memory.
///
/// Useful for embedding the tailer and for tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Vec<DeployEvent>,
    pub failures: Vec<String>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages of recorded events, in emission order.
    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.message.as_str()).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &DeployEvent) {
        self.events.push(event.clone());
    }

    fn operation_failed(&mut self, reason: &str) {
        self.failures.push(reason.to_string());
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&mut self, event: &DeployEvent) {
        (**self).emit(event);
    }

    fn operation_failed(&mut self, reason: &str) {
        (**self).operation_failed(reason);
    }

    fn deployment_started(&mut self, app_name: &str, deployment_id: &str) {
        (**self).deployment_started(app_name, deployment_id);
    }
}
