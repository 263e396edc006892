//! One status poll against the deployment endpoint.

use crate::config::SessionConfig;
use crate::protocol::Cursor;

use super::{ClientError, DeployApi, DeploymentId};

/// Split a status body into its lines, in order.
///
/// Blank lines are dropped, so a whitespace-only body yields no lines.
#[must_use]
pub fn split_lines(body: &str) -> Vec<String> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Request the log lines following `cursor`.
///
/// An empty result means the server had nothing new yet.
///
/// # Errors
///
/// Transport failures from `api` are returned unchanged.
pub async fn poll_cycle<A>(
    api: &A,
    config: &SessionConfig,
    deployment_id: &DeploymentId,
    cursor: Cursor,
) -> Result<Vec<String>, ClientError>
where
    A: DeployApi + ?Sized,
{
    let body = api
        .deployment_status(config, deployment_id, cursor)
        .await?;
    let lines = split_lines(&body);
    tracing::trace!(cursor = %cursor, lines = lines.len(), "Status poll returned");
    Ok(lines)
}
