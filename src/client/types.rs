//! Wire types of the deployment endpoint.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::Cursor;

/// Request kind, sent as the `action` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Deploy,
    DeploymentStatus,
    ClearDeployment,
}

impl Action {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deploy => "deploy",
            Self::DeploymentStatus => "deploymentStatus",
            Self::ClearDeployment => "clearDeployment",
        }
    }

    /// Returns true if a server error may be answered by sending the
    /// request again. A repeated `deploy` could start a second deployment.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        !matches!(self, Self::Deploy)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-assigned deployment identifier.
///
/// Kept in the JSON shape the server used so it is echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeploymentId {
    Number(u64),
    Text(String),
}

impl DeploymentId {
    fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for DeploymentId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<u64> for DeploymentId {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeployRequest<'a> {
    pub app_name: &'a str,
    pub secret_key: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusRequest<'a> {
    pub app_name: &'a str,
    pub secret_key: &'a str,
    pub deployment_id: &'a DeploymentId,
    pub cursor: Cursor,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ClearRequest<'a> {
    pub app_name: &'a str,
    pub secret_key: &'a str,
    pub deployment_id: &'a DeploymentId,
}

/// Body returned by `action=deploy`.
#[derive(Debug, Deserialize)]
pub(crate) struct DeployResponse {
    pub result: Option<DeployResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeployResult {
    pub deployment_id: Option<DeploymentId>,
}

impl DeployResponse {
    /// Extract a usable deployment id.
    pub(crate) fn into_deployment_id(self) -> Option<DeploymentId> {
        self.result
            .and_then(|r| r.deployment_id)
            .filter(|id| !id.is_blank())
    }
}
