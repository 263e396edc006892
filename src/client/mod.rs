//! Client for the deployment endpoint.
//!
//! All three request kinds go to the same base URL and differ only in the
//! `action` query parameter.

mod error;
mod http;
mod poll;
mod types;

use async_trait::async_trait;

use crate::config::SessionConfig;
use crate::protocol::Cursor;

pub use error::ClientError;
pub use http::{action_url, HttpDeployClient};
pub use poll::{poll_cycle, split_lines};
pub use types::{Action, DeploymentId};

/// Operations offered by the deployment endpoint.
#[async_trait]
pub trait DeployApi: Send + Sync {
    /// Trigger a deployment and return its identifier.
    async fn deploy(&self, config: &SessionConfig) -> Result<DeploymentId, ClientError>;

    /// Fetch the raw status body following `cursor`.
    async fn deployment_status(
        &self,
        config: &SessionConfig,
        deployment_id: &DeploymentId,
        cursor: Cursor,
    ) -> Result<String, ClientError>;

    /// Release server-side tracking state of a deployment.
    async fn clear_deployment(
        &self,
        config: &SessionConfig,
        deployment_id: &DeploymentId,
    ) -> Result<(), ClientError>;
}
