//! HTTP implementation of the deployment endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use url::Url;

use crate::config::{HttpConfig, SessionConfig};
use crate::protocol::Cursor;

use super::types::{ClearRequest, DeployRequest, DeployResponse, StatusRequest};
use super::{Action, ClientError, DeployApi, DeploymentId};

const USER_AGENT: &str = concat!("deploy-tail/", env!("CARGO_PKG_VERSION"));

/// Determine if a request should be retried based on status code and attempt count.
fn should_retry(status_code: u16, attempt: u32, max_retries: u32) -> bool {
    if attempt >= max_retries {
        return false;
    }
    // Retry on 5xx server errors
    (500..600).contains(&status_code)
}

/// Calculate exponential backoff duration for retry attempts.
fn calculate_backoff(attempt: u32) -> Duration {
    // Exponential backoff: 1s, 2s, 4s
    Duration::from_secs(1 << attempt.min(6))
}

/// Build the request URL for `action`, keeping other query parameters of
/// the base URL.
#[must_use]
pub fn action_url(base: &Url, action: Action) -> Url {
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != "action")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("action", action.as_str());
    url
}

/// Deployment endpoint client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpDeployClient {
    client: Client,
    max_retries: u32,
}

impl HttpDeployClient {
    /// Create a client with the given timeouts and retry budget.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Build` if the HTTP client cannot be constructed.
    pub fn new(config: &HttpConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;
        Ok(Self {
            client,
            max_retries: config.max_retries,
        })
    }

    /// POST `body` as JSON for `action`, retrying server errors for
    /// retryable actions.
    async fn post<B: Serialize + Sync>(
        &self,
        config: &SessionConfig,
        action: Action,
        body: &B,
    ) -> Result<Response, ClientError> {
        let url = action_url(&config.base_url, action);
        let max_retries = if action.is_retryable() {
            self.max_retries
        } else {
            0
        };

        let mut attempt = 0;
        loop {
            tracing::trace!(action = %action, attempt, "Sending request");
            let response = self
                .client
                .post(url.clone())
                .json(body)
                .send()
                .await
                .map_err(|e| ClientError::from_reqwest(action, &e))?;

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let status_code = status.as_u16();
            if should_retry(status_code, attempt, max_retries) {
                let backoff = calculate_backoff(attempt);
                tracing::warn!(
                    action = %action,
                    status = status_code,
                    backoff_secs = backoff.as_secs(),
                    "Server error, retrying"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                action,
                status: status_code,
                body,
            });
        }
    }
}

#[async_trait]
impl DeployApi for HttpDeployClient {
    async fn deploy(&self, config: &SessionConfig) -> Result<DeploymentId, ClientError> {
        let action = Action::Deploy;
        let body = DeployRequest {
            app_name: &config.app_name,
            secret_key: config.secret_key.expose(),
        };
        let response = self.post(config, action, &body).await?;
        let parsed: DeployResponse =
            response
                .json()
                .await
                .map_err(|e| ClientError::InvalidResponse {
                    action,
                    message: e.to_string(),
                })?;
        parsed
            .into_deployment_id()
            .ok_or_else(|| ClientError::InvalidResponse {
                action,
                message: "missing result.deploymentId".to_string(),
            })
    }

    async fn deployment_status(
        &self,
        config: &SessionConfig,
        deployment_id: &DeploymentId,
        cursor: Cursor,
    ) -> Result<String, ClientError> {
        let action = Action::DeploymentStatus;
        let body = StatusRequest {
            app_name: &config.app_name,
            secret_key: config.secret_key.expose(),
            deployment_id,
            cursor,
        };
        let response = self.post(config, action, &body).await?;
        response
            .text()
            .await
            .map_err(|e| ClientError::from_reqwest(action, &e))
    }

    async fn clear_deployment(
        &self,
        config: &SessionConfig,
        deployment_id: &DeploymentId,
    ) -> Result<(), ClientError> {
        let body = ClearRequest {
            app_name: &config.app_name,
            secret_key: config.secret_key.expose(),
            deployment_id,
        };
        self.post(config, Action::ClearDeployment, &body).await?;
        Ok(())
    }
}
