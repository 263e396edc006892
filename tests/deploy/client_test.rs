//! HTTP client tests against the fake deployment server.

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use deploy_tail::client::{poll_cycle, ClientError, DeployApi, DeploymentId, HttpDeployClient};
use deploy_tail::config::{HttpConfig, SecretKey, SessionConfig};
use deploy_tail::protocol::Cursor;

use super::server::{line, spawn, FakeDeployServer};

async fn setup(
    server: FakeDeployServer,
    max_retries: u32,
) -> (Arc<FakeDeployServer>, HttpDeployClient, SessionConfig) {
    let server = Arc::new(server);
    let base_url = spawn(server.clone()).await;
    let client = HttpDeployClient::new(&HttpConfig {
        max_retries,
        ..HttpConfig::default()
    })
    .expect("Failed to build client");
    let config = SessionConfig::new("shop", SecretKey::new("s3cret"), base_url);
    (server, client, config)
}

#[tokio::test]
async fn deploy_returns_server_id() {
    let (server, client, config) = setup(FakeDeployServer::new(&[]), 0).await;

    let id = client.deploy(&config).await.expect("deploy");

    assert_eq!(id, DeploymentId::from("dep-1"));
    assert_eq!(server.actions(), vec!["deploy"]);
}

#[tokio::test]
async fn deploy_rejects_malformed_body() {
    let mut server = FakeDeployServer::new(&[]);
    server.deploy_body = json!("accepted");
    let (_server, client, config) = setup(server, 0).await;

    let err = client.deploy(&config).await.unwrap_err();

    assert!(matches!(err, ClientError::InvalidResponse { .. }));
}

#[tokio::test]
async fn deploy_server_error_is_sent_once() {
    let mut server = FakeDeployServer::new(&[]);
    server.deploy_status = StatusCode::BAD_GATEWAY;
    let (server, client, config) = setup(server, 3).await;

    let err = client.deploy(&config).await.unwrap_err();

    match err {
        ClientError::Status { status, .. } => assert_eq!(status, 502),
        other => panic!("Expected Status error, got {other:?}"),
    }
    assert_eq!(server.actions(), vec!["deploy"]);
}

#[tokio::test]
async fn poll_cycle_splits_body_in_order() {
    let body = format!("{}\n{}\n\n", line(1, "inf", "a"), line(2, "inf", "b"));
    let (server, client, config) = setup(FakeDeployServer::new(&[&body]), 0).await;
    let id = DeploymentId::from("dep-1");

    let lines = poll_cycle(&client, &config, &id, Cursor(0))
        .await
        .expect("poll");

    assert_eq!(lines, vec![line(1, "inf", "a"), line(2, "inf", "b")]);
    assert_eq!(server.cursors(), vec![0]);
}

#[tokio::test]
async fn poll_cycle_empty_body_yields_no_lines() {
    let (_server, client, config) = setup(FakeDeployServer::new(&[" \n "]), 0).await;
    let id = DeploymentId::from("dep-1");

    let lines = poll_cycle(&client, &config, &id, Cursor(3))
        .await
        .expect("poll");

    assert!(lines.is_empty());
}

#[tokio::test]
async fn status_retries_server_errors() {
    let server = FakeDeployServer::new(&[]);
    {
        let mut responses = server.status_responses.lock().unwrap();
        responses.push_back((StatusCode::SERVICE_UNAVAILABLE, "busy".to_string()));
        responses.push_back((StatusCode::OK, line(5, "OKI", "done")));
    }
    let (server, client, config) = setup(server, 1).await;

    let body = client
        .deployment_status(&config, &DeploymentId::from("dep-1"), Cursor(4))
        .await
        .expect("status after retry");

    assert_eq!(body, line(5, "OKI", "done"));
    assert_eq!(server.cursors(), vec![4, 4]);
}

#[tokio::test]
async fn status_client_errors_are_not_retried() {
    let server = FakeDeployServer::new(&[]);
    server
        .status_responses
        .lock()
        .unwrap()
        .push_back((StatusCode::NOT_FOUND, "no such deployment".to_string()));
    let (server, client, config) = setup(server, 3).await;

    let err = client
        .deployment_status(&config, &DeploymentId::from("dep-1"), Cursor(0))
        .await
        .unwrap_err();

    match err {
        ClientError::Status { status, body, .. } => {
            assert_eq!(status, 404);
            assert_eq!(body, "no such deployment");
        }
        other => panic!("Expected Status error, got {other:?}"),
    }
    assert_eq!(server.cursors().len(), 1);
}

#[tokio::test]
async fn clear_sends_deployment_id() {
    let (server, client, config) = setup(FakeDeployServer::new(&[]), 0).await;

    client
        .clear_deployment(&config, &DeploymentId::from("dep-9"))
        .await
        .expect("clear");

    let request = server.requests().pop().expect("request");
    assert_eq!(request.action, "clearDeployment");
    assert_eq!(request.body["deploymentId"], json!("dep-9"));
    assert_eq!(request.body.get("cursor"), None);
}

#[tokio::test]
async fn connection_refused_is_request_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get address");
    drop(listener);

    let client = HttpDeployClient::new(&HttpConfig::default()).expect("client");
    let config = SessionConfig::new(
        "shop",
        SecretKey::new("s3cret"),
        url::Url::parse(&format!("http://{addr}/deploy")).unwrap(),
    );

    let err = client.deploy(&config).await.unwrap_err();
    assert!(matches!(err, ClientError::RequestFailed { .. }));
}
