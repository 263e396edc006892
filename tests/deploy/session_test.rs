//! End-to-end deployment sessions over HTTP.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use deploy_tail::client::{ClientError, HttpDeployClient};
use deploy_tail::config::{HttpConfig, SecretKey, SessionConfig};
use deploy_tail::events::{DeployEvent, RecordingSink, Severity};
use deploy_tail::protocol::Cursor;
use deploy_tail::session::{DeploymentSession, SessionError, SessionOutcome};
use deploy_tail::tail::{TailError, TailStatus, Tailer};

use super::server::{line, spawn, FakeDeployServer};

fn http_config() -> HttpConfig {
    HttpConfig {
        max_retries: 0,
        request_timeout_secs: 5,
        ..HttpConfig::default()
    }
}

fn tailer() -> Tailer {
    Tailer::new()
        .with_interval(Duration::from_millis(5))
        .with_max_polls(Some(20))
}

async fn run_session(
    server: FakeDeployServer,
) -> (
    Arc<FakeDeployServer>,
    Result<SessionOutcome, SessionError>,
    RecordingSink,
) {
    let server = Arc::new(server);
    let base_url = spawn(server.clone()).await;
    let client = HttpDeployClient::new(&http_config()).expect("Failed to build client");
    let config = SessionConfig::new("shop", SecretKey::new("s3cret"), base_url);

    let mut sink = RecordingSink::new();
    let result = DeploymentSession::new(&client, config)
        .with_tailer(tailer())
        .run(&mut sink)
        .await;
    (server, result, sink)
}

#[tokio::test]
async fn test_successful_deployment_end_to_end() {
    let body = format!(
        "{}\n{}\n",
        line(1, "inf", "building"),
        line(2, "OKI", "done")
    );
    let (server, result, sink) = run_session(FakeDeployServer::new(&[&body])).await;

    let outcome = result.expect("Session should complete");
    assert!(outcome.is_success());
    assert_eq!(outcome.report().status, TailStatus::Success);
    assert_eq!(outcome.report().cursor, Cursor(2));
    assert_eq!(
        sink.events,
        vec![DeployEvent::info("building"), DeployEvent::info("done")]
    );
    assert!(sink.failures.is_empty());

    assert_eq!(
        server.actions(),
        vec!["deploy", "deploymentStatus", "clearDeployment"]
    );
    let requests = server.requests();
    assert_eq!(
        requests[0].body,
        json!({ "appName": "shop", "secretKey": "s3cret" })
    );
    assert_eq!(
        requests[1].body,
        json!({
            "appName": "shop",
            "secretKey": "s3cret",
            "deploymentId": "dep-1",
            "cursor": 0
        })
    );
    assert_eq!(
        requests[2].body,
        json!({ "appName": "shop", "secretKey": "s3cret", "deploymentId": "dep-1" })
    );
}

#[tokio::test]
async fn test_failed_deployment_reports_reason_and_cleans_up() {
    let body = format!(
        "{}\n{}",
        line(1, "wrn", "cache miss"),
        line(2, "DED", "build failed: exit 1")
    );
    let (server, result, sink) = run_session(FakeDeployServer::new(&[&body])).await;

    match result.expect("Session should complete") {
        SessionOutcome::Failed { reason, .. } => assert_eq!(reason, "build failed: exit 1"),
        other => panic!("Expected Failed, got {other:?}"),
    }
    assert_eq!(
        sink.events,
        vec![
            DeployEvent::new(Severity::Warning, "cache miss"),
            DeployEvent::error("build failed: exit 1")
        ]
    );
    assert_eq!(sink.failures, vec!["build failed: exit 1".to_string()]);
    assert_eq!(server.actions().last().map(String::as_str), Some("clearDeployment"));
}

#[tokio::test]
async fn test_cursor_follows_last_decoded_line() {
    let first = format!("{}\n{}", line(4, "inf", "a"), line(6, "inf", "b"));
    let second = format!("{}\n{{broken\n{}", line(9, "not", "c"), line(11, "inf", "d"));
    let third = "   \n";
    let fourth = line(12, "OKI", "e");
    let (server, result, sink) =
        run_session(FakeDeployServer::new(&[&first, &second, third, &fourth])).await;

    assert!(result.expect("Session should complete").is_success());
    assert_eq!(server.cursors(), vec![0, 6, 9, 9]);
    assert_eq!(
        sink.messages(),
        vec!["a", "b", "c", "Failed to parse status line: {broken", "e"]
    );
    assert_eq!(sink.events[3].severity, Severity::Warning);

    let cursors = server.cursors();
    assert!(cursors.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_numeric_deployment_id_is_echoed() {
    let mut server = FakeDeployServer::new(&[&line(1, "OKI", "done")]);
    server.deploy_body = json!({ "result": { "deploymentId": 77 } });
    let (server, result, _sink) = run_session(server).await;

    assert!(result.expect("Session should complete").is_success());
    let clear = server.requests().pop().expect("clear request");
    assert_eq!(clear.action, "clearDeployment");
    assert_eq!(clear.body["deploymentId"], json!(77));
}

#[tokio::test]
async fn test_deploy_without_id_is_fatal() {
    let mut server = FakeDeployServer::new(&[]);
    server.deploy_body = json!({ "result": {} });
    let (server, result, sink) = run_session(server).await;

    assert!(matches!(
        result,
        Err(SessionError::Deploy(ClientError::InvalidResponse { .. }))
    ));
    assert_eq!(server.actions(), vec!["deploy"]);
    assert!(sink.events.is_empty());
}

#[tokio::test]
async fn test_deploy_rejected_is_fatal() {
    let mut server = FakeDeployServer::new(&[]);
    server.deploy_status = StatusCode::FORBIDDEN;
    server.deploy_body = json!({ "error": "bad secret" });
    let (server, result, _sink) = run_session(server).await;

    match result {
        Err(SessionError::Deploy(ClientError::Status { status, .. })) => assert_eq!(status, 403),
        other => panic!("Expected deploy status error, got {other:?}"),
    }
    assert_eq!(server.actions(), vec!["deploy"]);
}

#[tokio::test]
async fn test_status_server_error_escalates_after_cleanup() {
    let server = FakeDeployServer::new(&[]);
    server
        .status_responses
        .lock()
        .unwrap()
        .push_back((StatusCode::BAD_GATEWAY, "upstream down".to_string()));
    let (server, result, _sink) = run_session(server).await;

    assert!(matches!(
        result,
        Err(SessionError::Tail(TailError::Transport(ClientError::Status {
            status: 502,
            ..
        })))
    ));
    assert_eq!(
        server.actions(),
        vec!["deploy", "deploymentStatus", "clearDeployment"]
    );
}

#[tokio::test]
async fn test_poll_limit_ends_silent_deployment() {
    let (server, result, _sink) = run_session(FakeDeployServer::new(&[])).await;

    assert!(matches!(
        result,
        Err(SessionError::Tail(TailError::PollLimitExceeded { polls: 20, .. }))
    ));
    assert_eq!(server.cursors().len(), 20);
    assert_eq!(server.actions().last().map(String::as_str), Some("clearDeployment"));
}

#[tokio::test]
async fn test_action_parameter_replaces_and_keeps_other_query() {
    let (server, result, _sink) =
        run_session(FakeDeployServer::new(&[&line(1, "OKI", "ok")])).await;
    assert!(result.is_ok());
    for request in server.requests() {
        assert_eq!(request.query.get("team").map(String::as_str), Some("web"));
        assert_eq!(request.query.len(), 2, "query {:?}", request.query);
    }
}
