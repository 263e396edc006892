//! In-process fake deployment endpoint.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use url::Url;

/// A request received by the fake server.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub action: String,
    pub query: HashMap<String, String>,
    pub body: Value,
}

/// Scripted behaviour of the fake server.
#[derive(Debug)]
pub struct FakeDeployServer {
    pub deploy_status: StatusCode,
    pub deploy_body: Value,
    pub status_responses: Mutex<VecDeque<(StatusCode, String)>>,
    pub requests: Mutex<Vec<Recorded>>,
}

impl FakeDeployServer {
    pub fn new(bodies: &[&str]) -> Self {
        Self {
            deploy_status: StatusCode::OK,
            deploy_body: json!({ "result": { "deploymentId": "dep-1" } }),
            status_responses: Mutex::new(
                bodies
                    .iter()
                    .map(|b| (StatusCode::OK, (*b).to_string()))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.action).collect()
    }

    /// Cursors sent with each status request, in order.
    pub fn cursors(&self) -> Vec<u64> {
        self.requests()
            .iter()
            .filter(|r| r.action == "deploymentStatus")
            .map(|r| r.body["cursor"].as_u64().unwrap())
            .collect()
    }
}

async fn handle(
    State(server): State<Arc<FakeDeployServer>>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    let action = params.get("action").cloned().unwrap_or_default();
    server.requests.lock().unwrap().push(Recorded {
        action: action.clone(),
        query: params,
        body,
    });

    match action.as_str() {
        "deploy" => (server.deploy_status, Json(server.deploy_body.clone())).into_response(),
        "deploymentStatus" => {
            let (status, text) = server
                .status_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or((StatusCode::OK, String::new()));
            (status, text).into_response()
        }
        "clearDeployment" => Json(json!({ "result": "ok" })).into_response(),
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

/// Serve `server` on an ephemeral local port and return its base URL.
pub async fn spawn(server: Arc<FakeDeployServer>) -> Url {
    let router = Router::new()
        .route("/deploy", post(handle))
        .with_state(server);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr: SocketAddr = listener.local_addr().expect("Failed to get address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    Url::parse(&format!("http://{addr}/deploy?team=web")).unwrap()
}

/// Encode one status line.
pub fn line(cursor: u64, kind: &str, msg: &str) -> String {
    let entry = json!({ "type": kind, "msg": msg }).to_string();
    json!([cursor, entry]).to_string()
}
