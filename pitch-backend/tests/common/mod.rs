#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Method, Request, StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use pitch_backend::config::AppConfig;
use pitch_backend::services::{AccessGrant, SigningError, TokenSigner};
use pitch_backend::startup::{build_router, build_state};
use pitch_backend::store::StoreClientFactory;
use pitch_backend::AppState;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const SERVICE_KEY: &str = "service-role-secret";
pub const ANON_KEY: &str = "anon-public-key";
pub const LIVEKIT_KEY: &str = "APItestkey";
pub const LIVEKIT_SECRET: &str = "test-secret-test-secret-test-secret";
pub const LIVEKIT_URL: &str = "wss://pitch-test.livekit.cloud";

/// Configuration pointing at `store_url`, optionally with LiveKit credentials.
pub fn test_config(store_url: &str, with_livekit: bool) -> AppConfig {
    let mut vars: HashMap<&str, String> = HashMap::from([
        ("SUPABASE_URL", store_url.to_string()),
        ("SUPABASE_SERVICE_KEY", SERVICE_KEY.to_string()),
        ("SUPABASE_ANON_KEY", ANON_KEY.to_string()),
        ("SUPABASE_TIMEOUT_SECS", "5".to_string()),
    ]);

    if with_livekit {
        vars.insert("LIVEKIT_API_KEY", LIVEKIT_KEY.to_string());
        vars.insert("LIVEKIT_API_SECRET", LIVEKIT_SECRET.to_string());
        vars.insert("LIVEKIT_URL", LIVEKIT_URL.to_string());
    }

    let common = CoreConfig {
        port: 0,
        ..CoreConfig::default()
    };

    AppConfig::from_lookup(common, |key| vars.get(key).cloned())
        .expect("test configuration should load")
}

/// Router wired exactly as in production.
pub fn app(store_url: &str, with_livekit: bool) -> Router {
    let state = build_state(test_config(store_url, with_livekit)).expect("state should build");
    build_router(state)
}

/// Router with a caller-supplied signer; LiveKit URL is configured.
pub fn app_with_signer(signer: Arc<dyn TokenSigner>) -> Router {
    let config = test_config("http://127.0.0.1:1", true);
    let store = StoreClientFactory::new(&config.store).expect("store factory should build");
    build_router(AppState::new(config, store, Some(signer)))
}

/// Send a request through the router and decode the JSON body.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("router should respond");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be JSON")
    };
    (status, body)
}

pub async fn post_token(app: Router, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method(Method::POST)
            .uri("/api/voice/token")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

/// Signer that counts calls and returns a fixed token.
#[derive(Default)]
pub struct CountingSigner {
    pub calls: AtomicUsize,
    pub grants: Mutex<Vec<AccessGrant>>,
}

impl CountingSigner {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenSigner for CountingSigner {
    async fn sign(&self, grant: &AccessGrant) -> Result<String, SigningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.grants.lock().unwrap().push(grant.clone());
        Ok("signed.test.token".to_string())
    }
}

/// Signer that always fails with an error mentioning the secret.
pub struct FailingSigner;

#[async_trait]
impl TokenSigner for FailingSigner {
    async fn sign(&self, _grant: &AccessGrant) -> Result<String, SigningError> {
        Err(SigningError::InvalidGrant(format!(
            "key {} rejected by signer",
            LIVEKIT_SECRET
        )))
    }
}

/// One request as seen by the stand-in store.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// In-process stand-in for the PostgREST API.
///
/// Tables: `calls` (two rows), `empty` (no rows), `broken` (500).
pub struct FakeStore {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeStore {
    pub async fn spawn() -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));

        let router = Router::new()
            .route("/rest/v1/", get(rest_root))
            .route("/rest/v1/:table", get(table_rows))
            .with_state(requests.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake store");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        FakeStore {
            url: format!("http://127.0.0.1:{}", port),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

type Recorder = Arc<Mutex<Vec<RecordedRequest>>>;

fn record(recorder: &Recorder, method: Method, uri: &Uri, headers: HeaderMap) {
    recorder.lock().unwrap().push(RecordedRequest {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(|q| q.to_string()),
        headers,
    });
}

async fn rest_root(
    State(recorder): State<Recorder>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> impl IntoResponse {
    record(&recorder, method, &uri, headers);
    Json(json!({ "swagger": "2.0" }))
}

async fn table_rows(
    State(recorder): State<Recorder>,
    Path(table): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> axum::response::Response {
    record(&recorder, method, &uri, headers);

    let rows = match table.as_str() {
        "calls" => json!([
            { "id": "c1", "title": "Discovery call", "org_id": "org-1" },
            { "id": "c2", "title": "Demo", "org_id": "org-1" }
        ]),
        "empty" => json!([]),
        _ => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "relation does not exist" })),
            )
                .into_response()
        }
    };

    let total = rows.as_array().map(|r| r.len()).unwrap_or(0);
    let range = if total == 0 {
        "*/0".to_string()
    } else {
        format!("0-{}/{}", total - 1, total)
    };

    ([("content-range", range)], Json(rows)).into_response()
}
