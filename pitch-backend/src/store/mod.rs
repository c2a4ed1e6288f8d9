//! Client factory for the hosted data store (Supabase PostgREST).
//!
//! Two authorization contexts come out of [`StoreClientFactory`]:
//!
//! - **admin**: authenticated with the service-role secret. Bypasses the
//!   store's row-level security; for backend-owned reads and writes only.
//! - **scoped**: forwards a caller's bearer token on every request so the
//!   store's row-level security decides what the caller can see.
//!
//! The factory makes no authorization decisions of its own. Forwarded tokens
//! are not verified locally; the store is the only enforcement point.

mod extract;
mod query;

pub use extract::ScopedStore;
pub use query::{parse_content_range, TableQuery};

use crate::config::StoreConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder};
use secrecy::{ExposeSecret, Secret};
use service_core::error::AppError;
use service_core::observability::inject_trace_context;
use std::sync::Arc;
use thiserror::Error;

pub const API_KEY_HEADER: &str = "apikey";
const REST_PATH: &str = "/rest/v1";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid data store configuration: {0}")]
    Config(String),

    #[error("Invalid bearer token: {0}")]
    InvalidToken(String),

    #[error("Request to data store failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Data store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Record not found")]
    NotFound,

    #[error("Unexpected data store response: {0}")]
    Decode(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Config(msg) => AppError::Configuration(msg),
            StoreError::InvalidToken(msg) => AppError::InvalidArgument(msg),
            StoreError::NotFound => AppError::NotFound("Record not found".to_string()),
            other => AppError::upstream("Data store request failed", other),
        }
    }
}

/// Which credentials a handle carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Admin,
    Scoped,
}

/// Client-side auth session behaviour. Handles are short-lived and never hold
/// an interactive session, so both are always off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub persist_session: bool,
    pub auto_refresh_token: bool,
}

impl SessionOptions {
    pub const STATELESS: SessionOptions = SessionOptions {
        persist_session: false,
        auto_refresh_token: false,
    };
}

/// Builds [`StoreHandle`]s. Cheap to clone; the HTTP connection pool is shared.
#[derive(Clone)]
pub struct StoreClientFactory {
    http: Client,
    rest_url: Arc<str>,
    service_key: HeaderValue,
    service_authorization: HeaderValue,
    scoped_api_key: HeaderValue,
}

impl StoreClientFactory {
    /// Validate the store settings and build the shared HTTP client.
    ///
    /// Runs at startup so a misconfigured deployment never serves traffic.
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        if config.url.trim().is_empty() {
            return Err(StoreError::Config("SUPABASE_URL is empty".to_string()));
        }
        if config.service_key.expose_secret().trim().is_empty() {
            return Err(StoreError::Config(
                "SUPABASE_SERVICE_KEY is empty".to_string(),
            ));
        }
        if let Some(anon_key) = &config.anon_key {
            if anon_key.expose_secret().trim().is_empty() {
                return Err(StoreError::Config("SUPABASE_ANON_KEY is empty".to_string()));
            }
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build HTTP client: {}", e)))?;

        let service_key = secret_header(&config.service_key, "SUPABASE_SERVICE_KEY")?;
        let service_authorization = secret_header(
            &Secret::new(format!("Bearer {}", config.service_key.expose_secret())),
            "SUPABASE_SERVICE_KEY",
        )?;
        let scoped_api_key = secret_header(config.scoped_api_key(), "SUPABASE_ANON_KEY")?;

        if config.anon_key.is_none() {
            tracing::warn!(
                "SUPABASE_ANON_KEY not set; scoped data store requests will send the service key as apikey"
            );
        }

        Ok(Self {
            http,
            rest_url: Arc::from(format!("{}{}", config.url.trim_end_matches('/'), REST_PATH)),
            service_key,
            service_authorization,
            scoped_api_key,
        })
    }

    /// Privileged handle bound to the service-role secret.
    pub fn admin(&self) -> StoreHandle {
        StoreHandle {
            http: self.http.clone(),
            rest_url: self.rest_url.clone(),
            api_key: self.service_key.clone(),
            authorization: self.service_authorization.clone(),
            kind: HandleKind::Admin,
            session: SessionOptions::STATELESS,
        }
    }

    /// Handle that forwards `bearer_token` as `Authorization: Bearer <token>`
    /// on every request.
    ///
    /// Rejects empty tokens and tokens that could not be sent as a single
    /// header value rather than degrading to unauthenticated access.
    pub fn scoped(&self, bearer_token: &str) -> Result<StoreHandle, StoreError> {
        let authorization = bearer_header(bearer_token)?;

        Ok(StoreHandle {
            http: self.http.clone(),
            rest_url: self.rest_url.clone(),
            api_key: self.scoped_api_key.clone(),
            authorization,
            kind: HandleKind::Scoped,
            session: SessionOptions::STATELESS,
        })
    }
}

impl std::fmt::Debug for StoreClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClientFactory")
            .field("rest_url", &self.rest_url)
            .finish_non_exhaustive()
    }
}

/// A data store client in one fixed authorization context.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    http: Client,
    rest_url: Arc<str>,
    api_key: HeaderValue,
    authorization: HeaderValue,
    kind: HandleKind,
    session: SessionOptions,
}

impl StoreHandle {
    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    pub fn session_options(&self) -> SessionOptions {
        self.session
    }

    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    /// Start a query against `table`.
    pub fn table(&self, table: &str) -> TableQuery<'_> {
        TableQuery::new(self, table)
    }

    /// Headers attached to every request issued through this handle.
    pub fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, self.api_key.clone());
        headers.insert(AUTHORIZATION, self.authorization.clone());
        headers
    }

    pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut headers = self.auth_headers();
        inject_trace_context(&mut headers);
        self.http.request(method, url).headers(headers)
    }

    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(kind = ?self.kind, "Data store request failed: {}", e);
            StoreError::Request(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(
            kind = ?self.kind,
            status = status.as_u16(),
            "Data store rejected request: {}",
            body
        );
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// Round trip to the REST root; used by the readiness check.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        let url = format!("{}/", self.rest_url);
        self.send(self.request(Method::HEAD, &url)).await.map(|_| ())
    }
}

fn secret_header(secret: &Secret<String>, name: &str) -> Result<HeaderValue, StoreError> {
    let mut value = HeaderValue::from_str(secret.expose_secret())
        .map_err(|_| StoreError::Config(format!("{} contains invalid characters", name)))?;
    value.set_sensitive(true);
    Ok(value)
}

fn bearer_header(token: &str) -> Result<HeaderValue, StoreError> {
    if token.trim().is_empty() {
        return Err(StoreError::InvalidToken(
            "bearer token must not be empty".to_string(),
        ));
    }

    if !token.chars().all(|c| c.is_ascii_graphic()) {
        return Err(StoreError::InvalidToken(
            "bearer token must be printable ASCII without whitespace".to_string(),
        ));
    }

    let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| StoreError::InvalidToken("bearer token is not a valid header value".to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}
