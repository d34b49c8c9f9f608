//! API gateway for the backend crawler/indexer
//!
//! This module provides the single request path every component goes
//! through: it attaches the bearer credential when one is present, parses
//! the response body as JSON regardless of status, and turns non-success
//! responses into typed errors carrying the server's `error` text.
//!
//! Every call is a single attempt. Failures propagate to the caller, which
//! decides whether to surface them or record them as background errors.

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{
    Ack, Channel, DashboardSummary, LogEntry, LogKind, LoginResponse, PageInfo, Resource,
    ResourcePage, ScheduledTask, SyncAllRequest, SyncChannelRequest, SyncMode, SyncStatus,
    TaskSpec,
};

// ============================================================================
// Gateway Configuration
// ============================================================================

/// Configuration for the API gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the backend API
    pub base_url: String,

    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

impl GatewayConfig {
    /// Create a new gateway config
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            user_agent: format!("capstan/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

// ============================================================================
// Request Payloads and Response Envelopes
// ============================================================================

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct TransferRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChannelsResponse {
    channels: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct TasksResponse {
    tasks: Vec<ScheduledTask>,
}

#[derive(Debug, Deserialize)]
struct LogsResponse {
    logs: Vec<LogEntry>,
}

/// Browse-mode result envelope
#[derive(Debug, Deserialize)]
struct BrowseResponse {
    #[serde(default = "default_page")]
    page: u32,
    total: u64,
    total_pages: u32,
    resources: Vec<Resource>,
}

fn default_page() -> u32 {
    1
}

/// Search-mode result envelope
#[derive(Debug, Deserialize)]
struct SearchResponse {
    count: u64,
    resources: Vec<Resource>,
}

// ============================================================================
// API Gateway
// ============================================================================

/// Gateway executing requests against the backend API
pub struct ApiGateway {
    config: GatewayConfig,
    http_client: Client,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiGateway {
    /// Create a new gateway
    pub fn new(config: GatewayConfig) -> Result<Self, ApiError> {
        url::Url::parse(&config.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        let http_client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            config,
            http_client,
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Set the bearer credential attached to subsequent requests
    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    /// Current bearer credential, if any
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// True when a credential is present
    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    // ------------------------------------------------------------------
    // Typed endpoint wrappers
    // ------------------------------------------------------------------

    /// Authenticate and obtain a credential token
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        self.request(
            Method::POST,
            "/auth/login",
            Some(&LoginRequest { username, password }),
        )
        .await
    }

    /// Fetch the dashboard summary
    pub async fn dashboard(&self) -> Result<DashboardSummary, ApiError> {
        self.request::<(), _>(Method::GET, "/dashboard", None).await
    }

    /// Fetch the channel list
    pub async fn channels(&self) -> Result<Vec<Channel>, ApiError> {
        let response: ChannelsResponse = self.request::<(), _>(Method::GET, "/channels", None).await?;
        Ok(response.channels)
    }

    /// Fetch one page of resources without a query (browse mode)
    pub async fn browse_resources(
        &self,
        channel: Option<&str>,
        page: u32,
        per_page: u32,
    ) -> Result<ResourcePage, ApiError> {
        let mut params = vec![("page", page.to_string()), ("per_page", per_page.to_string())];
        if let Some(channel) = channel {
            params.push(("channel", channel.to_string()));
        }

        let builder = self
            .http_client
            .get(self.endpoint("/search"))
            .query(&params);
        let response: BrowseResponse = self.execute(builder).await?;

        Ok(ResourcePage {
            resources: response.resources,
            info: PageInfo::Browse {
                page: response.page,
                total_pages: response.total_pages,
                total: response.total,
            },
        })
    }

    /// Fetch matching resources for a free-text query (search mode)
    pub async fn search_resources(
        &self,
        query: &str,
        channel: Option<&str>,
    ) -> Result<ResourcePage, ApiError> {
        let mut params = vec![("q", query.to_string())];
        if let Some(channel) = channel {
            params.push(("channel", channel.to_string()));
        }

        let builder = self
            .http_client
            .get(self.endpoint("/search"))
            .query(&params);
        let response: SearchResponse = self.execute(builder).await?;

        Ok(ResourcePage {
            resources: response.resources,
            info: PageInfo::Search {
                count: response.count,
            },
        })
    }

    /// Start a sync across every channel
    pub async fn start_sync_all(&self, full: bool) -> Result<Ack, ApiError> {
        self.request(Method::POST, "/sync/all", Some(&SyncAllRequest { full }))
            .await
    }

    /// Start a single-channel sync
    pub async fn start_sync_channel(
        &self,
        channel: &str,
        mode: SyncMode,
    ) -> Result<Ack, ApiError> {
        self.request(
            Method::POST,
            "/sync",
            Some(&SyncChannelRequest {
                channel: channel.to_string(),
                mode,
            }),
        )
        .await
    }

    /// Fetch the current sync status
    pub async fn sync_status(&self) -> Result<SyncStatus, ApiError> {
        self.request::<(), _>(Method::GET, "/sync/status", None)
            .await
    }

    /// Fetch the full scheduled-task set
    pub async fn list_tasks(&self) -> Result<Vec<ScheduledTask>, ApiError> {
        let response: TasksResponse = self.request::<(), _>(Method::GET, "/tasks", None).await?;
        Ok(response.tasks)
    }

    /// Create a scheduled task
    pub async fn add_task(&self, spec: &TaskSpec) -> Result<Ack, ApiError> {
        self.request(Method::POST, "/tasks", Some(spec)).await
    }

    /// Delete a scheduled task
    pub async fn delete_task(&self, id: &str) -> Result<Ack, ApiError> {
        self.request::<(), _>(Method::DELETE, &format!("/tasks/{id}"), None)
            .await
    }

    /// Fetch activity-log entries
    pub async fn fetch_logs(
        &self,
        limit: Option<u32>,
        kind: Option<LogKind>,
    ) -> Result<Vec<LogEntry>, ApiError> {
        let mut params = Vec::new();
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(kind) = kind {
            params.push(("type", kind.as_str().to_string()));
        }

        let builder = self.http_client.get(self.endpoint("/logs")).query(&params);
        let response: LogsResponse = self.execute(builder).await?;
        Ok(response.logs)
    }

    /// Clear the activity log
    pub async fn clear_logs(&self) -> Result<Ack, ApiError> {
        self.request::<(), _>(Method::DELETE, "/logs", None).await
    }

    /// Ask the backend to transfer a resource into cloud storage
    pub async fn transfer(&self, url: &str) -> Result<Ack, ApiError> {
        self.request(Method::POST, "/transfer", Some(&TransferRequest { url }))
            .await
    }

    // ------------------------------------------------------------------
    // Request execution
    // ------------------------------------------------------------------

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Build and execute a request with an optional JSON body
    async fn request<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let mut builder = self.http_client.request(method, self.endpoint(path));
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.execute(builder).await
    }

    /// Single-attempt execution: attach credential, send, decode
    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let builder = match self.token().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            // The body is still JSON on errors; pull the server's own text
            let message = serde_json::from_slice::<serde_json::Value>(&bytes)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or_else(|| String::from("request failed"));

            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

// ============================================================================
// Gateway Errors
// ============================================================================

/// Request execution errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport failure (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success response from the backend
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Success response whose body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Malformed base URL at construction
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Create a server rejection error
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// HTTP status of a server rejection, if this is one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the backend rejected the credential
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Server { status: 401 | 403, .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_config_creation() {
        let config = GatewayConfig::new("http://localhost:5000/api");

        assert_eq!(config.base_url, "http://localhost:5000/api");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_gateway_config_builders() {
        let config = GatewayConfig::new("http://localhost:5000/api")
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("capstan-test");

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "capstan-test");
    }

    #[test]
    fn test_gateway_creation() {
        let gateway = ApiGateway::new(GatewayConfig::new("http://localhost:5000/api"));
        assert!(gateway.is_ok());
    }

    #[test]
    fn test_gateway_rejects_bad_url() {
        let gateway = ApiGateway::new(GatewayConfig::new("not a url"));
        assert!(matches!(gateway, Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_is_auth() {
        assert!(ApiError::server(401, "missing token").is_auth());
        assert!(ApiError::server(403, "forbidden").is_auth());
        assert!(!ApiError::server(400, "bad request").is_auth());
        assert!(!ApiError::server(500, "boom").is_auth());
    }

    #[tokio::test]
    async fn test_token_slot() {
        let gateway = ApiGateway::new(GatewayConfig::new("http://localhost:5000/api")).unwrap();
        assert!(!gateway.has_token().await);

        gateway.set_token(Some("abc".to_string())).await;
        assert_eq!(gateway.token().await.as_deref(), Some("abc"));

        gateway.set_token(None).await;
        assert!(!gateway.has_token().await);
    }
}
