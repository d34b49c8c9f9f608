//! Activity-log viewing
//!
//! Read-only window over the backend's sync/transfer log. The viewer keeps
//! the last successful snapshot together with the active filter, so a
//! failed refresh leaves the previous entries on screen and records the
//! failure instead of blanking the view. Clearing the log is destructive
//! and therefore confirm-gated.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::gateway::ApiGateway;
use crate::models::{LogEntry, LogKind};
use crate::notify::NotificationCenter;

/// Active log filter
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFilter {
    /// Maximum number of entries to fetch
    pub limit: Option<u32>,
    /// Restrict to one entry kind
    pub kind: Option<LogKind>,
}

/// Outcome of a confirm-gated log wipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    /// Server acknowledged the wipe
    Cleared(String),
    /// User declined; no request was sent
    Declined,
}

/// Viewer over the backend activity log
pub struct LogViewer {
    gateway: Arc<ApiGateway>,
    notify: NotificationCenter,
    entries: Arc<RwLock<Vec<LogEntry>>>,
    filter: Arc<RwLock<LogFilter>>,
    last_error: Arc<RwLock<Option<String>>>,
}

impl LogViewer {
    /// Create a viewer over the gateway
    pub fn new(gateway: Arc<ApiGateway>, notify: NotificationCenter) -> Self {
        Self {
            gateway,
            notify,
            entries: Arc::new(RwLock::new(Vec::new())),
            filter: Arc::new(RwLock::new(LogFilter::default())),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Fetch entries under a new filter and replace the snapshot
    ///
    /// On failure the previous snapshot stays in place and the error is
    /// recorded before being returned.
    pub async fn fetch(&self, limit: Option<u32>, kind: Option<LogKind>) -> Result<Vec<LogEntry>> {
        *self.filter.write().await = LogFilter { limit, kind };
        self.refresh().await
    }

    /// Re-fetch under the active filter
    pub async fn refresh(&self) -> Result<Vec<LogEntry>> {
        let filter = *self.filter.read().await;

        match self.gateway.fetch_logs(filter.limit, filter.kind).await {
            Ok(entries) => {
                *self.entries.write().await = entries.clone();
                *self.last_error.write().await = None;
                tracing::debug!(count = entries.len(), "Log entries refreshed");
                Ok(entries)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Log refresh failed");
                *self.last_error.write().await = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Last fetched entries
    pub async fn entries(&self) -> Vec<LogEntry> {
        self.entries.read().await.clone()
    }

    /// Active filter
    pub async fn filter(&self) -> LogFilter {
        *self.filter.read().await
    }

    /// Most recent refresh failure, if any
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    /// Wipe the server-side log after user confirmation
    ///
    /// Declining resolves to `Declined` without issuing any request.
    pub async fn clear(&self) -> Result<ClearOutcome> {
        let confirmed = self
            .notify
            .confirm("Clear logs", "Delete all log entries? This cannot be undone.")
            .await;
        if !confirmed {
            tracing::debug!("Log wipe declined");
            return Ok(ClearOutcome::Declined);
        }

        let ack = self.gateway.clear_logs().await?;
        self.notify.success(ack.message.clone()).await;

        // The wipe itself succeeded; a failed follow-up read only records
        if let Err(e) = self.refresh().await {
            tracing::debug!(error = %e, "Refresh after log wipe failed");
        }

        Ok(ClearOutcome::Cleared(ack.message))
    }
}

// ============================================================================
// Tests
// ============================================================================
