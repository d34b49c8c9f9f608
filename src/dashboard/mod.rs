//! Dashboard summary aggregation
//!
//! Read-only composition of the channel/resource/sync summary. Refreshes
//! are background reads: a failure is recorded in a per-source last-error
//! slot and the previous snapshot stays visible, so the console never
//! degrades below last-known-good data.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::gateway::ApiGateway;
use crate::models::{Channel, DashboardSummary};

/// Aggregated dashboard state with per-source error tracking
pub struct DashboardAggregator {
    gateway: Arc<ApiGateway>,

    /// Last-known-good summary
    summary: RwLock<DashboardSummary>,

    /// Last-known-good channel list
    channels: RwLock<Vec<Channel>>,

    /// Failure of the most recent summary refresh, if it failed
    last_summary_error: RwLock<Option<String>>,

    /// Failure of the most recent channel refresh, if it failed
    last_channels_error: RwLock<Option<String>>,

    /// When the summary was last successfully refreshed
    refreshed_at: RwLock<Option<DateTime<Utc>>>,

    /// Total refresh attempts
    refresh_count: AtomicU64,
}

impl DashboardAggregator {
    /// Create an aggregator wired to the gateway
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self {
            gateway,
            summary: RwLock::new(DashboardSummary::default()),
            channels: RwLock::new(Vec::new()),
            last_summary_error: RwLock::new(None),
            last_channels_error: RwLock::new(None),
            refreshed_at: RwLock::new(None),
            refresh_count: AtomicU64::new(0),
        }
    }

    /// Fetch the dashboard summary and replace the snapshot
    ///
    /// On failure the snapshot is left untouched and the error is recorded
    /// in the last-error slot; the caller decides whether to surface it.
    pub async fn refresh(&self) -> Result<DashboardSummary> {
        self.refresh_count.fetch_add(1, Ordering::Relaxed);

        match self.gateway.dashboard().await {
            Ok(summary) => {
                *self.summary.write().await = summary.clone();
                *self.last_summary_error.write().await = None;
                *self.refreshed_at.write().await = Some(Utc::now());

                tracing::debug!(
                    channels = summary.channels.len(),
                    total = summary.total_resources,
                    "Dashboard refreshed"
                );
                Ok(summary)
            }
            Err(e) => {
                *self.last_summary_error.write().await = Some(e.to_string());
                tracing::debug!(error = %e, "Dashboard refresh failed");
                Err(Error::Api(e))
            }
        }
    }

    /// Fetch the channel list and replace the snapshot
    pub async fn refresh_channels(&self) -> Result<Vec<Channel>> {
        match self.gateway.channels().await {
            Ok(channels) => {
                *self.channels.write().await = channels.clone();
                *self.last_channels_error.write().await = None;
                Ok(channels)
            }
            Err(e) => {
                *self.last_channels_error.write().await = Some(e.to_string());
                tracing::debug!(error = %e, "Channel refresh failed");
                Err(Error::Api(e))
            }
        }
    }

    /// Current summary snapshot
    pub async fn summary(&self) -> DashboardSummary {
        self.summary.read().await.clone()
    }

    /// Current channel-list snapshot
    pub async fn channel_list(&self) -> Vec<Channel> {
        self.channels.read().await.clone()
    }

    /// Error of the most recent summary refresh, if it failed
    pub async fn last_error(&self) -> Option<String> {
        self.last_summary_error.read().await.clone()
    }

    /// Error of the most recent channel refresh, if it failed
    pub async fn last_channels_error(&self) -> Option<String> {
        self.last_channels_error.read().await.clone()
    }

    /// When the summary was last successfully refreshed
    pub async fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        *self.refreshed_at.read().await
    }

    /// Total refresh attempts since construction
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count.load(Ordering::Relaxed)
    }
}
