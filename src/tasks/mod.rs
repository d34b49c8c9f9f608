//! Scheduled sync task management
//!
//! The server owns the schedule. Every mutation round-trips: create and
//! delete re-list afterwards so the local snapshot always mirrors what the
//! scheduler actually holds, never an optimistic guess. Deletion asks for
//! confirmation first and sends nothing when declined.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::gateway::ApiGateway;
use crate::models::{ScheduledTask, SyncMode, TaskSpec};
use crate::notify::NotificationCenter;

/// Outcome of a confirm-gated delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Server acknowledged the removal
    Deleted(String),
    /// User declined; no request was sent
    Declined,
}

/// Parse an interval argument into whole hours
///
/// Rejects zero, negatives, and fractional values before anything reaches
/// the server.
pub fn parse_interval_hours(raw: &str) -> Result<u32> {
    let value: u32 = raw
        .trim()
        .parse()
        .map_err(|_| Error::invalid_input(format!("invalid sync interval '{raw}': expected a whole number of hours")))?;

    if value == 0 {
        return Err(Error::invalid_input("sync interval must be at least 1 hour"));
    }

    Ok(value)
}

/// Client surface over the server-side task scheduler
pub struct TaskScheduler {
    gateway: Arc<ApiGateway>,
    notify: NotificationCenter,
    tasks: Arc<RwLock<Vec<ScheduledTask>>>,
}

impl TaskScheduler {
    /// Create a scheduler surface over the gateway
    pub fn new(gateway: Arc<ApiGateway>, notify: NotificationCenter) -> Self {
        Self {
            gateway,
            notify,
            tasks: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Fetch the schedule and replace the local snapshot wholesale
    pub async fn refresh(&self) -> Result<Vec<ScheduledTask>> {
        let tasks = self.gateway.list_tasks().await?;
        *self.tasks.write().await = tasks.clone();
        tracing::debug!(count = tasks.len(), "Task list refreshed");
        Ok(tasks)
    }

    /// Last fetched schedule
    pub async fn tasks(&self) -> Vec<ScheduledTask> {
        self.tasks.read().await.clone()
    }

    /// Create a recurring sync task and re-list
    pub async fn add(&self, channel: &str, mode: SyncMode, interval_hours: u32) -> Result<Vec<ScheduledTask>> {
        if channel.trim().is_empty() {
            return Err(Error::invalid_input("channel must not be empty"));
        }
        if interval_hours == 0 {
            return Err(Error::invalid_input("sync interval must be at least 1 hour"));
        }

        let spec = TaskSpec {
            channel: channel.trim().to_string(),
            mode,
            interval_hours,
        };
        let ack = self.gateway.add_task(&spec).await?;
        self.notify.success(ack.message).await;

        self.refresh().await
    }

    /// Delete a task after user confirmation
    ///
    /// Declining resolves to `Declined` without issuing any request.
    pub async fn delete(&self, id: &str) -> Result<DeleteOutcome> {
        let confirmed = self
            .notify
            .confirm("Delete task", format!("Delete scheduled task {id}? This cannot be undone."))
            .await;
        if !confirmed {
            tracing::debug!(id, "Task deletion declined");
            return Ok(DeleteOutcome::Declined);
        }

        let ack = self.gateway.delete_task(id).await?;
        self.notify.success(ack.message.clone()).await;
        self.refresh().await?;

        Ok(DeleteOutcome::Deleted(ack.message))
    }
}

// ============================================================================
// Tests
// ============================================================================
