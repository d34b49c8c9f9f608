//! Sync job orchestration
//!
//! Starts sync jobs and watches them to completion. Each job moves
//! Idle → Running → Idle: starting issues a single POST, then a background
//! chain polls the status endpoint at a fixed interval until the server
//! reports `running = false`, at which point the chain stops and triggers
//! exactly one dashboard refresh.
//!
//! Every chain captures a generation token at start. Starting a new sync
//! (or cancelling) bumps the counter, so a superseded chain notices at its
//! next tick and exits without applying anything; a result already in
//! flight is discarded by re-checking the token before it is applied. A
//! transport failure while polling halts the chain without retry and lands
//! in the orchestrator's last-error slot.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};

use crate::dashboard::DashboardAggregator;
use crate::error::Result;
use crate::gateway::ApiGateway;
use crate::models::{Ack, SyncMode, SyncScope};

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for sync polling
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Interval between status checks
    pub poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
        }
    }
}

impl SyncConfig {
    /// Set poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

// ============================================================================
// Job State
// ============================================================================

/// The job currently being watched
#[derive(Debug, Clone)]
pub struct SyncJob {
    /// One channel or every channel
    pub scope: SyncScope,

    /// Full or incremental
    pub mode: SyncMode,

    /// Latest status message from the server
    pub message: String,

    /// When the job was started
    pub started_at: DateTime<Utc>,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Starts sync jobs and polls them to completion
pub struct SyncOrchestrator {
    config: SyncConfig,
    gateway: Arc<ApiGateway>,
    dashboard: Arc<DashboardAggregator>,

    /// Present while a job is being watched, None when idle
    job: Arc<RwLock<Option<SyncJob>>>,

    /// Token invalidating superseded poll chains
    generation: Arc<AtomicU64>,

    /// Failure that halted the most recent poll chain, if one did
    last_error: Arc<RwLock<Option<String>>>,

    /// Teardown signal for every chain
    shutdown: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl SyncOrchestrator {
    /// Create an orchestrator wired to the gateway and dashboard
    pub fn new(
        config: SyncConfig,
        gateway: Arc<ApiGateway>,
        dashboard: Arc<DashboardAggregator>,
    ) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);

        Self {
            config,
            gateway,
            dashboard,
            job: Arc::new(RwLock::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
            last_error: Arc::new(RwLock::new(None)),
            shutdown,
            shutdown_rx,
        }
    }

    /// Start a sync job and begin watching it
    ///
    /// Issues one POST; on acceptance the previous poll chain (if any) is
    /// superseded and a new one begins. A rejected start leaves any running
    /// chain untouched and propagates the error to the caller.
    pub async fn start_sync(&self, scope: SyncScope, mode: SyncMode) -> Result<Ack> {
        let ack = match &scope {
            SyncScope::All => self.gateway.start_sync_all(mode == SyncMode::Full).await?,
            SyncScope::Channel(id) => self.gateway.start_sync_channel(id, mode).await?,
        };

        let my_gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        *self.job.write().await = Some(SyncJob {
            scope: scope.clone(),
            mode,
            message: ack.message.clone(),
            started_at: Utc::now(),
        });
        *self.last_error.write().await = None;

        tracing::info!(scope = %scope, mode = %mode, generation = my_gen, "Sync started");
        self.spawn_poll_chain(my_gen);

        Ok(ack)
    }

    /// Invalidate the active poll chain and forget the watched job
    ///
    /// Called on logout; the chain exits at its next tick without issuing
    /// another request.
    pub async fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.job.write().await = None;
        tracing::debug!("Sync polling cancelled");
    }

    /// Tear down every chain permanently
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// The job currently being watched
    pub async fn current_job(&self) -> Option<SyncJob> {
        self.job.read().await.clone()
    }

    /// True while a job is being watched
    pub async fn is_running(&self) -> bool {
        self.job.read().await.is_some()
    }

    /// Failure that halted the most recent poll chain, if one did
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    /// Current generation token
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Wait until the watched job completes or the chain halts
    ///
    /// Returns immediately when idle. Intended for callers that started a
    /// sync and want to block on its terminal state.
    pub async fn wait_idle(&self) {
        let mut probe = tokio::time::interval(self.config.poll_interval / 4);
        loop {
            probe.tick().await;
            if self.job.read().await.is_none() {
                return;
            }
            if self.last_error.read().await.is_some() {
                return;
            }
        }
    }

    fn spawn_poll_chain(&self, my_gen: u64) {
        let gateway = Arc::clone(&self.gateway);
        let dashboard = Arc::clone(&self.dashboard);
        let job = Arc::clone(&self.job);
        let generation = Arc::clone(&self.generation);
        let last_error = Arc::clone(&self.last_error);
        let mut shutdown_rx = self.shutdown_rx.clone();
        let poll_interval = self.config.poll_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            // The first tick completes immediately; consume it so the
            // first status check lands one interval after the start
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // Superseded chains exit before issuing a request
                        if generation.load(Ordering::SeqCst) != my_gen {
                            tracing::debug!(generation = my_gen, "Poll chain superseded");
                            break;
                        }

                        let status = match gateway.sync_status().await {
                            Ok(status) => status,
                            Err(e) => {
                                if generation.load(Ordering::SeqCst) == my_gen {
                                    *last_error.write().await = Some(e.to_string());
                                    *job.write().await = None;
                                }
                                tracing::debug!(error = %e, "Poll chain halted");
                                break;
                            }
                        };

                        // A newer chain may have started while the request
                        // was in flight; its state wins, ours is stale
                        if generation.load(Ordering::SeqCst) != my_gen {
                            tracing::debug!(generation = my_gen, "Discarding stale poll result");
                            break;
                        }

                        if status.running {
                            if let Some(job) = job.write().await.as_mut() {
                                job.message = status.message;
                            }
                            continue;
                        }

                        // First running=false observation: job is done
                        *job.write().await = None;
                        tracing::info!(message = %status.message, "Sync completed");

                        if let Err(e) = dashboard.refresh().await {
                            tracing::debug!(error = %e, "Post-sync dashboard refresh failed");
                        }
                        break;
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::debug!("Poll chain shut down");
                        break;
                    }
                }
            }
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayConfig;

    fn fixture() -> SyncOrchestrator {
        let gateway =
            Arc::new(ApiGateway::new(GatewayConfig::new("http://localhost:5000/api")).unwrap());
        let dashboard = Arc::new(DashboardAggregator::new(Arc::clone(&gateway)));
        SyncOrchestrator::new(SyncConfig::default(), gateway, dashboard)
    }

    #[test]
    fn test_default_poll_interval() {
        assert_eq!(SyncConfig::default().poll_interval, Duration::from_millis(2000));
    }

    #[test]
    fn test_config_builder() {
        let config = SyncConfig::default().with_poll_interval(Duration::from_millis(50));
        assert_eq!(config.poll_interval, Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_starts_idle() {
        let orchestrator = fixture();
        assert!(!orchestrator.is_running().await);
        assert!(orchestrator.current_job().await.is_none());
        assert!(orchestrator.last_error().await.is_none());
        assert_eq!(orchestrator.generation(), 0);
    }

    #[tokio::test]
    async fn test_cancel_bumps_generation() {
        let orchestrator = fixture();
        let before = orchestrator.generation();

        orchestrator.cancel().await;

        assert_eq!(orchestrator.generation(), before + 1);
        assert!(!orchestrator.is_running().await);
    }

    #[tokio::test]
    async fn test_wait_idle_returns_when_no_job() {
        let orchestrator = fixture();
        // Must not hang when nothing is being watched
        orchestrator.wait_idle().await;
    }
}
