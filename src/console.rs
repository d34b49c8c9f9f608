//! Console facade
//!
//! Owns one instance of every component, wired to a shared gateway and
//! preference store, and implements the flows that span more than one of
//! them: startup restoration, login with the follow-up dashboard refresh,
//! logout with poll teardown, and resource transfer.

use std::sync::Arc;

use crate::browse::{BrowserConfig, SearchBrowser};
use crate::config::Config;
use crate::dashboard::DashboardAggregator;
use crate::error::{Error, Result};
use crate::gateway::{ApiGateway, GatewayConfig};
use crate::history::HistoryStore;
use crate::logs::LogViewer;
use crate::models::Ack;
use crate::notify::NotificationCenter;
use crate::session::{Session, SessionStore};
use crate::store::PreferenceStore;
use crate::sync::{SyncConfig, SyncOrchestrator};
use crate::tasks::TaskScheduler;

/// Wired-up component set behind the CLI
pub struct Console {
    pub config: Config,
    pub gateway: Arc<ApiGateway>,
    pub store: Arc<PreferenceStore>,
    pub session: SessionStore,
    pub history: Arc<HistoryStore>,
    pub notify: NotificationCenter,
    pub dashboard: Arc<DashboardAggregator>,
    pub sync: SyncOrchestrator,
    pub browser: SearchBrowser,
    pub tasks: TaskScheduler,
    pub logs: LogViewer,
}

impl Console {
    /// Build every component from a validated configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let gateway = Arc::new(ApiGateway::new(
            GatewayConfig::new(config.server.url.clone())
                .with_timeout(config.request_timeout())
                .with_user_agent(config.server.user_agent.clone()),
        )?);
        let store = Arc::new(PreferenceStore::new(&config.storage.data_dir)?);
        let history = Arc::new(HistoryStore::new(Arc::clone(&store)));
        let notify = NotificationCenter::new().with_toast_ttl(config.toast_ttl());
        let dashboard = Arc::new(DashboardAggregator::new(Arc::clone(&gateway)));

        let session = SessionStore::new(Arc::clone(&gateway), Arc::clone(&store));
        let sync = SyncOrchestrator::new(
            SyncConfig::default().with_poll_interval(config.poll_interval()),
            Arc::clone(&gateway),
            Arc::clone(&dashboard),
        );
        let browser = SearchBrowser::new(
            BrowserConfig::default().with_page_size(config.console.page_size),
            Arc::clone(&gateway),
            Arc::clone(&history),
        );
        let tasks = TaskScheduler::new(Arc::clone(&gateway), notify.clone());
        let logs = LogViewer::new(Arc::clone(&gateway), notify.clone());

        Ok(Self {
            config,
            gateway,
            store,
            session,
            history,
            notify,
            dashboard,
            sync,
            browser,
            tasks,
            logs,
        })
    }

    /// Restore persisted identity and search history
    ///
    /// With a restored session the dashboard is refreshed once up front;
    /// failures there are recorded in the aggregator's last-error slots and
    /// startup still completes, so the console works offline.
    pub async fn startup(&self) -> Result<Option<Session>> {
        let session = self.session.restore().await?;
        self.history.restore().await?;

        if session.is_some() {
            if let Err(e) = self.dashboard.refresh().await {
                tracing::debug!(error = %e, "Initial dashboard refresh failed");
            }
            if let Err(e) = self.dashboard.refresh_channels().await {
                tracing::debug!(error = %e, "Initial channel refresh failed");
            }
        }

        Ok(session)
    }

    /// Authenticate, persist the identity, and load the dashboard
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let session = self.session.login(username, password).await?;
        self.notify
            .success(format!("Logged in as {}", session.username))
            .await;

        if let Err(e) = self.dashboard.refresh().await {
            tracing::debug!(error = %e, "Post-login dashboard refresh failed");
        }
        if let Err(e) = self.dashboard.refresh_channels().await {
            tracing::debug!(error = %e, "Post-login channel refresh failed");
        }

        Ok(session)
    }

    /// Drop the session and halt any status polling
    pub async fn logout(&self) -> Result<()> {
        // Poll chains die before the identity they depend on
        self.sync.cancel().await;
        self.session.logout().await?;
        self.notify.info("Logged out").await;
        Ok(())
    }

    /// Ask the backend to transfer a resource link into cloud storage
    pub async fn transfer(&self, url: &str) -> Result<Ack> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::invalid_input("transfer url must not be empty"));
        }

        let ack = self.gateway.transfer(url).await?;
        self.notify.success(ack.message.clone()).await;
        Ok(ack)
    }

    /// Stop background activity before exit
    pub fn shutdown(&self) {
        self.sync.stop();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.storage.data_dir = dir.path().to_path_buf();
        config
    }

    #[tokio::test]
    async fn test_new_wires_components() {
        let dir = TempDir::new().unwrap();
        let console = Console::new(test_config(&dir)).unwrap();

        assert!(!console.session.is_logged_in().await);
        assert!(console.history.is_empty().await);
        assert!(console.sync.current_job().await.is_none());
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.server.url = String::from("not a url");

        assert!(Console::new(config).is_err());
    }

    #[tokio::test]
    async fn test_startup_without_persisted_state() {
        let dir = TempDir::new().unwrap();
        let console = Console::new(test_config(&dir)).unwrap();

        let session = console.startup().await.unwrap();
        assert!(session.is_none());
        assert!(console.history.is_empty().await);
        // No session, so no network was touched
        assert_eq!(console.dashboard.refresh_count(), 0);
    }

    #[tokio::test]
    async fn test_transfer_rejects_blank_url() {
        let dir = TempDir::new().unwrap();
        let console = Console::new(test_config(&dir)).unwrap();

        let err = console.transfer("   ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
