//! Session lifecycle
//!
//! Holds the current identity and keeps the gateway's bearer slot and the
//! persisted token/display-name keys in step with it. Login is the only
//! operation that creates a session; logout destroys it without any server
//! round-trip.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::gateway::ApiGateway;
use crate::store::{PreferenceStore, KEY_TOKEN, KEY_USERNAME};

/// Current identity; exists iff logged in
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub username: String,
}

/// Login/logout state machine backed by the preference store
pub struct SessionStore {
    gateway: Arc<ApiGateway>,
    store: Arc<PreferenceStore>,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Create a session store wired to the gateway and preference store
    pub fn new(gateway: Arc<ApiGateway>, store: Arc<PreferenceStore>) -> Self {
        Self {
            gateway,
            store,
            current: RwLock::new(None),
        }
    }

    /// Reload a persisted identity at startup
    ///
    /// Returns the restored session when both keys are present; an
    /// incomplete pair (token without name or vice versa) restores nothing.
    pub async fn restore(&self) -> Result<Option<Session>> {
        let token: Option<String> = self.store.load(KEY_TOKEN).await?;
        let username: Option<String> = self.store.load(KEY_USERNAME).await?;

        let session = match (token, username) {
            (Some(token), Some(username)) => Session { token, username },
            _ => return Ok(None),
        };

        self.gateway.set_token(Some(session.token.clone())).await;
        *self.current.write().await = Some(session.clone());

        tracing::info!(username = %session.username, "Session restored");
        Ok(Some(session))
    }

    /// Authenticate against the backend and persist the identity
    ///
    /// On failure nothing changes: the token slot stays unset and no key
    /// is written.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let response = self.gateway.login(username, password).await?;

        let session = Session {
            token: response.token,
            username: response.username,
        };

        self.gateway.set_token(Some(session.token.clone())).await;
        self.store.save(KEY_TOKEN, &session.token).await?;
        self.store.save(KEY_USERNAME, &session.username).await?;
        *self.current.write().await = Some(session.clone());

        tracing::info!(username = %session.username, "Logged in");
        Ok(session)
    }

    /// Destroy the session immediately and unconditionally
    ///
    /// In-memory state and the gateway slot are cleared before the persisted
    /// keys are removed; in-flight requests failing authorization afterwards
    /// is acceptable.
    pub async fn logout(&self) -> Result<()> {
        *self.current.write().await = None;
        self.gateway.set_token(None).await;

        self.store.delete(KEY_TOKEN).await?;
        self.store.delete(KEY_USERNAME).await?;

        tracing::info!("Logged out");
        Ok(())
    }

    /// Current session snapshot
    pub async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    /// True when a session exists
    pub async fn is_logged_in(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Display name of the current session
    pub async fn username(&self) -> Option<String> {
        self.current.read().await.as_ref().map(|s| s.username.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayConfig;
    use tempfile::TempDir;

    fn fixture(dir: &TempDir) -> (Arc<ApiGateway>, Arc<PreferenceStore>) {
        let gateway =
            Arc::new(ApiGateway::new(GatewayConfig::new("http://localhost:5000/api")).unwrap());
        let store = Arc::new(PreferenceStore::new(dir.path()).unwrap());
        (gateway, store)
    }

    #[tokio::test]
    async fn test_restore_from_persisted_keys() {
        let temp_dir = TempDir::new().unwrap();
        let (gateway, store) = fixture(&temp_dir);

        store.save(KEY_TOKEN, &"tok-1").await.unwrap();
        store.save(KEY_USERNAME, &"admin").await.unwrap();

        let sessions = SessionStore::new(gateway.clone(), store);
        let restored = sessions.restore().await.unwrap().unwrap();

        assert_eq!(restored.username, "admin");
        assert_eq!(gateway.token().await.as_deref(), Some("tok-1"));
        assert!(sessions.is_logged_in().await);
    }

    #[tokio::test]
    async fn test_restore_without_keys_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let (gateway, store) = fixture(&temp_dir);

        let sessions = SessionStore::new(gateway.clone(), store);
        assert!(sessions.restore().await.unwrap().is_none());
        assert!(!gateway.has_token().await);
    }

    #[tokio::test]
    async fn test_incomplete_pair_restores_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let (gateway, store) = fixture(&temp_dir);

        store.save(KEY_TOKEN, &"orphan").await.unwrap();

        let sessions = SessionStore::new(gateway, store);
        assert!(sessions.restore().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let temp_dir = TempDir::new().unwrap();
        let (gateway, store) = fixture(&temp_dir);

        store.save(KEY_TOKEN, &"tok-2").await.unwrap();
        store.save(KEY_USERNAME, &"admin").await.unwrap();

        let sessions = SessionStore::new(gateway.clone(), store.clone());
        sessions.restore().await.unwrap();

        sessions.logout().await.unwrap();

        assert!(!sessions.is_logged_in().await);
        assert!(!gateway.has_token().await);
        assert!(!store.exists(KEY_TOKEN));
        assert!(!store.exists(KEY_USERNAME));
    }
}
