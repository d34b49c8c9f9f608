//! Recent search terms
//!
//! Bounded, deduplicated, most-recent-first list persisted through the
//! preference store after every mutation. Dedup is case-sensitive exact
//! match; re-adding an entry moves it to the front without growing the
//! list.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::store::{PreferenceStore, KEY_HISTORY};

/// Maximum retained entries; older ones are evicted beyond this
pub const MAX_ENTRIES: usize = 10;

/// Persisted list of recent search terms
pub struct HistoryStore {
    store: Arc<PreferenceStore>,
    entries: RwLock<Vec<String>>,
}

impl HistoryStore {
    /// Create an empty history backed by the preference store
    pub fn new(store: Arc<PreferenceStore>) -> Self {
        Self {
            store,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Reload the persisted list at startup
    pub async fn restore(&self) -> Result<()> {
        let persisted: Option<Vec<String>> = self.store.load(KEY_HISTORY).await?;
        if let Some(list) = persisted {
            *self.entries.write().await = list;
        }
        Ok(())
    }

    /// Record a search term at the front of the list
    pub async fn add(&self, query: &str) -> Result<()> {
        if query.is_empty() {
            return Ok(());
        }

        {
            let mut entries = self.entries.write().await;
            entries.retain(|e| e != query);
            entries.insert(0, query.to_string());
            entries.truncate(MAX_ENTRIES);
        }

        self.persist().await
    }

    /// Remove a single term
    pub async fn remove(&self, query: &str) -> Result<()> {
        {
            let mut entries = self.entries.write().await;
            entries.retain(|e| e != query);
        }

        self.persist().await
    }

    /// Drop every term
    pub async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        self.persist().await
    }

    /// Snapshot of the list, most recent first
    pub async fn entries(&self) -> Vec<String> {
        self.entries.read().await.clone()
    }

    /// Number of retained terms
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// True when no terms are retained
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn persist(&self) -> Result<()> {
        let entries = self.entries.read().await.clone();
        self.store.save(KEY_HISTORY, &entries).await
    }
}
