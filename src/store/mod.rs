//! Local preference storage
//!
//! Persists the console's client-local state as one JSON file per key under
//! the data directory. Keys are independent of each other; a write replaces
//! the key's file atomically (temp file then rename) and a missing key reads
//! back as `None`. Nothing here talks to the backend.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Credential token key
pub const KEY_TOKEN: &str = "token";
/// Display name key
pub const KEY_USERNAME: &str = "username";
/// Theme preference key
pub const KEY_THEME: &str = "theme";
/// Sidebar-collapsed flag key
pub const KEY_SIDEBAR: &str = "sidebar_collapsed";
/// Search-history list key
pub const KEY_HISTORY: &str = "search_history";

/// Per-key JSON file store for client-local preferences
pub struct PreferenceStore {
    data_dir: PathBuf,
}

impl PreferenceStore {
    /// Create a store rooted at the given directory, creating it if missing
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
        })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{key}.json"))
    }

    /// Persist a value under a key
    pub async fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.key_path(key);
        let temp_path = self.data_dir.join(format!("{key}.json.tmp"));

        let content = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(&temp_path, &content).await?;

        // Rename so readers never observe a half-written file
        tokio::fs::rename(&temp_path, &path).await?;

        tracing::debug!(key, path = %path.display(), "Preference saved");
        Ok(())
    }

    /// Load a value by key; missing or unreadable keys read as `None`
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.key_path(key);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding unreadable preference file");
                Ok(None)
            }
        }
    }

    /// Remove a key; removing an absent key is not an error
    pub async fn delete(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(key, "Preference deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Check whether a key is present
    pub fn exists(&self, key: &str) -> bool {
        self.key_path(key).exists()
    }

    // ------------------------------------------------------------------
    // Typed helpers for the preference keys no component owns
    // ------------------------------------------------------------------

    /// Stored theme preference
    pub async fn theme(&self) -> Result<Option<String>> {
        self.load(KEY_THEME).await
    }

    /// Persist the theme preference
    pub async fn set_theme(&self, theme: &str) -> Result<()> {
        self.save(KEY_THEME, &theme).await
    }

    /// Stored sidebar-collapsed flag, defaulting to expanded
    pub async fn sidebar_collapsed(&self) -> Result<bool> {
        Ok(self.load(KEY_SIDEBAR).await?.unwrap_or(false))
    }

    /// Persist the sidebar-collapsed flag
    pub async fn set_sidebar_collapsed(&self, collapsed: bool) -> Result<()> {
        self.save(KEY_SIDEBAR, &collapsed).await
    }

    /// Get the data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = PreferenceStore::new(temp_dir.path()).unwrap();

        store.save(KEY_TOKEN, &"abc123").await.unwrap();

        let loaded: Option<String> = store.load(KEY_TOKEN).await.unwrap();
        assert_eq!(loaded.as_deref(), Some("abc123"));
        assert!(store.exists(KEY_TOKEN));
    }

    #[tokio::test]
    async fn test_missing_key_reads_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = PreferenceStore::new(temp_dir.path()).unwrap();

        let loaded: Option<String> = store.load("nonexistent").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = PreferenceStore::new(temp_dir.path()).unwrap();

        std::fs::write(temp_dir.path().join("theme.json"), "{ not json }").unwrap();

        let loaded: Option<String> = store.load(KEY_THEME).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = PreferenceStore::new(temp_dir.path()).unwrap();

        store.save(KEY_USERNAME, &"admin").await.unwrap();
        store.delete(KEY_USERNAME).await.unwrap();
        assert!(!store.exists(KEY_USERNAME));

        // Second delete of an absent key succeeds
        store.delete(KEY_USERNAME).await.unwrap();
    }

    #[tokio::test]
    async fn test_no_temp_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let store = PreferenceStore::new(temp_dir.path()).unwrap();

        store.save(KEY_HISTORY, &vec!["a", "b"]).await.unwrap();
        assert!(!temp_dir.path().join("search_history.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_typed_helpers() {
        let temp_dir = TempDir::new().unwrap();
        let store = PreferenceStore::new(temp_dir.path()).unwrap();

        assert!(store.theme().await.unwrap().is_none());
        assert!(!store.sidebar_collapsed().await.unwrap());

        store.set_theme("dark").await.unwrap();
        store.set_sidebar_collapsed(true).await.unwrap();

        assert_eq!(store.theme().await.unwrap().as_deref(), Some("dark"));
        assert!(store.sidebar_collapsed().await.unwrap());
    }

    #[tokio::test]
    async fn test_keys_are_independent_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = PreferenceStore::new(temp_dir.path()).unwrap();

        store.save(KEY_TOKEN, &"t").await.unwrap();
        store.save(KEY_THEME, &"light").await.unwrap();
        store.delete(KEY_TOKEN).await.unwrap();

        let theme: Option<String> = store.load(KEY_THEME).await.unwrap();
        assert_eq!(theme.as_deref(), Some("light"));
    }
}
