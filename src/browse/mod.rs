//! Resource browsing and search
//!
//! One entry point serves both result modes: a non-empty query runs a
//! single-page free-text search (and records the term in history); an
//! empty query browses the active channel page by page. Page navigation
//! only exists in browse mode, and a channel-filter change resets the page
//! to 1 before refetching so a stale index can never outlive the filter.
//!
//! Every request captures a sequence token; a response arriving after a
//! newer request has been issued is discarded without touching state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::gateway::ApiGateway;
use crate::history::HistoryStore;
use crate::models::{PageInfo, Resource};

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the browser
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Resources per browse page
    pub page_size: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self { page_size: 20 }
    }
}

impl BrowserConfig {
    /// Set page size
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

// ============================================================================
// Result State
// ============================================================================

/// Which kind of result set is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseMode {
    /// Paginated listing without a query
    Browse,
    /// Single-page free-text result set
    Search,
}

/// Unified result state for both modes
#[derive(Debug, Clone)]
pub struct BrowseState {
    pub mode: BrowseMode,

    /// Active query; empty in browse mode
    pub query: String,

    /// Active channel filter
    pub channel: Option<String>,

    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
    pub resources: Vec<Resource>,
}

impl Default for BrowseState {
    fn default() -> Self {
        Self {
            mode: BrowseMode::Browse,
            query: String::new(),
            channel: None,
            page: 1,
            total_pages: 1,
            total: 0,
            resources: Vec::new(),
        }
    }
}

/// Candidate page for a relative move, when the move is valid
fn candidate_page(mode: BrowseMode, page: u32, total_pages: u32, delta: i64) -> Option<u32> {
    if mode == BrowseMode::Search {
        return None;
    }

    let candidate = i64::from(page) + delta;
    if candidate < 1 || candidate > i64::from(total_pages) {
        return None;
    }

    Some(candidate as u32)
}

// ============================================================================
// Browser
// ============================================================================

/// Unified paginated browsing and free-text search
pub struct SearchBrowser {
    config: BrowserConfig,
    gateway: Arc<ApiGateway>,
    history: Arc<HistoryStore>,
    state: Arc<RwLock<BrowseState>>,

    /// Token invalidating responses of superseded requests
    sequence: Arc<AtomicU64>,
}

impl SearchBrowser {
    /// Create a browser wired to the gateway and search history
    pub fn new(config: BrowserConfig, gateway: Arc<ApiGateway>, history: Arc<HistoryStore>) -> Self {
        Self {
            config,
            gateway,
            history,
            state: Arc::new(RwLock::new(BrowseState::default())),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Run a search when the query is non-empty, browse otherwise
    pub async fn execute(&self, query: Option<&str>) -> Result<BrowseState> {
        let query = query.unwrap_or("").trim().to_string();

        if query.is_empty() {
            self.run_browse().await
        } else {
            self.run_search(&query).await
        }
    }

    /// Move the browse page by a relative amount
    ///
    /// A no-op in search mode and whenever the candidate page falls
    /// outside `[1, total_pages]`.
    pub async fn change_page(&self, delta: i64) -> Result<BrowseState> {
        let target = {
            let state = self.state.read().await;
            candidate_page(state.mode, state.page, state.total_pages, delta)
        };

        let Some(target) = target else {
            return Ok(self.current().await);
        };

        self.state.write().await.page = target;
        self.run_browse().await
    }

    /// Set the channel filter without fetching
    ///
    /// For callers that stage a filter before their first [`execute`]. The
    /// page resets to 1 just like the fetching variant.
    ///
    /// [`execute`]: SearchBrowser::execute
    pub async fn stage_channel(&self, channel: Option<String>) {
        let mut state = self.state.write().await;
        state.channel = channel;
        state.page = 1;
    }

    /// Change the channel filter and refetch
    ///
    /// The page resets to 1 before the fetch so a previously valid index
    /// cannot exceed the new channel's page count.
    pub async fn set_channel(&self, channel: Option<String>) -> Result<BrowseState> {
        let query = {
            let mut state = self.state.write().await;
            state.channel = channel;
            state.page = 1;
            state.query.clone()
        };

        if query.is_empty() {
            self.run_browse().await
        } else {
            self.run_search(&query).await
        }
    }

    /// Current result snapshot
    pub async fn current(&self) -> BrowseState {
        self.state.read().await.clone()
    }

    /// Current sequence token
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    async fn run_browse(&self) -> Result<BrowseState> {
        let (page, channel) = {
            let state = self.state.read().await;
            (state.page, state.channel.clone())
        };

        let my_seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self
            .gateway
            .browse_resources(channel.as_deref(), page, self.config.page_size)
            .await;

        // A newer request owns the state now; drop this result entirely
        if self.sequence.load(Ordering::SeqCst) != my_seq {
            tracing::debug!(sequence = my_seq, "Discarding stale browse response");
            return Ok(self.current().await);
        }

        let fetched = result?;

        let mut state = self.state.write().await;
        state.mode = BrowseMode::Browse;
        state.query.clear();
        if let PageInfo::Browse {
            page,
            total_pages,
            total,
        } = fetched.info
        {
            state.page = page;
            state.total_pages = total_pages.max(1);
            state.total = total;
        }
        state.resources = fetched.resources;

        tracing::debug!(
            page = state.page,
            total_pages = state.total_pages,
            "Browse page loaded"
        );
        Ok(state.clone())
    }

    async fn run_search(&self, query: &str) -> Result<BrowseState> {
        // Recorded on submission, like the input box does
        self.history.add(query).await?;

        let channel = self.state.read().await.channel.clone();

        let my_seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.gateway.search_resources(query, channel.as_deref()).await;

        if self.sequence.load(Ordering::SeqCst) != my_seq {
            tracing::debug!(sequence = my_seq, "Discarding stale search response");
            return Ok(self.current().await);
        }

        let fetched = result?;
        let count = fetched.info.total();

        let mut state = self.state.write().await;
        state.mode = BrowseMode::Search;
        state.query = query.to_string();
        state.page = 1;
        state.total_pages = 1;
        state.total = count;
        state.resources = fetched.resources;

        tracing::debug!(query, count, "Search completed");
        Ok(state.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = BrowseState::default();
        assert_eq!(state.mode, BrowseMode::Browse);
        assert_eq!(state.page, 1);
        assert_eq!(state.total_pages, 1);
        assert!(state.resources.is_empty());
    }

    #[test]
    fn test_candidate_page_rejects_search_mode() {
        assert_eq!(candidate_page(BrowseMode::Search, 1, 5, 1), None);
        assert_eq!(candidate_page(BrowseMode::Search, 1, 5, -1), None);
    }

    #[test]
    fn test_candidate_page_clamps_to_bounds() {
        // Below the first page
        assert_eq!(candidate_page(BrowseMode::Browse, 1, 5, -1), None);
        // Past the last page
        assert_eq!(candidate_page(BrowseMode::Browse, 5, 5, 1), None);
        // Large jumps
        assert_eq!(candidate_page(BrowseMode::Browse, 2, 5, 10), None);
        assert_eq!(candidate_page(BrowseMode::Browse, 2, 5, -10), None);
    }

    #[test]
    fn test_candidate_page_accepts_valid_moves() {
        assert_eq!(candidate_page(BrowseMode::Browse, 1, 5, 1), Some(2));
        assert_eq!(candidate_page(BrowseMode::Browse, 3, 5, -2), Some(1));
        assert_eq!(candidate_page(BrowseMode::Browse, 4, 5, 1), Some(5));
    }

    #[test]
    fn test_single_page_has_no_moves() {
        assert_eq!(candidate_page(BrowseMode::Browse, 1, 1, 1), None);
        assert_eq!(candidate_page(BrowseMode::Browse, 1, 1, -1), None);
    }

    #[test]
    fn test_browser_config_default() {
        assert_eq!(BrowserConfig::default().page_size, 20);
        assert_eq!(BrowserConfig::default().with_page_size(50).page_size, 50);
    }
}
