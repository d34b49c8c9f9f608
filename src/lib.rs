//! capstan - Console client for a channel resource indexer
//!
//! A command-line control surface for the indexer backend: authentication,
//! resource browsing and search, sync orchestration with status polling,
//! scheduled-task management, and activity-log viewing.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`gateway`] - Typed HTTP access to the backend API
//! - [`models`] - Core data structures and types
//! - [`session`] - Login, logout, and persisted identity
//! - [`browse`] - Paginated browsing and free-text search
//! - [`sync`] - Sync jobs and status polling
//! - [`tasks`] - Scheduled sync task management
//! - [`dashboard`] - Aggregated channel and sync summaries
//! - [`notify`] - Toasts and confirmation prompts
//! - [`store`] - Per-key preference persistence
//!
//! # Example
//!
//! ```no_run
//! use capstan::config::Config;
//! use capstan::console::Console;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let console = Console::new(config)?;
//!     console.startup().await?;
//!     Ok(())
//! }
//! ```

pub mod browse;
pub mod config;
pub mod console;
pub mod dashboard;
pub mod error;
pub mod gateway;
pub mod history;
pub mod logs;
pub mod models;
pub mod notify;
pub mod session;
pub mod store;
pub mod sync;
pub mod tasks;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::console::Console;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::gateway::{ApiError, ApiGateway};
    pub use crate::models::{Channel, Resource, SyncMode, SyncScope, SyncStatus};
}

// Direct re-exports for convenience
pub use models::{Channel, Resource, SyncMode, SyncScope};
