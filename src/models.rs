// Core data structures for the capstan console

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sync job scope: one channel or every channel
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SyncScope {
    All,
    Channel(String),
}

impl SyncScope {
    /// Create from user input ("all" is the sentinel for every channel)
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Channel(s.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl std::fmt::Display for SyncScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Channel(id) => write!(f, "{id}"),
        }
    }
}

/// Sync job mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    Full,
    Incremental,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
        }
    }

    /// Create from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "full" => Some(Self::Full),
            "incremental" | "inc" => Some(Self::Incremental),
            _ => None,
        }
    }

    pub fn all() -> Vec<Self> {
        vec![Self::Full, Self::Incremental]
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the backend extracts pan links from a channel's posts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    Telegraph,
    Inline,
    Button,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Telegraph => "telegraph",
            Self::Inline => "inline",
            Self::Button => "button",
        }
    }
}

impl std::fmt::Display for ParseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A monitored source feed tracked by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub parse_mode: ParseMode,
    #[serde(default)]
    pub username: String,
}

/// Dashboard row: channel plus its resource counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub id: String,
    pub name: String,
    pub parse_mode: ParseMode,
    pub total: u64,
    pub parsed: u64,
    pub unparsed: u64,
}

/// Server-reported sync state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStatus {
    pub running: bool,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Full dashboard summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default)]
    pub channels: Vec<ChannelSummary>,
    pub total_resources: u64,
    pub total_parsed: u64,
    #[serde(default)]
    pub sync_status: SyncStatus,
}

/// An item extracted from a channel's content
///
/// Browse rows carry `created_at`; search rows carry the channel
/// attribution fields instead. Both deserialize into this one struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub message_id: i64,
    pub title: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub pan_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub channel_username: Option<String>,
}

/// Pagination facts for a result set
///
/// Browse and search responses carry different field sets; modeling them
/// as one exhaustive union keeps callers from inspecting shapes ad hoc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageInfo {
    Browse { page: u32, total_pages: u32, total: u64 },
    Search { count: u64 },
}

impl PageInfo {
    /// Current page; search results are always a single page
    pub fn page(&self) -> u32 {
        match self {
            Self::Browse { page, .. } => *page,
            Self::Search { .. } => 1,
        }
    }

    /// Page count; search results are always a single page
    pub fn total_pages(&self) -> u32 {
        match self {
            Self::Browse { total_pages, .. } => *total_pages,
            Self::Search { .. } => 1,
        }
    }

    /// Total matching resources
    pub fn total(&self) -> u64 {
        match self {
            Self::Browse { total, .. } => *total,
            Self::Search { count } => *count,
        }
    }

    pub fn is_search(&self) -> bool {
        matches!(self, Self::Search { .. })
    }
}

/// One page of resources plus its pagination facts
#[derive(Debug, Clone)]
pub struct ResourcePage {
    pub resources: Vec<Resource>,
    pub info: PageInfo,
}

/// Server-persisted recurring sync definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub next_run: Option<DateTime<Utc>>,
}

/// Payload for creating a scheduled task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub channel: String,
    pub mode: SyncMode,
    pub interval_hours: u32,
}

/// Payload for starting a sync across every channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncAllRequest {
    pub full: bool,
}

/// Payload for starting a single-channel sync
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncChannelRequest {
    pub channel: String,
    pub mode: SyncMode,
}

/// Successful login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    #[serde(default)]
    pub message: String,
}

/// Generic acknowledgement carrying the server's message text
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: String,
}

/// Activity-log entry category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Sync,
    Scheduled,
    Parse,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Scheduled => "scheduled",
            Self::Parse => "parse",
        }
    }

    /// Create from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sync" => Some(Self::Sync),
            "scheduled" => Some(Self::Scheduled),
            "parse" => Some(Self::Parse),
            _ => None,
        }
    }

    pub fn all() -> Vec<Self> {
        vec![Self::Sync, Self::Scheduled, Self::Parse]
    }
}

impl std::fmt::Display for LogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Activity-log entry severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Info,
    Success,
    Error,
    Warning,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl std::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Server-side activity-log entry
///
/// The backend keeps timestamps as bare ISO strings without an offset, so
/// they stay strings here rather than round-tripping through a tz type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: LogKind,
    #[serde(default)]
    pub channel: Option<String>,
    pub message: String,
    pub status: LogStatus,
}
