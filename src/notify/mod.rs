//! User-facing notifications
//!
//! This module provides the two prompt surfaces of the console:
//!
//! - **Toasts**: transient messages with a unique id, removed automatically
//!   after a fixed TTL (3000ms by default) regardless of interaction, with
//!   early manual dismissal by id.
//! - **Confirmations**: yes/no prompts with a single-shot resolution each.
//!   At most one prompt is displayed at a time; requests arriving while one
//!   is pending queue behind it in FIFO order. A newer request never
//!   replaces an unresolved older one, so no caller's pending result is
//!   abandoned.
//!
//! The center is a cheap cloneable handle; every clone shares the same
//! toast set and confirmation queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use uuid::Uuid;

/// Default toast time-to-live
pub const DEFAULT_TOAST_TTL: Duration = Duration::from_millis(3000);

// ============================================================================
// Toasts
// ============================================================================

/// Kind of a toast message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToastKind {
    /// Informational messages
    Info,
    /// Completed operations
    Success,
    /// Surfaced failures
    Error,
    /// Conditions worth attention
    Warning,
}

impl ToastKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl std::fmt::Display for ToastKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transient notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Toast {
    /// Unique toast identifier
    pub id: String,
    /// Message text
    pub message: String,
    /// Kind of message
    pub kind: ToastKind,
    /// When the toast was created
    pub created_at: DateTime<Utc>,
}

impl Toast {
    /// Create a new toast
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            message: message.into(),
            kind,
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// Confirmations
// ============================================================================

/// Displayable view of the confirmation currently awaiting an answer
#[derive(Debug, Clone)]
pub struct ConfirmPrompt {
    pub id: String,
    pub title: String,
    pub message: String,
}

/// A queued confirmation with its caller's resolver
struct PendingConfirm {
    prompt: ConfirmPrompt,
    responder: oneshot::Sender<bool>,
}

/// One displayed prompt plus the requests waiting behind it
#[derive(Default)]
struct ConfirmQueue {
    active: Option<PendingConfirm>,
    waiting: VecDeque<PendingConfirm>,
}

impl ConfirmQueue {
    fn push(&mut self, pending: PendingConfirm) {
        if self.active.is_none() {
            self.active = Some(pending);
        } else {
            self.waiting.push_back(pending);
        }
    }

    fn promote(&mut self) {
        if self.active.is_none() {
            self.active = self.waiting.pop_front();
        }
    }

    fn len(&self) -> usize {
        self.waiting.len() + usize::from(self.active.is_some())
    }
}

// ============================================================================
// Notification Center
// ============================================================================

/// Toast queue plus serialized confirmation prompts
#[derive(Clone)]
pub struct NotificationCenter {
    toasts: Arc<RwLock<Vec<Toast>>>,
    confirms: Arc<RwLock<ConfirmQueue>>,
    toast_ttl: Duration,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationCenter {
    /// Create a notification center with the default toast TTL
    pub fn new() -> Self {
        Self {
            toasts: Arc::new(RwLock::new(Vec::new())),
            confirms: Arc::new(RwLock::new(ConfirmQueue::default())),
            toast_ttl: DEFAULT_TOAST_TTL,
        }
    }

    /// Set toast time-to-live
    pub fn with_toast_ttl(mut self, ttl: Duration) -> Self {
        self.toast_ttl = ttl;
        self
    }

    /// Enqueue a toast; it removes itself after the TTL elapses
    pub async fn toast(&self, message: impl Into<String>, kind: ToastKind) -> Toast {
        let toast = Toast::new(message, kind);
        self.toasts.write().await.push(toast.clone());

        tracing::debug!(id = %toast.id, kind = %toast.kind, "Toast shown");

        let toasts = Arc::clone(&self.toasts);
        let id = toast.id.clone();
        let ttl = self.toast_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            toasts.write().await.retain(|t| t.id != id);
        });

        toast
    }

    /// Shorthand for a success toast
    pub async fn success(&self, message: impl Into<String>) -> Toast {
        self.toast(message, ToastKind::Success).await
    }

    /// Shorthand for an error toast
    pub async fn error(&self, message: impl Into<String>) -> Toast {
        self.toast(message, ToastKind::Error).await
    }

    /// Shorthand for an info toast
    pub async fn info(&self, message: impl Into<String>) -> Toast {
        self.toast(message, ToastKind::Info).await
    }

    /// Remove a toast before its TTL elapses
    pub async fn dismiss(&self, id: &str) -> bool {
        let mut toasts = self.toasts.write().await;
        let before = toasts.len();
        toasts.retain(|t| t.id != id);
        toasts.len() < before
    }

    /// Snapshot of the toasts currently shown
    pub async fn active_toasts(&self) -> Vec<Toast> {
        self.toasts.read().await.clone()
    }

    /// Request a confirmation and wait for its resolution
    ///
    /// The request joins the FIFO queue; it is displayed once every earlier
    /// request has been resolved. A torn-down center resolves as declined.
    pub async fn confirm(&self, title: impl Into<String>, message: impl Into<String>) -> bool {
        let prompt = ConfirmPrompt {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            message: message.into(),
        };
        let (tx, rx) = oneshot::channel();

        {
            let mut queue = self.confirms.write().await;
            queue.push(PendingConfirm {
                prompt,
                responder: tx,
            });
        }

        match rx.await {
            Ok(accepted) => accepted,
            Err(_) => {
                tracing::warn!("Confirmation dropped before resolution, treating as declined");
                false
            }
        }
    }

    /// The prompt currently displayed, if any
    pub async fn active_confirm(&self) -> Option<ConfirmPrompt> {
        self.confirms.read().await.active.as_ref().map(|p| p.prompt.clone())
    }

    /// Resolve the displayed prompt and promote the next queued one
    ///
    /// Returns false when nothing was displayed.
    pub async fn resolve_active(&self, accepted: bool) -> bool {
        let mut queue = self.confirms.write().await;

        let Some(pending) = queue.active.take() else {
            return false;
        };

        if pending.responder.send(accepted).is_err() {
            tracing::debug!(id = %pending.prompt.id, "Confirmation caller went away");
        }

        queue.promote();
        true
    }

    /// Queued confirmations, including the displayed one
    pub async fn pending_confirms(&self) -> usize {
        self.confirms.read().await.len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_kind_display() {
        assert_eq!(ToastKind::Info.as_str(), "info");
        assert_eq!(ToastKind::Error.as_str(), "error");
    }

    #[test]
    fn test_toast_ids_are_unique() {
        let a = Toast::new("x", ToastKind::Info);
        let b = Toast::new("x", ToastKind::Info);
        assert_ne!(a.id, b.id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toast_expires_after_ttl() {
        let center = NotificationCenter::new();
        center.toast("saved", ToastKind::Success).await;
        assert_eq!(center.active_toasts().await.len(), 1);

        tokio::time::sleep(Duration::from_millis(3001)).await;
        assert!(center.active_toasts().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_toast_still_present_before_ttl() {
        let center = NotificationCenter::new();
        center.toast("working", ToastKind::Info).await;

        tokio::time::sleep(Duration::from_millis(2999)).await;
        assert_eq!(center.active_toasts().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_removes_early() {
        let center = NotificationCenter::new();
        let toast = center.toast("gone soon", ToastKind::Warning).await;

        assert!(center.dismiss(&toast.id).await);
        assert!(center.active_toasts().await.is_empty());

        // The expiry task for the dismissed toast is a no-op later
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert!(center.active_toasts().await.is_empty());
    }

    #[tokio::test]
    async fn test_dismiss_unknown_id_is_false() {
        let center = NotificationCenter::new();
        assert!(!center.dismiss("no-such-id").await);
    }

    #[tokio::test]
    async fn test_confirms_queue_fifo() {
        let center = NotificationCenter::new();

        let first = tokio::spawn({
            let center = center.clone();
            async move { center.confirm("Delete task", "Remove task A?").await }
        });
        tokio::task::yield_now().await;

        let second = tokio::spawn({
            let center = center.clone();
            async move { center.confirm("Clear logs", "Remove every entry?").await }
        });
        tokio::task::yield_now().await;

        // The first request is displayed; the second queues behind it
        assert_eq!(center.pending_confirms().await, 2);
        let active = center.active_confirm().await.unwrap();
        assert_eq!(active.title, "Delete task");

        assert!(center.resolve_active(true).await);
        assert!(first.await.unwrap());

        // The queued request is promoted, not lost
        let active = center.active_confirm().await.unwrap();
        assert_eq!(active.title, "Clear logs");

        assert!(center.resolve_active(false).await);
        assert!(!second.await.unwrap());
        assert_eq!(center.pending_confirms().await, 0);
    }

    #[tokio::test]
    async fn test_resolve_without_active_is_false() {
        let center = NotificationCenter::new();
        assert!(!center.resolve_active(true).await);
    }

    #[tokio::test]
    async fn test_each_confirm_resolves_exactly_once() {
        let center = NotificationCenter::new();

        let pending = tokio::spawn({
            let center = center.clone();
            async move { center.confirm("Once", "only once?").await }
        });
        tokio::task::yield_now().await;

        assert!(center.resolve_active(true).await);
        assert!(pending.await.unwrap());

        // The queue is empty again; a second resolve has no target
        assert!(!center.resolve_active(false).await);
    }
}
