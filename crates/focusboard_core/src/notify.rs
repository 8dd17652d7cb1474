//! Toast notification channel.
//!
//! # Responsibility
//! - Carry human-readable event descriptions out of core.
//! - Provide an in-memory queue with fixed-duration expiry.
//!
//! # Invariants
//! - Notifying never fails and never blocks the caller.

use std::cell::RefCell;
use uuid::Uuid;

/// How long a toast stays active, in milliseconds.
pub const TOAST_TTL_MS: i64 = 3_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: Uuid,
    pub kind: ToastKind,
    pub message: String,
    /// Unix epoch milliseconds.
    pub created_at_ms: i64,
}

impl Toast {
    pub fn new(kind: ToastKind, message: impl Into<String>, created_at_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            created_at_ms,
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms - self.created_at_ms >= TOAST_TTL_MS
    }
}

/// Fire-and-forget sink for toasts.
pub trait Notifier {
    fn notify(&self, toast: Toast);
}

/// Discards every toast. Used by headless callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _toast: Toast) {}
}

/// In-memory toast collector.
#[derive(Debug, Default)]
pub struct ToastQueue {
    toasts: RefCell<Vec<Toast>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops expired toasts and returns the ones still on screen.
    pub fn active(&self, now_ms: i64) -> Vec<Toast> {
        let mut toasts = self.toasts.borrow_mut();
        toasts.retain(|toast| !toast.is_expired(now_ms));
        toasts.clone()
    }

    /// Removes and returns every queued toast regardless of age.
    pub fn drain(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.toasts.borrow_mut())
    }

    pub fn dismiss(&self, id: Uuid) {
        self.toasts.borrow_mut().retain(|toast| toast.id != id);
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, toast: Toast) {
        self.toasts.borrow_mut().push(toast);
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, toast: Toast) {
        (**self).notify(toast);
    }
}
