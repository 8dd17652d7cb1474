//! Deferred unlock scheduling.
//!
//! A completion asks for one unlock after a short delay. The request is an
//! explicit value that can be cancelled; it carries only a count, so the
//! unlock decision is made against registry state at run time.

/// Outstanding unlock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingUnlock {
    /// Number of unlocks asked for by completions since the last run.
    pub requested: usize,
    /// Unix epoch milliseconds after which the request may run.
    pub due_at_ms: i64,
}

/// Holds at most one pending unlock request.
#[derive(Debug, Clone, Default)]
pub struct UnlockScheduler {
    pending: Option<PendingUnlock>,
}

impl UnlockScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests `count` more unlocks; rapid requests coalesce and push the
    /// due time forward.
    pub fn schedule(&mut self, count: usize, now_ms: i64, delay_ms: i64) {
        let due_at_ms = now_ms + delay_ms;
        self.pending = Some(match self.pending {
            Some(pending) => PendingUnlock {
                requested: pending.requested + count,
                due_at_ms: pending.due_at_ms.max(due_at_ms),
            },
            None => PendingUnlock {
                requested: count,
                due_at_ms,
            },
        });
    }

    pub fn pending(&self) -> Option<PendingUnlock> {
        self.pending
    }

    /// Takes the request if its due time has passed.
    pub fn take_due(&mut self, now_ms: i64) -> Option<PendingUnlock> {
        match self.pending {
            Some(pending) if pending.due_at_ms <= now_ms => self.pending.take(),
            _ => None,
        }
    }

    /// Takes the request regardless of its due time.
    pub fn take(&mut self) -> Option<PendingUnlock> {
        self.pending.take()
    }

    /// Drops the request; returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::UnlockScheduler;

    #[test]
    fn requests_coalesce() {
        let mut scheduler = UnlockScheduler::new();
        scheduler.schedule(1, 0, 500);
        scheduler.schedule(1, 100, 500);

        let pending = scheduler.pending().unwrap();
        assert_eq!(pending.requested, 2);
        assert_eq!(pending.due_at_ms, 600);
    }

    #[test]
    fn take_due_waits_for_delay() {
        let mut scheduler = UnlockScheduler::new();
        scheduler.schedule(1, 0, 500);
        assert!(scheduler.take_due(499).is_none());
        assert!(scheduler.take_due(500).is_some());
        assert!(scheduler.pending().is_none());
    }

    #[test]
    fn cancel_reports_whether_anything_was_pending() {
        let mut scheduler = UnlockScheduler::new();
        assert!(!scheduler.cancel());
        scheduler.schedule(1, 0, 500);
        assert!(scheduler.cancel());
    }
}
