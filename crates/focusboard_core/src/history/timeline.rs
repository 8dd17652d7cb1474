//! History log with a single cursor.

use crate::history::action::HistoryAction;
use std::collections::VecDeque;

/// Append-only action log with an undo cursor.
///
/// Internally `applied` counts the entries at or before the cursor, so the
/// conventional index is `applied - 1` and "nothing applied" is `-1`.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: VecDeque<HistoryAction>,
    applied: usize,
    limit: Option<usize>,
}

impl HistoryLog {
    /// Unbounded log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log that keeps at most `limit` entries (minimum one), dropping the
    /// oldest first.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::default()
        }
    }

    /// Appends an action, discarding anything that was undone and not redone.
    pub fn record(&mut self, action: HistoryAction) {
        self.entries.truncate(self.applied);
        self.entries.push_back(action);
        if let Some(limit) = self.limit {
            while self.entries.len() > limit {
                self.entries.pop_front();
            }
        }
        self.applied = self.entries.len();
    }

    /// Moves the cursor back and returns the action to invert.
    pub fn step_back(&mut self) -> Option<&HistoryAction> {
        if self.applied == 0 {
            return None;
        }
        self.applied -= 1;
        self.entries.get(self.applied)
    }

    /// Moves the cursor forward and returns the action to re-apply.
    pub fn step_forward(&mut self) -> Option<&HistoryAction> {
        if self.applied >= self.entries.len() {
            return None;
        }
        self.applied += 1;
        self.entries.get(self.applied - 1)
    }

    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    pub fn can_redo(&self) -> bool {
        self.applied < self.entries.len()
    }

    /// Index of the last applied entry, `-1` when none is applied.
    pub fn index(&self) -> i64 {
        i64::try_from(self.applied).unwrap_or(i64::MAX) - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryAction> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.applied = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::HistoryLog;
    use crate::history::action::HistoryAction;
    use crate::model::task::{Task, TaskDraft, Visibility};

    fn add(title: &str) -> HistoryAction {
        HistoryAction::Add {
            task: Task::from_draft(TaskDraft::new(title), 0, Visibility::Visible),
            index: 0,
        }
    }

    #[test]
    fn empty_log_has_index_minus_one() {
        let mut log = HistoryLog::new();
        assert_eq!(log.index(), -1);
        assert!(!log.can_undo());
        assert!(!log.can_redo());
        assert!(log.step_back().is_none());
        assert!(log.step_forward().is_none());
    }

    #[test]
    fn record_after_undo_drops_redo_branch() {
        let mut log = HistoryLog::new();
        log.record(add("a"));
        log.record(add("b"));
        log.step_back();
        assert!(log.can_redo());

        log.record(add("c"));
        assert!(!log.can_redo());
        assert_eq!(log.len(), 2);
        assert_eq!(log.index(), 1);
    }

    #[test]
    fn limit_drops_oldest_entries_and_keeps_cursor_in_bounds() {
        let mut log = HistoryLog::with_limit(2);
        log.record(add("a"));
        log.record(add("b"));
        log.record(add("c"));
        assert_eq!(log.len(), 2);
        assert_eq!(log.index(), 1);

        assert!(log.step_back().is_some());
        assert!(log.step_back().is_some());
        assert!(log.step_back().is_none());
        assert_eq!(log.index(), -1);
    }
}
