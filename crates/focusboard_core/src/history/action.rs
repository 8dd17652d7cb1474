//! Reversible task commands.

use crate::model::task::{Completion, Task, TaskId};
use crate::registry::task_registry::TaskRegistry;

/// One logged command, carrying what is needed to invert and re-apply it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryAction {
    /// Task created at `index`.
    Add { task: Task, index: usize },
    /// Task removed from `index`.
    Delete { task: Task, index: usize },
    /// Completion flipped from `before` to `after`.
    Toggle {
        task_id: TaskId,
        before: Completion,
        after: Completion,
    },
    /// Fields merged; both full snapshots are kept.
    Update { before: Task, after: Task },
}

impl HistoryAction {
    pub fn task_id(&self) -> TaskId {
        match self {
            Self::Add { task, .. } | Self::Delete { task, .. } => task.id,
            Self::Toggle { task_id, .. } => *task_id,
            Self::Update { after, .. } => after.id,
        }
    }

    /// Short stable name used in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Delete { .. } => "delete",
            Self::Toggle { .. } => "toggle",
            Self::Update { .. } => "update",
        }
    }

    /// Reverts this action on the registry.
    ///
    /// Returns whether the registry changed; a task that no longer exists
    /// (or already exists, for a resurrect) leaves the registry untouched.
    pub fn undo(&self, registry: &mut TaskRegistry) -> bool {
        match self {
            Self::Add { task, .. } => registry.remove_task(task.id).is_some(),
            Self::Delete { task, index } => registry.insert_task_at(*index, task.clone()).is_some(),
            Self::Toggle {
                task_id, before, ..
            } => set_completion(registry, *task_id, *before),
            Self::Update { before, .. } => registry.replace_task(before.clone()),
        }
    }

    /// Re-applies this action on the registry.
    pub fn redo(&self, registry: &mut TaskRegistry) -> bool {
        match self {
            Self::Add { task, index } => registry.insert_task_at(*index, task.clone()).is_some(),
            Self::Delete { task, .. } => registry.remove_task(task.id).is_some(),
            Self::Toggle { task_id, after, .. } => set_completion(registry, *task_id, *after),
            Self::Update { after, .. } => registry.replace_task(after.clone()),
        }
    }
}

fn set_completion(registry: &mut TaskRegistry, task_id: TaskId, completion: Completion) -> bool {
    match registry.task_mut(task_id) {
        Some(task) => {
            task.apply_completion(completion);
            true
        }
        None => false,
    }
}
