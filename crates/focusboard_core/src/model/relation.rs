//! Typed links between tasks.
//!
//! # Invariants
//! - Both ends name distinct tasks that existed when the link was made.
//! - A relation is directional: `from_task_id` is the task that owns it.

use crate::model::task::TaskId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RelationId = Uuid;

/// How the `from` task relates to the `to` task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Blocks,
    BlockedBy,
    #[default]
    Related,
    Duplicate,
    Parent,
    Child,
}

impl RelationKind {
    pub const ALL: [Self; 6] = [
        Self::Blocks,
        Self::BlockedBy,
        Self::Related,
        Self::Duplicate,
        Self::Parent,
        Self::Child,
    ];

    /// Stable storage and log name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::BlockedBy => "blocked_by",
            Self::Related => "related",
            Self::Duplicate => "duplicate",
            Self::Parent => "parent",
            Self::Child => "child",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRelation {
    pub id: RelationId,
    pub from_task_id: TaskId,
    pub to_task_id: TaskId,
    pub kind: RelationKind,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl TaskRelation {
    pub fn new(
        from_task_id: TaskId,
        to_task_id: TaskId,
        kind: RelationKind,
        created_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_task_id,
            to_task_id,
            kind,
            created_at,
        }
    }

    pub fn involves(&self, task_id: TaskId) -> bool {
        self.from_task_id == task_id || self.to_task_id == task_id
    }

    /// Same ends and kind, ignoring id and timestamp.
    pub fn same_link(&self, other: &Self) -> bool {
        self.from_task_id == other.from_task_id
            && self.to_task_id == other.to_task_id
            && self.kind == other.kind
    }
}
