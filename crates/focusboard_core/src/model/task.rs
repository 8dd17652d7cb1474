//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record and its enumerations.
//! - Keep the `completed` flag, `status` and `completed_at` coupled.
//!
//! # Invariants
//! - `id` and `created_at` never change after creation.
//! - `status == Done` if and only if `completed == true`.
//! - `completed_at` is `Some` if and only if `completed == true`.
//! - Visibility is explicit; there is no "unset" visibility state.

use crate::model::project::ProjectId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a task.
pub type TaskId = Uuid;

/// Stable identifier for a subtask inside one task.
pub type SubtaskId = Uuid;

/// Board column / lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Parked, not planned yet.
    Backlog,
    /// Planned but not started.
    #[default]
    Todo,
    /// Work is in progress.
    InProgress,
    /// Completed. Always paired with `completed == true`.
    Done,
}

/// Task priority, ordered from lowest to highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    /// Numeric rank where a larger value means more important.
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Urgent => 4,
        }
    }
}

/// Quota visibility of a pending task.
///
/// Assigned at creation time from the current quota occupancy and only
/// promoted from `Hidden` to `Visible` by the unlock engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// One checklist item nested under a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: SubtaskId,
    pub title: String,
    pub completed: bool,
}

impl Subtask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            completed: false,
        }
    }
}

/// Completion-related fields of a task, captured together.
///
/// Used by the history log to invert and re-apply toggles exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub completed: bool,
    pub status: TaskStatus,
    pub completed_at: Option<i64>,
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub completed: bool,
    /// Category id, either a built-in default or a custom category.
    pub category: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds; set only while `completed == true`.
    pub completed_at: Option<i64>,
    pub due_date: Option<NaiveDate>,
    /// Weak reference; cleared when the project is deleted.
    pub project_id: Option<ProjectId>,
    pub visibility: Visibility,
    pub subtasks: Vec<Subtask>,
    /// Marks the single task the user is focusing on.
    pub is_focus: bool,
    pub description: Option<String>,
}

impl Task {
    /// Builds a task from a draft with a generated id.
    ///
    /// # Invariants
    /// - The completed/status coupling is derived from `draft.status`.
    pub fn from_draft(draft: TaskDraft, created_at: i64, visibility: Visibility) -> Self {
        let completed = draft.status == TaskStatus::Done;
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            completed,
            category: draft.category,
            status: draft.status,
            priority: draft.priority,
            created_at,
            completed_at: completed.then_some(created_at),
            due_date: draft.due_date,
            project_id: draft.project_id,
            visibility,
            subtasks: draft.subtasks.into_iter().map(Subtask::new).collect(),
            is_focus: false,
            description: draft.description,
        }
    }

    /// Whether the task still counts against the quota.
    pub fn is_pending(&self) -> bool {
        !self.completed
    }

    /// Pending and shown to the user.
    pub fn is_visible_pending(&self) -> bool {
        self.is_pending() && self.visibility == Visibility::Visible
    }

    /// Pending and held back by the quota.
    pub fn is_hidden_pending(&self) -> bool {
        self.is_pending() && self.visibility == Visibility::Hidden
    }

    pub fn completion(&self) -> Completion {
        Completion {
            completed: self.completed,
            status: self.status,
            completed_at: self.completed_at,
        }
    }

    pub fn apply_completion(&mut self, completion: Completion) {
        self.completed = completion.completed;
        self.status = completion.status;
        self.completed_at = completion.completed_at;
    }

    /// Sets the completed flag and re-derives status and `completed_at`.
    ///
    /// Reopening a done task moves it back to `Todo`; a non-done status is
    /// kept as-is when the flag does not change.
    pub fn set_completed(&mut self, completed: bool, now_ms: i64) {
        if completed {
            if !self.completed {
                self.completed_at = Some(now_ms);
            }
            self.status = TaskStatus::Done;
        } else {
            self.completed_at = None;
            if self.status == TaskStatus::Done {
                self.status = TaskStatus::Todo;
            }
        }
        self.completed = completed;
    }

    /// Sets the board status and re-derives the completed flag.
    pub fn set_status(&mut self, status: TaskStatus, now_ms: i64) {
        let completed = status == TaskStatus::Done;
        if completed && !self.completed {
            self.completed_at = Some(now_ms);
        } else if !completed {
            self.completed_at = None;
        }
        self.completed = completed;
        self.status = status;
    }

    /// Merges a partial update into this task.
    ///
    /// An explicit `status` wins over an explicit `completed`; either one
    /// re-establishes the coupling.
    pub fn apply_patch(&mut self, patch: TaskPatch, now_ms: i64) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(project_id) = patch.project_id {
            self.project_id = project_id;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(subtasks) = patch.subtasks {
            self.subtasks = subtasks;
        }

        match (patch.status, patch.completed) {
            (Some(status), _) => self.set_status(status, now_ms),
            (None, Some(completed)) => self.set_completed(completed, now_ms),
            (None, None) => {}
        }
    }
}

/// Input for creating a task. Identity and timestamps are assigned by core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub category: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub project_id: Option<ProjectId>,
    pub description: Option<String>,
    /// Initial subtask titles.
    pub subtasks: Vec<String>,
}

impl TaskDraft {
    /// Draft with default category `personal`, status `todo`, priority `medium`.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: "personal".to_string(),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            project_id: None,
            description: None,
            subtasks: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }
}

/// Partial update for a task.
///
/// `None` leaves a field untouched; for optional fields `Some(None)` clears.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub category: Option<String>,
    pub status: Option<TaskStatus>,
    pub completed: Option<bool>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub project_id: Option<Option<ProjectId>>,
    pub description: Option<Option<String>>,
    pub subtasks: Option<Vec<Subtask>>,
}
