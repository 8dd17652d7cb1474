//! Project domain model.
//!
//! Projects are labels only. Tasks point at them through a weak
//! `project_id` reference that is cleared when the project goes away.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProjectId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// CSS-style color, e.g. `#6366f1`.
    pub color: String,
    pub icon: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds of the last `update_project`.
    pub updated_at: Option<i64>,
}

impl Project {
    pub fn from_draft(draft: ProjectDraft, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: draft.name,
            color: draft.color,
            icon: draft.icon,
            created_at,
            updated_at: None,
        }
    }
}

/// Input for creating a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub name: String,
    pub color: String,
    pub icon: String,
}

impl ProjectDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: DEFAULT_PROJECT_COLOR.to_string(),
            icon: DEFAULT_PROJECT_ICON.to_string(),
        }
    }
}

/// Partial update for a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

pub const DEFAULT_PROJECT_COLOR: &str = "#6366f1";
pub const DEFAULT_PROJECT_ICON: &str = "🚀";
