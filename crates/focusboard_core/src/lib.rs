//! Core task lifecycle engine for FocusBoard.
//! This crate is the single source of truth for task, quota and history
//! invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod history;
pub mod logging;
pub mod model;
pub mod notify;
pub mod quota;
pub mod registry;
pub mod repo;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use history::action::HistoryAction;
pub use history::timeline::HistoryLog;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::category::{default_categories, Category};
pub use model::project::{Project, ProjectDraft, ProjectId, ProjectPatch};
pub use model::relation::{RelationId, RelationKind, TaskRelation};
pub use model::task::{
    Completion, Subtask, SubtaskId, Task, TaskDraft, TaskId, TaskPatch, TaskPriority, TaskStatus,
    Visibility,
};
pub use notify::{NoopNotifier, Notifier, Toast, ToastKind, ToastQueue};
pub use quota::limit::{TaskQuota, QUOTA_PRESETS};
pub use quota::schedule::PendingUnlock;
pub use registry::task_registry::{CategoryError, RelationError, TaskRegistry};
pub use repo::state_repo::{RepoError, RepoResult, SqliteStateRepository, StateRepository};
pub use service::task_service::TaskService;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
