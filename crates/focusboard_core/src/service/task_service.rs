//! Task lifecycle use-case service.
//!
//! # Responsibility
//! - Act as the single writer over the task registry.
//! - Record reversible commands in the history log and replay them on
//!   undo/redo.
//! - Assign quota visibility on create and trigger unlocks on completion.
//! - Maintain typed relations between tasks.
//! - Persist the durable snapshot after every mutation and emit toasts.
//!
//! # Invariants
//! - Unknown ids are silent no-ops: no mutation, no history entry.
//! - Undo/redo never record history.
//! - A task re-entering the pending set (reopen, undo, redo) is visible only
//!   when the other visible pending tasks leave room under the quota.
//! - A failed persistence write leaves in-memory state untouched and is
//!   reported through an error toast.
//! - Log events carry ids and counts only, never task titles.

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::history::action::HistoryAction;
use crate::history::timeline::HistoryLog;
use crate::model::category::Category;
use crate::model::project::{Project, ProjectDraft, ProjectId, ProjectPatch};
use crate::model::relation::{RelationId, RelationKind, TaskRelation};
use crate::model::task::{
    Subtask, SubtaskId, Task, TaskDraft, TaskId, TaskPatch, TaskStatus, Visibility,
};
use crate::notify::{Notifier, Toast, ToastKind};
use crate::quota::limit::{self, TaskQuota};
use crate::quota::schedule::{PendingUnlock, UnlockScheduler};
use crate::quota::unlock;
use crate::registry::task_registry::{CategoryError, RelationError, TaskRegistry};
use crate::repo::state_repo::{RepoResult, StateRepository};
use log::{debug, error, info};
use uuid::Uuid;

/// Command dispatcher for the task lifecycle engine.
pub struct TaskService<R: StateRepository, N: Notifier> {
    registry: TaskRegistry,
    history: HistoryLog,
    unlocks: UnlockScheduler,
    repo: R,
    notifier: N,
    clock: Box<dyn Clock>,
    config: EngineConfig,
    last_persist_error: Option<String>,
}

impl<R: StateRepository, N: Notifier> TaskService<R, N> {
    /// Loads persisted state and starts a fresh session.
    ///
    /// History and pending unlocks always start empty.
    pub fn load(
        repo: R,
        notifier: N,
        clock: impl Clock + 'static,
        config: EngineConfig,
    ) -> RepoResult<Self> {
        let registry = repo.load_state()?;
        info!(
            "event=state_load module=service status=ok tasks={} projects={} quota={}",
            registry.tasks().len(),
            registry.projects().len(),
            registry.quota().get()
        );
        Ok(Self::with_registry(registry, repo, notifier, clock, config))
    }

    /// Starts a session over an already built registry without reading the
    /// repository.
    pub fn with_registry(
        registry: TaskRegistry,
        repo: R,
        notifier: N,
        clock: impl Clock + 'static,
        config: EngineConfig,
    ) -> Self {
        let history = match config.history_limit {
            Some(limit) => HistoryLog::with_limit(limit),
            None => HistoryLog::new(),
        };
        Self {
            registry,
            history,
            unlocks: UnlockScheduler::new(),
            repo,
            notifier,
            clock: Box::new(clock),
            config,
            last_persist_error: None,
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn tasks(&self) -> &[Task] {
        self.registry.tasks()
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.registry.task(id)
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Creates a task, hidden when the quota is already full.
    pub fn add_task(&mut self, draft: TaskDraft) -> TaskId {
        let now_ms = self.clock.now_ms();
        let visibility = if self.registry.quota().admits(self.registry.visible_count()) {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };

        let task = Task::from_draft(draft, now_ms, visibility);
        let task_id = task.id;
        if let Some(index) = self.registry.push_task(task.clone()) {
            self.history.record(HistoryAction::Add { task, index });
        }

        info!(
            "event=task_add module=service status=ok task_id={task_id} visibility={}",
            visibility_label(visibility)
        );
        match visibility {
            Visibility::Visible => self.toast(ToastKind::Success, "Task created"),
            Visibility::Hidden => {
                self.toast(ToastKind::Info, "Task created (hidden, quota reached)")
            }
        }
        self.persist();
        task_id
    }

    /// Flips completion; a fresh completion may unlock one hidden task.
    ///
    /// A reopened task comes back hidden when the quota is already full.
    pub fn toggle_task(&mut self, id: TaskId) {
        let now_ms = self.clock.now_ms();
        let Some(task) = self.registry.task_mut(id) else {
            debug!("event=task_toggle module=service status=skipped reason=not_found task_id={id}");
            return;
        };

        let before = task.completion();
        let completing = !task.completed;
        task.set_completed(completing, now_ms);
        let after = task.completion();
        self.history.record(HistoryAction::Toggle {
            task_id: id,
            before,
            after,
        });

        info!("event=task_toggle module=service status=ok task_id={id} completed={completing}");
        if completing {
            self.toast(ToastKind::Success, "Task completed ✓");
            self.request_unlock_after_completion(now_ms);
        } else if self.registry.settle_reentry(id, false) == Some(Visibility::Hidden) {
            debug!("event=task_toggle module=service status=hidden reason=quota_full task_id={id}");
            self.toast(ToastKind::Info, "Task reopened (hidden, quota reached)");
        } else {
            self.toast(ToastKind::Success, "Task reopened");
        }
        self.persist();
    }

    /// Removes a task permanently.
    pub fn delete_task(&mut self, id: TaskId) {
        let Some((index, task)) = self.registry.remove_task(id) else {
            debug!("event=task_delete module=service status=skipped reason=not_found task_id={id}");
            return;
        };
        self.history.record(HistoryAction::Delete { task, index });

        info!("event=task_delete module=service status=ok task_id={id}");
        self.toast(ToastKind::Info, "Task deleted");
        self.persist();
    }

    /// Merges a partial update, keeping the completed/done coupling.
    pub fn update_task(&mut self, id: TaskId, patch: TaskPatch) {
        let now_ms = self.clock.now_ms();
        let Some(task) = self.registry.task_mut(id) else {
            debug!("event=task_update module=service status=skipped reason=not_found task_id={id}");
            return;
        };

        let before = task.clone();
        task.apply_patch(patch, now_ms);
        self.registry.settle_reentry(id, before.is_pending());
        let Some(after) = self.registry.task(id).cloned() else {
            return;
        };
        self.history.record(HistoryAction::Update { before, after });

        info!("event=task_update module=service status=ok task_id={id}");
        self.toast(ToastKind::Success, "Task updated");
        self.persist();
    }

    /// Moves a task to a board column.
    ///
    /// Board moves are not undoable and do not trigger unlocks.
    pub fn move_task(&mut self, id: TaskId, status: TaskStatus) {
        let now_ms = self.clock.now_ms();
        let Some(task) = self.registry.task_mut(id) else {
            debug!("event=task_move module=service status=skipped reason=not_found task_id={id}");
            return;
        };
        let was_pending = task.is_pending();
        task.set_status(status, now_ms);
        self.registry.settle_reentry(id, was_pending);

        info!(
            "event=task_move module=service status=ok task_id={id} completed={}",
            status == TaskStatus::Done
        );
        self.persist();
    }

    pub fn quota(&self) -> TaskQuota {
        self.registry.quota()
    }

    /// Stores a new quota (clamped to at least one).
    ///
    /// Lowering the quota never hides tasks that are already visible.
    pub fn set_task_quota(&mut self, quota: u32) {
        let quota = TaskQuota::new(quota);
        self.registry.set_quota(quota);
        info!(
            "event=quota_set module=service status=ok quota={} visible={}",
            quota.get(),
            self.registry.visible_count()
        );
        self.persist();
    }

    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.registry.visible_tasks()
    }

    pub fn hidden_tasks(&self) -> Vec<&Task> {
        self.registry.hidden_tasks()
    }

    pub fn is_quota_full(&self) -> bool {
        !self.registry.quota().admits(self.registry.visible_count())
    }

    /// Hidden tasks that fit under the quota right now.
    pub fn unlockable_count(&self) -> usize {
        limit::unlockable_count(self.registry.tasks(), self.registry.quota())
    }

    /// Unlocks up to `count` hidden tasks in priority order.
    ///
    /// Saturating; returns how many were unlocked.
    pub fn unlock_next_tasks(&mut self, count: usize) -> usize {
        let now_ms = self.clock.now_ms();
        let unlocked = unlock::unlock_next(self.registry.tasks_mut(), count, now_ms).len();

        info!("event=task_unlock module=service status=ok requested={count} unlocked={unlocked}");
        if unlocked > 0 {
            let message = if unlocked == 1 {
                "1 task unlocked".to_string()
            } else {
                format!("{unlocked} tasks unlocked")
            };
            self.toast(ToastKind::Success, message);
            self.persist();
        }
        unlocked
    }

    pub fn pending_unlock(&self) -> Option<PendingUnlock> {
        self.unlocks.pending()
    }

    /// Runs the deferred unlock when its delay has elapsed.
    ///
    /// The amount is re-evaluated against current state: at most the number
    /// of requests, and never past the quota.
    pub fn poll_pending_unlock(&mut self) -> usize {
        let now_ms = self.clock.now_ms();
        match self.unlocks.take_due(now_ms) {
            Some(pending) => self.run_unlock_request(pending),
            None => 0,
        }
    }

    /// Runs the deferred unlock immediately, ignoring its delay.
    pub fn flush_pending_unlock(&mut self) -> usize {
        match self.unlocks.take() {
            Some(pending) => self.run_unlock_request(pending),
            None => 0,
        }
    }

    /// Drops the deferred unlock; returns whether one was pending.
    pub fn cancel_pending_unlock(&mut self) -> bool {
        let cancelled = self.unlocks.cancel();
        if cancelled {
            debug!("event=task_unlock module=service status=cancelled");
        }
        cancelled
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Index of the last applied history entry, `-1` when none.
    pub fn history_index(&self) -> i64 {
        self.history.index()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Reverts the last applied command; returns whether the cursor moved.
    pub fn undo(&mut self) -> bool {
        let Some(action) = self.history.step_back() else {
            return false;
        };
        let was_pending = self.registry.task(action.task_id()).is_some_and(Task::is_pending);
        let applied = action.undo(&mut self.registry);
        self.registry.settle_reentry(action.task_id(), was_pending);
        info!(
            "event=history_undo module=service status=ok action={} task_id={} applied={applied}",
            action.kind(),
            action.task_id()
        );
        self.toast(ToastKind::Info, "Action undone");
        self.persist();
        true
    }

    /// Re-applies the next undone command; returns whether the cursor moved.
    pub fn redo(&mut self) -> bool {
        let Some(action) = self.history.step_forward() else {
            return false;
        };
        let was_pending = self.registry.task(action.task_id()).is_some_and(Task::is_pending);
        let applied = action.redo(&mut self.registry);
        self.registry.settle_reentry(action.task_id(), was_pending);
        info!(
            "event=history_redo module=service status=ok action={} task_id={} applied={applied}",
            action.kind(),
            action.task_id()
        );
        self.toast(ToastKind::Info, "Action redone");
        self.persist();
        true
    }

    /// Appends a subtask; returns its id, or `None` for an unknown task.
    pub fn add_subtask(
        &mut self,
        task_id: TaskId,
        title: impl Into<String>,
    ) -> Option<SubtaskId> {
        let task = self.registry.task_mut(task_id)?;
        let subtask = Subtask::new(title);
        let subtask_id = subtask.id;
        task.subtasks.push(subtask);

        debug!(
            "event=subtask_add module=service status=ok task_id={task_id} subtask_id={subtask_id}"
        );
        self.persist();
        Some(subtask_id)
    }

    pub fn toggle_subtask(&mut self, task_id: TaskId, subtask_id: SubtaskId) {
        let Some(subtask) = self
            .registry
            .task_mut(task_id)
            .and_then(|task| task.subtasks.iter_mut().find(|item| item.id == subtask_id))
        else {
            return;
        };
        subtask.completed = !subtask.completed;
        self.persist();
    }

    pub fn delete_subtask(&mut self, task_id: TaskId, subtask_id: SubtaskId) {
        let Some(task) = self.registry.task_mut(task_id) else {
            return;
        };
        let before = task.subtasks.len();
        task.subtasks.retain(|item| item.id != subtask_id);
        if task.subtasks.len() != before {
            self.persist();
        }
    }

    /// Makes `task_id` the only focus task.
    pub fn set_focus_task(&mut self, task_id: TaskId) {
        if self.registry.task(task_id).is_none() {
            return;
        }
        for task in self.registry.tasks_mut() {
            task.is_focus = task.id == task_id;
        }
        info!("event=task_focus module=service status=ok task_id={task_id}");
        self.persist();
    }

    /// The focus task, if it is still pending.
    pub fn focus_task(&self) -> Option<&Task> {
        self.registry
            .tasks()
            .iter()
            .find(|task| task.is_focus && task.is_pending())
    }

    pub fn projects(&self) -> &[Project] {
        self.registry.projects()
    }

    pub fn add_project(&mut self, draft: ProjectDraft) -> ProjectId {
        let project = Project::from_draft(draft, self.clock.now_ms());
        let project_id = project.id;
        self.registry.push_project(project);

        info!("event=project_add module=service status=ok project_id={project_id}");
        self.toast(ToastKind::Success, "Project created");
        self.persist();
        project_id
    }

    pub fn update_project(&mut self, id: ProjectId, patch: ProjectPatch) {
        let now_ms = self.clock.now_ms();
        if self.registry.update_project(id, patch, now_ms) {
            info!("event=project_update module=service status=ok project_id={id}");
            self.persist();
        }
    }

    /// Deletes a project and detaches its tasks.
    pub fn delete_project(&mut self, id: ProjectId) {
        let Some(detached) = self.registry.remove_project(id) else {
            return;
        };
        info!(
            "event=project_delete module=service status=ok project_id={id} \
             detached_tasks={detached}"
        );
        self.toast(ToastKind::Info, "Project deleted");
        self.persist();
    }

    pub fn all_categories(&self) -> Vec<Category> {
        self.registry.all_categories()
    }

    /// Creates a custom category and returns its id.
    pub fn add_category(
        &mut self,
        label: impl Into<String>,
        emoji: impl Into<String>,
    ) -> Result<String, CategoryError> {
        let category = Category {
            id: Uuid::new_v4().simple().to_string(),
            label: label.into().trim().to_string(),
            emoji: emoji.into(),
            created_at: self.clock.now_ms(),
        };
        let category_id = category.id.clone();
        self.registry.push_category(category)?;

        self.toast(ToastKind::Success, "Category created");
        self.persist();
        Ok(category_id)
    }

    pub fn update_category(
        &mut self,
        id: &str,
        label: &str,
        emoji: &str,
    ) -> Result<(), CategoryError> {
        self.registry.update_category(id, label, emoji)?;
        self.toast(ToastKind::Success, "Category updated");
        self.persist();
        Ok(())
    }

    /// Deletes a custom category; refused while tasks still use it.
    pub fn delete_category(&mut self, id: &str) -> Result<(), CategoryError> {
        match self.registry.remove_category(id) {
            Ok(_) => {
                self.toast(ToastKind::Success, "Category deleted");
                self.persist();
                Ok(())
            }
            Err(err) => {
                if let CategoryError::InUse { task_count, .. } = &err {
                    self.toast(
                        ToastKind::Error,
                        format!("Cannot delete: {task_count} task(s) use this category"),
                    );
                }
                Err(err)
            }
        }
    }

    pub fn relations(&self) -> &[TaskRelation] {
        self.registry.relations()
    }

    /// Relations touching `task_id` in either direction.
    ///
    /// Links whose other end was deleted are skipped; they come back when
    /// the deletion is undone.
    pub fn relations_for(&self, task_id: TaskId) -> Vec<&TaskRelation> {
        self.registry.relations_for(task_id)
    }

    /// Links two tasks. Relations are not recorded in history.
    pub fn add_relation(
        &mut self,
        from: TaskId,
        to: TaskId,
        kind: RelationKind,
    ) -> Result<RelationId, RelationError> {
        let relation = TaskRelation::new(from, to, kind, self.clock.now_ms());
        let relation_id = relation.id;
        if let Err(err) = self.registry.push_relation(relation) {
            debug!(
                "event=relation_add module=service status=rejected from={from} to={to} error={err}"
            );
            return Err(err);
        }

        info!(
            "event=relation_add module=service status=ok relation_id={relation_id} kind={}",
            kind.as_str()
        );
        self.toast(ToastKind::Success, "Relation created");
        self.persist();
        Ok(relation_id)
    }

    /// Removes a relation; returns whether it existed.
    pub fn remove_relation(&mut self, id: RelationId) -> bool {
        if self.registry.remove_relation(id).is_none() {
            debug!("event=relation_remove module=service status=skipped relation_id={id}");
            return false;
        }
        info!("event=relation_remove module=service status=ok relation_id={id}");
        self.toast(ToastKind::Info, "Relation removed");
        self.persist();
        true
    }

    /// Writes the current snapshot, returning the repository error.
    pub fn flush(&mut self) -> RepoResult<()> {
        let result = self.repo.save_state(&self.registry);
        match &result {
            Ok(()) => self.last_persist_error = None,
            Err(err) => self.last_persist_error = Some(err.to_string()),
        }
        result
    }

    /// Message of the most recent failed write, cleared by the next success.
    pub fn last_persist_error(&self) -> Option<&str> {
        self.last_persist_error.as_deref()
    }

    fn request_unlock_after_completion(&mut self, now_ms: i64) {
        let visible = self.registry.visible_count();
        let hidden = self.registry.hidden_count();
        if !self.registry.quota().admits(visible) || hidden == 0 {
            return;
        }

        if self.config.unlocks_synchronously() {
            self.unlock_next_tasks(1);
        } else {
            self.unlocks.schedule(1, now_ms, self.config.unlock_delay_ms);
            debug!(
                "event=task_unlock module=service status=scheduled delay_ms={}",
                self.config.unlock_delay_ms
            );
        }
    }

    fn run_unlock_request(&mut self, pending: PendingUnlock) -> usize {
        let room = self
            .registry
            .quota()
            .remaining(self.registry.visible_count());
        let count = pending.requested.min(room);
        if count == 0 {
            debug!(
                "event=task_unlock module=service status=skipped reason=quota_full requested={}",
                pending.requested
            );
            return 0;
        }
        self.unlock_next_tasks(count)
    }

    fn persist(&mut self) {
        if let Err(err) = self.flush() {
            error!("event=state_persist module=service status=error error={err}");
            self.toast(ToastKind::Error, format!("Could not save changes: {err}"));
        }
    }

    fn toast(&self, kind: ToastKind, message: impl Into<String>) {
        self.notifier
            .notify(Toast::new(kind, message, self.clock.now_ms()));
    }
}

fn visibility_label(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Visible => "visible",
        Visibility::Hidden => "hidden",
    }
}
