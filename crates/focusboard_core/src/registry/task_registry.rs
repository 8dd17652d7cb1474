//! Task registry state container.

use crate::model::category::{default_categories, is_builtin_category, Category};
use crate::model::project::{Project, ProjectId, ProjectPatch};
use crate::model::relation::{RelationId, TaskRelation};
use crate::model::task::{Task, TaskId, Visibility};
use crate::quota::limit::{self, TaskQuota};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Category maintenance errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryError {
    /// Label is blank after trim.
    InvalidLabel,
    /// Built-in categories are read-only.
    BuiltinCategory(String),
    /// Category id is unknown.
    NotFound(String),
    /// Tasks still reference the category.
    InUse { id: String, task_count: usize },
}

impl Display for CategoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLabel => write!(f, "category label must not be blank"),
            Self::BuiltinCategory(id) => write!(f, "built-in category is read-only: {id}"),
            Self::NotFound(id) => write!(f, "category not found: {id}"),
            Self::InUse { id, task_count } => {
                write!(f, "category {id} is used by {task_count} task(s)")
            }
        }
    }
}

impl Error for CategoryError {}

/// Relation maintenance errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationError {
    /// Both ends name the same task.
    SelfRelation(TaskId),
    /// One end names no existing task.
    UnknownTask(TaskId),
    /// The same ends are already linked with the same kind.
    Duplicate,
}

impl Display for RelationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfRelation(id) => write!(f, "task {id} cannot relate to itself"),
            Self::UnknownTask(id) => write!(f, "task not found: {id}"),
            Self::Duplicate => write!(f, "relation already exists"),
        }
    }
}

impl Error for RelationError {}

/// Canonical in-memory state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    projects: Vec<Project>,
    categories: Vec<Category>,
    relations: Vec<TaskRelation>,
    quota: TaskQuota,
}

impl TaskRegistry {
    pub fn new(quota: TaskQuota) -> Self {
        Self {
            quota,
            ..Self::default()
        }
    }

    /// Rebuilds a registry from persisted parts.
    ///
    /// Later duplicates of a task id are dropped to keep ids unique, and
    /// relations whose ends no longer exist are discarded.
    pub fn from_parts(
        tasks: Vec<Task>,
        projects: Vec<Project>,
        categories: Vec<Category>,
        relations: Vec<TaskRelation>,
        quota: TaskQuota,
    ) -> Self {
        let mut registry = Self::new(quota);
        for task in tasks {
            registry.push_task(task);
        }
        registry.projects = projects;
        registry.categories = categories;
        registry.relations = relations
            .into_iter()
            .filter(|relation| registry.is_live(relation))
            .collect();
        registry
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut [Task] {
        &mut self.tasks
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Custom categories only, in creation order.
    pub fn custom_categories(&self) -> &[Category] {
        &self.categories
    }

    /// Built-in categories followed by custom ones.
    pub fn all_categories(&self) -> Vec<Category> {
        let mut all = default_categories();
        all.extend(self.categories.iter().cloned());
        all
    }

    pub fn quota(&self) -> TaskQuota {
        self.quota
    }

    pub fn set_quota(&mut self, quota: TaskQuota) {
        self.quota = quota;
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    /// Appends a task; returns its index, or `None` when the id already exists.
    pub fn push_task(&mut self, task: Task) -> Option<usize> {
        let index = self.tasks.len();
        self.insert_task_at(index, task)
    }

    /// Inserts a task at `index` (clamped to the list length).
    ///
    /// Returns the actual index, or `None` when the id already exists.
    pub fn insert_task_at(&mut self, index: usize, task: Task) -> Option<usize> {
        if self.position(task.id).is_some() {
            return None;
        }
        let index = index.min(self.tasks.len());
        self.tasks.insert(index, task);
        Some(index)
    }

    /// Removes a task; returns its former index and record.
    pub fn remove_task(&mut self, id: TaskId) -> Option<(usize, Task)> {
        let index = self.position(id)?;
        Some((index, self.tasks.remove(index)))
    }

    /// Replaces the stored task with the same id; returns whether it existed.
    pub fn replace_task(&mut self, task: Task) -> bool {
        match self.task_mut(task.id) {
            Some(slot) => {
                *slot = task;
                true
            }
            None => false,
        }
    }

    /// Re-applies the creation visibility rule to a task that has just
    /// entered the pending set (reopened or reinserted).
    ///
    /// A task that was already pending keeps its visibility, so lowering the
    /// quota never hides shown tasks. Returns the assigned visibility, or
    /// `None` when nothing was reassigned.
    pub fn settle_reentry(&mut self, id: TaskId, was_pending: bool) -> Option<Visibility> {
        if was_pending {
            return None;
        }
        let others = self
            .tasks
            .iter()
            .filter(|task| task.id != id && task.is_visible_pending())
            .count();
        let visibility = if self.quota.admits(others) {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
        let task = self.task_mut(id).filter(|task| task.is_pending())?;
        task.visibility = visibility;
        Some(visibility)
    }

    pub fn visible_tasks(&self) -> Vec<&Task> {
        limit::visible_tasks(&self.tasks)
    }

    pub fn hidden_tasks(&self) -> Vec<&Task> {
        limit::hidden_tasks(&self.tasks)
    }

    pub fn visible_count(&self) -> usize {
        limit::visible_count(&self.tasks)
    }

    pub fn hidden_count(&self) -> usize {
        limit::hidden_count(&self.tasks)
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    pub fn push_project(&mut self, project: Project) {
        self.projects.push(project);
    }

    /// Merges a project patch; returns whether the project existed.
    pub fn update_project(&mut self, id: ProjectId, patch: ProjectPatch, now_ms: i64) -> bool {
        let Some(project) = self.projects.iter_mut().find(|project| project.id == id) else {
            return false;
        };
        if let Some(name) = patch.name {
            project.name = name;
        }
        if let Some(color) = patch.color {
            project.color = color;
        }
        if let Some(icon) = patch.icon {
            project.icon = icon;
        }
        project.updated_at = Some(now_ms);
        true
    }

    /// Removes a project and clears the weak reference on its tasks.
    ///
    /// Returns the number of detached tasks, or `None` for an unknown project.
    pub fn remove_project(&mut self, id: ProjectId) -> Option<usize> {
        let index = self.projects.iter().position(|project| project.id == id)?;
        self.projects.remove(index);

        let mut detached = 0;
        for task in self.tasks.iter_mut().filter(|task| task.project_id == Some(id)) {
            task.project_id = None;
            detached += 1;
        }
        Some(detached)
    }

    pub fn relations(&self) -> &[TaskRelation] {
        &self.relations
    }

    /// Relations touching `task_id` whose both ends still exist.
    pub fn relations_for(&self, task_id: TaskId) -> Vec<&TaskRelation> {
        self.relations
            .iter()
            .filter(|relation| relation.involves(task_id) && self.is_live(relation))
            .collect()
    }

    pub fn push_relation(&mut self, relation: TaskRelation) -> Result<(), RelationError> {
        if relation.from_task_id == relation.to_task_id {
            return Err(RelationError::SelfRelation(relation.from_task_id));
        }
        for end in [relation.from_task_id, relation.to_task_id] {
            if self.task(end).is_none() {
                return Err(RelationError::UnknownTask(end));
            }
        }
        if self.relations.iter().any(|existing| existing.same_link(&relation)) {
            return Err(RelationError::Duplicate);
        }
        self.relations.push(relation);
        Ok(())
    }

    pub fn remove_relation(&mut self, id: RelationId) -> Option<TaskRelation> {
        let index = self.relations.iter().position(|relation| relation.id == id)?;
        Some(self.relations.remove(index))
    }

    fn is_live(&self, relation: &TaskRelation) -> bool {
        self.task(relation.from_task_id).is_some() && self.task(relation.to_task_id).is_some()
    }

    pub fn category_usage(&self, id: &str) -> usize {
        self.tasks.iter().filter(|task| task.category == id).count()
    }

    pub fn push_category(&mut self, category: Category) -> Result<(), CategoryError> {
        if category.label.trim().is_empty() {
            return Err(CategoryError::InvalidLabel);
        }
        if is_builtin_category(&category.id) {
            return Err(CategoryError::BuiltinCategory(category.id));
        }
        self.categories.push(category);
        Ok(())
    }

    pub fn update_category(
        &mut self,
        id: &str,
        label: &str,
        emoji: &str,
    ) -> Result<(), CategoryError> {
        if is_builtin_category(id) {
            return Err(CategoryError::BuiltinCategory(id.to_string()));
        }
        if label.trim().is_empty() {
            return Err(CategoryError::InvalidLabel);
        }
        let category = self
            .categories
            .iter_mut()
            .find(|category| category.id == id)
            .ok_or_else(|| CategoryError::NotFound(id.to_string()))?;
        category.label = label.trim().to_string();
        category.emoji = emoji.to_string();
        Ok(())
    }

    /// Deletes a custom category unless tasks still use it.
    pub fn remove_category(&mut self, id: &str) -> Result<Category, CategoryError> {
        if is_builtin_category(id) {
            return Err(CategoryError::BuiltinCategory(id.to_string()));
        }
        let index = self
            .categories
            .iter()
            .position(|category| category.id == id)
            .ok_or_else(|| CategoryError::NotFound(id.to_string()))?;
        let task_count = self.category_usage(id);
        if task_count > 0 {
            return Err(CategoryError::InUse {
                id: id.to_string(),
                task_count,
            });
        }
        Ok(self.categories.remove(index))
    }
}
