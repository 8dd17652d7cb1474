//! Task state repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the durable subset of registry state: tasks (with subtasks),
//!   projects, custom categories, task relations and the quota setting.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `save_state` replaces the stored snapshot atomically.
//! - Read paths reject invalid persisted values instead of masking them.
//! - Rows without a stored visibility load as visible; rows without a status
//!   (or with one contradicting `completed`) derive it from `completed`.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::category::Category;
use crate::model::project::Project;
use crate::model::relation::{RelationKind, TaskRelation};
use crate::model::task::{Subtask, Task, TaskId, TaskPriority, TaskStatus, Visibility};
use crate::quota::limit::TaskQuota;
use crate::registry::task_registry::TaskRegistry;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_QUOTA_KEY: &str = "task_quota";
const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    completed,
    category,
    status,
    priority,
    created_at,
    completed_at,
    due_date,
    project_uuid,
    visibility,
    is_focus,
    description
FROM tasks
ORDER BY position ASC, uuid ASC";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for state persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match \
                 expected {expected_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::UninitializedConnection { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable storage for registry snapshots.
pub trait StateRepository {
    /// Loads the stored snapshot; an empty store yields an empty registry
    /// with the default quota.
    fn load_state(&self) -> RepoResult<TaskRegistry>;
    /// Replaces the stored snapshot with `registry`.
    fn save_state(&self, registry: &TaskRegistry) -> RepoResult<()>;
}

impl<R: StateRepository + ?Sized> StateRepository for &R {
    fn load_state(&self) -> RepoResult<TaskRegistry> {
        (**self).load_state()
    }

    fn save_state(&self, registry: &TaskRegistry) -> RepoResult<()> {
        (**self).save_state(registry)
    }
}

/// SQLite-backed state repository.
pub struct SqliteStateRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStateRepository<'conn> {
    /// Wraps a connection that has all migrations applied.
    ///
    /// Use `db::open_db` / `db::open_db_in_memory` to obtain one.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let actual_version = current_user_version(conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl StateRepository for SqliteStateRepository<'_> {
    fn load_state(&self) -> RepoResult<TaskRegistry> {
        let mut subtasks = load_subtasks(self.conn)?;

        let mut stmt = self.conn.prepare(TASK_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            let mut task = parse_task_row(row)?;
            task.subtasks = subtasks.remove(&task.id).unwrap_or_default();
            tasks.push(task);
        }

        let projects = load_projects(self.conn)?;
        let categories = load_categories(self.conn)?;
        let relations = load_relations(self.conn)?;
        let quota = load_quota(self.conn)?;

        Ok(TaskRegistry::from_parts(tasks, projects, categories, relations, quota))
    }

    fn save_state(&self, registry: &TaskRegistry) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(
            "DELETE FROM task_subtasks;
             DELETE FROM tasks;
             DELETE FROM projects;
             DELETE FROM categories;
             DELETE FROM task_relations;",
        )?;

        for (position, task) in registry.tasks().iter().enumerate() {
            insert_task(&tx, task, position)?;
        }

        for project in registry.projects() {
            tx.execute(
                "INSERT INTO projects (uuid, name, color, icon, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    project.id.to_string(),
                    project.name.as_str(),
                    project.color.as_str(),
                    project.icon.as_str(),
                    project.created_at,
                    project.updated_at,
                ],
            )?;
        }

        for category in registry.custom_categories() {
            tx.execute(
                "INSERT INTO categories (id, label, emoji, created_at) VALUES (?1, ?2, ?3, ?4);",
                params![
                    category.id.as_str(),
                    category.label.as_str(),
                    category.emoji.as_str(),
                    category.created_at,
                ],
            )?;
        }

        for relation in registry.relations() {
            tx.execute(
                "INSERT INTO task_relations (uuid, from_task_uuid, to_task_uuid, kind, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    relation.id.to_string(),
                    relation.from_task_id.to_string(),
                    relation.to_task_id.to_string(),
                    relation.kind.as_str(),
                    relation.created_at,
                ],
            )?;
        }

        tx.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            params![TASK_QUOTA_KEY, registry.quota().get().to_string()],
        )?;

        tx.commit()?;
        Ok(())
    }
}

fn insert_task(conn: &Connection, task: &Task, position: usize) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO tasks (
            uuid,
            position,
            title,
            completed,
            category,
            status,
            priority,
            created_at,
            completed_at,
            due_date,
            project_uuid,
            visibility,
            is_focus,
            description
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14);",
        params![
            task.id.to_string(),
            position_to_db(position)?,
            task.title.as_str(),
            bool_to_int(task.completed),
            task.category.as_str(),
            task_status_to_db(task.status),
            task_priority_to_db(task.priority),
            task.created_at,
            task.completed_at,
            task.due_date
                .map(|date| date.format(DUE_DATE_FORMAT).to_string()),
            task.project_id.map(|id| id.to_string()),
            visibility_to_db(task.visibility),
            bool_to_int(task.is_focus),
            task.description.as_deref(),
        ],
    )?;

    for (position, subtask) in task.subtasks.iter().enumerate() {
        conn.execute(
            "INSERT INTO task_subtasks (task_uuid, uuid, position, title, completed)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                task.id.to_string(),
                subtask.id.to_string(),
                position_to_db(position)?,
                subtask.title.as_str(),
                bool_to_int(subtask.completed),
            ],
        )?;
    }

    Ok(())
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id = parse_uuid(row.get("uuid")?, "tasks.uuid")?;
    let completed = parse_bool(row.get("completed")?, "tasks.completed")?;

    let status = match row.get::<_, Option<String>>("status")? {
        Some(value) => parse_task_status(&value).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid task status `{value}` in tasks.status"))
        })?,
        None if completed => TaskStatus::Done,
        None => TaskStatus::Todo,
    };
    // Legacy rows may disagree; the completed flag wins.
    let status = match (status, completed) {
        (TaskStatus::Done, false) => TaskStatus::Todo,
        (_, true) => TaskStatus::Done,
        (status, false) => status,
    };

    let priority_text: String = row.get("priority")?;
    let priority = parse_task_priority(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid task priority `{priority_text}` in tasks.priority"
        ))
    })?;

    let visibility = match row.get::<_, Option<String>>("visibility")? {
        Some(value) => parse_visibility(&value).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid visibility `{value}` in tasks.visibility"))
        })?,
        None => Visibility::Visible,
    };

    let due_date = match row.get::<_, Option<String>>("due_date")? {
        Some(value) => Some(NaiveDate::parse_from_str(&value, DUE_DATE_FORMAT).map_err(|_| {
            RepoError::InvalidData(format!("invalid due date `{value}` in tasks.due_date"))
        })?),
        None => None,
    };

    let project_id = match row.get::<_, Option<String>>("project_uuid")? {
        Some(value) => Some(parse_uuid(value, "tasks.project_uuid")?),
        None => None,
    };

    let created_at: i64 = row.get("created_at")?;
    let completed_at = if completed {
        row.get::<_, Option<i64>>("completed_at")?.or(Some(created_at))
    } else {
        None
    };

    Ok(Task {
        id,
        title: row.get("title")?,
        completed,
        category: row.get("category")?,
        status,
        priority,
        created_at,
        completed_at,
        due_date,
        project_id,
        visibility,
        subtasks: Vec::new(),
        is_focus: parse_bool(row.get("is_focus")?, "tasks.is_focus")?,
        description: row.get("description")?,
    })
}

fn load_subtasks(conn: &Connection) -> RepoResult<HashMap<TaskId, Vec<Subtask>>> {
    let mut stmt = conn.prepare(
        "SELECT task_uuid, uuid, title, completed
         FROM task_subtasks
         ORDER BY task_uuid ASC, position ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut by_task: HashMap<TaskId, Vec<Subtask>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let task_id = parse_uuid(row.get("task_uuid")?, "task_subtasks.task_uuid")?;
        let subtask = Subtask {
            id: parse_uuid(row.get("uuid")?, "task_subtasks.uuid")?,
            title: row.get("title")?,
            completed: parse_bool(row.get("completed")?, "task_subtasks.completed")?,
        };
        by_task.entry(task_id).or_default().push(subtask);
    }
    Ok(by_task)
}

fn load_projects(conn: &Connection) -> RepoResult<Vec<Project>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, name, color, icon, created_at, updated_at
         FROM projects
         ORDER BY created_at ASC, uuid ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut projects = Vec::new();
    while let Some(row) = rows.next()? {
        projects.push(Project {
            id: parse_uuid(row.get("uuid")?, "projects.uuid")?,
            name: row.get("name")?,
            color: row.get("color")?,
            icon: row.get("icon")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        });
    }
    Ok(projects)
}

fn load_categories(conn: &Connection) -> RepoResult<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, label, emoji, created_at
         FROM categories
         ORDER BY created_at ASC, id ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut categories = Vec::new();
    while let Some(row) = rows.next()? {
        categories.push(Category {
            id: row.get("id")?,
            label: row.get("label")?,
            emoji: row.get("emoji")?,
            created_at: row.get("created_at")?,
        });
    }
    Ok(categories)
}

fn load_relations(conn: &Connection) -> RepoResult<Vec<TaskRelation>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, from_task_uuid, to_task_uuid, kind, created_at
         FROM task_relations
         ORDER BY created_at ASC, uuid ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut relations = Vec::new();
    while let Some(row) = rows.next()? {
        let kind_text: String = row.get("kind")?;
        let kind = RelationKind::parse(&kind_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid relation kind `{kind_text}` in task_relations.kind"
            ))
        })?;
        let from_task_id =
            parse_uuid(row.get("from_task_uuid")?, "task_relations.from_task_uuid")?;
        let to_task_id = parse_uuid(row.get("to_task_uuid")?, "task_relations.to_task_uuid")?;
        relations.push(TaskRelation {
            id: parse_uuid(row.get("uuid")?, "task_relations.uuid")?,
            from_task_id,
            to_task_id,
            kind,
            created_at: row.get("created_at")?,
        });
    }
    Ok(relations)
}

fn load_quota(conn: &Connection) -> RepoResult<TaskQuota> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1;",
            [TASK_QUOTA_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match stored {
        Some(value) => value.parse::<u32>().map(TaskQuota::new).map_err(|_| {
            RepoError::InvalidData(format!("invalid task quota `{value}` in settings"))
        }),
        None => Ok(TaskQuota::DEFAULT),
    }
}

fn parse_uuid(value: String, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(&value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn parse_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

fn position_to_db(position: usize) -> RepoResult<i64> {
    i64::try_from(position)
        .map_err(|_| RepoError::InvalidData(format!("position {position} out of range")))
}

fn task_status_to_db(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Backlog => "backlog",
        TaskStatus::Todo => "todo",
        TaskStatus::InProgress => "in_progress",
        TaskStatus::Done => "done",
    }
}

fn parse_task_status(value: &str) -> Option<TaskStatus> {
    match value {
        "backlog" => Some(TaskStatus::Backlog),
        "todo" => Some(TaskStatus::Todo),
        "in_progress" | "in-progress" => Some(TaskStatus::InProgress),
        "done" => Some(TaskStatus::Done),
        _ => None,
    }
}

fn task_priority_to_db(priority: TaskPriority) -> &'static str {
    match priority {
        TaskPriority::Low => "low",
        TaskPriority::Medium => "medium",
        TaskPriority::High => "high",
        TaskPriority::Urgent => "urgent",
    }
}

fn parse_task_priority(value: &str) -> Option<TaskPriority> {
    match value {
        "low" => Some(TaskPriority::Low),
        "medium" => Some(TaskPriority::Medium),
        "high" => Some(TaskPriority::High),
        "urgent" => Some(TaskPriority::Urgent),
        _ => None,
    }
}

fn visibility_to_db(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Visible => "visible",
        Visibility::Hidden => "hidden",
    }
}

fn parse_visibility(value: &str) -> Option<Visibility> {
    match value {
        "visible" => Some(Visibility::Visible),
        "hidden" => Some(Visibility::Hidden),
        _ => None,
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
