//! CLI entry point for inspecting and driving a FocusBoard database.
//!
//! # Responsibility
//! - Verify `focusboard_core` linkage (`ping`, `version`).
//! - Run single task commands against a database file for local checks.
//!
//! The database path comes from `--db` or `FOCUSBOARD_DB`; logs go to
//! `--log-dir` / `FOCUSBOARD_LOG_DIR` when set.

use clap::{Parser, Subcommand};
use focusboard_core::db::open_db;
use focusboard_core::{
    default_log_level, init_logging, EngineConfig, NoopNotifier, Notifier, RelationKind,
    SqliteStateRepository, StateRepository, SystemClock, TaskDraft, TaskId, TaskPriority,
    TaskService, TaskStatus,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// focusboard - quota-limited task board
///
/// Prints the core linkage check, then runs at most one command against the
/// database and prints the resulting board.
#[derive(Parser, Debug)]
#[command(name = "focusboard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the SQLite database
    #[arg(long, global = true, env = "FOCUSBOARD_DB")]
    db: Option<PathBuf>,

    /// Directory for rolling log files
    #[arg(long, global = true, env = "FOCUSBOARD_LOG_DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
enum Command {
    /// Add a task with medium priority
    Add {
        /// Task title words
        #[arg(required = true)]
        title: Vec<String>,
    },

    /// Add a task with urgent priority
    AddUrgent {
        /// Task title words
        #[arg(required = true)]
        title: Vec<String>,
    },

    /// Flip a task between pending and completed
    Toggle {
        /// Task id
        id: TaskId,
    },

    /// Delete a task
    Delete {
        /// Task id
        id: TaskId,
    },

    /// Move a task to the in-progress column
    Start {
        /// Task id
        id: TaskId,
    },

    /// Unlock up to COUNT hidden tasks
    Unlock {
        /// How many hidden tasks to reveal
        count: usize,
    },

    /// Set the visible task quota
    Quota {
        /// New quota, clamped to at least 1
        value: u32,
    },

    /// Link two tasks
    Relate {
        /// Task that owns the relation
        from: TaskId,

        /// Task on the other end
        to: TaskId,

        /// Relation kind: blocks, blocked_by, related, duplicate, parent, child
        #[arg(long, default_value = "related", value_parser = parse_relation_kind)]
        kind: RelationKind,
    },

    /// Print the board without changing it
    List,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    println!("focusboard_core ping={}", focusboard_core::ping());
    println!("focusboard_core version={}", focusboard_core::core_version());

    if let Some(log_dir) = cli.log_dir.as_deref() {
        if let Err(err) = init_logging(default_log_level(), log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let Some(db_path) = cli.db.as_deref() else {
        return ExitCode::SUCCESS;
    };

    match run(db_path, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(db_path: &Path, command: Option<Command>) -> Result<(), String> {
    let conn = open_db(db_path).map_err(|err| err.to_string())?;
    let repo = SqliteStateRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let mut service = TaskService::load(repo, NoopNotifier, SystemClock, EngineConfig::immediate())
        .map_err(|err| err.to_string())?;

    match command {
        None | Some(Command::List) => {}
        Some(Command::Add { title }) => {
            let id = service.add_task(TaskDraft::new(title.join(" ")));
            println!("added {id}");
        }
        Some(Command::AddUrgent { title }) => {
            let draft = TaskDraft::new(title.join(" ")).with_priority(TaskPriority::Urgent);
            let id = service.add_task(draft);
            println!("added {id}");
        }
        Some(Command::Toggle { id }) => service.toggle_task(id),
        Some(Command::Delete { id }) => service.delete_task(id),
        Some(Command::Start { id }) => service.move_task(id, TaskStatus::InProgress),
        Some(Command::Unlock { count }) => {
            let unlocked = service.unlock_next_tasks(count);
            println!("unlocked {unlocked}");
        }
        Some(Command::Quota { value }) => service.set_task_quota(value),
        Some(Command::Relate { from, to, kind }) => {
            let id = service
                .add_relation(from, to, kind)
                .map_err(|err| err.to_string())?;
            println!("related {id}");
        }
    }

    if let Some(err) = service.last_persist_error() {
        return Err(format!("changes not saved: {err}"));
    }
    print_summary(&service);
    Ok(())
}

fn print_summary<R: StateRepository, N: Notifier>(service: &TaskService<R, N>) {
    let quota = service.quota();
    let quota_label = if quota.is_unlimited() {
        "unlimited".to_string()
    } else {
        quota.get().to_string()
    };
    println!(
        "tasks={} visible={} hidden={} quota={quota_label} unlockable={} relations={}",
        service.tasks().len(),
        service.visible_tasks().len(),
        service.hidden_tasks().len(),
        service.unlockable_count(),
        service.relations().len()
    );
    for task in service.tasks() {
        let marker = if task.completed {
            "x"
        } else if task.is_hidden_pending() {
            "~"
        } else {
            " "
        };
        println!("[{marker}] {} {:?} {}", task.id, task.priority, task.title);
    }
    for relation in service.relations() {
        println!(
            "{} -{}-> {}",
            relation.from_task_id,
            relation.kind.as_str(),
            relation.to_task_id
        );
    }
}

fn parse_relation_kind(value: &str) -> Result<RelationKind, String> {
    RelationKind::parse(value).ok_or_else(|| {
        let known: Vec<&str> = RelationKind::ALL.iter().map(|kind| kind.as_str()).collect();
        format!("unknown relation kind `{value}` (expected one of {})", known.join(", "))
    })
}
