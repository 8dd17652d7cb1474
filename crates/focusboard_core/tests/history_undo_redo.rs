use focusboard_core::db::open_db_in_memory;
use focusboard_core::{
    EngineConfig, HistoryAction, ManualClock, SqliteStateRepository, TaskDraft, TaskPatch,
    TaskService, ToastQueue,
};
use rusqlite::Connection;

fn setup<'a>(
    conn: &'a Connection,
    toasts: &'a ToastQueue,
    clock: &ManualClock,
    config: EngineConfig,
) -> TaskService<SqliteStateRepository<'a>, &'a ToastQueue> {
    let repo = SqliteStateRepository::try_new(conn).unwrap();
    TaskService::load(repo, toasts, clock.clone(), config).unwrap()
}

fn assert_index_in_bounds<R, N>(service: &TaskService<R, N>)
where
    R: focusboard_core::StateRepository,
    N: focusboard_core::Notifier,
{
    let index = service.history_index();
    assert!(index >= -1);
    assert!(index < service.history_len() as i64);
}

#[test]
fn empty_history_cannot_undo_or_redo() {
    let conn = open_db_in_memory().unwrap();
    let toasts = ToastQueue::new();
    let mut service = setup(&conn, &toasts, &ManualClock::new(0), EngineConfig::immediate());

    assert_eq!(service.history_index(), -1);
    assert!(!service.undo());
    assert!(!service.redo());
    assert!(toasts.drain().is_empty());
}

#[test]
fn add_undo_redo_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let toasts = ToastQueue::new();
    let mut service = setup(&conn, &toasts, &ManualClock::new(0), EngineConfig::immediate());
    service.add_task(TaskDraft::new("first"));
    let id = service.add_task(TaskDraft::new("second"));
    let after_add = service.tasks().to_vec();

    assert!(service.undo());
    assert!(service.task(id).is_none());
    assert_eq!(service.history_index(), 0);

    assert!(service.redo());
    assert_eq!(service.tasks(), after_add.as_slice());
    assert_eq!(service.history_index(), 1);
    assert_eq!(service.history_len(), 2);
}

#[test]
fn delete_undo_restores_original_position() {
    let conn = open_db_in_memory().unwrap();
    let toasts = ToastQueue::new();
    let mut service = setup(&conn, &toasts, &ManualClock::new(0), EngineConfig::immediate());
    service.add_task(TaskDraft::new("a"));
    let middle = service.add_task(TaskDraft::new("b"));
    service.add_task(TaskDraft::new("c"));
    let before_delete = service.tasks().to_vec();

    service.delete_task(middle);
    let after_delete = service.tasks().to_vec();

    assert!(service.undo());
    assert_eq!(service.tasks(), before_delete.as_slice());
    assert!(service.redo());
    assert_eq!(service.tasks(), after_delete.as_slice());
}

#[test]
fn toggle_undo_redo_restores_completion_exactly() {
    let conn = open_db_in_memory().unwrap();
    let toasts = ToastQueue::new();
    let clock = ManualClock::new(0);
    let mut service = setup(&conn, &toasts, &clock, EngineConfig::immediate());
    let id = service.add_task(TaskDraft::new("toggle me"));
    let before_toggle = service.tasks().to_vec();

    clock.set(7_000);
    service.toggle_task(id);
    let after_toggle = service.tasks().to_vec();

    clock.set(20_000);
    assert!(service.undo());
    assert_eq!(service.tasks(), before_toggle.as_slice());
    assert!(service.redo());
    assert_eq!(service.tasks(), after_toggle.as_slice());
    assert_eq!(service.task(id).unwrap().completed_at, Some(7_000));
}

#[test]
fn update_redo_reapplies_recorded_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let toasts = ToastQueue::new();
    let mut service = setup(&conn, &toasts, &ManualClock::new(0), EngineConfig::immediate());
    let id = service.add_task(TaskDraft::new("old"));

    service.update_task(
        id,
        TaskPatch {
            title: Some("new".to_string()),
            description: Some(Some("details".to_string())),
            ..TaskPatch::default()
        },
    );
    let updated = service.task(id).unwrap().clone();

    assert!(service.undo());
    let reverted = service.task(id).unwrap();
    assert_eq!(reverted.title, "old");
    assert_eq!(reverted.description, None);

    assert!(service.redo());
    assert_eq!(service.task(id).unwrap(), &updated);
}

#[test]
fn new_command_discards_redo_branch() {
    let conn = open_db_in_memory().unwrap();
    let toasts = ToastQueue::new();
    let mut service = setup(&conn, &toasts, &ManualClock::new(0), EngineConfig::immediate());
    service.add_task(TaskDraft::new("a"));
    let b = service.add_task(TaskDraft::new("b"));

    assert!(service.undo());
    assert!(service.can_redo());

    let c = service.add_task(TaskDraft::new("c"));
    assert!(!service.can_redo());
    assert!(!service.redo());
    assert_eq!(service.history_len(), 2);
    assert_eq!(service.history_index(), 1);
    assert!(service.task(b).is_none());
    assert!(service.task(c).is_some());

    let kinds: Vec<&str> = service.history().entries().map(HistoryAction::kind).collect();
    assert_eq!(kinds, vec!["add", "add"]);
}

#[test]
fn undo_and_redo_do_not_record_history() {
    let conn = open_db_in_memory().unwrap();
    let toasts = ToastQueue::new();
    let mut service = setup(&conn, &toasts, &ManualClock::new(0), EngineConfig::immediate());
    let id = service.add_task(TaskDraft::new("a"));
    service.toggle_task(id);

    service.undo();
    service.undo();
    service.redo();
    assert_eq!(service.history_len(), 2);
    assert_eq!(service.history_index(), 0);
}

#[test]
fn index_stays_in_bounds_for_mixed_sequences() {
    let conn = open_db_in_memory().unwrap();
    let toasts = ToastQueue::new();
    let mut service = setup(&conn, &toasts, &ManualClock::new(0), EngineConfig::immediate());

    let mut ids = Vec::new();
    for step in 0..30 {
        match step % 6 {
            0 | 3 => ids.push(service.add_task(TaskDraft::new(format!("task-{step}")))),
            1 => {
                if let Some(id) = ids.first() {
                    service.toggle_task(*id);
                }
            }
            2 => {
                service.undo();
                service.undo();
            }
            4 => {
                service.redo();
            }
            _ => {
                if let Some(id) = ids.pop() {
                    service.delete_task(id);
                }
            }
        }
        assert_index_in_bounds(&service);
    }

    while service.undo() {
        assert_index_in_bounds(&service);
    }
    assert_eq!(service.history_index(), -1);
    while service.redo() {
        assert_index_in_bounds(&service);
    }
    assert_eq!(service.history_index(), service.history_len() as i64 - 1);
}

#[test]
fn history_limit_drops_oldest_entries() {
    let conn = open_db_in_memory().unwrap();
    let toasts = ToastQueue::new();
    let config = EngineConfig {
        unlock_delay_ms: 0,
        history_limit: Some(3),
    };
    let mut service = setup(&conn, &toasts, &ManualClock::new(0), config);

    for index in 0..5 {
        service.add_task(TaskDraft::new(format!("task-{index}")));
    }
    assert_eq!(service.history_len(), 3);
    assert_eq!(service.history_index(), 2);

    assert!(service.undo());
    assert!(service.undo());
    assert!(service.undo());
    assert!(!service.undo());
    assert_eq!(service.tasks().len(), 2);
}
