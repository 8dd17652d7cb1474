use focusboard_core::db::open_db_in_memory;
use focusboard_core::{
    default_categories, CategoryError, EngineConfig, ManualClock, ProjectDraft, ProjectPatch,
    SqliteStateRepository, TaskDraft, TaskService, ToastKind, ToastQueue,
};
use rusqlite::Connection;
use serde_json::json;

fn setup<'a>(
    conn: &'a Connection,
    toasts: &'a ToastQueue,
    clock: &ManualClock,
) -> TaskService<SqliteStateRepository<'a>, &'a ToastQueue> {
    let repo = SqliteStateRepository::try_new(conn).unwrap();
    TaskService::load(repo, toasts, clock.clone(), EngineConfig::immediate()).unwrap()
}

#[test]
fn deleting_project_detaches_tasks() {
    let conn = open_db_in_memory().unwrap();
    let toasts = ToastQueue::new();
    let clock = ManualClock::new(100);
    let mut service = setup(&conn, &toasts, &clock);

    let project = service.add_project(ProjectDraft::new("Garden"));
    let task = service.add_task(TaskDraft::new("Plant tulips").with_project(project));
    assert_eq!(service.task(task).unwrap().project_id, Some(project));

    service.delete_project(project);

    assert!(service.projects().is_empty());
    assert_eq!(service.task(task).unwrap().project_id, None);
}

#[test]
fn updating_project_merges_fields_and_stamps_time() {
    let conn = open_db_in_memory().unwrap();
    let toasts = ToastQueue::new();
    let clock = ManualClock::new(100);
    let mut service = setup(&conn, &toasts, &clock);
    let project = service.add_project(ProjectDraft::new("Garden"));

    clock.set(250);
    service.update_project(
        project,
        ProjectPatch {
            name: Some("Backyard".to_string()),
            ..ProjectPatch::default()
        },
    );

    let stored = &service.projects()[0];
    assert_eq!(stored.name, "Backyard");
    assert_eq!(stored.created_at, 100);
    assert_eq!(stored.updated_at, Some(250));
}

#[test]
fn builtin_categories_are_listed_first_and_read_only() {
    let conn = open_db_in_memory().unwrap();
    let toasts = ToastQueue::new();
    let mut service = setup(&conn, &toasts, &ManualClock::new(0));

    let custom = service.add_category("Errands", "🛒").unwrap();
    let all = service.all_categories();
    let builtin = default_categories();
    assert_eq!(&all[..builtin.len()], builtin.as_slice());
    assert_eq!(all.last().unwrap().id, custom);

    assert_eq!(
        service.delete_category("work"),
        Err(CategoryError::BuiltinCategory("work".to_string()))
    );
    assert_eq!(
        service.update_category("dev", "Code", "⌨️"),
        Err(CategoryError::BuiltinCategory("dev".to_string()))
    );
    assert_eq!(service.add_category("   ", "x"), Err(CategoryError::InvalidLabel));
}

#[test]
fn category_in_use_cannot_be_deleted() {
    let conn = open_db_in_memory().unwrap();
    let toasts = ToastQueue::new();
    let mut service = setup(&conn, &toasts, &ManualClock::new(0));
    let category = service.add_category("Errands", "🛒").unwrap();
    let task = service.add_task(TaskDraft::new("Groceries").with_category(category.clone()));
    toasts.drain();

    let err = service.delete_category(&category).unwrap_err();
    assert_eq!(
        err,
        CategoryError::InUse {
            id: category.clone(),
            task_count: 1
        }
    );
    let drained = toasts.drain();
    assert_eq!(drained.len(), 1);
    assert_eq!(drained[0].kind, ToastKind::Error);

    service.delete_task(task);
    service.delete_category(&category).unwrap();
    assert_eq!(service.all_categories().len(), default_categories().len());
}

#[test]
fn task_serializes_with_snake_case_enums() {
    let conn = open_db_in_memory().unwrap();
    let toasts = ToastQueue::new();
    let mut service = setup(&conn, &toasts, &ManualClock::new(42));
    let id = service.add_task(TaskDraft::new("Serialize me"));
    service.move_task(id, focusboard_core::TaskStatus::InProgress);

    let value = serde_json::to_value(service.task(id).unwrap()).unwrap();
    assert_eq!(value["status"], json!("in_progress"));
    assert_eq!(value["priority"], json!("medium"));
    assert_eq!(value["visibility"], json!("visible"));
    assert_eq!(value["created_at"], json!(42));
    assert_eq!(value["completed_at"], json!(null));
}
