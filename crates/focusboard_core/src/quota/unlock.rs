//! Hidden-task ranking and unlock.
//!
//! Ranking order, first difference wins:
//! 1. urgent priority
//! 2. overdue (due instant before now)
//! 3. due within three days
//! 4. has a due date
//! 5. earlier due date
//! 6. higher priority
//!
//! Ties keep list order. Due dates are read as midnight UTC.

use crate::clock::{date_start_ms, MS_PER_DAY};
use crate::model::task::{Task, TaskId, TaskPriority, Visibility};
use std::cmp::Ordering;

const DUE_SOON_WINDOW_MS: i64 = 3 * MS_PER_DAY;

/// Returns hidden pending tasks in unlock order.
pub fn rank_hidden(tasks: &[Task], now_ms: i64) -> Vec<&Task> {
    let mut hidden: Vec<&Task> = tasks.iter().filter(|task| task.is_hidden_pending()).collect();
    // `sort_by` is stable, which gives the list-order tie break.
    hidden.sort_by(|a, b| compare_for_unlock(a, b, now_ms));
    hidden
}

/// Promotes up to `count` hidden tasks to visible.
///
/// Saturating: with fewer hidden tasks than requested, all are unlocked.
/// Returns the ids that were unlocked, in unlock order.
pub fn unlock_next(tasks: &mut [Task], count: usize, now_ms: i64) -> Vec<TaskId> {
    let chosen: Vec<TaskId> = rank_hidden(tasks, now_ms)
        .into_iter()
        .take(count)
        .map(|task| task.id)
        .collect();

    for task in tasks.iter_mut() {
        if chosen.contains(&task.id) {
            task.visibility = Visibility::Visible;
        }
    }
    chosen
}

fn compare_for_unlock(a: &Task, b: &Task, now_ms: i64) -> Ordering {
    let a_due = a.due_date.map(date_start_ms);
    let b_due = b.due_date.map(date_start_ms);

    is_urgent(b)
        .cmp(&is_urgent(a))
        .then_with(|| is_overdue(b_due, now_ms).cmp(&is_overdue(a_due, now_ms)))
        .then_with(|| is_due_soon(b_due, now_ms).cmp(&is_due_soon(a_due, now_ms)))
        .then_with(|| b_due.is_some().cmp(&a_due.is_some()))
        .then_with(|| match (a_due, b_due) {
            (Some(a_due), Some(b_due)) => a_due.cmp(&b_due),
            _ => Ordering::Equal,
        })
        .then_with(|| b.priority.rank().cmp(&a.priority.rank()))
}

fn is_urgent(task: &Task) -> bool {
    task.priority == TaskPriority::Urgent
}

fn is_overdue(due_ms: Option<i64>, now_ms: i64) -> bool {
    due_ms.is_some_and(|due| due < now_ms)
}

fn is_due_soon(due_ms: Option<i64>, now_ms: i64) -> bool {
    due_ms.is_some_and(|due| due - now_ms < DUE_SOON_WINDOW_MS)
}

#[cfg(test)]
mod tests {
    use super::{rank_hidden, unlock_next};
    use crate::clock::date_start_ms;
    use crate::model::task::{Task, TaskDraft, TaskPriority, Visibility};
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn now_ms() -> i64 {
        date_start_ms(today()) + 12 * 60 * 60 * 1000
    }

    fn hidden(title: &str, priority: TaskPriority, due_in_days: Option<i64>) -> Task {
        let mut draft = TaskDraft::new(title).with_priority(priority);
        if let Some(days) = due_in_days {
            draft = draft.with_due_date(today() + chrono::Duration::days(days));
        }
        Task::from_draft(draft, 0, Visibility::Hidden)
    }

    fn titles(tasks: Vec<&Task>) -> Vec<&str> {
        tasks.into_iter().map(|task| task.title.as_str()).collect()
    }

    #[test]
    fn urgent_outranks_overdue_non_urgent() {
        let tasks = vec![
            hidden("late-low", TaskPriority::Low, Some(-5)),
            hidden("urgent-none", TaskPriority::Urgent, None),
        ];
        assert_eq!(titles(rank_hidden(&tasks, now_ms())), ["urgent-none", "late-low"]);
    }

    #[test]
    fn due_soon_outranks_far_due_and_dated_outranks_undated() {
        let tasks = vec![
            hidden("undated-high", TaskPriority::High, None),
            hidden("far", TaskPriority::Low, Some(30)),
            hidden("soon", TaskPriority::Low, Some(2)),
        ];
        assert_eq!(
            titles(rank_hidden(&tasks, now_ms())),
            ["soon", "far", "undated-high"]
        );
    }

    #[test]
    fn earlier_due_date_then_priority_break_ties() {
        let tasks = vec![
            hidden("later", TaskPriority::High, Some(20)),
            hidden("earlier-low", TaskPriority::Low, Some(10)),
            hidden("earlier-high", TaskPriority::High, Some(10)),
        ];
        assert_eq!(
            titles(rank_hidden(&tasks, now_ms())),
            ["earlier-high", "earlier-low", "later"]
        );
    }

    #[test]
    fn undated_ties_use_priority_then_list_order() {
        let tasks = vec![
            hidden("medium-a", TaskPriority::Medium, None),
            hidden("high", TaskPriority::High, None),
            hidden("medium-b", TaskPriority::Medium, None),
        ];
        assert_eq!(
            titles(rank_hidden(&tasks, now_ms())),
            ["high", "medium-a", "medium-b"]
        );
    }

    #[test]
    fn unlock_saturates_and_skips_completed_tasks() {
        let mut done = hidden("done", TaskPriority::Urgent, None);
        done.set_completed(true, 0);
        let mut tasks = vec![done, hidden("only", TaskPriority::Low, None)];

        let unlocked = unlock_next(&mut tasks, 5, now_ms());
        assert_eq!(unlocked, vec![tasks[1].id]);
        assert_eq!(tasks[1].visibility, Visibility::Visible);
        assert_eq!(tasks[0].visibility, Visibility::Hidden);
    }

    #[test]
    fn task_due_today_counts_as_overdue_after_midnight() {
        let tasks = vec![
            hidden("tomorrow", TaskPriority::Medium, Some(1)),
            hidden("today", TaskPriority::Medium, Some(0)),
        ];
        let ranked = rank_hidden(&tasks, now_ms());
        assert_eq!(ranked[0].title, "today");
    }
}
