//! Quota value and visible/hidden partitions.

use crate::model::task::Task;
use serde::{Deserialize, Serialize};

/// Maximum number of simultaneously visible pending tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskQuota(u32);

impl TaskQuota {
    pub const MIN: Self = Self(1);
    pub const UNLIMITED: Self = Self(u32::MAX);
    pub const DEFAULT: Self = Self(10);

    /// Builds a quota, clamping values below one.
    pub fn new(value: u32) -> Self {
        Self(value.max(Self::MIN.0))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_unlimited(self) -> bool {
        self == Self::UNLIMITED
    }

    /// Whether another visible task fits under this quota.
    pub fn admits(self, visible_count: usize) -> bool {
        visible_count < self.as_usize()
    }

    /// Free slots left for `visible_count` visible tasks, saturating at zero.
    pub fn remaining(self, visible_count: usize) -> usize {
        self.as_usize().saturating_sub(visible_count)
    }

    fn as_usize(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl Default for TaskQuota {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Quota choices offered by the settings surface.
pub const QUOTA_PRESETS: &[TaskQuota] = &[
    TaskQuota(5),
    TaskQuota(10),
    TaskQuota(15),
    TaskQuota(20),
    TaskQuota::UNLIMITED,
];

/// Pending tasks currently shown to the user, in list order.
pub fn visible_tasks(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().filter(|task| task.is_visible_pending()).collect()
}

/// Pending tasks held back by the quota, in list order.
pub fn hidden_tasks(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().filter(|task| task.is_hidden_pending()).collect()
}

pub fn visible_count(tasks: &[Task]) -> usize {
    tasks.iter().filter(|task| task.is_visible_pending()).count()
}

pub fn hidden_count(tasks: &[Task]) -> usize {
    tasks.iter().filter(|task| task.is_hidden_pending()).count()
}

/// How many hidden tasks could be unlocked right now without exceeding the quota.
pub fn unlockable_count(tasks: &[Task], quota: TaskQuota) -> usize {
    quota.remaining(visible_count(tasks)).min(hidden_count(tasks))
}

#[cfg(test)]
mod tests {
    use super::{TaskQuota, QUOTA_PRESETS};

    #[test]
    fn quota_clamps_to_one() {
        assert_eq!(TaskQuota::new(0).get(), 1);
        assert_eq!(TaskQuota::new(7).get(), 7);
    }

    #[test]
    fn unlimited_quota_always_admits() {
        assert!(TaskQuota::UNLIMITED.admits(1_000_000));
        assert!(QUOTA_PRESETS.last().unwrap().is_unlimited());
    }

    #[test]
    fn remaining_saturates_when_over_quota() {
        assert_eq!(TaskQuota::new(2).remaining(5), 0);
        assert_eq!(TaskQuota::new(5).remaining(2), 3);
    }
}
