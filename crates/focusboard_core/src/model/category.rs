//! Task categories.
//!
//! # Invariants
//! - Built-in categories always exist and cannot be edited or deleted.
//! - Custom category ids never collide with built-in ids.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub label: String,
    pub emoji: String,
    /// Unix epoch milliseconds; `0` for built-in categories.
    pub created_at: i64,
}

const BUILTIN: &[(&str, &str, &str)] = &[
    ("dev", "Dev", "💻"),
    ("design", "Design", "🎨"),
    ("work", "Work", "💼"),
    ("personal", "Personal", "🏠"),
    ("urgent", "Urgent", "🚨"),
];

/// Returns the built-in categories in display order.
pub fn default_categories() -> Vec<Category> {
    BUILTIN
        .iter()
        .map(|(id, label, emoji)| Category {
            id: (*id).to_string(),
            label: (*label).to_string(),
            emoji: (*emoji).to_string(),
            created_at: 0,
        })
        .collect()
}

pub fn is_builtin_category(id: &str) -> bool {
    BUILTIN.iter().any(|(builtin_id, _, _)| *builtin_id == id)
}
