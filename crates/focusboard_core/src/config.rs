//! Task engine tuning knobs.
//!
//! The quota itself is user state and lives in the registry; this module
//! only holds process-level behavior settings.

/// Delay before the automatic unlock that follows a completion.
pub const DEFAULT_UNLOCK_DELAY_MS: i64 = 500;

/// Number of history entries kept before the oldest are dropped.
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// `0` runs the post-completion unlock synchronously.
    pub unlock_delay_ms: i64,
    /// `None` keeps the full session history.
    pub history_limit: Option<usize>,
}

impl EngineConfig {
    /// Config with synchronous unlocks, used by headless callers and tests.
    pub fn immediate() -> Self {
        Self {
            unlock_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn unlocks_synchronously(&self) -> bool {
        self.unlock_delay_ms <= 0
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            unlock_delay_ms: DEFAULT_UNLOCK_DELAY_MS,
            history_limit: Some(DEFAULT_HISTORY_LIMIT),
        }
    }
}
