use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use model::Snowflake;
use tokio::time::Instant;

/// Per-user, per-action rate limiting of commands.
#[derive(Default)]
pub struct CooldownService {
    last_used: DashMap<(Snowflake, String), Instant>,
}

impl CooldownService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true and starts a new window if `subject` may perform `action` now.
    pub fn check(&self, subject: Snowflake, action: &str, window: Duration) -> bool {
        let now = Instant::now();

        match self.last_used.entry((subject, action.to_owned())) {
            Entry::Occupied(mut entry) => {
                if now.duration_since(*entry.get()) < window {
                    false
                } else {
                    entry.insert(now);
                    true
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        }
    }

    /// Time left until `subject` may perform `action` again.
    pub fn remaining(&self, subject: Snowflake, action: &str, window: Duration) -> Option<Duration> {
        let last = *self.last_used.get(&(subject, action.to_owned()))?;
        window
            .checked_sub(last.elapsed())
            .filter(|remaining| !remaining.is_zero())
    }

    /// Forgets every use older than `window`.
    pub fn purge(&self, window: Duration) {
        self.last_used.retain(|_, last| last.elapsed() < window);
    }

    pub fn len(&self) -> usize {
        self.last_used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_used.is_empty()
    }
}
