use std::time::Duration;

use dashmap::DashMap;
use model::Snowflake;
use tokio::time::Instant;

use crate::import::ImportScope;
use crate::{Error, Result};

/// The choices a user has made so far in an import flow.
#[derive(Debug, Clone)]
pub struct ImportSession {
    pub snapshot: Option<String>,
    pub scope: Option<ImportScope>,
    pub in_progress: bool,
    pub started_at: Instant,
}

impl ImportSession {
    fn new() -> Self {
        Self {
            snapshot: None,
            scope: None,
            in_progress: false,
            started_at: Instant::now(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot.is_some() && self.scope.is_some()
    }
}

/// Import flows keyed by the user driving them. A user has at most one flow, and at most one
/// import running.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<Snowflake, ImportSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh flow, discarding earlier choices.
    pub fn begin(&self, user: Snowflake) -> Result<()> {
        if self.is_running(user) {
            return Error::ImportInProgress.into();
        }

        self.sessions.insert(user, ImportSession::new());
        Ok(())
    }

    pub fn select_snapshot(&self, user: Snowflake, identifier: &str) -> Result<()> {
        self.update(user, |session| session.snapshot = Some(identifier.to_owned()))
    }

    pub fn select_scope(&self, user: Snowflake, scope: ImportScope) -> Result<()> {
        self.update(user, |session| session.scope = Some(scope))
    }

    /// Marks the flow as running and hands out its choices.
    pub fn start(&self, user: Snowflake) -> Result<(String, ImportScope)> {
        let mut session = match self.sessions.get_mut(&user) {
            Some(session) => session,
            None => return Error::IncompleteSession.into(),
        };

        if session.in_progress {
            return Error::ImportInProgress.into();
        }

        match (session.snapshot.clone(), session.scope) {
            (Some(snapshot), Some(scope)) => {
                session.in_progress = true;
                Ok((snapshot, scope))
            }
            _ => Error::IncompleteSession.into(),
        }
    }

    /// Ends the flow once its import has completed.
    pub fn finish(&self, user: Snowflake) {
        self.sessions.remove(&user);
    }

    /// Abandons the flow. A running import cannot be cancelled.
    pub fn cancel(&self, user: Snowflake) -> bool {
        self.sessions
            .remove_if(&user, |_, session| !session.in_progress)
            .is_some()
    }

    pub fn get(&self, user: Snowflake) -> Option<ImportSession> {
        self.sessions.get(&user).map(|session| session.clone())
    }

    pub fn is_running(&self, user: Snowflake) -> bool {
        self.sessions
            .get(&user)
            .map_or(false, |session| session.in_progress)
    }

    /// Drops idle flows older than `max_age`.
    pub fn purge_stale(&self, max_age: Duration) {
        self.sessions
            .retain(|_, session| session.in_progress || session.started_at.elapsed() < max_age);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn update<F: FnOnce(&mut ImportSession)>(&self, user: Snowflake, f: F) -> Result<()> {
        let mut session = self.sessions.entry(user).or_insert_with(ImportSession::new);
        if session.in_progress {
            return Error::ImportInProgress.into();
        }

        f(&mut *session);
        Ok(())
    }
}
