use std::sync::Arc;

use model::channel::Permission;
use model::guild::{Guild, Member, Role};
use model::{PermissionBitSet, Snowflake};
use tracing::info;

use super::{CooldownService, SessionStore};
use crate::export;
use crate::import::{ImportProgress, ImportScope, ImportSummary, Importer};
use crate::store::{SnapshotListing, SnapshotStore};
use crate::target::Target;
use crate::{Config, Error, Result};

pub const EXPORT: &str = "export";
pub const IMPORT: &str = "import";

/// The user running a command, as seen by the guild it is run in.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Invoker {
    pub user_id: Snowflake,
    pub is_owner: bool,
    pub permissions: PermissionBitSet,
}

impl Invoker {
    pub fn from_member(guild: &Guild, user_id: Snowflake, member: &Member, roles: &[Role]) -> Self {
        Self {
            user_id,
            is_owner: guild.owner_id == user_id,
            permissions: guild.base_permissions(user_id, member, roles),
        }
    }

    /// Only the owner and administrators may export or import.
    pub fn is_privileged(&self) -> bool {
        self.is_owner || self.permissions.has_permission(Permission::Administrator)
    }
}

/// The export and import commands, with their privilege gate, cooldown and import flows.
pub struct SchematicCommand<S: SnapshotStore + ?Sized> {
    config: Arc<Config>,
    store: Arc<S>,
    cooldowns: CooldownService,
    sessions: SessionStore,
}

impl<S: SnapshotStore + ?Sized> SchematicCommand<S> {
    pub fn new(config: Arc<Config>, store: Arc<S>) -> Self {
        Self {
            config,
            store,
            cooldowns: CooldownService::new(),
            sessions: SessionStore::new(),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn cooldowns(&self) -> &CooldownService {
        &self.cooldowns
    }

    /// Snapshots the target and persists it. Returns the identifier of the stored snapshot.
    pub async fn export<T: Target + ?Sized>(&self, invoker: &Invoker, target: &T) -> Result<String> {
        Self::authorize(invoker)?;
        self.enforce_cooldown(invoker, EXPORT)?;

        let snapshot = export::build(target).await?;
        let identifier = self.store.save(&snapshot).await?;

        info!(user_id = %invoker.user_id, %identifier, "Saved export");
        Ok(identifier)
    }

    pub async fn list(&self, invoker: &Invoker) -> Result<Vec<SnapshotListing>> {
        Self::authorize(invoker)?;
        Ok(self.store.list().await?)
    }

    /// Runs the import the invoker has selected in their session, then closes the session.
    pub async fn import<T, F>(
        &self,
        invoker: &Invoker,
        target: &T,
        on_progress: F,
    ) -> Result<ImportSummary>
    where
        T: Target + ?Sized,
        F: Fn(ImportProgress) + Send + Sync,
    {
        Self::authorize(invoker)?;

        self.sessions.purge_stale(self.config.session_ttl());
        match self.sessions.get(invoker.user_id) {
            Some(session) if session.in_progress => return Error::ImportInProgress.into(),
            Some(session) if session.is_ready() => {}
            _ => return Error::IncompleteSession.into(),
        }

        self.enforce_cooldown(invoker, IMPORT)?;

        let (identifier, scope) = self.sessions.start(invoker.user_id)?;
        let res = self.run_import(&identifier, scope, target, on_progress).await;
        self.sessions.finish(invoker.user_id);

        res
    }

    async fn run_import<T, F>(
        &self,
        identifier: &str,
        scope: ImportScope,
        target: &T,
        on_progress: F,
    ) -> Result<ImportSummary>
    where
        T: Target + ?Sized,
        F: Fn(ImportProgress) + Send + Sync,
    {
        let snapshot = self.store.load(identifier).await?;

        let summary = Importer::new(target, &self.config)
            .on_progress(on_progress)
            .import(&snapshot, scope)
            .await?;

        Ok(summary)
    }

    fn authorize(invoker: &Invoker) -> Result<()> {
        if invoker.is_privileged() {
            Ok(())
        } else {
            Error::NotPermitted.into()
        }
    }

    fn enforce_cooldown(&self, invoker: &Invoker, action: &str) -> Result<()> {
        let window = self.config.cooldown();
        self.cooldowns.purge(window);

        if self.cooldowns.check(invoker.user_id, action, window) {
            Ok(())
        } else {
            let remaining = self
                .cooldowns
                .remaining(invoker.user_id, action, window)
                .unwrap_or(window);

            Error::OnCooldown(remaining).into()
        }
    }
}
