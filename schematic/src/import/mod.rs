mod remap;
pub use remap::SubjectRemapper;

mod scope;
pub use scope::ImportScope;

mod summary;
pub use summary::{EntityKind, FailureStage, ImportFailure, ImportSummary, SkippedEntity};

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use backoff::ExponentialBackoffBuilder;
use model::channel::{Channel, Permission};
use model::guild::Role;
use model::schematic::{Snapshot, SnapshotChannel, SnapshotRole};
use model::{PermissionBitSet, Snowflake};
use tracing::{debug, info, warn};

use crate::error::{ImportError, TargetError};
use crate::ratelimiter::{IntervalRateLimiter, RateLimiter};
use crate::target::{ChannelSpec, RoleSpec, Target};
use crate::Config;

/// Guild permissions the importing identity needs unless it is an administrator.
pub const REQUIRED_PERMISSIONS: &[Permission] = &[
    Permission::ManageRoles,
    Permission::ManageChannels,
    Permission::ViewChannel,
];

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ImportProgress {
    pub done: usize,
    pub total: usize,
}

type ProgressFn<'a> = Box<dyn Fn(ImportProgress) + Send + Sync + 'a>;

/// Applies snapshots to a target guild, creating whatever is missing.
///
/// Mutations are issued strictly one at a time. Role creations are spaced by the role limiter
/// and channel creations by the channel limiter, each measured from the end of the previous
/// mutation.
pub struct Importer<'a, T: Target + ?Sized> {
    target: &'a T,
    role_limiter: Arc<dyn RateLimiter>,
    channel_limiter: Arc<dyn RateLimiter>,
    max_retries: u32,
    progress: Option<ProgressFn<'a>>,
}

// Live entities indexed by name. Categories and other channels are tracked separately.
struct LiveIndex {
    roles: HashSet<String>,
    categories: HashMap<String, Snowflake>,
    channels: HashMap<String, Snowflake>,
}

struct ImportRun<'s> {
    summary: ImportSummary,
    remapper: SubjectRemapper<'s>,
    live: LiveIndex,
    done: usize,
    total: usize,
}

impl<'a, T: Target + ?Sized> Importer<'a, T> {
    pub fn new(target: &'a T, config: &Config) -> Self {
        Self::with_limiters(
            target,
            Arc::new(IntervalRateLimiter::new(config.role_interval())),
            Arc::new(IntervalRateLimiter::new(config.channel_interval())),
        )
        .max_retries(config.rate_limit_retries)
    }

    pub fn with_limiters(
        target: &'a T,
        role_limiter: Arc<dyn RateLimiter>,
        channel_limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            target,
            role_limiter,
            channel_limiter,
            max_retries: 0,
            progress: None,
        }
    }

    /// How many times a rate limited request is retried before it counts as failed.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(ImportProgress) + Send + Sync + 'a,
    {
        self.progress = Some(Box::new(f));
        self
    }

    /// Creates the parts of `snapshot` selected by `scope` that the target lacks.
    ///
    /// Errors are only returned when nothing has been mutated yet. Once mutation starts, failures
    /// of individual entities are collected in the summary and the import carries on.
    #[tracing::instrument(skip_all, fields(guild_id = %self.target.guild_id(), source_id = %snapshot.source_id, %scope))]
    pub async fn import(
        &self,
        snapshot: &Snapshot,
        scope: ImportScope,
    ) -> Result<ImportSummary, ImportError> {
        if let Some(reason) = snapshot.structure_error() {
            return Err(ImportError::Malformed(reason));
        }

        let guild_id = self.target.guild_id();
        let unreadable = move |source| ImportError::Target { guild_id, source };

        let permissions = self
            .target
            .current_permissions()
            .await
            .map_err(unreadable)?;

        let missing = missing_permissions(permissions);
        if !missing.is_empty() {
            return Err(ImportError::MissingPermissions(missing));
        }

        let roles = self.target.roles().await.map_err(unreadable)?;
        let channels = self.target.channels().await.map_err(unreadable)?;

        let mut run = ImportRun {
            summary: ImportSummary::default(),
            remapper: SubjectRemapper::new(snapshot, guild_id, &roles),
            live: LiveIndex::new(&roles, &channels),
            done: 0,
            total: total_steps(snapshot, scope),
        };

        info!(total = run.total, "Starting import");

        if scope.includes_roles() {
            self.import_roles(snapshot, &mut run).await;
        }

        if scope.includes_channels() {
            self.import_channels(snapshot, &mut run).await;
        }

        if scope.includes_existing_permissions() {
            self.import_permissions(snapshot, &mut run).await;
        }

        let summary = run.summary;
        info!(
            roles_created = summary.roles_created,
            channels_created = summary.channels_created,
            permissions_applied = summary.permissions_applied,
            skipped = summary.skipped.len(),
            failures = summary.failures.len(),
            "Import finished"
        );

        Ok(summary)
    }

    async fn import_roles(&self, snapshot: &Snapshot, run: &mut ImportRun<'_>) {
        // Lowest first, so that every role created later ends up above it
        let mut roles: Vec<&SnapshotRole> = snapshot.roles.iter().rev().collect();
        roles.sort_by_key(|role| role.position);

        // Only the first role with a given name is acted upon
        let mut seen = HashSet::new();

        for role in roles {
            if !seen.insert(role.name.as_str()) {
                debug!(name = %role.name, "Role name repeated in snapshot");
                run.summary.skip(&role.name, EntityKind::Role);
            } else if run.live.roles.contains(&role.name) {
                debug!(name = %role.name, "Role already exists");
                run.summary.skip(&role.name, EntityKind::Role);
            } else {
                let spec = RoleSpec::from(role);
                let res = self
                    .send(Some(&*self.role_limiter), &role.name, || {
                        self.target.create_role(&spec)
                    })
                    .await;

                match res {
                    Ok(created) => {
                        info!(name = %role.name, id = %created.id, "Created role");
                        run.summary.roles_created += 1;
                        run.remapper.learn_role(&role.name, created.id);
                        run.live.roles.insert(role.name.clone());
                    }
                    Err(e) => {
                        warn!(name = %role.name, error = %e, "Failed to create role");
                        run.summary.fail(&role.name, FailureStage::CreateRole, e);
                    }
                }
            }

            self.advance(run);
        }
    }

    async fn import_channels(&self, snapshot: &Snapshot, run: &mut ImportRun<'_>) {
        for entry in &snapshot.channels {
            let id = self.import_channel(entry, None, run).await;

            if !entry.is_category() {
                continue;
            }

            match id {
                Some(parent) => {
                    for child in &entry.children {
                        self.import_channel(child, Some(parent), run).await;
                    }
                }
                None => {
                    for child in &entry.children {
                        run.summary.fail(
                            &child.name,
                            FailureStage::SkippedParentFailed,
                            format!("category {} could not be created", entry.name),
                        );
                        self.advance(run);
                    }
                }
            }
        }
    }

    /// Creates a single channel unless one with the same name exists. Returns the live id of the
    /// channel either way, or `None` if creation failed.
    async fn import_channel(
        &self,
        entry: &SnapshotChannel,
        parent: Option<Snowflake>,
        run: &mut ImportRun<'_>,
    ) -> Option<Snowflake> {
        let kind = if entry.is_category() {
            EntityKind::Category
        } else {
            EntityKind::Channel
        };

        if let Some(existing) = run.live.find(entry) {
            debug!(name = %entry.name, ?kind, "Channel already exists");
            run.summary.skip(&entry.name, kind);
            self.advance(run);
            return Some(existing);
        }

        let spec = ChannelSpec::from(entry);
        let res = self
            .send(Some(&*self.channel_limiter), &entry.name, || {
                self.target.create_channel(&spec, parent)
            })
            .await;

        let id = match res {
            Ok(created) => {
                info!(name = %entry.name, id = %created.id, ?parent, "Created channel");
                run.summary.channels_created += 1;
                run.live.insert(entry, created.id);

                if !entry.overwrites.is_empty() {
                    self.apply_overwrites(entry, created.id, run).await;
                }

                Some(created.id)
            }
            Err(e) => {
                let stage = match kind {
                    EntityKind::Category => FailureStage::CreateCategory,
                    _ => FailureStage::CreateChannel,
                };

                warn!(name = %entry.name, error = %e, "Failed to create channel");
                run.summary.fail(&entry.name, stage, e);
                None
            }
        };

        self.advance(run);
        id
    }

    async fn import_permissions(&self, snapshot: &Snapshot, run: &mut ImportRun<'_>) {
        for entry in snapshot.iter_channels().filter(|c| !c.overwrites.is_empty()) {
            match run.live.find(entry) {
                Some(channel_id) => self.apply_overwrites(entry, channel_id, run).await,
                None => {
                    warn!(name = %entry.name, "No live channel to apply overwrites to");
                    run.summary.fail(
                        &entry.name,
                        FailureStage::MissingChannel,
                        "no channel with this name exists",
                    );
                }
            }

            self.advance(run);
        }
    }

    async fn apply_overwrites(
        &self,
        entry: &SnapshotChannel,
        channel_id: Snowflake,
        run: &mut ImportRun<'_>,
    ) {
        let (overwrites, unmapped) = run.remapper.translate(&entry.overwrites);

        for subject in unmapped {
            warn!(channel = %entry.name, %subject, "Dropping overwrite for unknown role");
            run.summary.fail(
                &entry.name,
                FailureStage::UnmappedSubject,
                format!("no role in this guild corresponds to {}", subject),
            );
        }

        if overwrites.is_empty() {
            return;
        }

        let res = self
            .send(None, &entry.name, || {
                self.target.set_channel_overwrites(channel_id, &overwrites)
            })
            .await;

        match res {
            Ok(()) => run.summary.permissions_applied += 1,
            Err(e) => {
                warn!(channel = %entry.name, error = %e, "Failed to apply overwrites");
                run.summary.fail(&entry.name, FailureStage::ApplyOverwrites, e);
            }
        }
    }

    /// Issues a request after the limiter allows it, retrying while the target reports a rate
    /// limit and retries remain. Every completed request restarts the interval of both limiters,
    /// so pacing carries over from the role phase into the channel phase.
    async fn send<R, F, Fut>(
        &self,
        limiter: Option<&dyn RateLimiter>,
        name: &str,
        request: F,
    ) -> Result<R, TargetError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<R, TargetError>>,
    {
        let max_retries = self.max_retries;
        let attempts = AtomicU32::new(0);
        let (attempts, request) = (&attempts, &request);

        let operation = move || async move {
            if let Some(limiter) = limiter {
                limiter.wait().await;
            }

            let res = request().await;
            self.role_limiter.mark();
            self.channel_limiter.mark();

            res.map_err(|e| match e.retry_after() {
                Some(retry_after) if attempts.fetch_add(1, Ordering::SeqCst) < max_retries => {
                    backoff::Error::retry_after(e, retry_after)
                }
                _ => backoff::Error::permanent(e),
            })
        };

        // Discord's retry_after takes precedence over the policy's own delays
        let policy = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(None)
            .build();

        backoff::future::retry_notify(policy, operation, |e: TargetError, delay| {
            warn!(name, ?delay, error = %e, "Rate limited, retrying");
        })
        .await
    }

    fn advance(&self, run: &mut ImportRun<'_>) {
        run.done += 1;

        if let Some(progress) = &self.progress {
            progress(ImportProgress {
                done: run.done,
                total: run.total,
            });
        }
    }
}

impl LiveIndex {
    fn new(roles: &[Role], channels: &[Channel]) -> Self {
        let mut index = Self {
            roles: roles.iter().map(|r| r.name.clone()).collect(),
            categories: HashMap::new(),
            channels: HashMap::new(),
        };

        for channel in channels
            .iter()
            .filter(|c| c.channel_type.is_guild_structure())
        {
            let names = if channel.channel_type.is_category() {
                &mut index.categories
            } else {
                &mut index.channels
            };

            names.entry(channel.name.clone()).or_insert(channel.id);
        }

        index
    }

    fn names(&self, entry: &SnapshotChannel) -> &HashMap<String, Snowflake> {
        if entry.is_category() {
            &self.categories
        } else {
            &self.channels
        }
    }

    fn find(&self, entry: &SnapshotChannel) -> Option<Snowflake> {
        self.names(entry).get(&entry.name).copied()
    }

    fn insert(&mut self, entry: &SnapshotChannel, id: Snowflake) {
        let names = if entry.is_category() {
            &mut self.categories
        } else {
            &mut self.channels
        };

        names.entry(entry.name.clone()).or_insert(id);
    }
}

/// Names of the required permissions missing from `granted`.
pub fn missing_permissions(granted: PermissionBitSet) -> Vec<String> {
    if granted.has_permission(Permission::Administrator) {
        return Vec::new();
    }

    REQUIRED_PERMISSIONS
        .iter()
        .filter(|perm| !granted.has_permission(**perm))
        .map(|perm| perm.name().to_owned())
        .collect()
}

fn total_steps(snapshot: &Snapshot, scope: ImportScope) -> usize {
    let mut total = 0;

    if scope.includes_roles() {
        total += snapshot.roles.len();
    }

    if scope.includes_channels() {
        total += snapshot.channel_count();
    }

    if scope.includes_existing_permissions() {
        total += snapshot
            .iter_channels()
            .filter(|c| !c.overwrites.is_empty())
            .count();
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{MemoryTarget, Request};
    use chrono::Utc;
    use model::channel::{ChannelType, PermissionOverwriteType};
    use model::schematic::SnapshotOverwrite;
    use parking_lot::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    const SOURCE: Snowflake = Snowflake(1_000);
    const TARGET: Snowflake = Snowflake(2_000);

    fn importer(target: &MemoryTarget) -> Importer<'_, MemoryTarget> {
        Importer::with_limiters(
            target,
            Arc::new(IntervalRateLimiter::new(Duration::from_secs(1))),
            Arc::new(IntervalRateLimiter::new(Duration::from_secs(2))),
        )
        .max_retries(3)
    }

    fn role(id: u64, name: &str, position: u16) -> SnapshotRole {
        SnapshotRole {
            id: Some(Snowflake(id)),
            name: name.to_owned(),
            color: 0,
            hoist: false,
            mentionable: false,
            permissions: vec!["ViewChannel".to_owned()],
            position,
        }
    }

    fn channel(name: &str, kind: ChannelType, position: u16) -> SnapshotChannel {
        SnapshotChannel {
            id: None,
            name: name.to_owned(),
            kind,
            position,
            overwrites: vec![],
            bitrate: None,
            user_limit: None,
            available_tags: None,
            children: vec![],
        }
    }

    fn category(name: &str, position: u16, children: &[&str]) -> SnapshotChannel {
        let mut category = channel(name, ChannelType::GuildCategory, position);
        category.children = children
            .iter()
            .enumerate()
            .map(|(i, name)| channel(name, ChannelType::GuildText, i as u16))
            .collect();
        category
    }

    fn role_overwrite(id: Snowflake, allow: &str) -> SnapshotOverwrite {
        SnapshotOverwrite {
            id,
            overwrite_type: PermissionOverwriteType::Role,
            allow: vec![allow.to_owned()],
            deny: vec![],
        }
    }

    fn roles_snapshot() -> Snapshot {
        let mut snapshot = Snapshot::new(SOURCE, Utc::now());
        snapshot.roles = vec![
            role(1_001, "Admin", 2),
            role(1_002, "Mod", 1),
            role(1_003, "Member", 0),
        ];
        snapshot
    }

    fn full_snapshot() -> Snapshot {
        let mut snapshot = roles_snapshot();

        let mut info = category("Info", 0, &["rules", "announcements"]);
        info.overwrites.push(role_overwrite(SOURCE, "ViewChannel"));
        info.children[0]
            .overwrites
            .push(role_overwrite(Snowflake(1_002), "ManageMessages"));

        snapshot.channels = vec![
            info,
            category("Events", 1, &["calendar"]),
            channel("general", ChannelType::GuildText, 2),
        ];
        snapshot
    }

    fn creation_names(target: &MemoryTarget) -> Vec<String> {
        target
            .creation_requests()
            .into_iter()
            .map(|req| match req {
                Request::CreateRole { name, .. } | Request::CreateChannel { name, .. } => name,
                Request::SetOverwrites { .. } => unreachable!(),
            })
            .collect()
    }

    fn creation_times(target: &MemoryTarget) -> Vec<Instant> {
        target
            .creation_requests()
            .into_iter()
            .filter_map(|req| match req {
                Request::CreateRole { at, .. } | Request::CreateChannel { at, .. } => Some(at),
                Request::SetOverwrites { .. } => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_roles_created_lowest_first() {
        let target = MemoryTarget::new(TARGET);
        let summary = importer(&target)
            .import(&roles_snapshot(), ImportScope::RolesOnly)
            .await
            .unwrap();

        assert_eq!(creation_names(&target), vec!["Member", "Mod", "Admin"]);
        assert_eq!(summary.roles_created, 3);
        assert!(summary.failures.is_empty());

        let times = creation_times(&target);
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(1));
        }

        let admin = target.role_by_name("Admin").unwrap();
        let member = target.role_by_name("Member").unwrap();
        assert!(admin.position > member.position);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_import_is_idempotent() {
        let target = MemoryTarget::new(TARGET);
        let snapshot = full_snapshot();

        let first = importer(&target)
            .import(&snapshot, ImportScope::All)
            .await
            .unwrap();
        assert_eq!(first.roles_created, 3);
        assert_eq!(first.channels_created, 6);
        assert_eq!(first.permissions_applied, 2);
        assert!(first.is_clean(), "{:?}", first.failures);

        let requests = target.requests().len();

        let second = importer(&target)
            .import(&snapshot, ImportScope::All)
            .await
            .unwrap();
        assert_eq!(second.roles_created, 0);
        assert_eq!(second.channels_created, 0);
        assert_eq!(second.permissions_applied, 0);
        assert!(second.is_clean());
        assert_eq!(second.skipped.len(), 9);
        assert_eq!(target.requests().len(), requests);
    }

    #[tokio::test(start_paused = true)]
    async fn test_children_follow_their_category() {
        let target = MemoryTarget::new(TARGET);
        importer(&target)
            .import(&full_snapshot(), ImportScope::ChannelsOnly)
            .await
            .unwrap();

        assert_eq!(
            creation_names(&target),
            vec!["Info", "rules", "announcements", "Events", "calendar", "general"]
        );
        assert_eq!(target.max_in_flight(), 1);

        let info = target.channel_by_name("Info").unwrap();
        let rules = target.channel_by_name("rules").unwrap();
        let general = target.channel_by_name("general").unwrap();
        assert_eq!(rules.parent_id, Some(info.id));
        assert_eq!(general.parent_id, None);

        let times = creation_times(&target);
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(2));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_role_skipped() {
        let target = MemoryTarget::new(TARGET).with_role("Mod", 1);
        let summary = importer(&target)
            .import(&roles_snapshot(), ImportScope::RolesOnly)
            .await
            .unwrap();

        assert_eq!(creation_names(&target), vec!["Member", "Admin"]);
        assert_eq!(summary.roles_created, 2);
        assert!(summary.failures.is_empty());
        assert_eq!(
            summary.skipped,
            vec![SkippedEntity {
                entity_name: "Mod".to_owned(),
                kind: EntityKind::Role,
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_category_skips_children() {
        let target = MemoryTarget::new(TARGET).reject("Events");
        let summary = importer(&target)
            .import(&full_snapshot(), ImportScope::All)
            .await
            .unwrap();

        assert_eq!(summary.channels_created, 4);
        assert_eq!(summary.failures.len(), 2);
        assert_eq!(summary.failures[0].entity_name, "Events");
        assert_eq!(summary.failures[0].stage, FailureStage::CreateCategory);
        assert_eq!(summary.failures[1].entity_name, "calendar");
        assert_eq!(summary.failures[1].stage, FailureStage::SkippedParentFailed);

        assert!(target.channel_by_name("calendar").is_none());
        assert!(target.channel_by_name("general").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrites_remapped_to_new_roles() {
        let target = MemoryTarget::new(TARGET);
        importer(&target)
            .import(&full_snapshot(), ImportScope::All)
            .await
            .unwrap();

        let mods = target.role_by_name("Mod").unwrap();
        let rules = target.channel_by_name("rules").unwrap();
        assert_eq!(rules.permission_overwrites.len(), 1);
        assert_eq!(rules.permission_overwrites[0].id, mods.id);
        assert!(rules.permission_overwrites[0]
            .allow
            .has_permission(Permission::ManageMessages));

        // The source @everyone becomes the target's
        let info = target.channel_by_name("Info").unwrap();
        assert_eq!(info.permission_overwrites[0].id, TARGET);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmapped_subject_recorded() {
        let target = MemoryTarget::new(TARGET);
        let summary = importer(&target)
            .import(&full_snapshot(), ImportScope::ChannelsOnly)
            .await
            .unwrap();

        // Roles were not imported, so the Mod overwrite on rules has no counterpart
        let unmapped: Vec<&ImportFailure> =
            summary.failures_at(FailureStage::UnmappedSubject).collect();
        assert_eq!(unmapped.len(), 1);
        assert_eq!(unmapped[0].entity_name, "rules");
        assert!(target
            .channel_by_name("rules")
            .unwrap()
            .permission_overwrites
            .is_empty());
        assert_eq!(summary.permissions_applied, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_guild_keeps_subjects() {
        let mut snapshot = Snapshot::new(TARGET, Utc::now());
        let mut lounge = channel("lounge", ChannelType::GuildText, 0);
        lounge.overwrites.push(role_overwrite(Snowflake(42), "SendMessages"));
        snapshot.channels.push(lounge);

        let target = MemoryTarget::new(TARGET);
        let summary = importer(&target)
            .import(&snapshot, ImportScope::All)
            .await
            .unwrap();

        assert!(summary.is_clean());
        let lounge = target.channel_by_name("lounge").unwrap();
        assert_eq!(lounge.permission_overwrites[0].id, Snowflake(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_permissions_abort() {
        let target = MemoryTarget::new(TARGET)
            .with_permissions(PermissionBitSet::from(Permission::ViewChannel));

        let err = importer(&target)
            .import(&full_snapshot(), ImportScope::All)
            .await
            .unwrap_err();

        match err {
            ImportError::MissingPermissions(missing) => {
                assert_eq!(missing, vec!["ManageRoles", "ManageChannels"]);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(target.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_administrator_is_enough() {
        let target = MemoryTarget::new(TARGET)
            .with_permissions(PermissionBitSet::from(Permission::Administrator));

        let summary = importer(&target)
            .import(&roles_snapshot(), ImportScope::RolesOnly)
            .await
            .unwrap();
        assert_eq!(summary.roles_created, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_snapshot_rejected() {
        let mut snapshot = roles_snapshot();
        let mut info = category("Info", 0, &[]);
        info.children.push(category("Nested", 0, &[]));
        snapshot.channels.push(info);

        let target = MemoryTarget::new(TARGET);
        let err = importer(&target)
            .import(&snapshot, ImportScope::All)
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::Malformed(_)));
        assert!(target.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_role_name_created_once() {
        let mut snapshot = roles_snapshot();
        snapshot.roles.push(role(1_004, "Mod", 0));

        let target = MemoryTarget::new(TARGET);
        let summary = importer(&target)
            .import(&snapshot, ImportScope::RolesOnly)
            .await
            .unwrap();

        assert_eq!(summary.roles_created, 3);
        assert!(summary.is_clean());
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].entity_name, "Mod");
        assert_eq!(creation_names(&target), vec!["Mod", "Member", "Admin"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_with_repeated_names_imports() {
        let source = MemoryTarget::new(SOURCE)
            .with_role("Helper", 1)
            .with_role("Helper", 2)
            .with_role("Staff", 3);
        let snapshot = crate::export::build(&source).await.unwrap();

        let target = MemoryTarget::new(TARGET);
        let summary = importer(&target)
            .import(&snapshot, ImportScope::All)
            .await
            .unwrap();

        assert_eq!(summary.roles_created, 2);
        assert!(summary.is_clean());
        assert_eq!(creation_names(&target), vec!["Helper", "Staff"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_starts_after_completion() {
        let latency = Duration::from_millis(1_500);
        let target = MemoryTarget::new(TARGET).with_latency(latency);

        let mut snapshot = roles_snapshot();
        snapshot
            .channels
            .push(channel("general", ChannelType::GuildText, 0));

        importer(&target)
            .import(&snapshot, ImportScope::All)
            .await
            .unwrap();

        let times = creation_times(&target);
        assert_eq!(times.len(), 4);

        let idle: Vec<Duration> = times
            .windows(2)
            .map(|pair| pair[1] - (pair[0] + latency))
            .collect();

        // Between roles, and from the last role to the first channel
        assert!(idle[0] >= Duration::from_secs(1), "{:?}", idle);
        assert!(idle[1] >= Duration::from_secs(1), "{:?}", idle);
        assert!(idle[2] >= Duration::from_secs(2), "{:?}", idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_retried() {
        let target = MemoryTarget::new(TARGET).rate_limit("Mod", 2);
        let summary = importer(&target)
            .import(&roles_snapshot(), ImportScope::RolesOnly)
            .await
            .unwrap();

        assert_eq!(summary.roles_created, 3);
        assert!(summary.is_clean());
        assert_eq!(
            creation_names(&target),
            vec!["Member", "Mod", "Mod", "Mod", "Admin"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_exhausted() {
        let target = MemoryTarget::new(TARGET).rate_limit("Mod", 10);
        let summary = importer(&target)
            .max_retries(1)
            .import(&roles_snapshot(), ImportScope::RolesOnly)
            .await
            .unwrap();

        assert_eq!(summary.roles_created, 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].stage, FailureStage::CreateRole);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permissions_only_targets_existing_channels() {
        let target = MemoryTarget::new(TARGET)
            .with_role("Mod", 1)
            .with_channel("Info", ChannelType::GuildCategory, None)
            .with_channel("rules", ChannelType::GuildText, None);

        let summary = importer(&target)
            .import(&full_snapshot(), ImportScope::PermissionsOnly)
            .await
            .unwrap();

        assert!(target.creation_requests().is_empty());
        assert_eq!(summary.permissions_applied, 2);
        assert!(summary.is_clean());

        let mods = target.role_by_name("Mod").unwrap();
        let rules = target.channel_by_name("rules").unwrap();
        assert_eq!(rules.permission_overwrites[0].id, mods.id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_rejection_recorded() {
        let target = MemoryTarget::new(TARGET).reject_overwrites("Info");
        let summary = importer(&target)
            .import(&full_snapshot(), ImportScope::All)
            .await
            .unwrap();

        let failures: Vec<&ImportFailure> =
            summary.failures_at(FailureStage::ApplyOverwrites).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].entity_name, "Info");
        assert_eq!(summary.permissions_applied, 1);
        assert_eq!(summary.channels_created, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_reported() {
        let target = MemoryTarget::new(TARGET);
        let seen = Mutex::new(Vec::new());

        importer(&target)
            .on_progress(|progress| seen.lock().push(progress))
            .import(&full_snapshot(), ImportScope::All)
            .await
            .unwrap();

        let seen = seen.into_inner();
        assert_eq!(seen.len(), 9);
        assert_eq!(seen.last(), Some(&ImportProgress { done: 9, total: 9 }));
    }
}
