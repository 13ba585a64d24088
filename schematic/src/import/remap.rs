use std::collections::HashMap;

use model::channel::{PermissionOverwrite, PermissionOverwriteType};
use model::guild::Role;
use model::schematic::{Snapshot, SnapshotOverwrite};
use model::Snowflake;

/// Translates overwrite subjects from the exporting guild to the guild being imported into.
///
/// Role subjects are matched by name: the snapshot knows each exported role's source id and name,
/// and the target knows which live role carries that name. The source guild's @everyone role maps
/// to the target's. Member subjects are user ids, which are global, and are kept as they are.
pub struct SubjectRemapper<'a> {
    source_id: Snowflake,
    target_id: Snowflake,
    source_roles: HashMap<Snowflake, &'a str>,
    live_roles: HashMap<String, Snowflake>,
}

impl<'a> SubjectRemapper<'a> {
    pub fn new(snapshot: &'a Snapshot, target_id: Snowflake, live_roles: &[Role]) -> Self {
        let mut remapper = Self {
            source_id: snapshot.source_id,
            target_id,
            source_roles: snapshot.role_names_by_id(),
            live_roles: HashMap::new(),
        };

        for role in live_roles {
            if !role.is_everyone(target_id) {
                remapper.learn_role(&role.name, role.id);
            }
        }

        remapper
    }

    /// Whether the snapshot was exported from the guild it is being imported into.
    pub fn same_guild(&self) -> bool {
        self.source_id == self.target_id
    }

    /// Records a live role. The first role seen with a given name wins.
    pub fn learn_role(&mut self, name: &str, id: Snowflake) {
        self.live_roles.entry(name.to_owned()).or_insert(id);
    }

    pub fn resolve(&self, overwrite: &SnapshotOverwrite) -> Option<Snowflake> {
        match overwrite.overwrite_type {
            PermissionOverwriteType::Member => Some(overwrite.id),
            PermissionOverwriteType::Role if overwrite.id == self.source_id => Some(self.target_id),
            PermissionOverwriteType::Role => self
                .source_roles
                .get(&overwrite.id)
                .and_then(|name| self.live_roles.get(*name))
                .copied()
                .or_else(|| self.same_guild().then_some(overwrite.id)),
        }
    }

    /// Native overwrites for every resolvable subject, and the source ids of those that could not
    /// be resolved.
    pub fn translate(
        &self,
        overwrites: &[SnapshotOverwrite],
    ) -> (Vec<PermissionOverwrite>, Vec<Snowflake>) {
        let mut translated = Vec::with_capacity(overwrites.len());
        let mut unmapped = Vec::new();

        for overwrite in overwrites {
            match self.resolve(overwrite) {
                Some(subject) => translated.push(overwrite.to_overwrite(subject)),
                None => unmapped.push(overwrite.id),
            }
        }

        (translated, unmapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use model::schematic::SnapshotRole;
    use model::PermissionBitSet;

    fn snapshot_role(id: u64, name: &str) -> SnapshotRole {
        SnapshotRole {
            id: Some(Snowflake(id)),
            name: name.to_owned(),
            color: 0,
            hoist: false,
            mentionable: false,
            permissions: vec![],
            position: 1,
        }
    }

    fn live_role(id: u64, name: &str) -> Role {
        Role {
            id: Snowflake(id),
            name: name.to_owned(),
            color: 0,
            hoist: false,
            position: 1,
            permissions: PermissionBitSet::EMPTY,
            managed: false,
            mentionable: false,
        }
    }

    fn overwrite(id: u64, overwrite_type: PermissionOverwriteType) -> SnapshotOverwrite {
        SnapshotOverwrite {
            id: Snowflake(id),
            overwrite_type,
            allow: vec!["ViewChannel".to_owned()],
            deny: vec![],
        }
    }

    fn snapshot() -> Snapshot {
        let mut snapshot = Snapshot::new(Snowflake(1), Utc::now());
        snapshot.roles.push(snapshot_role(10, "Mods"));
        snapshot.roles.push(snapshot_role(11, "Muted"));
        snapshot
    }

    #[test]
    fn test_cross_guild_remap() {
        let snapshot = snapshot();
        let remapper = SubjectRemapper::new(&snapshot, Snowflake(2), &[live_role(20, "Mods")]);

        assert!(!remapper.same_guild());
        assert_eq!(
            remapper.resolve(&overwrite(10, PermissionOverwriteType::Role)),
            Some(Snowflake(20))
        );
        assert_eq!(
            remapper.resolve(&overwrite(1, PermissionOverwriteType::Role)),
            Some(Snowflake(2))
        );
        // Muted was never created in the target
        assert_eq!(
            remapper.resolve(&overwrite(11, PermissionOverwriteType::Role)),
            None
        );
        assert_eq!(
            remapper.resolve(&overwrite(500, PermissionOverwriteType::Member)),
            Some(Snowflake(500))
        );
    }

    #[test]
    fn test_same_guild_keeps_unknown_subjects() {
        let snapshot = snapshot();
        let remapper = SubjectRemapper::new(&snapshot, Snowflake(1), &[]);

        assert!(remapper.same_guild());
        assert_eq!(
            remapper.resolve(&overwrite(99, PermissionOverwriteType::Role)),
            Some(Snowflake(99))
        );
    }

    #[test]
    fn test_learned_roles_resolve() {
        let snapshot = snapshot();
        let mut remapper = SubjectRemapper::new(&snapshot, Snowflake(2), &[]);
        remapper.learn_role("Muted", Snowflake(30));

        let (translated, unmapped) = remapper.translate(&[
            overwrite(11, PermissionOverwriteType::Role),
            overwrite(10, PermissionOverwriteType::Role),
        ]);

        assert_eq!(translated.len(), 1);
        assert_eq!(translated[0].id, Snowflake(30));
        assert_eq!(unmapped, vec![Snowflake(10)]);
    }
}
