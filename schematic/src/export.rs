use std::collections::HashSet;

use chrono::{DateTime, Utc};
use model::channel::Channel;
use model::guild::Role;
use model::schematic::{Snapshot, SnapshotChannel, SnapshotOverwrite, SnapshotRole};
use model::Snowflake;
use tracing::{debug, info};

use crate::error::ExportError;
use crate::target::Target;

/// Reads the role and channel graph of a guild into a snapshot. Nothing is returned if either
/// collection cannot be read.
#[tracing::instrument(skip(target), fields(guild_id = %target.guild_id()))]
pub async fn build<T: Target + ?Sized>(target: &T) -> Result<Snapshot, ExportError> {
    let guild_id = target.guild_id();
    let unreadable = move |source| ExportError::Unreadable { guild_id, source };

    let roles = target.roles().await.map_err(unreadable)?;
    let channels = target.channels().await.map_err(unreadable)?;

    let snapshot = assemble(guild_id, Utc::now(), roles, channels);
    info!(
        roles = snapshot.roles.len(),
        channels = snapshot.channel_count(),
        "Exported guild"
    );

    Ok(snapshot)
}

pub fn assemble(
    guild_id: Snowflake,
    exported_at: DateTime<Utc>,
    mut roles: Vec<Role>,
    channels: Vec<Channel>,
) -> Snapshot {
    let mut snapshot = Snapshot::new(guild_id, exported_at);

    roles.retain(|role| !role.is_everyone(guild_id) && !role.managed);
    roles.sort_by(|a, b| b.position.cmp(&a.position).then(a.id.cmp(&b.id)));

    // Discord allows repeated role names, but roles are matched by name. The highest one wins.
    let mut names = HashSet::new();
    roles.retain(|role| {
        let first = names.insert(role.name.clone());
        if !first {
            debug!(name = %role.name, id = %role.id, "Leaving out role with a repeated name");
        }
        first
    });

    snapshot.roles = roles.iter().map(SnapshotRole::from_role).collect();

    let mut channels: Vec<Channel> = channels
        .into_iter()
        .filter(|c| c.channel_type.is_guild_structure())
        .collect();
    channels.sort_by(|a, b| a.position.cmp(&b.position).then(a.id.cmp(&b.id)));

    let (categories, rest): (Vec<&Channel>, Vec<&Channel>) =
        channels.iter().partition(|c| c.channel_type.is_category());

    let category_ids: HashSet<Snowflake> = categories.iter().map(|c| c.id).collect();

    for category in &categories {
        let mut entry = to_snapshot_channel(category);
        entry.children = rest
            .iter()
            .filter(|c| c.parent_id == Some(category.id))
            .map(|c| to_snapshot_channel(c))
            .collect();

        snapshot.channels.push(entry);
    }

    // Channels whose parent is missing are treated like uncategorized ones
    snapshot.channels.extend(
        rest.iter()
            .filter(|c| c.parent_id.map_or(true, |p| !category_ids.contains(&p)))
            .map(|c| to_snapshot_channel(c)),
    );

    snapshot
}

fn to_snapshot_channel(channel: &Channel) -> SnapshotChannel {
    let kind = channel.channel_type;

    SnapshotChannel {
        id: Some(channel.id),
        name: channel.name.clone(),
        kind,
        position: channel.position.unwrap_or_default(),
        overwrites: channel
            .permission_overwrites
            .iter()
            .map(SnapshotOverwrite::from_overwrite)
            .collect(),
        bitrate: channel.bitrate.filter(|_| kind.is_voice()),
        user_limit: channel.user_limit.filter(|_| kind.is_voice()),
        available_tags: channel.available_tags.clone().filter(|_| kind.is_forum()),
        children: Vec::new(),
    }
}
