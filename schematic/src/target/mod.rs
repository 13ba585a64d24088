mod http;
pub use http::HttpTarget;

mod memory;
pub use memory::{MemoryTarget, Request};

use async_trait::async_trait;
use model::channel::{Channel, ChannelType, ForumTag, PermissionOverwrite};
use model::guild::Role;
use model::schematic::{SnapshotChannel, SnapshotRole};
use model::{PermissionBitSet, Snowflake};
use serde::Serialize;

use crate::error::TargetError;

/// A live guild that can be read from and mutated.
#[async_trait]
pub trait Target: Send + Sync {
    fn guild_id(&self) -> Snowflake;

    async fn roles(&self) -> Result<Vec<Role>, TargetError>;
    async fn channels(&self) -> Result<Vec<Channel>, TargetError>;

    /// Guild-level permissions of the identity performing mutations.
    async fn current_permissions(&self) -> Result<PermissionBitSet, TargetError>;

    async fn create_role(&self, spec: &RoleSpec) -> Result<Role, TargetError>;
    async fn create_channel(
        &self,
        spec: &ChannelSpec,
        parent: Option<Snowflake>,
    ) -> Result<Channel, TargetError>;

    /// Replaces the channel's whole overwrite list.
    async fn set_channel_overwrites(
        &self,
        channel_id: Snowflake,
        overwrites: &[PermissionOverwrite],
    ) -> Result<(), TargetError>;
}

#[derive(Serialize, Debug, Clone, Eq, PartialEq)]
pub struct RoleSpec {
    pub name: String,
    pub color: u32,
    pub hoist: bool,
    pub mentionable: bool,
    pub permissions: PermissionBitSet,
    // Not accepted on creation. Precedence follows creation order instead.
    #[serde(skip_serializing)]
    pub position: u16,
}

impl From<&SnapshotRole> for RoleSpec {
    fn from(role: &SnapshotRole) -> Self {
        RoleSpec {
            name: role.name.clone(),
            color: role.color,
            hoist: role.hoist,
            mentionable: role.mentionable,
            permissions: role.permission_bits(),
            position: role.position,
        }
    }
}

#[derive(Serialize, Debug, Clone, Eq, PartialEq)]
pub struct ChannelSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    pub position: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_limit: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_tags: Option<Vec<ForumTag>>,
}

impl From<&SnapshotChannel> for ChannelSpec {
    fn from(channel: &SnapshotChannel) -> Self {
        let (bitrate, user_limit) = if channel.kind.is_voice() {
            (channel.bitrate, channel.user_limit)
        } else {
            (None, None)
        };

        let available_tags = if channel.kind.is_forum() {
            channel
                .available_tags
                .as_ref()
                .map(|tags| tags.iter().map(ForumTag::without_id).collect())
        } else {
            None
        };

        ChannelSpec {
            name: channel.name.clone(),
            kind: channel.kind,
            position: channel.position,
            bitrate,
            user_limit,
            available_tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_channel(kind: ChannelType) -> SnapshotChannel {
        SnapshotChannel {
            id: None,
            name: "lounge".to_owned(),
            kind,
            position: 3,
            overwrites: vec![],
            bitrate: Some(96000),
            user_limit: Some(5),
            available_tags: Some(vec![ForumTag {
                id: Some(Snowflake(9)),
                name: "help".to_owned(),
                moderated: false,
                emoji_id: None,
                emoji_name: Some("❓".to_owned()),
            }]),
            children: vec![],
        }
    }

    #[test]
    fn test_voice_fields_only_for_voice() {
        let voice = ChannelSpec::from(&snapshot_channel(ChannelType::GuildVoice));
        assert_eq!(voice.bitrate, Some(96000));
        assert_eq!(voice.user_limit, Some(5));
        assert!(voice.available_tags.is_none());

        let text = ChannelSpec::from(&snapshot_channel(ChannelType::GuildText));
        assert!(text.bitrate.is_none());
        assert!(text.available_tags.is_none());
    }

    #[test]
    fn test_forum_tags_lose_ids() {
        let forum = ChannelSpec::from(&snapshot_channel(ChannelType::GuildForum));
        let tags = forum.available_tags.unwrap();
        assert_eq!(tags[0].id, None);
        assert_eq!(tags[0].name, "help");
        assert!(forum.bitrate.is_none());
    }

    #[test]
    fn test_role_spec_body() {
        let role = SnapshotRole {
            id: None,
            name: "Mods".to_owned(),
            color: 3447003,
            hoist: true,
            mentionable: true,
            permissions: vec!["KickMembers".to_owned(), "Nonsense".to_owned()],
            position: 4,
        };

        let body = serde_json::to_value(RoleSpec::from(&role)).unwrap();
        assert_eq!(body["permissions"], "2");
        assert!(body.get("position").is_none());
    }
}
