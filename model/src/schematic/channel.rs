use serde::{Deserialize, Serialize};

use super::SnapshotOverwrite;
use crate::channel::{ChannelType, ForumTag};
use crate::Snowflake;

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotChannel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Snowflake>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    #[serde(default)]
    pub position: u16,
    #[serde(rename = "permissionOverwrites", default)]
    pub overwrites: Vec<SnapshotOverwrite>,

    // Voice and stage channels only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_limit: Option<u16>,

    // Forum and media channels only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_tags: Option<Vec<ForumTag>>,

    /// Direct children of a category, ordered by position.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotChannel>,
}

impl SnapshotChannel {
    pub fn is_category(&self) -> bool {
        self.kind.is_category()
    }

    /// This channel followed by its children.
    pub fn iter(&self) -> impl Iterator<Item = &SnapshotChannel> {
        std::iter::once(self).chain(self.children.iter())
    }
}
