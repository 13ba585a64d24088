use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SnapshotChannel, SnapshotRole};
use crate::Snowflake;

pub const FORMAT_VERSION: &str = "1.0";

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(alias = "version")]
    pub format_version: String,
    pub exported_at: DateTime<Utc>,
    #[serde(alias = "serverId")]
    pub source_id: Snowflake,
    /// Ordered by position, highest first.
    #[serde(default)]
    pub roles: Vec<SnapshotRole>,
    /// Categories and uncategorized channels, ordered by position.
    #[serde(default)]
    pub channels: Vec<SnapshotChannel>,
}

/// The header of a snapshot document. Deserializing into this skips the role and channel graph.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    #[serde(alias = "version")]
    pub format_version: String,
    pub exported_at: DateTime<Utc>,
    #[serde(alias = "serverId")]
    pub source_id: Snowflake,
}

impl Snapshot {
    pub fn new(source_id: Snowflake, exported_at: DateTime<Utc>) -> Snapshot {
        Snapshot {
            format_version: FORMAT_VERSION.to_owned(),
            exported_at,
            source_id,
            roles: Vec::new(),
            channels: Vec::new(),
        }
    }

    pub fn metadata(&self) -> SnapshotMetadata {
        SnapshotMetadata {
            format_version: self.format_version.clone(),
            exported_at: self.exported_at,
            source_id: self.source_id,
        }
    }

    /// Every channel in the document, each category directly followed by its children.
    pub fn iter_channels(&self) -> impl Iterator<Item = &SnapshotChannel> {
        self.channels.iter().flat_map(SnapshotChannel::iter)
    }

    pub fn channel_count(&self) -> usize {
        self.iter_channels().count()
    }

    /// Names of exported roles keyed by their id in the source guild.
    pub fn role_names_by_id(&self) -> HashMap<Snowflake, &str> {
        self.roles
            .iter()
            .filter_map(|role| role.id.map(|id| (id, role.name.as_str())))
            .collect()
    }

    /// Describes the first violation of the document's structural rules, if any: categories
    /// only appear at the top level, only categories have children, and no channel id appears
    /// twice.
    ///
    /// Repeated role names are tolerated. Older documents may carry them, and importers only
    /// act on the first role with a given name.
    pub fn structure_error(&self) -> Option<String> {
        for top_level in &self.channels {
            if !top_level.is_category() && !top_level.children.is_empty() {
                return Some(format!(
                    "channel {} has children but is not a category",
                    top_level.name
                ));
            }

            if let Some(child) = top_level.children.iter().find(|c| c.is_category()) {
                return Some(format!(
                    "category {} is nested inside {}",
                    child.name, top_level.name
                ));
            }

            if let Some(child) = top_level.children.iter().find(|c| !c.children.is_empty()) {
                return Some(format!("channel {} has nested children", child.name));
            }
        }

        let mut seen = HashSet::new();
        for channel in self.iter_channels() {
            if let Some(id) = channel.id {
                if !seen.insert(id) {
                    return Some(format!("channel {} appears more than once", id));
                }
            }
        }

        None
    }
}
