use serde::{Deserialize, Serialize};

use crate::guild::Role;
use crate::{PermissionBitSet, Snowflake};

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct SnapshotRole {
    /// Live id in the exporting guild. Only used to resolve overwrite subjects on import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Snowflake>,
    pub name: String,
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub hoist: bool,
    #[serde(default)]
    pub mentionable: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub position: u16,
}

impl SnapshotRole {
    pub fn from_role(role: &Role) -> SnapshotRole {
        SnapshotRole {
            id: Some(role.id),
            name: role.name.clone(),
            color: role.color,
            hoist: role.hoist,
            mentionable: role.mentionable,
            permissions: role.permissions.capabilities(),
            position: role.position,
        }
    }

    pub fn permission_bits(&self) -> PermissionBitSet {
        PermissionBitSet::from_capabilities(&self.permissions)
    }
}
