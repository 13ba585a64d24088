use serde::{Deserialize, Serialize};

use crate::{PermissionBitSet, Snowflake};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Role {
    pub id: Snowflake,
    pub name: String,
    pub color: u32,
    pub hoist: bool,
    pub position: u16,
    pub permissions: PermissionBitSet,
    #[serde(default)]
    pub managed: bool,
    pub mentionable: bool,
}

impl Role {
    /// The implicit @everyone role shares its id with the guild.
    pub fn is_everyone(&self, guild_id: Snowflake) -> bool {
        self.id == guild_id
    }
}
