use serde::{Deserialize, Serialize};

use crate::channel::{PermissionOverwrite, PermissionOverwriteType};
use crate::{PermissionBitSet, Snowflake};

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct SnapshotOverwrite {
    /// Live id of the subject in the exporting guild.
    pub id: Snowflake,

    #[serde(rename = "type")]
    pub overwrite_type: PermissionOverwriteType,

    #[serde(default)]
    pub allow: Vec<String>,

    #[serde(default)]
    pub deny: Vec<String>,
}

impl SnapshotOverwrite {
    pub fn from_overwrite(overwrite: &PermissionOverwrite) -> SnapshotOverwrite {
        SnapshotOverwrite {
            id: overwrite.id,
            overwrite_type: overwrite.overwrite_type,
            allow: overwrite.allow.capabilities(),
            deny: overwrite.deny.capabilities(),
        }
    }

    /// Native overwrite targeting `subject`, which may differ from the exported id.
    pub fn to_overwrite(&self, subject: Snowflake) -> PermissionOverwrite {
        PermissionOverwrite {
            id: subject,
            overwrite_type: self.overwrite_type,
            allow: PermissionBitSet::from_capabilities(&self.allow),
            deny: PermissionBitSet::from_capabilities(&self.deny),
        }
    }
}
