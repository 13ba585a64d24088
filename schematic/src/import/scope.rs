use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which parts of a snapshot an import applies.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ImportScope {
    All,
    RolesOnly,
    ChannelsOnly,
    PermissionsOnly,
}

impl ImportScope {
    pub fn includes_roles(&self) -> bool {
        matches!(self, ImportScope::All | ImportScope::RolesOnly)
    }

    pub fn includes_channels(&self) -> bool {
        matches!(self, ImportScope::All | ImportScope::ChannelsOnly)
    }

    /// Whether overwrites are applied to channels that already exist. Channels created by an
    /// import always receive their overwrites.
    pub fn includes_existing_permissions(&self) -> bool {
        *self == ImportScope::PermissionsOnly
    }
}

impl FromStr for ImportScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" | "everything" => Ok(ImportScope::All),
            "roles" | "roles-only" => Ok(ImportScope::RolesOnly),
            "channels" | "channels-only" => Ok(ImportScope::ChannelsOnly),
            "permissions" | "permissions-only" => Ok(ImportScope::PermissionsOnly),
            other => Err(format!(
                "unknown import scope {}, expected one of all, roles, channels, permissions",
                other
            )),
        }
    }
}

impl fmt::Display for ImportScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ImportScope::All => "all",
            ImportScope::RolesOnly => "roles",
            ImportScope::ChannelsOnly => "channels",
            ImportScope::PermissionsOnly => "permissions",
        };

        f.write_str(s)
    }
}
