use crate::channel::Permission;
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::Formatter;
use std::ops::{BitOr, BitOrAssign};

/// Native Discord permission bitmask, serialized as a decimal string.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct PermissionBitSet(pub u64);

impl PermissionBitSet {
    pub const EMPTY: PermissionBitSet = PermissionBitSet(0);

    pub fn all() -> PermissionBitSet {
        PermissionBitSet(Permission::known_bits())
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        let perm = permission as u64;
        self.0 & perm == perm
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Portable capability names for every set bit, in ascending bit order. Bits Discord has
    /// added since [`Permission`] was last updated are dropped.
    pub fn capabilities(&self) -> Vec<String> {
        Permission::ALL
            .iter()
            .filter(|perm| self.has_permission(**perm))
            .map(|perm| perm.name().to_owned())
            .collect()
    }

    /// Inverse of [`PermissionBitSet::capabilities`]. Names that are not capabilities are ignored.
    pub fn from_capabilities<I, S>(names: I) -> PermissionBitSet
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| Permission::from_name(name.as_ref()))
            .fold(PermissionBitSet::EMPTY, |set, perm| set | perm)
    }
}

impl From<Permission> for PermissionBitSet {
    fn from(permission: Permission) -> Self {
        PermissionBitSet(permission as u64)
    }
}

impl BitOr for PermissionBitSet {
    type Output = PermissionBitSet;

    fn bitor(self, rhs: Self) -> Self::Output {
        PermissionBitSet(self.0 | rhs.0)
    }
}

impl BitOr<Permission> for PermissionBitSet {
    type Output = PermissionBitSet;

    fn bitor(self, rhs: Permission) -> Self::Output {
        PermissionBitSet(self.0 | rhs as u64)
    }
}

impl BitOrAssign for PermissionBitSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl Serialize for PermissionBitSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for PermissionBitSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(PermissionBitSet(
            String::deserialize(deserializer)?
                .parse()
                .map_err(Error::custom)?,
        ))
    }
}

impl fmt::Display for PermissionBitSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
