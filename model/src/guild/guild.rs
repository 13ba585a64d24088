use serde::{Deserialize, Serialize};

use super::{Member, Role};
use crate::channel::Permission;
use crate::{PermissionBitSet, Snowflake};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
    pub owner_id: Snowflake,
}

impl Guild {
    /// Guild-level permissions of a member, before any channel overwrites are applied.
    pub fn base_permissions(
        &self,
        user_id: Snowflake,
        member: &Member,
        roles: &[Role],
    ) -> PermissionBitSet {
        if user_id == self.owner_id {
            return PermissionBitSet::all();
        }

        let permissions = roles
            .iter()
            .filter(|role| role.is_everyone(self.id) || member.roles.contains(&role.id))
            .fold(PermissionBitSet::EMPTY, |acc, role| acc | role.permissions);

        if permissions.has_permission(Permission::Administrator) {
            PermissionBitSet::all()
        } else {
            permissions
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(id: u64, permissions: &[Permission]) -> Role {
        Role {
            id: Snowflake(id),
            name: format!("role-{}", id),
            color: 0,
            hoist: false,
            position: 0,
            permissions: PermissionBitSet(Permission::sum(permissions)),
            managed: false,
            mentionable: false,
        }
    }

    fn guild() -> Guild {
        Guild {
            id: Snowflake(1),
            name: "Test".to_owned(),
            owner_id: Snowflake(99),
        }
    }

    #[test]
    fn test_owner_has_everything() {
        let member = Member { nick: None, roles: vec![] };
        assert_eq!(
            guild().base_permissions(Snowflake(99), &member, &[]),
            PermissionBitSet::all()
        );
    }

    #[test]
    fn test_everyone_and_member_roles() {
        let roles = vec![
            role(1, &[Permission::ViewChannel]),
            role(2, &[Permission::ManageRoles]),
            role(3, &[Permission::BanMembers]),
        ];
        let member = Member {
            nick: None,
            roles: vec![Snowflake(2)],
        };

        let perms = guild().base_permissions(Snowflake(5), &member, &roles);
        assert!(perms.has_permission(Permission::ViewChannel));
        assert!(perms.has_permission(Permission::ManageRoles));
        assert!(!perms.has_permission(Permission::BanMembers));
    }

    #[test]
    fn test_administrator_implies_all() {
        let roles = vec![role(1, &[]), role(2, &[Permission::Administrator])];
        let member = Member {
            nick: None,
            roles: vec![Snowflake(2)],
        };

        assert_eq!(
            guild().base_permissions(Snowflake(5), &member, &roles),
            PermissionBitSet::all()
        );
    }
}
