use serde_repr::{Deserialize_repr, Serialize_repr};

macro_rules! permissions {
    ($($name:ident = $bit:literal,)*) => {
        #[derive(Serialize_repr, Deserialize_repr, Debug, Copy, Clone, Eq, PartialEq, Hash)]
        #[repr(u64)]
        pub enum Permission {
            $($name = 1 << $bit,)*
        }

        impl Permission {
            /// Every permission Discord currently defines, in ascending bit order.
            pub const ALL: &'static [Permission] = &[$(Permission::$name,)*];

            pub fn name(self) -> &'static str {
                match self {
                    $(Permission::$name => stringify!($name),)*
                }
            }
        }
    };
}

permissions! {
    CreateInstantInvite = 0,
    KickMembers = 1,
    BanMembers = 2,
    Administrator = 3,
    ManageChannels = 4,
    ManageGuild = 5,
    AddReactions = 6,
    ViewAuditLog = 7,
    PrioritySpeaker = 8,
    Stream = 9,
    ViewChannel = 10,
    SendMessages = 11,
    SendTTSMessages = 12,
    ManageMessages = 13,
    EmbedLinks = 14,
    AttachFiles = 15,
    ReadMessageHistory = 16,
    MentionEveryone = 17,
    UseExternalEmojis = 18,
    ViewGuildInsights = 19,
    Connect = 20,
    Speak = 21,
    MuteMembers = 22,
    DeafenMembers = 23,
    MoveMembers = 24,
    UseVAD = 25,
    ChangeNickname = 26,
    ManageNicknames = 27,
    ManageRoles = 28,
    ManageWebhooks = 29,
    ManageGuildExpressions = 30,
    UseApplicationCommands = 31,
    RequestToSpeak = 32,
    ManageEvents = 33,
    ManageThreads = 34,
    CreatePublicThreads = 35,
    CreatePrivateThreads = 36,
    UseExternalStickers = 37,
    SendMessagesInThreads = 38,
    UseEmbeddedActivities = 39,
    ModerateMembers = 40,
    ViewCreatorMonetizationAnalytics = 41,
    UseSoundboard = 42,
    CreateGuildExpressions = 43,
    CreateEvents = 44,
    UseExternalSounds = 45,
    SendVoiceMessages = 46,
    SendPolls = 49,
    UseExternalApps = 50,
}

impl Permission {
    pub fn sum(permissions: &[Permission]) -> u64 {
        let mut sum = 0;
        permissions
            .iter()
            .copied()
            .for_each(|perm| sum |= perm as u64);
        sum
    }

    /// Bitmask of every permission in [`Permission::ALL`].
    pub fn known_bits() -> u64 {
        Permission::sum(Permission::ALL)
    }

    pub fn from_name(name: &str) -> Option<Permission> {
        Permission::ALL
            .iter()
            .copied()
            .find(|perm| perm.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        for perm in Permission::ALL {
            assert_eq!(Permission::from_name(perm.name()), Some(*perm));
        }
    }

    #[test]
    fn test_all_is_ascending() {
        let bits: Vec<u64> = Permission::ALL.iter().map(|p| *p as u64).collect();
        let mut sorted = bits.clone();
        sorted.sort_unstable();
        assert_eq!(bits, sorted);
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(Permission::from_name("ManageEverything"), None);
        assert_eq!(Permission::from_name("viewchannel"), None);
    }
}
