use serde_repr::{Deserialize_repr, Serialize_repr};
use ChannelType::*;

#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum ChannelType {
    GuildText = 0,
    DM = 1,
    GuildVoice = 2,
    GroupDM = 3,
    GuildCategory = 4,
    GuildNews = 5,
    GuildAnnouncementThread = 10,
    GuildPublicThread = 11,
    GuildPrivateThread = 12,
    GuildStageVoice = 13,
    GuildDirectory = 14,
    GuildForum = 15,
    GuildMedia = 16,
}

impl ChannelType {
    pub fn is_thread(&self) -> bool {
        matches!(
            self,
            GuildAnnouncementThread | GuildPublicThread | GuildPrivateThread
        )
    }

    pub fn is_category(&self) -> bool {
        *self == GuildCategory
    }

    /// Channels that carry `bitrate` and `user_limit`.
    pub fn is_voice(&self) -> bool {
        matches!(self, GuildVoice | GuildStageVoice)
    }

    /// Channels that carry `available_tags`.
    pub fn is_forum(&self) -> bool {
        matches!(self, GuildForum | GuildMedia)
    }

    /// Whether the channel belongs to a guild's structure, as opposed to a DM or a thread.
    pub fn is_guild_structure(&self) -> bool {
        !self.is_thread() && !matches!(self, DM | GroupDM)
    }
}
