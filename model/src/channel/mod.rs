mod channel;
pub use channel::*;

mod channel_type;
pub use channel_type::ChannelType;

mod forum_tag;
pub use forum_tag::ForumTag;

mod permission_overwrite;
pub use permission_overwrite::*;

mod permission;
pub use permission::Permission;
