//! The portable schematic document: a guild's roles, categories and channels at one point in
//! time, with permissions stored as capability names rather than bitmasks.

mod snapshot;
pub use snapshot::{Snapshot, SnapshotMetadata, FORMAT_VERSION};

mod role;
pub use role::SnapshotRole;

mod channel;
pub use channel::SnapshotChannel;

mod overwrite;
pub use overwrite::SnapshotOverwrite;
