mod database;
pub use database::Database;

mod table;
pub use table::Table;

mod snapshots;
pub use snapshots::{SnapshotHeader, Snapshots};

// re-export sqlx for errors etc
pub use sqlx;
