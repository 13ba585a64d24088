mod fs;
pub use fs::FsSnapshotStore;

mod postgres;
pub use postgres::PostgresSnapshotStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::schematic::Snapshot;
use model::Snowflake;
use serde::Serialize;

use crate::error::StoreError;

#[derive(Serialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotListing {
    pub identifier: String,
    pub exported_at: DateTime<Utc>,
    pub source_id: Snowflake,
}

/// Persisted snapshot documents, one per source guild.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Metadata of every stored snapshot, newest first.
    async fn list(&self) -> Result<Vec<SnapshotListing>, StoreError>;

    async fn load(&self, identifier: &str) -> Result<Snapshot, StoreError>;

    /// Stores `snapshot`, replacing any older export of the same guild, and returns the
    /// identifier it can be loaded by.
    async fn save(&self, snapshot: &Snapshot) -> Result<String, StoreError>;
}

/// Identifiers are the source guild id.
pub(crate) fn parse_identifier(identifier: &str) -> Result<Snowflake, StoreError> {
    let identifier = identifier.trim();
    identifier
        .strip_suffix(".json")
        .unwrap_or(identifier)
        .parse()
        .map_err(|_| StoreError::NotFound(identifier.to_owned()))
}
