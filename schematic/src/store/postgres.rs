use async_trait::async_trait;
use database::Database;
use model::schematic::Snapshot;
use model::Snowflake;
use std::sync::Arc;

use super::{parse_identifier, SnapshotListing, SnapshotStore};
use crate::error::StoreError;

/// Snapshots kept in the `snapshots` table, one row per source guild.
pub struct PostgresSnapshotStore {
    db: Arc<Database>,
}

impl PostgresSnapshotStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SnapshotStore for PostgresSnapshotStore {
    async fn list(&self) -> Result<Vec<SnapshotListing>, StoreError> {
        let headers = self.db.snapshots.list().await?;

        Ok(headers
            .into_iter()
            .map(|header| SnapshotListing {
                identifier: header.source_id.to_string(),
                exported_at: header.exported_at,
                source_id: Snowflake(header.source_id as u64),
            })
            .collect())
    }

    async fn load(&self, identifier: &str) -> Result<Snapshot, StoreError> {
        let source_id = parse_identifier(identifier)?;

        let document = self
            .db
            .snapshots
            .get(source_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(identifier.to_owned()))?;

        serde_json::from_value(document).map_err(|e| StoreError::Corrupt {
            identifier: identifier.to_owned(),
            reason: e.to_string(),
        })
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<String, StoreError> {
        let document = serde_json::to_value(snapshot)?;

        self.db
            .snapshots
            .upsert(
                snapshot.source_id,
                &snapshot.format_version,
                snapshot.exported_at,
                &document,
            )
            .await?;

        Ok(snapshot.source_id.to_string())
    }
}
