use async_trait::async_trait;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{Error, Executor, PgPool};
use std::sync::Arc;

use crate::Table;

use futures::TryStreamExt;
use model::Snowflake;

/// Listing columns of a stored snapshot, without the document body.
#[derive(sqlx::FromRow, Debug)]
pub struct SnapshotHeader {
    pub source_id: i64,
    pub format_version: String,
    pub exported_at: DateTime<Utc>,
}

pub struct Snapshots {
    db: Arc<PgPool>,
}

#[async_trait]
impl Table for Snapshots {
    async fn create_schema(&self) -> Result<(), Error> {
        // Two statements, so this has to go over the simple query protocol
        self.db
            .execute(
                r#"
CREATE TABLE IF NOT EXISTS snapshots(
	"source_id" int8 NOT NULL,
	"format_version" VARCHAR(16) NOT NULL,
	"exported_at" TIMESTAMPTZ NOT NULL,
	"document" jsonb NOT NULL,
	PRIMARY KEY("source_id")
);
CREATE INDEX IF NOT EXISTS snapshots_exported_at ON snapshots("exported_at");
"#,
            )
            .await?;

        Ok(())
    }
}

impl Snapshots {
    pub fn new(db: Arc<PgPool>) -> Snapshots {
        Snapshots { db }
    }

    pub async fn list(&self) -> Result<Vec<SnapshotHeader>, Error> {
        let query = r#"SELECT "source_id", "format_version", "exported_at" FROM snapshots ORDER BY "exported_at" DESC;"#;

        let mut rows = sqlx::query_as::<_, SnapshotHeader>(query).fetch(&*self.db);

        let mut headers = Vec::new();
        while let Some(row) = rows.try_next().await? {
            headers.push(row);
        }

        Ok(headers)
    }

    /// The raw document, left unparsed so callers can tell a corrupt document from a missing one.
    pub async fn get(&self, source_id: Snowflake) -> Result<Option<serde_json::Value>, Error> {
        let query = r#"SELECT "document" FROM snapshots WHERE "source_id" = $1;"#;

        match sqlx::query_as::<_, (Json<serde_json::Value>,)>(query)
            .bind(source_id.0 as i64)
            .fetch_one(&*self.db)
            .await
        {
            Ok(row) => Ok(Some(row.0 .0)),
            Err(sqlx::Error::RowNotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn upsert(
        &self,
        source_id: Snowflake,
        format_version: &str,
        exported_at: DateTime<Utc>,
        document: &serde_json::Value,
    ) -> Result<(), Error> {
        let query = r#"
INSERT INTO snapshots("source_id", "format_version", "exported_at", "document")
VALUES($1, $2, $3, $4)
ON CONFLICT("source_id") DO UPDATE SET "format_version" = $2, "exported_at" = $3, "document" = $4;"#;

        sqlx::query(query)
            .bind(source_id.0 as i64)
            .bind(format_version)
            .bind(exported_at)
            .bind(Json(document))
            .execute(&*self.db)
            .await?;

        Ok(())
    }
}
