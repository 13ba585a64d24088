use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use crate::{Snapshots, Table};

pub struct Database {
    pub snapshots: Snapshots,
}

impl Database {
    pub async fn connect(uri: &str, pg_opts: PgPoolOptions) -> Result<Database, sqlx::Error> {
        let pool = Arc::new(pg_opts.connect(uri).await?);

        Ok(Database {
            snapshots: Snapshots::new(Arc::clone(&pool)),
        })
    }

    pub async fn create_schema(&self) -> Result<(), sqlx::Error> {
        self.snapshots.create_schema().await?;

        Ok(())
    }
}
