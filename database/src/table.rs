use async_trait::async_trait;

/// A table owned by this crate that knows how to create itself.
#[async_trait]
pub trait Table: Send + Sync {
    async fn create_schema(&self) -> Result<(), sqlx::Error>;
}
