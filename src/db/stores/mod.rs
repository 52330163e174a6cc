use async_trait::async_trait;

use super::DatabaseError;
use super::models::VisitorCount;

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Returns the counter row, inserting it with `count = 0` when absent.
    /// Never modifies an existing row.
    async fn get_or_create(&self) -> Result<VisitorCount, DatabaseError>;

    /// Inserts the row with `count = 1` or adds one to it, as a single
    /// atomic upsert, and returns the new value.
    async fn increment(&self) -> Result<VisitorCount, DatabaseError>;
}
