use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::{CounterStore, DatabaseError};

/// Body of both visitor-count responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: i64,
}

/// Read and record visits against the singleton counter row.
///
/// Cloning is cheap: every clone shares the same store, and through it the
/// same connection pool.
#[derive(Clone)]
pub struct VisitorCounter {
    store: Arc<dyn CounterStore>,
}

impl VisitorCounter {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Current count. The first read ever creates the row at zero.
    pub async fn current(&self) -> Result<CountResponse, DatabaseError> {
        let row = self.store.get_or_create().await?;
        debug!(count = row.count, "visitor count read");
        Ok(CountResponse { count: row.count })
    }

    /// Registers one visit and returns the count including it.
    pub async fn record_visit(&self) -> Result<CountResponse, DatabaseError> {
        let row = self.store.increment().await?;
        debug!(count = row.count, "visitor count incremented");
        Ok(CountResponse { count: row.count })
    }
}
