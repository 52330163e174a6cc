use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::db::manager::Pool;
use crate::db::schema::visitor_count;

use super::{
    DatabaseError,
    models::{COUNTER_ID, VisitorCount},
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = visitor_count)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct DbVisitorCount {
    id: i32,
    count: i64,
}

impl From<DbVisitorCount> for VisitorCount {
    fn from(value: DbVisitorCount) -> Self {
        Self {
            id: value.id,
            count: value.count,
        }
    }
}

async fn with_connection<T, F>(pool: Pool, operation: F) -> Result<T, DatabaseError>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> Result<T, DatabaseError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        operation(&mut conn)
    })
    .await
    .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
}

pub struct PostgresCounterStore {
    pool: Pool,
}

impl PostgresCounterStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::CounterStore for PostgresCounterStore {
    async fn get_or_create(&self) -> Result<VisitorCount, DatabaseError> {
        let pool = self.pool.clone();
        with_connection(pool, move |conn| {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                diesel::insert_into(visitor_count::table)
                    .values((visitor_count::id.eq(COUNTER_ID), visitor_count::count.eq(0i64)))
                    .on_conflict(visitor_count::id)
                    .do_nothing()
                    .execute(conn)?;

                visitor_count::table
                    .find(COUNTER_ID)
                    .select(DbVisitorCount::as_select())
                    .first::<DbVisitorCount>(conn)
            })
            .map(Into::into)
            .map_err(DatabaseError::from)
        })
        .await
    }

    async fn increment(&self) -> Result<VisitorCount, DatabaseError> {
        let pool = self.pool.clone();
        with_connection(pool, move |conn| {
            diesel::insert_into(visitor_count::table)
                .values((visitor_count::id.eq(COUNTER_ID), visitor_count::count.eq(1i64)))
                .on_conflict(visitor_count::id)
                .do_update()
                .set(visitor_count::count.eq(visitor_count::count + 1i64))
                .returning(DbVisitorCount::as_returning())
                .get_result::<DbVisitorCount>(conn)
                .map(Into::into)
                .map_err(DatabaseError::from)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::PostgresCounterStore;
    use crate::config::DatabaseConfig;
    use crate::db::{CounterStore, DatabaseManager};

    /// Needs a disposable database, e.g.
    /// `VISITOR_COUNTER_TEST_PG_URL=postgres://postgres@localhost/visitor_counter_test`.
    #[tokio::test]
    #[ignore = "requires a running PostgreSQL server"]
    async fn postgres_concurrent_increments_are_not_lost() {
        let Ok(url) = std::env::var("VISITOR_COUNTER_TEST_PG_URL") else {
            return;
        };
        let config = DatabaseConfig {
            url: Some(url),
            filename: None,
            max_connections: Some(8),
            min_connections: Some(1),
            busy_timeout_ms: 5000,
        };

        let manager = DatabaseManager::new(&config).await.expect("db manager");
        manager.migrate().await.expect("migrate");
        let pool = manager.pool().expect("postgres pool").clone();
        let store: Arc<dyn CounterStore> = Arc::new(PostgresCounterStore::new(pool));

        let before = store.get_or_create().await.expect("read").count;
        let tasks = (0..32).map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.increment().await })
        });
        for result in futures::future::join_all(tasks).await {
            result.expect("join").expect("increment");
        }

        let after = store.get_or_create().await.expect("read").count;
        assert_eq!(after, before + 32);
    }
}
