use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::schema::visitor_count;

use super::{
    DatabaseError,
    models::{COUNTER_ID, VisitorCount},
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = visitor_count)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
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

pub(crate) fn establish_connection(
    path: &str,
    busy_timeout_ms: u64,
) -> Result<SqliteConnection, DatabaseError> {
    let mut conn =
        SqliteConnection::establish(path).map_err(|e| DatabaseError::Connection(e.to_string()))?;
    // Writers queue on the file lock instead of failing with SQLITE_BUSY.
    diesel::sql_query(format!("PRAGMA busy_timeout = {busy_timeout_ms}"))
        .execute(&mut conn)
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;
    Ok(conn)
}

fn select_counter(conn: &mut SqliteConnection) -> QueryResult<DbVisitorCount> {
    visitor_count::table
        .find(COUNTER_ID)
        .select(DbVisitorCount::as_select())
        .first::<DbVisitorCount>(conn)
}

fn upsert_increment(conn: &mut SqliteConnection) -> QueryResult<usize> {
    diesel::insert_into(visitor_count::table)
        .values((visitor_count::id.eq(COUNTER_ID), visitor_count::count.eq(1i64)))
        .on_conflict(visitor_count::id)
        .do_update()
        .set(visitor_count::count.eq(visitor_count::count + 1i64))
        .execute(conn)
}

pub struct SqliteCounterStore {
    db_path: Arc<String>,
    busy_timeout_ms: u64,
}

impl SqliteCounterStore {
    pub fn new(db_path: Arc<String>, busy_timeout_ms: u64) -> Self {
        Self {
            db_path,
            busy_timeout_ms,
        }
    }

    async fn run<F>(&self, operation: F) -> Result<VisitorCount, DatabaseError>
    where
        F: FnOnce(&mut SqliteConnection) -> QueryResult<DbVisitorCount> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        let busy_timeout_ms = self.busy_timeout_ms;
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path, busy_timeout_ms)?;
            conn.immediate_transaction(operation)
                .map(Into::into)
                .map_err(DatabaseError::from)
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}

#[async_trait]
impl super::CounterStore for SqliteCounterStore {
    async fn get_or_create(&self) -> Result<VisitorCount, DatabaseError> {
        self.run(|conn| {
            diesel::insert_into(visitor_count::table)
                .values((visitor_count::id.eq(COUNTER_ID), visitor_count::count.eq(0i64)))
                .on_conflict(visitor_count::id)
                .do_nothing()
                .execute(conn)?;
            select_counter(conn)
        })
        .await
    }

    async fn increment(&self) -> Result<VisitorCount, DatabaseError> {
        self.run(|conn| {
            upsert_increment(conn)?;
            select_counter(conn)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use diesel::RunQueryDsl;
    use tempfile::NamedTempFile;

    use super::{SqliteCounterStore, select_counter, upsert_increment};
    use crate::config::DatabaseConfig;
    use crate::db::{CounterStore, DatabaseManager};

    async fn migrated_store(file: &NamedTempFile) -> Arc<dyn CounterStore> {
        let db_path = file.path().to_string_lossy().to_string();
        let manager = DatabaseManager::new(&DatabaseConfig::sqlite(db_path))
            .await
            .expect("db manager");
        manager.migrate().await.expect("migrate");
        manager.counter_store()
    }

    #[tokio::test]
    async fn read_creates_row_at_zero_and_is_idempotent() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let store = migrated_store(&file).await;

        let first = store.get_or_create().await.expect("first read");
        assert_eq!(first.id, 1);
        assert_eq!(first.count, 0);

        let second = store.get_or_create().await.expect("second read");
        assert_eq!(second.count, 0);
    }

    #[tokio::test]
    async fn increment_on_absent_row_starts_at_one() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let store = migrated_store(&file).await;

        let visit = store.increment().await.expect("increment");
        assert_eq!(visit.count, 1);
        assert_eq!(store.get_or_create().await.expect("read").count, 1);
    }

    #[tokio::test]
    async fn increment_adds_exactly_one_and_persists() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let store = migrated_store(&file).await;

        for expected in 1..=5 {
            assert_eq!(store.increment().await.expect("increment").count, expected);
        }

        let reopened = migrated_store(&file).await;
        assert_eq!(reopened.get_or_create().await.expect("read").count, 5);
        assert_eq!(reopened.increment().await.expect("increment").count, 6);
    }

    #[tokio::test]
    async fn concurrent_increments_on_absent_row_are_not_lost() {
        const CALLERS: i64 = 24;

        let file = NamedTempFile::new().expect("temp sqlite file");
        let store = migrated_store(&file).await;

        let tasks = (0..CALLERS).map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.increment().await })
        });

        let mut seen: Vec<i64> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.expect("join").expect("increment").count)
            .collect();
        seen.sort_unstable();

        assert_eq!(seen, (1..=CALLERS).collect::<Vec<_>>());
        assert_eq!(store.get_or_create().await.expect("read").count, CALLERS);
    }

    #[tokio::test]
    async fn concurrent_first_reads_do_not_collide() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let store = migrated_store(&file).await;

        let tasks = (0..8).map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.get_or_create().await })
        });
        for joined in futures::future::join_all(tasks).await {
            assert_eq!(joined.expect("join").expect("read").count, 0);
        }
    }

    #[tokio::test]
    async fn failure_after_upsert_rolls_back_the_increment() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        migrated_store(&file).await.increment().await.expect("seed");
        let store =
            SqliteCounterStore::new(Arc::new(file.path().to_string_lossy().to_string()), 1000);

        let err = store
            .run(|conn| {
                upsert_increment(conn)?;
                diesel::sql_query("INSERT INTO no_such_table VALUES (1)").execute(conn)?;
                select_counter(conn)
            })
            .await
            .unwrap_err();
        assert!(!err.is_unavailable());

        assert_eq!(store.get_or_create().await.expect("read").count, 1);
        assert_eq!(store.increment().await.expect("increment").count, 2);
    }

    #[tokio::test]
    async fn missing_table_is_a_query_error() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let store =
            SqliteCounterStore::new(Arc::new(file.path().to_string_lossy().to_string()), 1000);

        let err = store.increment().await.unwrap_err();
        assert!(!err.is_unavailable());
    }

    #[tokio::test]
    async fn unreachable_file_is_a_connection_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("missing").join("counter.db");
        let store = SqliteCounterStore::new(Arc::new(path.to_string_lossy().to_string()), 1000);

        let err = store.get_or_create().await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
