use crate::config::{DatabaseConfig as ConfigDatabaseConfig, DbType as ConfigDbType};
use crate::db::{CounterStore, DatabaseError};
use std::sync::Arc;

#[cfg(feature = "postgres")]
use crate::db::postgres::PostgresCounterStore;
#[cfg(feature = "postgres")]
use diesel::pg::PgConnection;
#[cfg(feature = "postgres")]
use diesel::r2d2::{self, ConnectionManager};

#[cfg(feature = "postgres")]
pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

#[cfg(any(feature = "postgres", feature = "sqlite"))]
use diesel::RunQueryDsl;

#[cfg(feature = "sqlite")]
use crate::db::sqlite::{SqliteCounterStore, establish_connection};

#[derive(Clone)]
pub struct DatabaseManager {
    #[cfg(feature = "postgres")]
    postgres_pool: Option<Pool>,
    #[cfg(feature = "sqlite")]
    sqlite_path: Option<String>,
    #[cfg(feature = "sqlite")]
    busy_timeout_ms: u64,
    counter_store: Arc<dyn CounterStore>,
    db_type: DbType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbType {
    Postgres,
    Sqlite,
}

impl DbType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DbType::Postgres => "postgres",
            DbType::Sqlite => "sqlite",
        }
    }
}

impl From<ConfigDbType> for DbType {
    fn from(value: ConfigDbType) -> Self {
        match value {
            ConfigDbType::Postgres => DbType::Postgres,
            ConfigDbType::Sqlite => DbType::Sqlite,
        }
    }
}

#[cfg(feature = "postgres")]
const POSTGRES_MIGRATION: &str = r#"
    CREATE TABLE IF NOT EXISTS visitor_count (
        id INTEGER PRIMARY KEY,
        count BIGINT NOT NULL DEFAULT 0 CHECK (count >= 0)
    )
"#;

#[cfg(feature = "sqlite")]
const SQLITE_MIGRATION: &str = r#"
    CREATE TABLE IF NOT EXISTS visitor_count (
        id INTEGER PRIMARY KEY NOT NULL,
        count INTEGER NOT NULL DEFAULT 0 CHECK (count >= 0)
    )
"#;

impl DatabaseManager {
    pub async fn new(config: &ConfigDatabaseConfig) -> Result<Self, DatabaseError> {
        let db_type = DbType::from(config.db_type());

        match db_type {
            #[cfg(feature = "postgres")]
            DbType::Postgres => {
                let connection_string = config.connection_string();
                let max_connections = config.max_connections();
                let min_connections = config.min_connections();

                let manager = ConnectionManager::<PgConnection>::new(connection_string);

                let builder = r2d2::Pool::builder()
                    .max_size(max_connections)
                    .min_idle(Some(min_connections));

                // r2d2 blocks while it fills min_idle, keep that off the runtime threads.
                let pool = tokio::task::spawn_blocking(move || builder.build(manager))
                    .await
                    .map_err(|e| DatabaseError::Connection(format!("pool task failed: {e}")))?
                    .map_err(|e| DatabaseError::Connection(e.to_string()))?;

                let counter_store = Arc::new(PostgresCounterStore::new(pool.clone()));

                Ok(Self {
                    postgres_pool: Some(pool),
                    #[cfg(feature = "sqlite")]
                    sqlite_path: None,
                    #[cfg(feature = "sqlite")]
                    busy_timeout_ms: config.busy_timeout_ms,
                    counter_store,
                    db_type,
                })
            }
            #[cfg(feature = "sqlite")]
            DbType::Sqlite => {
                let path = config.sqlite_path().ok_or_else(|| {
                    DatabaseError::Connection("sqlite path missing from config".to_string())
                })?;

                let counter_store = Arc::new(SqliteCounterStore::new(
                    Arc::new(path.clone()),
                    config.busy_timeout_ms,
                ));

                Ok(Self {
                    #[cfg(feature = "postgres")]
                    postgres_pool: None,
                    sqlite_path: Some(path),
                    busy_timeout_ms: config.busy_timeout_ms,
                    counter_store,
                    db_type,
                })
            }
            #[cfg(not(feature = "postgres"))]
            DbType::Postgres => Err(DatabaseError::Connection(
                "PostgreSQL feature not enabled".to_string(),
            )),
            #[cfg(not(feature = "sqlite"))]
            DbType::Sqlite => Err(DatabaseError::Connection(
                "SQLite feature not enabled".to_string(),
            )),
        }
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        match self.db_type {
            #[cfg(feature = "postgres")]
            DbType::Postgres => {
                let pool = self.postgres_pool.clone().ok_or_else(|| {
                    DatabaseError::Migration("postgres pool not initialized".to_string())
                })?;
                Self::migrate_postgres(pool).await
            }
            #[cfg(feature = "sqlite")]
            DbType::Sqlite => {
                let path = self.sqlite_path.clone().ok_or_else(|| {
                    DatabaseError::Migration("sqlite path not initialized".to_string())
                })?;
                Self::migrate_sqlite(path, self.busy_timeout_ms).await
            }
            #[cfg(not(feature = "postgres"))]
            DbType::Postgres => Err(DatabaseError::Migration(
                "PostgreSQL feature not enabled".to_string(),
            )),
            #[cfg(not(feature = "sqlite"))]
            DbType::Sqlite => Err(DatabaseError::Migration(
                "SQLite feature not enabled".to_string(),
            )),
        }
    }

    #[cfg(feature = "postgres")]
    async fn migrate_postgres(pool: Pool) -> Result<(), DatabaseError> {
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| DatabaseError::Connection(e.to_string()))?;

            diesel::sql_query(POSTGRES_MIGRATION)
                .execute(&mut conn)
                .map_err(|e| DatabaseError::Migration(e.to_string()))?;

            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration task failed: {e}")))?
    }

    #[cfg(feature = "sqlite")]
    async fn migrate_sqlite(path: String, busy_timeout_ms: u64) -> Result<(), DatabaseError> {
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&path, busy_timeout_ms)?;

            diesel::sql_query(SQLITE_MIGRATION)
                .execute(&mut conn)
                .map_err(|e| DatabaseError::Migration(e.to_string()))?;

            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration task failed: {e}")))?
    }

    pub fn counter_store(&self) -> Arc<dyn CounterStore> {
        self.counter_store.clone()
    }

    #[cfg(feature = "postgres")]
    pub fn pool(&self) -> Option<&Pool> {
        self.postgres_pool.as_ref()
    }

    pub fn db_type(&self) -> DbType {
        self.db_type
    }
}
