use log::debug;
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Row, Sqlite, SqlitePool,
};
use std::{future::Future, str::FromStr, sync::Arc, time::Duration as StdDuration};
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tokio::sync::Mutex;

use crate::config::{DBSettings, SqliteConfigSerde};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqliteMode {
    ReadWriteCreate, // rwc - Read + Write + Create if missing
    ReadWrite,       // rw  - Read + Write (must exist)
    ReadOnly,        // ro  - Read only (must exist)
    Memory,          // memory - In-memory database
}

#[derive(Debug, Clone)]
pub enum JournalMode {
    WAL,
    DELETE,
    TRUNCATE,
    MEMORY,
    OFF,
}

#[derive(Debug, Clone)]
pub enum SynchronousMode {
    OFF,
    NORMAL,
    FULL,
}

#[derive(Debug, Clone)]
pub struct SqliteConfig {
    pub mode: SqliteMode,
    pub busy_timeout_ms: u32,
    pub journal_mode: JournalMode,
    pub synchronous: SynchronousMode,
    pub foreign_keys: bool,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        SqliteConfigSerde::default().into()
    }
}

impl SqliteConfig {
    pub fn read_only(&self) -> Self {
        Self {
            mode: SqliteMode::ReadOnly,
            synchronous: SynchronousMode::OFF,
            foreign_keys: false,
            ..self.clone()
        }
    }

    pub fn build_connect_options(
        &self,
        database_path: &str,
    ) -> Result<SqliteConnectOptions, sqlx::Error> {
        let options = match self.mode {
            // Every connection opened from these options sees the same named
            // shared-cache database, which lives as long as one connection does
            SqliteMode::Memory => SqliteConnectOptions::from_str("sqlite::memory:")?,
            SqliteMode::ReadOnly => {
                return Ok(SqliteConnectOptions::new()
                    .filename(database_path)
                    .read_only(true)
                    .busy_timeout(StdDuration::from_millis(self.busy_timeout_ms as u64)));
            }
            SqliteMode::ReadWrite => SqliteConnectOptions::new()
                .filename(database_path)
                .read_only(false),
            SqliteMode::ReadWriteCreate => SqliteConnectOptions::new()
                .filename(database_path)
                .read_only(false)
                .create_if_missing(true),
        };

        let journal_mode = match self.journal_mode {
            JournalMode::WAL => "WAL",
            JournalMode::DELETE => "DELETE",
            JournalMode::TRUNCATE => "TRUNCATE",
            JournalMode::MEMORY => "MEMORY",
            JournalMode::OFF => "OFF",
        };
        let sync_mode = match self.synchronous {
            SynchronousMode::OFF => "OFF",
            SynchronousMode::NORMAL => "NORMAL",
            SynchronousMode::FULL => "FULL",
        };

        Ok(options
            .busy_timeout(StdDuration::from_millis(self.busy_timeout_ms as u64))
            .pragma("journal_mode", journal_mode)
            .pragma("synchronous", sync_mode)
            .foreign_keys(self.foreign_keys))
    }
}

impl From<SqliteConfigSerde> for SqliteConfig {
    fn from(config: SqliteConfigSerde) -> Self {
        Self {
            mode: match config.mode.as_str() {
                "ReadWrite" => SqliteMode::ReadWrite,
                "ReadOnly" => SqliteMode::ReadOnly,
                "Memory" => SqliteMode::Memory,
                _ => SqliteMode::ReadWriteCreate,
            },
            busy_timeout_ms: config.busy_timeout_ms,
            journal_mode: match config.journal_mode.to_uppercase().as_str() {
                "DELETE" => JournalMode::DELETE,
                "TRUNCATE" => JournalMode::TRUNCATE,
                "MEMORY" => JournalMode::MEMORY,
                "OFF" => JournalMode::OFF,
                _ => JournalMode::WAL,
            },
            synchronous: match config.synchronous.to_uppercase().as_str() {
                "OFF" => SynchronousMode::OFF,
                "FULL" => SynchronousMode::FULL,
                _ => SynchronousMode::NORMAL,
            },
            foreign_keys: config.foreign_keys,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabasePoolConfig {
    pub read_max_connections: u32,
    pub read_min_connections: u32,
    pub write_max_connections: u32,
    pub write_min_connections: u32,
    pub idle_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub sqlite_config: SqliteConfig,
}

impl Default for DatabasePoolConfig {
    fn default() -> Self {
        DBSettings::default().into()
    }
}

impl From<DBSettings> for DatabasePoolConfig {
    fn from(config: DBSettings) -> Self {
        Self {
            read_max_connections: config.read_max_connections,
            read_min_connections: config.read_min_connections,
            write_max_connections: config.write_max_connections,
            write_min_connections: config.write_min_connections,
            idle_timeout_secs: config.idle_timeout_secs,
            acquire_timeout_secs: config.acquire_timeout_secs,
            write_timeout_secs: config.write_timeout_secs,
            sqlite_config: config.sqlite_config.into(),
        }
    }
}

static CONTESTS_MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/contests");
static USERS_MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/users");

pub enum DatabaseType {
    /// Contests and the participations entered into them
    Contests,
    Users,
}

#[derive(Error, Debug)]
pub enum DatabaseWriteError {
    #[error("database write failed: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("timed out after {0:?} waiting for the write lock")]
    Timeout(StdDuration),
}

#[derive(Clone, Debug)]
pub struct DBConnection {
    pub database_name: String,
    pub database_path: String,
    read_pool: SqlitePool,
    write_pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
    write_timeout: StdDuration,
}

impl DBConnection {
    pub async fn new(
        path: &str,
        db_name: &str,
        database_pool_config: DatabasePoolConfig,
        db_type: DatabaseType,
    ) -> Result<Self, sqlx::Error> {
        let database_path = format!("{}/{}.db", path, db_name);

        if database_pool_config.sqlite_config.mode != SqliteMode::Memory {
            let database_url = format!("sqlite:{}", database_path);
            if !Sqlite::database_exists(&database_url).await? {
                Sqlite::create_database(&database_url).await?;
            }
        }

        let (read_pool, write_pool) =
            Self::create_pools(&database_path, &database_pool_config).await?;

        let migrator = match db_type {
            DatabaseType::Contests => &CONTESTS_MIGRATOR,
            DatabaseType::Users => &USERS_MIGRATOR,
        };

        migrator
            .run(&write_pool)
            .await
            .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;

        Ok(Self {
            database_name: db_name.to_string(),
            database_path,
            read_pool,
            write_pool,
            write_lock: Arc::new(Mutex::new(())),
            write_timeout: StdDuration::from_secs(database_pool_config.write_timeout_secs),
        })
    }

    #[cfg(test)]
    pub fn new_with_pools(
        database_name: String,
        database_path: String,
        read_pool: SqlitePool,
        write_pool: SqlitePool,
    ) -> Self {
        Self {
            database_name,
            database_path,
            read_pool,
            write_pool,
            write_lock: Arc::new(Mutex::new(())),
            write_timeout: StdDuration::from_secs(5),
        }
    }

    async fn create_pools(
        database_path: &str,
        database_pool_config: &DatabasePoolConfig,
    ) -> Result<(SqlitePool, SqlitePool), sqlx::Error> {
        let sqlite_config = &database_pool_config.sqlite_config;
        let acquire_timeout = StdDuration::from_secs(database_pool_config.acquire_timeout_secs);

        if sqlite_config.mode == SqliteMode::Memory {
            // One pool serves both sides, idle connections are kept so the
            // database is not dropped between requests
            let options = sqlite_config.build_connect_options(database_path)?;
            debug!("Memory connection: {:?}", options);
            let pool = SqlitePoolOptions::new()
                .max_connections(database_pool_config.write_max_connections.max(1))
                .min_connections(1)
                .acquire_timeout(acquire_timeout)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?;
            return Ok((pool.clone(), pool));
        }

        let write_config = SqliteConfig {
            mode: SqliteMode::ReadWrite,
            ..sqlite_config.clone()
        };
        let write_connection = write_config.build_connect_options(database_path)?;
        debug!("Write connection: {:?}", write_connection);

        let write_pool = SqlitePoolOptions::new()
            .max_connections(database_pool_config.write_max_connections)
            .min_connections(database_pool_config.write_min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(StdDuration::from_secs(
                database_pool_config.idle_timeout_secs,
            ))
            .connect_with(write_connection)
            .await?;

        let read_connection = sqlite_config
            .read_only()
            .build_connect_options(database_path)?;
        debug!("Read connection: {:?}", read_connection);

        let read_pool = SqlitePoolOptions::new()
            .max_connections(database_pool_config.read_max_connections)
            .min_connections(database_pool_config.read_min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(StdDuration::from_secs(
                database_pool_config.idle_timeout_secs,
            ))
            .connect_with(read_connection)
            .await?;

        Ok((read_pool, write_pool))
    }

    /// Runs a write against the write pool, one writer at a time per database
    pub async fn execute_write<F, Fut, T>(&self, operation: F) -> Result<T, DatabaseWriteError>
    where
        F: FnOnce(SqlitePool) -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        let _guard = tokio::time::timeout(self.write_timeout, self.write_lock.lock())
            .await
            .map_err(|_| DatabaseWriteError::Timeout(self.write_timeout))?;

        operation(self.write_pool.clone())
            .await
            .map_err(DatabaseWriteError::Sqlx)
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        let _: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.read_pool)
            .await?;
        let _: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.write_pool)
            .await?;

        Ok(())
    }

    pub async fn close(self) {
        self.read_pool.close().await;
        self.write_pool.close().await;
    }

    pub fn read(&self) -> &SqlitePool {
        &self.read_pool
    }

    pub fn write(&self) -> &SqlitePool {
        &self.write_pool
    }
}

pub fn parse_required_datetime(
    row: &SqliteRow,
    column: &str,
) -> Result<OffsetDateTime, sqlx::Error> {
    let date_str: String = row.try_get(column)?;
    OffsetDateTime::parse(&date_str, &Rfc3339).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// Reads a JSON object stored as text, absent values become an empty map
pub fn parse_json_object(
    row: &SqliteRow,
    column: &str,
) -> Result<serde_json::Map<String, serde_json::Value>, sqlx::Error> {
    match row.try_get::<Option<String>, _>(column)? {
        Some(raw) if !raw.is_empty() => {
            serde_json::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
                index: column.to_string(),
                source: Box::new(e),
            })
        }
        _ => Ok(serde_json::Map::new()),
    }
}

pub fn parse_uuid(row: &SqliteRow, column: &str) -> Result<uuid::Uuid, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    uuid::Uuid::parse_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

pub fn format_datetime(datetime: OffsetDateTime) -> Result<String, sqlx::Error> {
    datetime
        .format(&Rfc3339)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))
}
