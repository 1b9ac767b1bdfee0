#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use sqlx::sqlite;
use std::{str::FromStr, time::Duration};
use tokio::try_join;

pub mod config;
mod r#impl;
pub mod types;

use config::SqliteConfig;

/// SQLite implementation of the warehouse ports.
///
/// A file-backed database gets a reader pool and a single-connection writer
/// pool, as is usual for SQLite in WAL mode. An in-memory database only
/// exists for the lifetime of its connection, so both handles then share a
/// single pinned connection.
///
/// # Example
///
/// ```no_run
/// # use rpo_sqlite::{Db, config::SqliteConfig};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Db::open(&SqliteConfig::default()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Db {
    /// Connection pool for read operations
    pub reader: sqlx::Pool<sqlx::Sqlite>,
    /// Connection pool for write operations (limited to 1 connection)
    pub writer: sqlx::Pool<sqlx::Sqlite>,
}

impl Db {
    /// Open the database described by `config` and apply pending migrations.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the connection fails or a migration cannot
    /// be applied.
    pub async fn open(config: &SqliteConfig) -> Result<Self, sqlx::Error> {
        let Some(path) = config.database_path.as_ref() else {
            let options = sqlite::SqliteConnectOptions::from_str(":memory:")?
                .foreign_keys(true)
                .pragma("temp_store", "memory");
            let pool = sqlite::SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?;
            sqlx::migrate!("./schema").run(&pool).await?;
            return Ok(Self {
                reader: pool.clone(),
                writer: pool,
            });
        };

        let options = sqlite::SqliteConnectOptions::new()
            .filename(path)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true)
            .journal_mode(sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlite::SqliteSynchronous::Normal)
            .pragma("cache_size", "1000000000")
            .pragma("journal_size_limit", "27103364")
            .pragma("mmap_size", "134217728")
            .pragma("temp_store", "memory")
            .create_if_missing(config.create_if_missing);

        let reader = sqlite::SqlitePoolOptions::new().connect_with(options.clone());
        let writer = sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options);

        let (reader, writer) = try_join!(reader, writer)?;

        sqlx::migrate!("./schema").run(&writer).await?;

        tracing::debug!(path = %path.display(), "warehouse opened");
        Ok(Self { reader, writer })
    }
}
