//! Database module for SQLite persistence
//!
//! Holds the local entity records, the persisted operation queue counters and
//! per-domain sync metadata.

mod schema;

pub use schema::*;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;

use crate::error::Result;

/// Create a new database connection pool with the local schema applied
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    let pool = connect(database_url).await?;

    initialize_schema(&pool).await?;

    Ok(pool)
}

/// Open a pool without touching the schema
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Create an in-memory pool with the schema applied.
///
/// The database lives only as long as its connection: one connection, never
/// recycled.
pub async fn create_memory_pool() -> Result<SqlitePool> {
    let pool = open_memory_pool().await?;
    initialize_schema(&pool).await?;
    Ok(pool)
}

/// In-memory pool without any schema
pub(crate) async fn open_memory_pool() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    Ok(pool)
}
