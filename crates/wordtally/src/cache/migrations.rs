//! Schema migrations for the SQLite cache.
//!
//! Applied migrations are tracked in a `_migrations` table; pending ones
//! run in version order, each at most once.

use rusqlite::Connection;
use tracing::info;

use crate::error::CacheError;

struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_cache_entries_table",
        sql: include_str!("sql/001_create_cache_entries.sql"),
    },
    Migration {
        version: 2,
        description: "index_cache_entries_expires_at",
        sql: include_str!("sql/002_index_expires_at.sql"),
    },
];

pub fn run_all(conn: &Connection) -> Result<(), CacheError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        info!(
            "Running cache migration v{}: {}",
            migration.version, migration.description
        );

        conn.execute_batch(migration.sql)
            .map_err(|e| CacheError::Migration {
                version: migration.version,
                reason: e.to_string(),
            })?;

        conn.execute(
            "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.description],
        )?;
    }

    Ok(())
}
