//! Schema versioning for the drivelog database.
//!
//! The schema version lives in the `metadata` table. A fresh database is
//! created at the base schema and then migrated up to [`CURRENT_VERSION`].

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::error::{Error, Result};

use super::schema::SCHEMA_STATEMENTS;

/// The current schema version.
pub const CURRENT_VERSION: i32 = 1;

const VERSION_KEY: &str = "schema_version";

/// Create missing tables and bring the schema up to [`CURRENT_VERSION`].
///
/// Safe to call on every open.
///
/// # Errors
///
/// Returns an error if schema creation or a migration step fails, or if the
/// database was written by a newer version of drivelog.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let version = schema_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {version} is newer than supported version \
                 {CURRENT_VERSION}"
            ),
        });
    }

    for next in (version + 1)..=CURRENT_VERSION {
        debug!(version = next, "Applying schema migration");
        apply(conn, next)?;
    }
    Ok(())
}

/// Stored schema version, 0 for a database that never recorded one.
fn schema_version(conn: &Connection) -> Result<i32> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match stored {
        None => Ok(0),
        Some(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
    }
}

fn record_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

fn apply(conn: &Connection, version: i32) -> Result<()> {
    match version {
        // Base schema; the tables already exist.
        1 => record_version(conn, 1),
        _ => Err(Error::DatabaseMigration {
            message: format!("unknown migration version: {version}"),
        }),
    }
}
