//! Record index schema.
//!
//! The index is derived data: it can always be rebuilt by replaying the
//! feeds, so schema changes bump the version and start over.

use rusqlite::{Connection, Result};
use tracing::info;

/// Current schema version, stored in `PRAGMA user_version`.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the record index.
pub const SCHEMA_SQL: &str = r"
-- Catch-up progress per feed
CREATE TABLE IF NOT EXISTS feeds (
    feed TEXT PRIMARY KEY,
    indexed_len INTEGER NOT NULL DEFAULT 0,
    indexed_bytes INTEGER NOT NULL DEFAULT 0
);

-- One row per record; seq_no is the global insertion order
CREATE TABLE IF NOT EXISTS records (
    seq_no INTEGER PRIMARY KEY AUTOINCREMENT,
    feed TEXT NOT NULL,
    seq INTEGER NOT NULL,
    type TEXT,
    byte_offset INTEGER NOT NULL,
    byte_length INTEGER NOT NULL,
    UNIQUE (feed, seq)
);

CREATE INDEX IF NOT EXISTS idx_records_type ON records(type, seq_no);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS records;
DROP TABLE IF EXISTS feeds;
";

/// Create the index tables, rebuilding them if the stored version differs.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version != 0 && version != CURRENT_SCHEMA_VERSION {
        info!(
            found = version,
            expected = CURRENT_SCHEMA_VERSION,
            "Index schema changed, rebuilding"
        );
        conn.execute_batch(DROP_SQL)?;
    }

    conn.execute_batch(SCHEMA_SQL)?;
    conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        apply_schema(&conn).unwrap();

        let version: i32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_stale_schema_is_rebuilt() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO feeds (feed, indexed_len, indexed_bytes) VALUES ('a', 3, 30)",
            [],
        )
        .unwrap();
        conn.pragma_update(None, "user_version", 99).unwrap();

        apply_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM feeds", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
