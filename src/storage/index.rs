//! SQLite secondary index over the feeds.
//!
//! Maps each record to its feed location and indexes it by `type`.
//! Catch-up progress is tracked per feed so reopening a persisted index
//! only reads the feed tails.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;
use crate::storage::feed::FeedEntry;
use crate::storage::schema::apply_schema;

/// Where a record lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLocation {
    pub feed: String,
    pub seq: u64,
    pub offset: u64,
    pub length: u64,
}

/// Catch-up progress for one feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedProgress {
    /// Number of records indexed.
    pub indexed_len: u64,
    /// Byte offset just past the last indexed record.
    pub indexed_bytes: u64,
}

/// Options for streaming records out of the index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamOptions {
    /// Stop after this many records.
    pub limit: Option<usize>,
    /// Newest first instead of oldest first.
    pub reverse: bool,
}

/// SQLite-backed record index.
#[derive(Debug)]
pub struct RecordIndex {
    conn: Connection,
}

impl RecordIndex {
    /// Open (or create) a persisted index.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Create a throwaway index that lives only as long as this value.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be applied.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// How far `feed` has been indexed.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn progress(&self, feed: &str) -> Result<FeedProgress> {
        let progress = self
            .conn
            .query_row(
                "SELECT indexed_len, indexed_bytes FROM feeds WHERE feed = ?1",
                [feed],
                |row| {
                    Ok(FeedProgress {
                        indexed_len: row.get(0)?,
                        indexed_bytes: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(progress.unwrap_or_default())
    }

    /// Index a batch of entries read from `feed` and record the new progress.
    ///
    /// Runs in one transaction, so a crash never leaves progress ahead of
    /// the indexed rows.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails.
    pub fn record(&mut self, feed: &str, entries: &[FeedEntry], indexed_bytes: u64) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut insert = tx.prepare_cached(
                "INSERT OR IGNORE INTO records (feed, seq, type, byte_offset, byte_length)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for entry in entries {
                insert.execute(params![
                    feed,
                    entry.seq,
                    entry.record_type(),
                    entry.offset,
                    entry.length,
                ])?;
            }

            let indexed_len = entries.last().map(|e| e.seq + 1);
            tx.execute(
                "INSERT INTO feeds (feed, indexed_len, indexed_bytes) VALUES (?1, COALESCE(?2, 0), ?3)
                 ON CONFLICT(feed) DO UPDATE SET
                     indexed_len = COALESCE(?2, indexed_len),
                     indexed_bytes = ?3",
                params![feed, indexed_len, indexed_bytes],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Locate every record of `record_type`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn locate(&self, record_type: &str, options: &StreamOptions) -> Result<Vec<RecordLocation>> {
        let direction = if options.reverse { "DESC" } else { "ASC" };
        let sql = format!(
            "SELECT feed, seq, byte_offset, byte_length FROM records
             WHERE type = ?1
             ORDER BY seq_no {direction}
             LIMIT ?2"
        );
        let limit = options
            .limit
            .map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![record_type, limit], |row| {
            Ok(RecordLocation {
                feed: row.get(0)?,
                seq: row.get(1)?,
                offset: row.get(2)?,
                length: row.get(3)?,
            })
        })?;

        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Number of indexed records of `record_type`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self, record_type: &str) -> Result<u64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE type = ?1",
            [record_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(seq: u64, offset: u64, value: serde_json::Value) -> FeedEntry {
        FeedEntry {
            seq,
            offset,
            length: 10,
            value,
        }
    }

    #[test]
    fn test_progress_defaults_to_zero() {
        let index = RecordIndex::in_memory().unwrap();
        assert_eq!(index.progress("nope").unwrap(), FeedProgress::default());
    }

    #[test]
    fn test_record_and_locate_by_type() {
        let mut index = RecordIndex::in_memory().unwrap();
        index
            .record(
                "a",
                &[
                    entry(0, 0, json!({"type": "observation", "id": "o1"})),
                    entry(1, 11, json!({"type": "node", "id": "n1"})),
                    entry(2, 22, json!({"type": "observation", "id": "o2"})),
                ],
                33,
            )
            .unwrap();

        assert_eq!(
            index.progress("a").unwrap(),
            FeedProgress {
                indexed_len: 3,
                indexed_bytes: 33
            }
        );
        assert_eq!(index.count("observation").unwrap(), 2);

        let found = index.locate("observation", &StreamOptions::default()).unwrap();
        let seqs: Vec<u64> = found.iter().map(|l| l.seq).collect();
        assert_eq!(seqs, vec![0, 2]);
    }

    #[test]
    fn test_locate_reverse_and_limit() {
        let mut index = RecordIndex::in_memory().unwrap();
        let entries: Vec<_> = (0..5)
            .map(|i| entry(i, i * 11, json!({"type": "observation"})))
            .collect();
        index.record("a", &entries, 55).unwrap();

        let options = StreamOptions {
            limit: Some(2),
            reverse: true,
        };
        let found = index.locate("observation", &options).unwrap();
        let seqs: Vec<u64> = found.iter().map(|l| l.seq).collect();
        assert_eq!(seqs, vec![4, 3]);
    }

    #[test]
    fn test_empty_batch_keeps_len() {
        let mut index = RecordIndex::in_memory().unwrap();
        index
            .record("a", &[entry(0, 0, json!({"type": "observation"}))], 11)
            .unwrap();
        index.record("a", &[], 11).unwrap();

        assert_eq!(index.progress("a").unwrap().indexed_len, 1);
    }
}
