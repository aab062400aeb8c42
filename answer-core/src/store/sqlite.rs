//! SQLite-backed keyword store.

use super::{Candidate, InsertOutcome, KeywordRecord, KeywordStore, StoreError};
use rusqlite::{params, Connection, ErrorCode, OpenFlags};
use std::path::Path;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        primary_keyword TEXT NOT NULL,
        secondary_keyword TEXT,
        answer TEXT NOT NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS data_keyword_pair
        ON data (primary_keyword, IFNULL(secondary_keyword, ''));
";

/// Keyword store persisted in a SQLite database file.
///
/// Uniqueness of `(primary_keyword, secondary_keyword)` is enforced by a
/// unique index that treats a missing secondary keyword as one value, so at
/// most one bare record exists per primary keyword.
pub struct SqliteKeywordStore {
    conn: Connection,
}

impl SqliteKeywordStore {
    /// Open or create a database file and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::initialize(conn)
    }

    /// Open an existing database file read-only, failing if it is absent or
    /// has no `data` table. The schema is left as found.
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StoreError::Missing(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let tables: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'data'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(StoreError::MissingTable(path.to_path_buf()));
        }

        Ok(Self { conn })
    }

    /// Open a private in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}

impl KeywordStore for SqliteKeywordStore {
    fn query(&self, primary_keyword: &str) -> Result<Vec<Candidate>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT answer, secondary_keyword FROM data WHERE primary_keyword = ?1 ORDER BY id",
        )?;

        // Blank secondary keywords count as missing.
        let rows = stmt.query_map(params![primary_keyword], |row| {
            let secondary: Option<String> = row.get(1)?;
            Ok(Candidate {
                answer: row.get(0)?,
                secondary_keyword: secondary.filter(|s| !s.trim().is_empty()),
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    fn insert(&mut self, record: &KeywordRecord) -> Result<InsertOutcome, StoreError> {
        record.validate()?;

        let result = self.conn.execute(
            "INSERT INTO data (primary_keyword, secondary_keyword, answer) VALUES (?1, ?2, ?3)",
            params![
                record.primary_keyword,
                record.secondary_keyword,
                record.answer
            ],
        );

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn record_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM data", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
