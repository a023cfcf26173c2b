//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Store trait.

use crate::storage::change::plan_write;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StorageResult, Store};
use crate::storage::{ArticleSnapshot, Document, SourceStats, StaleCursor, WriteKind};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const DOCUMENT_COLUMNS: &str = "normalized_url, url, source, title, html_content, content, \
     excerpt, content_hash, first_scraped, last_scraped, last_modified, scraped_count, \
     content_length, status_code, is_valid";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates a database file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database or create the schema
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
}

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
    let content_length: i64 = row.get(12)?;
    Ok(Document {
        normalized_url: row.get(0)?,
        url: row.get(1)?,
        source: row.get(2)?,
        title: row.get(3)?,
        html_content: row.get(4)?,
        content: row.get(5)?,
        excerpt: row.get(6)?,
        content_hash: row.get(7)?,
        first_scraped: from_millis(row.get(8)?),
        last_scraped: from_millis(row.get(9)?),
        last_modified: from_millis(row.get(10)?),
        scraped_count: row.get(11)?,
        content_length: u64::try_from(content_length).unwrap_or(0),
        status_code: row.get(13)?,
        is_valid: row.get(14)?,
    })
}

fn load_document(conn: &Connection, normalized_url: &str) -> rusqlite::Result<Option<Document>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM documents WHERE normalized_url = ?1",
            DOCUMENT_COLUMNS
        ),
        params![normalized_url],
        row_to_document,
    )
    .optional()
}

fn write_document(conn: &Connection, doc: &Document) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO documents ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
             ON CONFLICT(normalized_url) DO UPDATE SET
                url = excluded.url,
                source = excluded.source,
                title = excluded.title,
                html_content = excluded.html_content,
                content = excluded.content,
                excerpt = excluded.excerpt,
                content_hash = excluded.content_hash,
                last_scraped = excluded.last_scraped,
                last_modified = excluded.last_modified,
                scraped_count = excluded.scraped_count,
                content_length = excluded.content_length,
                status_code = excluded.status_code,
                is_valid = excluded.is_valid",
            DOCUMENT_COLUMNS
        ),
        params![
            doc.normalized_url,
            doc.url,
            doc.source,
            doc.title,
            doc.html_content,
            doc.content,
            doc.excerpt,
            doc.content_hash,
            to_millis(doc.first_scraped),
            to_millis(doc.last_scraped),
            to_millis(doc.last_modified),
            doc.scraped_count,
            i64::try_from(doc.content_length).unwrap_or(i64::MAX),
            doc.status_code,
            doc.is_valid,
        ],
    )?;
    Ok(())
}

impl Store for SqliteStorage {
    fn document_exists(&self, normalized_url: &str) -> StorageResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM documents WHERE normalized_url = ?1)",
            params![normalized_url],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn get_document(&self, normalized_url: &str) -> StorageResult<Option<Document>> {
        Ok(load_document(&self.conn, normalized_url)?)
    }

    fn save_document(&mut self, article: &ArticleSnapshot) -> StorageResult<WriteKind> {
        let tx = self.conn.transaction()?;

        let existing = load_document(&tx, &article.normalized_url)?;
        let (kind, document) = plan_write(existing.as_ref(), article);
        write_document(&tx, &document)?;

        tx.commit()?;
        Ok(kind)
    }

    fn stale_page(
        &self,
        cutoff: DateTime<Utc>,
        after: Option<&StaleCursor>,
        limit: usize,
    ) -> StorageResult<Vec<StaleCursor>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let (after_millis, after_url) = match after {
            Some(cursor) => (Some(to_millis(cursor.last_scraped)), cursor.normalized_url.as_str()),
            None => (None, ""),
        };

        let mut stmt = self.conn.prepare(
            "SELECT last_scraped, normalized_url FROM documents
             WHERE last_scraped < ?1
               AND (?2 IS NULL OR (last_scraped, normalized_url) > (?2, ?3))
             ORDER BY last_scraped ASC, normalized_url ASC
             LIMIT ?4",
        )?;

        let page = stmt
            .query_map(
                params![to_millis(cutoff), after_millis, after_url, limit],
                |row| {
                    Ok(StaleCursor {
                        last_scraped: from_millis(row.get(0)?),
                        normalized_url: row.get(1)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(page)
    }

    fn count_documents(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn source_stats(&self) -> StorageResult<Vec<SourceStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT source,
                    COUNT(*) AS n,
                    COALESCE(AVG(content_length), 0.0),
                    COALESCE(MAX(scraped_count), 0),
                    COALESCE(SUM(CASE WHEN is_valid THEN 1 ELSE 0 END), 0)
             FROM documents
             GROUP BY source
             ORDER BY n DESC, source",
        )?;

        let stats = stmt
            .query_map([], |row| {
                let documents: i64 = row.get(1)?;
                let valid: i64 = row.get(4)?;
                Ok(SourceStats {
                    source: row.get(0)?,
                    documents: documents as u64,
                    avg_content_length: row.get(2)?,
                    max_scraped_count: row.get(3)?,
                    valid_documents: valid as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(stats)
    }

    fn total_scrapes(&self) -> StorageResult<u64> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(scraped_count), 0) FROM documents",
            [],
            |row| row.get(0),
        )?;
        Ok(total as u64)
    }
}
