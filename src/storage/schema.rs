//! Database schema definitions
//!
//! Timestamps are stored as Unix milliseconds so staleness checks are plain
//! integer comparisons.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per normalized URL, upserted on every successful article fetch
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    normalized_url TEXT NOT NULL UNIQUE,
    url TEXT NOT NULL,
    source TEXT NOT NULL,
    title TEXT NOT NULL,
    html_content TEXT NOT NULL,
    content TEXT NOT NULL,
    excerpt TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    first_scraped INTEGER NOT NULL,
    last_scraped INTEGER NOT NULL,
    last_modified INTEGER NOT NULL,
    scraped_count INTEGER NOT NULL DEFAULT 0,
    content_length INTEGER NOT NULL,
    status_code INTEGER,
    is_valid INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_documents_last_scraped ON documents(last_scraped);
CREATE INDEX IF NOT EXISTS idx_documents_source ON documents(source);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
