//! SQL DDL for the knowledge and history databases.
//!
//! The knowledge database holds `chunks`, the `chunks_vec` (vec0) index and
//! `schema_meta`. The history database holds `sessions` and `messages`. All
//! DDL uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

/// Schema version written by this binary.
pub const SCHEMA_VERSION: u32 = 1;

const META_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

const KNOWLEDGE_SQL: &str = r#"
-- Chunk text and metadata. The vector lives in chunks_vec under the same id.
CREATE TABLE IF NOT EXISTS chunks (
    id TEXT PRIMARY KEY,
    document_id TEXT,
    content TEXT NOT NULL CHECK(length(content) > 0),
    metadata TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_document ON chunks(document_id);
CREATE INDEX IF NOT EXISTS idx_chunks_created ON chunks(created_at);
"#;

const HISTORY_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    session_id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    last_updated TEXT NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL REFERENCES sessions(session_id),
    role TEXT NOT NULL CHECK(role IN ('user','assistant')),
    content TEXT NOT NULL,
    timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id, timestamp);
"#;

/// vec0 DDL. The column width is fixed at creation, so it is rendered per database.
fn vec_table_sql(dimensions: usize) -> String {
    format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS chunks_vec USING vec0(\n    \
         id TEXT PRIMARY KEY,\n    \
         embedding FLOAT[{dimensions}] distance_metric=cosine\n);"
    )
}

fn init_meta(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(META_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}

/// Initialize the knowledge tables except the vector index. Idempotent.
pub fn init_knowledge_schema(conn: &Connection) -> rusqlite::Result<()> {
    init_meta(conn)?;
    conn.execute_batch(KNOWLEDGE_SQL)?;
    Ok(())
}

/// Create `chunks_vec` if missing. An existing table keeps its original width.
pub fn init_vector_table(conn: &Connection, dimensions: usize) -> rusqlite::Result<()> {
    conn.execute_batch(&vec_table_sql(dimensions))
}

/// Initialize the session/message tables. Idempotent.
pub fn init_history_schema(conn: &Connection) -> rusqlite::Result<()> {
    init_meta(conn)?;
    conn.execute_batch(HISTORY_SQL)?;
    Ok(())
}
