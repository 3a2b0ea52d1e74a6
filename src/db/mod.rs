pub mod meta;
pub mod schema;

use rusqlite::Connection;
use serde::Serialize;
use sqlite_vec::sqlite3_vec_init;
use std::path::Path;
use std::sync::Once;

use crate::error::Result;

static SQLITE_VEC_INIT: Once = Once::new();

/// Register the sqlite-vec extension globally. Safe to call multiple times.
pub fn load_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// RFC 3339 UTC timestamp with microseconds, so rows written in the same
/// second still sort in write order.
pub(crate) fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

fn open_file(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    // WAL lets readers proceed while a write transaction is open
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;
    Ok(conn)
}

/// Open (or create) the knowledge database, with sqlite-vec loaded and the
/// vector table sized for `dimensions`.
pub fn open_knowledge_database(path: impl AsRef<Path>, dimensions: usize) -> Result<Connection> {
    let path = path.as_ref();
    load_sqlite_vec();

    let conn = open_file(path)?;
    schema::init_knowledge_schema(&conn)?;
    meta::ensure_embedding_dimensions(&conn, dimensions)?;
    schema::init_vector_table(&conn, dimensions)?;

    tracing::info!(path = %path.display(), dimensions, "knowledge database initialized");
    Ok(conn)
}

/// Open (or create) the conversation history database.
pub fn open_history_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    let conn = open_file(path)?;
    schema::init_history_schema(&conn)?;

    tracing::info!(path = %path.display(), "history database initialized");
    Ok(conn)
}

/// In-memory knowledge database, for tests and throwaway runs.
pub fn open_memory_knowledge_database(dimensions: usize) -> Result<Connection> {
    load_sqlite_vec();
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    schema::init_knowledge_schema(&conn)?;
    meta::ensure_embedding_dimensions(&conn, dimensions)?;
    schema::init_vector_table(&conn, dimensions)?;
    Ok(conn)
}

pub fn open_memory_history_database() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    schema::init_history_schema(&conn)?;
    Ok(conn)
}

/// Snapshot of both databases, used by `lore doctor`.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub schema_version: u32,
    pub sqlite_vec_version: String,
    pub embedding_model: Option<String>,
    pub embedding_dimensions: Option<usize>,
    pub chunk_count: i64,
    pub vector_count: i64,
    pub session_count: i64,
    pub message_count: i64,
    pub knowledge_integrity: String,
    pub history_integrity: String,
}

impl HealthReport {
    /// Every chunk has a vector and both integrity checks passed.
    pub fn is_healthy(&self) -> bool {
        self.chunk_count == self.vector_count
            && self.knowledge_integrity == "ok"
            && self.history_integrity == "ok"
    }
}

fn count(conn: &Connection, table: &str) -> rusqlite::Result<i64> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
}

fn integrity(conn: &Connection) -> rusqlite::Result<String> {
    conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))
}

pub fn check_database_health(knowledge: &Connection, history: &Connection) -> Result<HealthReport> {
    let sqlite_vec_version: String =
        knowledge.query_row("SELECT vec_version()", [], |row| row.get(0))?;

    Ok(HealthReport {
        schema_version: meta::get_schema_version(knowledge)?,
        sqlite_vec_version,
        embedding_model: meta::get_embedding_model(knowledge)?,
        embedding_dimensions: meta::get_embedding_dimensions(knowledge)?,
        chunk_count: count(knowledge, "chunks")?,
        vector_count: count(knowledge, "chunks_vec")?,
        session_count: count(history, "sessions")?,
        message_count: count(history, "messages")?,
        knowledge_integrity: integrity(knowledge)?,
        history_integrity: integrity(history)?,
    })
}
