//! `schema_meta` bookkeeping: schema version, embedding model and vector width.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{LoreError, Result};

fn get_value(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = ?1",
        [key],
        |row| row.get::<_, String>(0),
    )
    .optional()
}

fn set_value(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_meta (key, value) VALUES (?1, ?2)",
        [key, value],
    )?;
    Ok(())
}

/// Get the current schema version from the database.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    Ok(get_value(conn, "schema_version")?
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(0))
}

/// Get the embedding model the stored vectors were produced with, if recorded.
pub fn get_embedding_model(conn: &Connection) -> rusqlite::Result<Option<String>> {
    get_value(conn, "embedding_model")
}

pub fn set_embedding_model(conn: &Connection, model: &str) -> rusqlite::Result<()> {
    set_value(conn, "embedding_model", model)
}

pub fn get_embedding_dimensions(conn: &Connection) -> rusqlite::Result<Option<usize>> {
    Ok(get_value(conn, "embedding_dimensions")?.and_then(|v| v.parse().ok()))
}

/// Record the vector width on first open, and refuse to reopen with another width.
pub fn ensure_embedding_dimensions(conn: &Connection, dimensions: usize) -> Result<()> {
    match get_embedding_dimensions(conn)? {
        Some(stored) if stored != dimensions => Err(LoreError::validation(format!(
            "knowledge database stores {stored}-dimensional vectors but {dimensions} are configured"
        ))),
        Some(_) => Ok(()),
        None => {
            set_value(conn, "embedding_dimensions", &dimensions.to_string())?;
            Ok(())
        }
    }
}
