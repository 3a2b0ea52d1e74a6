//! Persisted knowledge chunks and their vectors.
//!
//! [`KnowledgeStore`] owns `(id, text, vector, metadata)` tuples. Text and
//! vector always change together, and every write runs in one transaction, so
//! a failed call leaves the store as it was. Embeddings are computed before
//! the transaction opens: a gateway failure aborts the call with nothing
//! written.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use tracing::{debug, info, warn};

use super::embedding_to_bytes;
use super::types::{
    strip_nulls, KnowledgeChunk, Metadata, MetadataValue, RawMetadata, SearchHit, StoreStats,
};
use crate::db::{self, meta};
use crate::embedding::EmbeddingProvider;
use crate::error::{LoreError, Result};

/// Metadata key grouping the chunks of one ingested document.
pub const DOCUMENT_ID_KEY: &str = "document_id";

/// Largest `k` sqlite-vec accepts in a vec0 KNN query.
pub const MAX_KNN_K: usize = 4096;

/// One document rewrite for [`KnowledgeStore::replace_document`].
///
/// `update_*` slices are parallel, as are `append_*`.
#[derive(Debug, Clone, Copy)]
pub struct DocumentRewrite<'a> {
    pub update_ids: &'a [String],
    pub update_texts: &'a [String],
    pub update_metadatas: &'a [RawMetadata],
    pub delete_ids: &'a [String],
    pub append_texts: &'a [String],
    pub append_metadatas: &'a [RawMetadata],
}

pub struct KnowledgeStore {
    conn: Connection,
    embedder: Arc<dyn EmbeddingProvider>,
    llm_model: String,
}

/// Raw row as stored; metadata still JSON text.
struct ChunkRow {
    id: String,
    content: String,
    metadata: String,
    created_at: String,
    updated_at: String,
}

impl ChunkRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            content: row.get(1)?,
            metadata: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    fn into_chunk(self) -> Result<KnowledgeChunk> {
        Ok(KnowledgeChunk {
            id: self.id,
            text: self.content,
            metadata: serde_json::from_str(&self.metadata)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl KnowledgeStore {
    /// Open (or create) the knowledge database at `path`.
    pub fn open(
        path: impl AsRef<Path>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm_model: &str,
    ) -> Result<Self> {
        let conn = db::open_knowledge_database(path, embedder.dimensions())?;
        Self::new(conn, embedder, llm_model)
    }

    /// Wrap an already-initialized knowledge connection.
    pub fn new(
        conn: Connection,
        embedder: Arc<dyn EmbeddingProvider>,
        llm_model: &str,
    ) -> Result<Self> {
        match meta::get_embedding_model(&conn)? {
            None => meta::set_embedding_model(&conn, embedder.model_name())?,
            Some(stored) if stored != embedder.model_name() => {
                warn!(
                    stored = %stored,
                    configured = %embedder.model_name(),
                    "embedding model changed since vectors were written; run `lore re-embed`"
                );
            }
            Some(_) => {}
        }

        Ok(Self {
            conn,
            embedder,
            llm_model: llm_model.to_string(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn embedding_model(&self) -> &str {
        self.embedder.model_name()
    }

    /// Embed and persist each text under a fresh id. Returns ids in input order.
    pub fn add(&mut self, texts: &[String], metadatas: &[RawMetadata]) -> Result<Vec<String>> {
        if texts.len() != metadatas.len() {
            return Err(LoreError::validation(format!(
                "add needs one metadata map per text ({} texts, {} metadatas)",
                texts.len(),
                metadatas.len()
            )));
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        ensure_non_empty(texts)?;

        let vectors = self.embed_all(texts)?;
        let now = db::timestamp_now();

        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(texts.len());
        for ((text, raw), vector) in texts.iter().zip(metadatas).zip(&vectors) {
            ids.push(insert_new(&tx, text, raw, vector, &now)?);
        }
        tx.commit()?;

        info!(count = ids.len(), "added knowledge chunks");
        Ok(ids)
    }

    /// The `k` nearest chunks to `query` by cosine distance, nearest first.
    ///
    /// With a filter, only chunks whose metadata equals every filter entry
    /// are ranked.
    pub fn search(&self, query: &str, k: usize, filter: Option<&Metadata>) -> Result<Vec<SearchHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed(query)?;
        self.check_dimensions(&vector)?;

        let rows = match filter {
            Some(filter) if !filter.is_empty() => self.filtered_search(&vector, k, filter)?,
            _ => self.knn_search(&vector, k)?,
        };

        let hits = rows
            .into_iter()
            .map(|(id, content, metadata, distance)| -> Result<SearchHit> {
                Ok(SearchHit {
                    id,
                    text: content,
                    metadata: serde_json::from_str(&metadata)?,
                    distance,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(k, returned = hits.len(), "knowledge search");
        Ok(hits)
    }

    /// vec0 KNN. `k` is capped at [`MAX_KNN_K`].
    fn knn_search(&self, vector: &[f32], k: usize) -> Result<Vec<(String, String, String, f64)>> {
        let k = k.min(MAX_KNN_K);
        let mut stmt = self.conn.prepare(
            "WITH knn AS (
                 SELECT id, distance FROM chunks_vec
                 WHERE embedding MATCH ?1
                 ORDER BY distance
                 LIMIT ?2
             )
             SELECT c.id, c.content, c.metadata, knn.distance
             FROM knn JOIN chunks c ON c.id = knn.id
             ORDER BY knn.distance",
        )?;
        let rows = stmt
            .query_map(params![embedding_to_bytes(vector), to_i64(k)], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Exact scan over the chunks matching `filter`. vec0 KNN cannot filter on
    /// JSON metadata, so distances are computed directly.
    fn filtered_search(
        &self,
        vector: &[f32],
        k: usize,
        filter: &Metadata,
    ) -> Result<Vec<(String, String, String, f64)>> {
        let mut values: Vec<Value> = vec![Value::Blob(embedding_to_bytes(vector).to_vec())];
        let mut conditions = Vec::with_capacity(filter.len());
        for (key, value) in filter {
            values.push(Value::Text(json_path(key)?));
            values.push(value.to_sql_value());
            conditions.push(format!(
                "json_extract(c.metadata, ?{}) = ?{}",
                values.len() - 1,
                values.len()
            ));
        }
        values.push(Value::Integer(to_i64(k)));

        let sql = format!(
            "SELECT c.id, c.content, c.metadata, vec_distance_cosine(v.embedding, ?1) AS distance
             FROM chunks c JOIN chunks_vec v ON v.id = c.id
             WHERE {}
             ORDER BY distance
             LIMIT ?{}",
            conditions.join(" AND "),
            values.len()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Replace text, vector and metadata at existing ids.
    ///
    /// The ids are kept. Metadata gains `updated=true` and a fresh `timestamp`.
    /// Every id must exist.
    pub fn update(&mut self, ids: &[String], texts: &[String], metadatas: &[RawMetadata]) -> Result<()> {
        self.check_update_args(ids, texts, metadatas)?;
        if ids.is_empty() {
            return Ok(());
        }

        let vectors = self.embed_all(texts)?;
        let now = db::timestamp_now();

        let tx = self.conn.transaction()?;
        for (((id, text), raw), vector) in ids.iter().zip(texts).zip(metadatas).zip(&vectors) {
            rewrite_existing(&tx, id, text, raw, vector, &now)?;
        }
        tx.commit()?;

        info!(count = ids.len(), "updated knowledge chunks");
        Ok(())
    }

    /// Rewrite a document in one transaction: update `rewrite.update_ids` in
    /// place, delete `rewrite.delete_ids`, and add `rewrite.append_texts` under
    /// fresh ids. Returns the appended ids.
    ///
    /// Every text is embedded before anything is written, so any failure
    /// leaves the document exactly as it was.
    pub fn replace_document(&mut self, rewrite: &DocumentRewrite<'_>) -> Result<Vec<String>> {
        self.check_update_args(
            rewrite.update_ids,
            rewrite.update_texts,
            rewrite.update_metadatas,
        )?;
        if rewrite.append_texts.len() != rewrite.append_metadatas.len() {
            return Err(LoreError::validation(format!(
                "append needs one metadata map per text ({} texts, {} metadatas)",
                rewrite.append_texts.len(),
                rewrite.append_metadatas.len()
            )));
        }
        ensure_non_empty(rewrite.append_texts)?;
        if let Some(id) = rewrite
            .delete_ids
            .iter()
            .find(|id| rewrite.update_ids.contains(id))
        {
            return Err(LoreError::validation(format!(
                "chunk {id} cannot be both updated and deleted"
            )));
        }

        let all_texts: Vec<String> = rewrite
            .update_texts
            .iter()
            .chain(rewrite.append_texts)
            .cloned()
            .collect();
        let vectors = self.embed_all(&all_texts)?;
        let (update_vectors, append_vectors) = vectors.split_at(rewrite.update_texts.len());
        let now = db::timestamp_now();

        let tx = self.conn.transaction()?;
        for (((id, text), raw), vector) in rewrite
            .update_ids
            .iter()
            .zip(rewrite.update_texts)
            .zip(rewrite.update_metadatas)
            .zip(update_vectors)
        {
            rewrite_existing(&tx, id, text, raw, vector, &now)?;
        }
        let mut deleted = 0;
        for id in rewrite.delete_ids {
            deleted += delete_row(&tx, id)?;
        }
        let mut appended = Vec::with_capacity(rewrite.append_texts.len());
        for ((text, raw), vector) in rewrite
            .append_texts
            .iter()
            .zip(rewrite.append_metadatas)
            .zip(append_vectors)
        {
            appended.push(insert_new(&tx, text, raw, vector, &now)?);
        }
        tx.commit()?;

        info!(
            updated = rewrite.update_ids.len(),
            deleted,
            appended = appended.len(),
            "rewrote knowledge document"
        );
        Ok(appended)
    }

    /// Counts must match, texts must be non-blank and every id must exist.
    fn check_update_args(
        &self,
        ids: &[String],
        texts: &[String],
        metadatas: &[RawMetadata],
    ) -> Result<()> {
        if ids.len() != texts.len() || ids.len() != metadatas.len() {
            return Err(LoreError::validation(format!(
                "update needs equal counts (ids {}, texts {}, metadatas {})",
                ids.len(),
                texts.len(),
                metadatas.len()
            )));
        }
        ensure_non_empty(texts)?;

        let existing = self.existing_ids(ids)?;
        if let Some(missing) = ids.iter().find(|id| !existing.contains(id.as_str())) {
            return Err(LoreError::validation(format!("no knowledge chunk with id {missing}")));
        }
        Ok(())
    }

    /// Remove chunks by id. Unknown ids are ignored. Returns how many were removed.
    pub fn delete(&mut self, ids: &[String]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut deleted = 0;
        for id in ids {
            deleted += delete_row(&tx, id)?;
        }
        tx.commit()?;

        info!(requested = ids.len(), deleted, "deleted knowledge chunks");
        Ok(deleted)
    }

    /// Fetch chunks in the order requested. Unknown ids are skipped.
    pub fn get_by_ids(&self, ids: &[String]) -> Result<Vec<KnowledgeChunk>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, content, metadata, created_at, updated_at FROM chunks WHERE id = ?1",
        )?;
        let mut chunks = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(row) = stmt.query_row(params![id], ChunkRow::from_row).optional()? {
                chunks.push(row.into_chunk()?);
            }
        }
        Ok(chunks)
    }

    /// Ids of every chunk in the same document as `chunk_id`, by `chunk_index`.
    ///
    /// A chunk stored without a document id is its own group. Unknown ids give
    /// an empty list.
    pub fn document_chunk_ids(&self, chunk_id: &str) -> Result<Vec<String>> {
        let document: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT document_id FROM chunks WHERE id = ?1",
                params![chunk_id],
                |row| row.get(0),
            )
            .optional()?;

        let document_id = match document {
            None => return Ok(Vec::new()),
            Some(None) => return Ok(vec![chunk_id.to_string()]),
            Some(Some(document_id)) => document_id,
        };

        let mut stmt = self.conn.prepare(
            "SELECT id FROM chunks WHERE document_id = ?1
             ORDER BY CAST(json_extract(metadata, '$.chunk_index') AS INTEGER), created_at, id",
        )?;
        let ids = stmt
            .query_map(params![document_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }

    /// Oldest chunks first, up to `limit`.
    pub fn list(&self, limit: usize) -> Result<Vec<KnowledgeChunk>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, content, metadata, created_at, updated_at FROM chunks
             ORDER BY created_at, id LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![to_i64(limit)], ChunkRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(ChunkRow::into_chunk).collect()
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            total_documents: self.count()?,
            embedding_model: self.embedder.model_name().to_string(),
            llm_model: self.llm_model.clone(),
        })
    }

    /// Remove every chunk. Returns how many there were.
    pub fn reset(&mut self) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM chunks", [])?;
        tx.execute("DELETE FROM chunks_vec", [])?;
        tx.commit()?;

        info!(deleted, "knowledge store reset");
        Ok(deleted)
    }

    /// Recompute every vector with the current embedding model.
    ///
    /// All embeddings are computed before anything is written. `progress` is
    /// called after each chunk with `(done, total)`.
    pub fn re_embed_all(&mut self, mut progress: impl FnMut(usize, usize)) -> Result<usize> {
        let rows: Vec<(String, String)> = {
            let mut stmt = self.conn.prepare("SELECT id, content FROM chunks ORDER BY id")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        let total = rows.len();
        let mut vectors = Vec::with_capacity(total);
        for (i, (_, content)) in rows.iter().enumerate() {
            let vector = self.embedder.embed(content)?;
            self.check_dimensions(&vector)?;
            vectors.push(vector);
            progress(i + 1, total);
        }

        let tx = self.conn.transaction()?;
        for ((id, _), vector) in rows.iter().zip(&vectors) {
            tx.execute("DELETE FROM chunks_vec WHERE id = ?1", params![id])?;
            insert_vec(&tx, id, vector)?;
        }
        meta::set_embedding_model(&tx, self.embedder.model_name())?;
        tx.commit()?;

        info!(count = total, model = %self.embedder.model_name(), "re-embedded knowledge");
        Ok(total)
    }

    fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let vectors = self.embedder.embed_batch(&refs)?;
        for vector in &vectors {
            self.check_dimensions(vector)?;
        }
        Ok(vectors)
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        let expected = self.embedder.dimensions();
        if vector.len() != expected {
            return Err(LoreError::validation(format!(
                "embedding has {} dimensions, store expects {expected}",
                vector.len()
            )));
        }
        Ok(())
    }

    fn existing_ids(&self, ids: &[String]) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT 1 FROM chunks WHERE id = ?1")?;
        let mut found = HashSet::new();
        for id in ids {
            if stmt.exists(params![id])? {
                found.insert(id.clone());
            }
        }
        Ok(found)
    }
}

fn ensure_non_empty(texts: &[String]) -> Result<()> {
    if let Some(pos) = texts.iter().position(|t| t.trim().is_empty()) {
        return Err(LoreError::validation(format!("text at position {pos} is empty")));
    }
    Ok(())
}

fn document_id_of(metadata: &Metadata) -> Option<String> {
    metadata
        .get(DOCUMENT_ID_KEY)
        .and_then(MetadataValue::as_str)
        .map(str::to_string)
}

fn insert_chunk(
    tx: &Transaction,
    id: &str,
    text: &str,
    metadata: &Metadata,
    now: &str,
) -> Result<()> {
    tx.execute(
        "INSERT INTO chunks (id, document_id, content, metadata, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![id, document_id_of(metadata), text, serde_json::to_string(metadata)?, now],
    )?;
    Ok(())
}

/// Insert a chunk under a fresh id, stamping `timestamp`.
fn insert_new(
    tx: &Transaction,
    text: &str,
    raw: &RawMetadata,
    vector: &[f32],
    now: &str,
) -> Result<String> {
    let id = uuid::Uuid::now_v7().to_string();
    let mut metadata = strip_nulls(raw);
    metadata.insert("timestamp".into(), now.into());

    insert_chunk(tx, &id, text, &metadata, now)?;
    insert_vec(tx, &id, vector)?;
    Ok(id)
}

/// Replace text, metadata and vector of an existing chunk, keeping its id.
fn rewrite_existing(
    tx: &Transaction,
    id: &str,
    text: &str,
    raw: &RawMetadata,
    vector: &[f32],
    now: &str,
) -> Result<()> {
    let mut metadata = strip_nulls(raw);
    metadata.insert("updated".into(), true.into());
    metadata.insert("timestamp".into(), now.into());

    tx.execute(
        "UPDATE chunks
         SET content = ?2, metadata = ?3, updated_at = ?4,
             document_id = COALESCE(?5, document_id)
         WHERE id = ?1",
        params![
            id,
            text,
            serde_json::to_string(&metadata)?,
            now,
            document_id_of(&metadata)
        ],
    )?;
    tx.execute("DELETE FROM chunks_vec WHERE id = ?1", params![id])?;
    insert_vec(tx, id, vector)
}

fn delete_row(tx: &Transaction, id: &str) -> Result<usize> {
    let deleted = tx.execute("DELETE FROM chunks WHERE id = ?1", params![id])?;
    tx.execute("DELETE FROM chunks_vec WHERE id = ?1", params![id])?;
    Ok(deleted)
}

fn insert_vec(tx: &Transaction, id: &str, vector: &[f32]) -> Result<()> {
    tx.execute(
        "INSERT INTO chunks_vec (id, embedding) VALUES (?1, ?2)",
        params![id, embedding_to_bytes(vector)],
    )?;
    Ok(())
}

/// JSON path for a top-level key. Keys are quoted so dots and spaces are literal.
fn json_path(key: &str) -> Result<String> {
    if key.is_empty() || key.contains('"') {
        return Err(LoreError::validation(format!("invalid metadata filter key: {key:?}")));
    }
    Ok(format!("$.\"{key}\""))
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;

    /// Maps a few known words to fixed directions so rankings are predictable.
    struct AxisEmbedding;

    impl EmbeddingProvider for AxisEmbedding {
        fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, GatewayError> {
            let mut v = vec![0.05f32; 4];
            for word in text.split_whitespace() {
                match word {
                    "rent" => v[0] += 1.0,
                    "cat" => v[1] += 1.0,
                    "coffee" => v[2] += 1.0,
                    _ => v[3] += 0.1,
                }
            }
            Ok(v)
        }

        fn model_name(&self) -> &str {
            "axis"
        }

        fn dimensions(&self) -> usize {
            4
        }
    }

    fn store() -> KnowledgeStore {
        let conn = db::open_memory_knowledge_database(4).unwrap();
        KnowledgeStore::new(conn, Arc::new(AxisEmbedding), "llm").unwrap()
    }

    fn meta(pairs: &[(&str, MetadataValue)]) -> RawMetadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Some(v.clone())))
            .collect()
    }

    #[test]
    fn add_stamps_timestamp_and_strips_nulls() {
        let mut store = store();
        let mut raw = meta(&[("source", "cli".into())]);
        raw.insert("author".into(), None);

        let ids = store.add(&["rent is due".into()], &[raw]).unwrap();
        let chunk = &store.get_by_ids(&ids).unwrap()[0];

        assert_eq!(chunk.metadata["source"].as_str(), Some("cli"));
        assert!(chunk.metadata.contains_key("timestamp"));
        assert!(!chunk.metadata.contains_key("author"));
    }

    #[test]
    fn search_ranks_nearest_first() {
        let mut store = store();
        store
            .add(
                &["my cat sleeps".into(), "rent rent".into()],
                &[RawMetadata::new(), RawMetadata::new()],
            )
            .unwrap();

        let hits = store.search("rent", 2, None).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "rent rent");
        assert!(hits[0].distance < hits[1].distance);
    }

    #[test]
    fn filter_restricts_candidates() {
        let mut store = store();
        store
            .add(
                &["rent notes".into(), "rent again".into()],
                &[
                    meta(&[("source", "voice".into())]),
                    meta(&[("source", "cli".into())]),
                ],
            )
            .unwrap();

        let mut filter = Metadata::new();
        filter.insert("source".into(), "cli".into());
        let hits = store.search("rent", 5, Some(&filter)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "rent again");
    }

    #[test]
    fn update_with_mismatched_lengths_is_rejected() {
        let mut store = store();
        let ids = store.add(&["cat".into()], &[RawMetadata::new()]).unwrap();
        let err = store
            .update(&ids, &["a".into(), "b".into()], &[RawMetadata::new()])
            .unwrap_err();
        assert!(matches!(err, LoreError::Validation(_)));
    }

    #[test]
    fn update_unknown_id_is_rejected() {
        let mut store = store();
        let err = store
            .update(&["nope".into()], &["cat".into()], &[RawMetadata::new()])
            .unwrap_err();
        assert!(matches!(err, LoreError::Validation(_)));
    }

    #[test]
    fn empty_text_is_rejected() {
        let mut store = store();
        let err = store.add(&["  ".into()], &[RawMetadata::new()]).unwrap_err();
        assert!(matches!(err, LoreError::Validation(_)));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn document_grouping_orders_by_chunk_index() {
        let mut store = store();
        let second = store
            .add(
                &["coffee two".into()],
                &[meta(&[("document_id", "d1".into()), ("chunk_index", 1usize.into())])],
            )
            .unwrap();
        let first = store
            .add(
                &["coffee one".into()],
                &[meta(&[("document_id", "d1".into()), ("chunk_index", 0usize.into())])],
            )
            .unwrap();
        let loose = store.add(&["cat".into()], &[RawMetadata::new()]).unwrap();

        let group = store.document_chunk_ids(&second[0]).unwrap();
        assert_eq!(group, vec![first[0].clone(), second[0].clone()]);
        assert_eq!(store.document_chunk_ids(&loose[0]).unwrap(), loose);
        assert!(store.document_chunk_ids("missing").unwrap().is_empty());
    }

    #[test]
    fn invalid_filter_key_is_rejected() {
        let store = store();
        let mut filter = Metadata::new();
        filter.insert("bad\"key".into(), "x".into());
        assert!(matches!(
            store.search("cat", 1, Some(&filter)),
            Err(LoreError::Validation(_))
        ));
    }
}
