//! Add-or-update orchestration for incoming knowledge.
//!
//! New input is classified first. Plain additions are chunked and stored
//! under a fresh document id. Updates are merged into the best-matching
//! stored document, whose chunks are then rewritten in place:
//!
//! 1. `n = min(new_chunks, old_ids)`; the first `n` old ids receive the first
//!    `n` new chunks, keeping their ids.
//! 2. Old ids beyond `n` are deleted (the document shrank).
//! 3. New chunks beyond `n` are dropped or appended under fresh ids,
//!    depending on [`OverflowPolicy`].
//!
//! All three steps commit together through
//! [`KnowledgeStore::replace_document`]; a failed rewrite leaves the old
//! document untouched.
//!
//! Classifier and merger failures degrade to "add as new" and "keep
//! original". Store failures propagate.

use serde::Serialize;
use tracing::{debug, info};

use super::intent::{IntentClassifier, UpdateIntent};
use super::merge::KnowledgeMerger;
use crate::config::OverflowPolicy;
use crate::error::{LoreError, Result};
use crate::knowledge::store::DOCUMENT_ID_KEY;
use crate::knowledge::{
    Chunker, DocumentRewrite, KnowledgeStore, MetadataValue, RawMetadata, SearchHit,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestAction {
    Added,
    Updated,
}

/// Audit trail of one ingest decision.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestDetails {
    pub intent: Option<UpdateIntent>,
    /// Hits considered as the update target, nearest first.
    pub related: Vec<SearchHit>,
    pub merged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_text: Option<String>,
    /// Old chunk ids removed because the merged document is shorter.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deleted_ids: Vec<String>,
    /// Merged chunks that did not fit the old ids and were not stored.
    #[serde(skip_serializing_if = "is_zero")]
    pub dropped_chunks: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub action: IngestAction,
    /// Ids actually written by this call.
    pub doc_ids: Vec<String>,
    pub details: IngestDetails,
}

pub struct IngestionPipeline {
    chunker: Chunker,
    classifier: IntentClassifier,
    merger: KnowledgeMerger,
    related_k: usize,
    overflow: OverflowPolicy,
}

impl IngestionPipeline {
    pub fn new(
        chunker: Chunker,
        classifier: IntentClassifier,
        merger: KnowledgeMerger,
        related_k: usize,
        overflow: OverflowPolicy,
    ) -> Self {
        Self {
            chunker,
            classifier,
            merger,
            related_k,
            overflow,
        }
    }

    /// Chunk and store `text` as a new document, without intent detection.
    pub fn add(
        &self,
        store: &mut KnowledgeStore,
        text: &str,
        source: &str,
        metadata: &RawMetadata,
    ) -> Result<Vec<String>> {
        let chunks = self.chunker.chunk(text)?;
        if chunks.is_empty() {
            return Err(LoreError::validation("nothing to add: text is blank"));
        }

        let document_id = uuid::Uuid::now_v7().to_string();
        let total = chunks.len();
        let metadatas: Vec<RawMetadata> = (0..total)
            .map(|i| {
                chunk_metadata(metadata, source, &document_id, i, total, text.chars().count())
            })
            .collect();

        let ids = store.add(&chunks, &metadatas)?;
        info!(document_id = %document_id, chunks = ids.len(), source, "knowledge added");
        Ok(ids)
    }

    /// Add `text`, or merge it into existing knowledge when it reads as an update.
    pub fn ingest(
        &self,
        store: &mut KnowledgeStore,
        text: &str,
        source: &str,
        metadata: &RawMetadata,
    ) -> Result<IngestOutcome> {
        if text.trim().is_empty() {
            return Err(LoreError::validation("nothing to add: text is blank"));
        }

        let intent = self.classifier.classify(text);
        let mut details = IngestDetails {
            intent: Some(intent.clone()),
            ..IngestDetails::default()
        };

        if !intent.is_update {
            let doc_ids = self.add(store, text, source, metadata)?;
            return Ok(IngestOutcome {
                action: IngestAction::Added,
                doc_ids,
                details,
            });
        }

        let related = store.search(text, self.related_k, None)?;
        let Some(top) = related.first().cloned() else {
            debug!(topic = %intent.topic, "update intent without related knowledge; adding");
            let doc_ids = self.add(store, text, source, metadata)?;
            return Ok(IngestOutcome {
                action: IngestAction::Added,
                doc_ids,
                details,
            });
        };
        details.related = related;

        let mut old_ids = store.document_chunk_ids(&top.id)?;
        if old_ids.is_empty() {
            old_ids.push(top.id.clone());
        }
        let document_id = top
            .metadata
            .get(DOCUMENT_ID_KEY)
            .and_then(MetadataValue::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| top.id.clone());

        let merged_text = self.merger.merge(&top.text, text, &intent.topic);
        let new_chunks = self.chunker.chunk(&merged_text)?;
        details.merged = true;
        details.original_text = Some(top.text.clone());
        details.merged_text = Some(merged_text.clone());

        let n = new_chunks.len().min(old_ids.len());
        let overflow = &new_chunks[n..];
        let total = match self.overflow {
            OverflowPolicy::Drop => n,
            OverflowPolicy::Append => new_chunks.len(),
        };
        let text_len = merged_text.chars().count();
        let update_meta = |i: usize| {
            let mut meta = chunk_metadata(metadata, source, &document_id, i, total, text_len);
            meta.insert("is_update".into(), Some(true.into()));
            meta.insert("updated_topic".into(), Some(intent.topic.clone().into()));
            meta
        };

        let updated_ids = old_ids[..n].to_vec();
        let updated_meta: Vec<RawMetadata> = (0..n).map(&update_meta).collect();
        let surplus = old_ids[n..].to_vec();
        let (append_texts, append_meta): (&[String], Vec<RawMetadata>) = match self.overflow {
            OverflowPolicy::Drop => {
                details.dropped_chunks = overflow.len();
                (&[], Vec::new())
            }
            OverflowPolicy::Append => (overflow, (n..new_chunks.len()).map(&update_meta).collect()),
        };

        let appended = store.replace_document(&DocumentRewrite {
            update_ids: &updated_ids,
            update_texts: &new_chunks[..n],
            update_metadatas: &updated_meta,
            delete_ids: &surplus,
            append_texts,
            append_metadatas: &append_meta,
        })?;
        details.deleted_ids = surplus;

        let mut doc_ids = updated_ids;
        doc_ids.extend(appended);

        info!(
            document_id = %document_id,
            topic = %intent.topic,
            written = doc_ids.len(),
            deleted = details.deleted_ids.len(),
            dropped = details.dropped_chunks,
            "knowledge updated"
        );
        Ok(IngestOutcome {
            action: IngestAction::Updated,
            doc_ids,
            details,
        })
    }
}

fn chunk_metadata(
    base: &RawMetadata,
    source: &str,
    document_id: &str,
    chunk_index: usize,
    total_chunks: usize,
    original_text_length: usize,
) -> RawMetadata {
    let mut meta = base.clone();
    meta.insert("source".into(), Some(source.into()));
    meta.insert("chunk_index".into(), Some(chunk_index.into()));
    meta.insert("total_chunks".into(), Some(total_chunks.into()));
    meta.insert("original_text_length".into(), Some(original_text_length.into()));
    meta.insert(DOCUMENT_ID_KEY.into(), Some(document_id.into()));
    meta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_metadata_overrides_caller_keys() {
        let mut base = RawMetadata::new();
        base.insert("source".into(), Some("caller".into()));
        base.insert("mood".into(), Some("calm".into()));

        let meta = chunk_metadata(&base, "voice", "doc", 2, 3, 40);
        assert_eq!(meta["source"], Some(MetadataValue::from("voice")));
        assert_eq!(meta["mood"], Some(MetadataValue::from("calm")));
        assert_eq!(meta["chunk_index"], Some(MetadataValue::Int(2)));
        assert_eq!(meta["total_chunks"], Some(MetadataValue::Int(3)));
        assert_eq!(meta[DOCUMENT_ID_KEY], Some(MetadataValue::from("doc")));
    }

    #[test]
    fn outcome_serializes_lowercase_action() {
        let outcome = IngestOutcome {
            action: IngestAction::Updated,
            doc_ids: vec!["a".into()],
            details: IngestDetails::default(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["action"], "updated");
        assert!(json["details"].get("deleted_ids").is_none());
    }
}
