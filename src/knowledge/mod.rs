pub mod chunker;
pub mod store;
pub mod types;

pub use chunker::{chunk_text, Chunker};
pub use store::{DocumentRewrite, KnowledgeStore};
pub use types::{KnowledgeChunk, Metadata, MetadataValue, RawMetadata, SearchHit, StoreStats};

/// Convert an f32 embedding slice to raw bytes for sqlite-vec.
pub fn embedding_to_bytes(embedding: &[f32]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            embedding.as_ptr() as *const u8,
            std::mem::size_of_val(embedding),
        )
    }
}
