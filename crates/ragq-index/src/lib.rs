//! File-backed retrieval index artifact: a single sqlite database holding
//! `documents` and `chunks`, rebuilt wholesale on every reindex and swapped
//! in atomically via a temp-file-plus-rename protocol owned by the caller.

mod chunk_id;
mod embedding;
mod error;
mod model;
mod store;

pub use chunk_id::chunk_index;
pub use embedding::{cosine_similarity, decode as decode_embedding, encode as encode_embedding};
pub use error::IndexStoreError;
pub use model::{ChunkInput, DocumentInput, StoredChunk};
pub use store::{load, self_check, write};
