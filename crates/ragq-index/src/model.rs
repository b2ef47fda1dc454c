/// A loaded document, ready to be persisted into the index artifact.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub id: String,
    pub source_path: String,
    pub text: String,
}

/// A chunk produced from a [`DocumentInput`]. `chunk_id` must follow the
/// `"<doc_id>-<4-digit zero-padded index>"` convention; anything else is a
/// contract violation rejected at write time.
#[derive(Debug, Clone)]
pub struct ChunkInput {
    pub chunk_id: String,
    pub doc_id: String,
    pub text: String,
}

/// A chunk as read back from the index artifact, joined against its parent
/// document's source path.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredChunk {
    pub chunk_id: String,
    pub source_path: String,
    pub text: String,
    pub embedding: Vec<f32>,
}
