use crate::error::RunnerError;
use ragq_index::{ChunkInput, DocumentInput};

/// Splits `text` into a sliding window of `[cursor, cursor+chunk_size)`
/// advancing by `chunk_size - chunk_overlap`. Each window is stripped; empty
/// windows are dropped.
fn chunk_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let length = chars.len();
    let mut chunks = Vec::new();
    let mut cursor = 0usize;

    while cursor < length {
        let end = (cursor + chunk_size).min(length);
        let window: String = chars[cursor..end].iter().collect();
        let trimmed = window.trim().to_string();
        if !trimmed.is_empty() {
            chunks.push(trimmed);
        }

        if end >= length {
            break;
        }
        cursor = end - chunk_overlap;
    }

    chunks
}

/// Chunks every document, assigning each chunk a `"<doc_id>-<index:04d>"` id.
pub fn chunk_documents(
    documents: &[DocumentInput],
    chunk_size: i64,
    chunk_overlap: i64,
) -> Result<Vec<ChunkInput>, RunnerError> {
    if chunk_size <= 0 {
        return Err(RunnerError::InvalidChunkSize);
    }
    if chunk_overlap < 0 || chunk_overlap >= chunk_size {
        return Err(RunnerError::InvalidChunkOverlap { overlap: chunk_overlap, size: chunk_size });
    }

    let mut result = Vec::new();
    for document in documents {
        let pieces = chunk_text(&document.text, chunk_size as usize, chunk_overlap as usize);
        for (index, text) in pieces.into_iter().enumerate() {
            result.push(ChunkInput {
                chunk_id: format!("{}-{:04}", document.id, index),
                doc_id: document.id.clone(),
                text,
            });
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, text: &str) -> DocumentInput {
        DocumentInput { id: id.to_string(), source_path: format!("{id}.txt"), text: text.to_string() }
    }

    #[test]
    fn rejects_overlap_greater_or_equal_to_size() {
        let docs = vec![doc("d1", "hello world")];
        assert!(matches!(
            chunk_documents(&docs, 10, 10),
            Err(RunnerError::InvalidChunkOverlap { .. })
        ));
    }

    #[test]
    fn rejects_nonpositive_chunk_size() {
        let docs = vec![doc("d1", "hello world")];
        assert!(matches!(chunk_documents(&docs, 0, 0), Err(RunnerError::InvalidChunkSize)));
    }

    #[test]
    fn chunk_ids_follow_doc_id_and_zero_padded_index() {
        let docs = vec![doc("abc123", &"x".repeat(250))];
        let chunks = chunk_documents(&docs, 100, 10).unwrap();
        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].chunk_id, "abc123-0000");
        assert_eq!(chunks[1].chunk_id, "abc123-0001");
    }

    #[test]
    fn sliding_window_covers_whole_document() {
        let text = "a".repeat(1280);
        let docs = vec![doc("doc1", &text)];
        let chunks = chunk_documents(&docs, 120, 20).unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(!chunk.text.is_empty());
        }
    }
}
