use crate::error::IndexStoreError;

/// Extracts the zero-padded index out of a `"<doc_id>-<4-digit index>"`
/// chunk id, e.g. `"a1b2c3-0003"` -> `3`.
pub fn chunk_index(chunk_id: &str) -> Result<i64, IndexStoreError> {
    let (_, suffix) = chunk_id
        .rsplit_once('-')
        .ok_or_else(|| IndexStoreError::InvalidChunkId { chunk_id: chunk_id.to_string() })?;

    if suffix.len() != 4 || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IndexStoreError::InvalidChunkId { chunk_id: chunk_id.to_string() });
    }

    suffix
        .parse::<i64>()
        .map_err(|_| IndexStoreError::InvalidChunkId { chunk_id: chunk_id.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_chunk_ids() {
        assert_eq!(chunk_index("abc123-0000").unwrap(), 0);
        assert_eq!(chunk_index("abc123-0042").unwrap(), 42);
    }

    #[test]
    fn rejects_malformed_chunk_ids() {
        assert!(chunk_index("no-dash-here").is_err());
        assert!(chunk_index("abc123-1").is_err());
        assert!(chunk_index("abc123-abcd").is_err());
        assert!(chunk_index("nodash").is_err());
    }
}
