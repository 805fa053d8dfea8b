use crate::error::IngestError;

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 1_500,
            overlap_chars: 400,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.max_chars == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "max_chars must be greater than zero".to_string(),
            ));
        }
        if self.overlap_chars >= self.max_chars {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap {} must be strictly less than max {}",
                self.overlap_chars, self.max_chars
            )));
        }
        Ok(())
    }
}

/// Splits text into overlapping fixed-size windows, greedy left to right.
///
/// Each chunk spans up to `max_chars` characters; the next chunk starts
/// `max_chars - overlap_chars` characters after the previous one, so
/// consecutive chunks share the trailing `overlap_chars` of the former.
pub fn split_into_chunks(text: &str, config: ChunkingConfig) -> Result<Vec<String>, IngestError> {
    config.validate()?;

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Ok(Vec::new());
    }

    let stride = config.max_chars - config.overlap_chars;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + config.max_chars).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += stride;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::{split_into_chunks, ChunkingConfig};
    use crate::error::IngestError;

    fn config(max_chars: usize, overlap_chars: usize) -> ChunkingConfig {
        ChunkingConfig {
            max_chars,
            overlap_chars,
        }
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunks = split_into_chunks("", config(10, 2)).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn short_text_yields_a_single_chunk() {
        let chunks = split_into_chunks("abc", config(10, 2)).unwrap();
        assert_eq!(chunks, vec!["abc".to_string()]);
    }

    #[test]
    fn adjacent_chunks_share_the_overlap() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = split_into_chunks(text, config(10, 4)).unwrap();

        assert_eq!(chunks[0], "abcdefghij");
        assert_eq!(chunks[1], "ghijklmnop");
        for pair in chunks.windows(2) {
            let tail = &pair[0][pair[0].len() - 4..];
            assert!(pair[1].starts_with(tail));
        }
    }

    #[test]
    fn chunk_count_follows_the_stride() {
        // 26 chars, stride 6: windows start at 0, 6, 12, 18 and the last
        // one reaches the end of the text.
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = split_into_chunks(text, config(10, 4)).unwrap();
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|chunk| chunk.len() <= 10));
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "El asistente responde preguntas sobre documentos PDF.";
        let first = split_into_chunks(text, config(16, 5)).unwrap();
        let second = split_into_chunks(text, config(16, 5)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn overlap_equal_to_max_is_rejected() {
        let result = split_into_chunks("abcdef", config(4, 4));
        assert!(matches!(result, Err(IngestError::InvalidChunkConfig(_))));
    }

    #[test]
    fn overlap_above_max_is_rejected() {
        let result = split_into_chunks("abcdef", config(4, 9));
        assert!(matches!(result, Err(IngestError::InvalidChunkConfig(_))));
    }

    #[test]
    fn zero_max_is_rejected() {
        let result = split_into_chunks("abcdef", config(0, 0));
        assert!(matches!(result, Err(IngestError::InvalidChunkConfig(_))));
    }
}
