use common::error::AppError;
use text_splitter::{ChunkConfig, TextSplitter};

/// Chunk bounds in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl ChunkSettings {
    /// Per-call overrides falling back to `defaults`.
    pub fn resolve(
        defaults: ChunkSettings,
        chunk_size: Option<usize>,
        chunk_overlap: Option<usize>,
    ) -> Self {
        Self {
            chunk_size: chunk_size.unwrap_or(defaults.chunk_size),
            chunk_overlap: chunk_overlap.unwrap_or(defaults.chunk_overlap),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.chunk_size == 0 {
            return Err(AppError::Validation("chunk_size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Validation(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Splits on paragraph, then sentence, then word boundaries, and drops line breaks
/// from each chunk before it is handed to the model.
pub fn split_into_chunks(text: &str, settings: ChunkSettings) -> Result<Vec<String>, AppError> {
    settings.validate()?;

    let chunk_config = ChunkConfig::new(settings.chunk_size)
        .with_overlap(settings.chunk_overlap)
        .map_err(|e| AppError::Validation(format!("invalid chunk overlap: {e}")))?;
    let splitter = TextSplitter::new(chunk_config);

    Ok(splitter
        .chunks(text)
        .map(|chunk| chunk.replace('\n', ""))
        .filter(|chunk| !chunk.trim().is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_respect_size_and_drop_newlines() {
        let text = "First paragraph sentence one. Sentence two.\n\nSecond paragraph here.\nWith a wrapped line.";
        let chunks = split_into_chunks(
            text,
            ChunkSettings {
                chunk_size: 48,
                chunk_overlap: 8,
            },
        )
        .expect("split");

        assert!(chunks.len() >= 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= 48));
        assert!(chunks.iter().all(|c| !c.contains('\n')));
        assert!(chunks.iter().any(|c| c.contains("Second paragraph")));
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = split_into_chunks(
            "Only one line.",
            ChunkSettings {
                chunk_size: 500,
                chunk_overlap: 50,
            },
        )
        .expect("split");
        assert_eq!(chunks, vec!["Only one line.".to_string()]);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        let chunks = split_into_chunks(
            "  \n\n ",
            ChunkSettings {
                chunk_size: 10,
                chunk_overlap: 0,
            },
        )
        .expect("split");
        assert!(chunks.is_empty());
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let err = split_into_chunks(
            "text",
            ChunkSettings {
                chunk_size: 10,
                chunk_overlap: 10,
            },
        )
        .expect_err("invalid settings");
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn overrides_fall_back_to_defaults() {
        let defaults = ChunkSettings {
            chunk_size: 500,
            chunk_overlap: 50,
        };
        let resolved = ChunkSettings::resolve(defaults, Some(200), None);
        assert_eq!(resolved.chunk_size, 200);
        assert_eq!(resolved.chunk_overlap, 50);
    }
}
