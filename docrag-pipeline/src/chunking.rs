//! Fixed-size text chunking with overlap.

use docrag_core::{RagError, Result};

/// Splits text into fixed-size character windows with configurable overlap.
///
/// Window boundaries are computed over characters, not bytes, so multi-byte
/// input can never be split inside a code point.
///
/// # Example
///
/// ```rust,ignore
/// use docrag_pipeline::TextChunker;
///
/// let chunker = TextChunker::new(1000, 200)?;
/// let chunks = chunker.split(&page_text);
/// ```
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker producing windows of at most `chunk_size` characters
    /// where consecutive windows share `overlap` characters.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Chunking`] if `chunk_size` is zero or `overlap`
    /// is not strictly smaller than `chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::Chunking {
                message: "chunk_size must be positive".into(),
            });
        }
        if overlap >= chunk_size {
            return Err(RagError::Chunking {
                message: format!(
                    "overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
                ),
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Split one text into ordered chunks. Empty text yields no chunks;
    /// non-empty text yields only non-empty chunks of at most `chunk_size`
    /// characters.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char start plus the end of the text, so
        // windows slice on boundaries.
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());
        let char_count = offsets.len() - 1;

        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < char_count {
            let end = (start + self.chunk_size).min(char_count);
            chunks.push(text[offsets[start]..offsets[end]].to_string());
            start += step;
        }
        chunks
    }

    /// Chunk each page independently and concatenate the outputs in document
    /// order.
    pub fn split_pages(&self, pages: &[String]) -> Vec<String> {
        let mut chunks = Vec::new();
        for page in pages {
            chunks.extend(self.split(page));
        }
        chunks
    }
}
