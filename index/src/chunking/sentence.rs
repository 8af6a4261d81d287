//! Sentence-aware splitting with a token budget.

use unicode_segmentation::UnicodeSegmentation;

use crate::error::{IndexError, Result};
use crate::hash::content_hash;
use crate::settings::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::types::{Chunk, Document};

use super::Chunker;

/// Packs whole sentences into chunks of at most `chunk_size` tokens.
///
/// Tokens are whitespace-separated words. Consecutive chunks share up to `chunk_overlap`
/// trailing tokens, and a sentence longer than `chunk_size` is cut on word boundaries.
/// Whitespace inside a chunk is normalized to single spaces.
///
/// # Example
///
/// ```rust
/// use ragshelf_index::chunking::{Chunker, SentenceSplitter};
/// use ragshelf_index::Document;
///
/// let splitter = SentenceSplitter::default();
/// let doc = Document::new("doc1", "First sentence. Second sentence.");
/// let chunks = splitter.chunk(&doc).unwrap();
/// assert_eq!(chunks.len(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl SentenceSplitter {
    /// Creates a splitter.
    ///
    /// # Errors
    /// Returns [`IndexError::Chunking`] if `chunk_size` is zero or `chunk_overlap` is not
    /// smaller than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(IndexError::Chunking("chunk size must be positive".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(IndexError::Chunking(format!(
                "chunk overlap {chunk_overlap} must be smaller than chunk size {chunk_size}"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Maximum tokens per chunk.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Tokens shared between consecutive chunks.
    #[must_use]
    pub const fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Sentences as word lists, with oversized sentences cut to fit.
    fn pieces<'a>(&self, text: &'a str) -> Vec<Vec<&'a str>> {
        let mut pieces = Vec::new();
        for sentence in text.unicode_sentences() {
            let words: Vec<&str> = sentence.split_whitespace().collect();
            pieces.extend(words.chunks(self.chunk_size).map(<[&str]>::to_vec));
        }
        pieces
    }

    fn make_chunk(doc: &Document, index: usize, words: &[&str]) -> Chunk {
        let text = words.join(" ");
        let mut metadata = doc.metadata.clone();
        metadata.insert("token_count".into(), words.len().to_string());
        Chunk::with_metadata(
            Chunk::id_for(&doc.id, index),
            &text,
            &doc.id,
            index,
            content_hash(&text),
            metadata,
        )
    }
}

impl Default for SentenceSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl Chunker for SentenceSplitter {
    fn chunk(&self, doc: &Document) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for piece in self.pieces(&doc.text) {
            if !current.is_empty() && current.len() + piece.len() > self.chunk_size {
                chunks.push(Self::make_chunk(doc, chunks.len(), &current));

                let keep = self.chunk_overlap.min(current.len());
                let carry = current.split_off(current.len() - keep);
                current = if carry.len() + piece.len() > self.chunk_size {
                    Vec::new()
                } else {
                    carry
                };
            }
            current.extend(piece);
        }

        if !current.is_empty() {
            chunks.push(Self::make_chunk(doc, chunks.len(), &current));
        }

        Ok(chunks)
    }

    fn name(&self) -> &'static str {
        "sentence"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn small_text_single_chunk() {
        let doc = Document::new("doc1", "a test document");
        let chunks = SentenceSplitter::default().chunk(&doc).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "doc1#chunk_0");
        assert_eq!(chunks[0].text, "a test document");
        assert_eq!(chunks[0].content_hash, content_hash("a test document"));
    }

    #[test]
    fn empty_text_has_no_chunks() {
        let doc = Document::new("doc1", "  \n\t ");
        assert!(SentenceSplitter::default().chunk(&doc).unwrap().is_empty());
    }

    #[test]
    fn long_sentence_cut_on_words() {
        let splitter = SentenceSplitter::new(512, 0).unwrap();
        let doc = Document::new("doc1", words(1200));
        let chunks = splitter.chunk(&doc).unwrap();

        let counts: Vec<usize> = chunks
            .iter()
            .map(|c| c.text.split_whitespace().count())
            .collect();
        assert_eq!(counts, vec![512, 512, 176]);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.source_id, "doc1");
        }
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let splitter = SentenceSplitter::new(10, 3).unwrap();
        let doc = Document::new(
            "doc1",
            "One two three four five. Six seven eight nine ten. Eleven twelve thirteen fourteen fifteen.",
        );
        let chunks = splitter.chunk(&doc).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "One two three four five. Six seven eight nine ten.");
        assert_eq!(
            chunks[1].text,
            "eight nine ten. Eleven twelve thirteen fourteen fifteen."
        );
    }

    #[test]
    fn chunks_respect_budget() {
        let splitter = SentenceSplitter::new(16, 4).unwrap();
        let text = (0..40)
            .map(|i| format!("Sentence number {i} has a few words."))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = splitter.chunk(&Document::new("d", text)).unwrap();

        assert!(chunks.len() > 1);
        assert!(
            chunks
                .iter()
                .all(|c| c.text.split_whitespace().count() <= 16)
        );
    }

    #[test]
    fn metadata_inherited() {
        let mut doc = Document::new("d", "Hello there.");
        doc.metadata.insert("file_name".into(), "a.txt".into());
        let chunks = SentenceSplitter::default().chunk(&doc).unwrap();
        assert_eq!(chunks[0].metadata["file_name"], "a.txt");
        assert_eq!(chunks[0].metadata["token_count"], "2");
    }

    #[test]
    fn rejects_invalid_budgets() {
        assert!(SentenceSplitter::new(0, 0).is_err());
        assert!(SentenceSplitter::new(8, 8).is_err());
    }

    #[test]
    fn default_settings() {
        let splitter = SentenceSplitter::default();
        assert_eq!(splitter.chunk_size(), 512);
        assert_eq!(splitter.chunk_overlap(), 20);
    }
}
