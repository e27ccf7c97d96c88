//! Text chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`FixedSizeChunker`]: exact character windows with configurable overlap
//! - [`RecursiveChunker`]: prefers paragraph, line, then word boundaries and
//!   falls back to character windows only for oversized runs
//!
//! All sizes are measured in characters, never bytes, so multi-byte text is
//! never cut inside a code point.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::config::{ChunkingStrategy, RagConfig};
use crate::document::ChunkSpan;
use crate::error::{RagError, Result};

/// A strategy for splitting extracted text into chunks.
///
/// Implementations are pure: the same input always yields the same spans.
pub trait Chunker: Send + Sync {
    /// Split text into chunk spans, in document order.
    ///
    /// Returns an empty `Vec` if the text is empty.
    fn chunk(&self, text: &str) -> Vec<ChunkSpan>;
}

/// Build the chunker selected by the configuration.
///
/// # Errors
///
/// Returns [`RagError::ConfigError`] if the chunk sizing is invalid.
pub fn chunker_for(config: &RagConfig) -> Result<Arc<dyn Chunker>> {
    Ok(match config.chunking {
        ChunkingStrategy::Recursive => {
            Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap)?)
        }
        ChunkingStrategy::FixedSize => {
            Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap)?)
        }
    })
}

fn check_sizing(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::ConfigError(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Split `text` into overlapping windows of at most `chunk_size` characters.
///
/// Each window after the first starts `chunk_size - chunk_overlap` characters
/// after the previous one. The returned iterator is lazy and `Clone`, so it
/// can be restarted from the beginning at any time.
///
/// # Errors
///
/// Returns [`RagError::ConfigError`] if `chunk_overlap >= chunk_size`.
pub fn split_windows(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<TextWindows<'_>> {
    check_sizing(chunk_size, chunk_overlap)?;
    Ok(TextWindows::new(text, chunk_size, chunk_size - chunk_overlap))
}

/// One window produced by [`TextWindows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window<'a> {
    /// Character offset of the window start.
    pub start: usize,
    /// The window text.
    pub text: &'a str,
}

/// Lazy iterator over fixed-size character windows of a text.
#[derive(Debug, Clone)]
pub struct TextWindows<'a> {
    text: &'a str,
    size: usize,
    step: usize,
    /// Byte and character offset of the next window, `None` once exhausted.
    next: Option<(usize, usize)>,
}

impl<'a> TextWindows<'a> {
    fn new(text: &'a str, size: usize, step: usize) -> Self {
        let next = if text.is_empty() { None } else { Some((0, 0)) };
        Self { text, size, step, next }
    }
}

/// Byte length of the first `chars` characters of `s` (or all of `s`).
fn byte_len_of_chars(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(i, _)| i)
}

impl<'a> Iterator for TextWindows<'a> {
    type Item = Window<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (start_byte, start_char) = self.next?;
        let rest = &self.text[start_byte..];
        let end_byte = start_byte + byte_len_of_chars(rest, self.size);

        // The window that reaches the end of the text is the last one.
        self.next = if end_byte >= self.text.len() {
            None
        } else {
            Some((start_byte + byte_len_of_chars(rest, self.step), start_char + self.step))
        };

        Some(Window { start: start_char, text: &self.text[start_byte..end_byte] })
    }
}

/// Splits text into fixed-size character windows with configurable overlap.
///
/// Every span except the last is exactly `chunk_size` characters long and
/// consecutive spans share exactly `chunk_overlap` characters.
///
/// # Example
///
/// ```rust,ignore
/// use local_rag::{Chunker, FixedSizeChunker};
///
/// let chunker = FixedSizeChunker::new(256, 50)?;
/// let spans = chunker.chunk(&text);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        check_sizing(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Lazily iterate over the windows of `text`.
    pub fn windows<'a>(&self, text: &'a str) -> TextWindows<'a> {
        TextWindows::new(text, self.chunk_size, self.chunk_size - self.chunk_overlap)
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, text: &str) -> Vec<ChunkSpan> {
        self.windows(text)
            .map(|w| ChunkSpan { text: w.text.to_string(), start: w.start })
            .collect()
    }
}

/// Separators tried in order, coarsest first. The empty separator means
/// "cut at character boundaries".
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text at the coarsest natural boundary that keeps chunks small.
///
/// Text is first split on blank lines. Pieces that fit are greedily merged
/// up to `chunk_size` characters; when a chunk is emitted, a tail of at most
/// `chunk_overlap` characters of whole pieces is carried into the next one.
/// Pieces that are still too long are split again at line breaks, then at
/// spaces, and finally into hard character windows.
///
/// Chunks are trimmed and whitespace-only chunks are dropped, so the overlap
/// here is a soft target rather than an exact count.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        check_sizing(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    fn split_recursive(&self, text: &str, separators: &[&str], out: &mut Vec<String>) {
        let Some(pos) = separators.iter().position(|sep| sep.is_empty() || text.contains(sep))
        else {
            self.split_hard(text, out);
            return;
        };

        let separator = separators[pos];
        if separator.is_empty() {
            self.split_hard(text, out);
            return;
        }
        let remaining = &separators[pos + 1..];

        let mut fitting: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) <= self.chunk_size {
                fitting.push(piece);
            } else {
                if !fitting.is_empty() {
                    self.merge(&fitting, out);
                    fitting.clear();
                }
                self.split_recursive(piece, remaining, out);
            }
        }
        if !fitting.is_empty() {
            self.merge(&fitting, out);
        }
    }

    fn split_hard(&self, text: &str, out: &mut Vec<String>) {
        let windows = TextWindows::new(text, self.chunk_size, self.chunk_size - self.chunk_overlap);
        out.extend(windows.filter_map(|w| non_blank(w.text)));
    }

    /// Greedily merge pieces that each fit into chunks of at most
    /// `chunk_size` characters, carrying an overlap tail between chunks.
    fn merge(&self, pieces: &[&str], out: &mut Vec<String>) {
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !current.is_empty() {
                out.extend(non_blank(&concat(&current)));
                while total > self.chunk_overlap || (total > 0 && total + len > self.chunk_size) {
                    let Some(front) = current.pop_front() else { break };
                    total -= char_len(front);
                }
                while let Some(front) = current.front().filter(|p| p.trim().is_empty()) {
                    total -= char_len(front);
                    current.pop_front();
                }
            }
            // Chunks always begin with a non-blank piece.
            if current.is_empty() && piece.trim().is_empty() {
                continue;
            }
            current.push_back(piece);
            total += len;
        }

        if !current.is_empty() {
            out.extend(non_blank(&concat(&current)));
        }
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, text: &str) -> Vec<ChunkSpan> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut raw = Vec::new();
        self.split_recursive(text, &SEPARATORS, &mut raw);
        locate_spans(text, raw, self.chunk_overlap)
    }
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Attach character offsets to chunks that are ordered substrings of `text`.
///
/// A chunk never starts before the previous chunk's end minus the overlap,
/// which keeps repeated text from matching an earlier occurrence.
fn locate_spans(text: &str, chunks: Vec<String>, chunk_overlap: usize) -> Vec<ChunkSpan> {
    let char_starts: Vec<usize> =
        text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let char_count = char_starts.len() - 1;

    let mut spans: Vec<ChunkSpan> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let from_char = match spans.last() {
            None => 0,
            Some(prev) => {
                let prev_end = prev.start + char_len(&prev.text);
                (prev.start + 1).max(prev_end.saturating_sub(chunk_overlap)).min(char_count)
            }
        };
        let from_byte = char_starts[from_char];
        let start = match text[from_byte..].find(&chunk) {
            Some(i) => char_starts.partition_point(|&b| b < from_byte + i),
            None => from_char,
        };
        spans.push(ChunkSpan { text: chunk, start });
    }

    spans
}

fn concat(pieces: &VecDeque<&str>) -> String {
    pieces.iter().copied().collect()
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
