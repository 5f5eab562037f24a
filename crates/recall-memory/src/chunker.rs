// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Line-oriented text chunking with character overlap.
//!
//! The token budget is approximated at four characters per token. Input is
//! accumulated line by line; when the next line would overflow the budget,
//! the accumulator is emitted and the next chunk is seeded with the tail of
//! the emitted one. Lengths are counted in Unicode scalar values.

use crate::types::ChunkOptions;

/// Characters per approximate token.
const CHARS_PER_TOKEN: usize = 4;

/// Lower bound on the chunk size in characters.
const MIN_CHUNK_CHARS: usize = 32;

/// A contiguous piece of the input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// First input line (1-based) covered by the chunk.
    pub start_line: usize,
    /// Last input line (1-based, inclusive) covered by the chunk.
    pub end_line: usize,
}

/// Accumulator for the chunk being built.
struct Pending {
    text: String,
    chars: usize,
    /// `(char offset, line number)` for every line that starts in `text`.
    line_starts: Vec<(usize, usize)>,
    end_line: usize,
}

impl Pending {
    fn new() -> Self {
        Self {
            text: String::new(),
            chars: 0,
            line_starts: Vec::new(),
            end_line: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.line_starts.is_empty()
    }

    fn push_line(&mut self, line: &str, line_no: usize) {
        if !self.is_empty() {
            self.text.push('\n');
            self.chars += 1;
        }
        self.line_starts.push((self.chars, line_no));
        self.text.push_str(line);
        self.chars += line.chars().count();
        self.end_line = line_no;
    }

    fn start_line(&self) -> usize {
        self.line_starts.first().map_or(0, |&(_, line)| line)
    }

    /// The last `overlap` characters and the line they begin on.
    fn tail(&self, overlap: usize) -> Option<(String, usize)> {
        if overlap == 0 || self.chars == 0 {
            return None;
        }
        let skip = self.chars.saturating_sub(overlap);
        let tail: String = self.text.chars().skip(skip).collect();
        let line = self
            .line_starts
            .iter()
            .rev()
            .find(|&&(offset, _)| offset <= skip)
            .map_or(self.start_line(), |&(_, line)| line);
        Some((tail, line))
    }

    fn into_chunk(self) -> Option<Chunk> {
        if self.text.trim().is_empty() {
            return None;
        }
        Some(Chunk {
            start_line: self.start_line(),
            end_line: self.end_line,
            text: self.text,
        })
    }
}

/// Split `text` into ordered, overlapping chunks.
///
/// A single line longer than the budget is kept whole. Whitespace-only
/// input produces no chunks.
pub fn chunk_text(text: &str, options: ChunkOptions) -> Vec<Chunk> {
    let max_chars = (options.tokens * CHARS_PER_TOKEN).max(MIN_CHUNK_CHARS);
    let overlap_chars = options.overlap * CHARS_PER_TOKEN;

    let mut chunks = Vec::new();
    let mut pending = Pending::new();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line_chars = line.chars().count();

        if !pending.is_empty() && pending.chars + 1 + line_chars > max_chars {
            let tail = pending.tail(overlap_chars);
            let flushed = std::mem::replace(&mut pending, Pending::new());
            chunks.extend(flushed.into_chunk());
            if let Some((tail, tail_line)) = tail {
                pending.text = tail;
                pending.chars = pending.text.chars().count();
                pending.line_starts.push((0, tail_line));
                pending.end_line = tail_line;
            }
        }

        pending.push_line(line, line_no);
    }

    chunks.extend(pending.into_chunk());
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn opts(tokens: usize, overlap: usize) -> ChunkOptions {
        ChunkOptions { tokens, overlap }
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_text("", ChunkOptions::default()).is_empty());
        assert!(chunk_text("  \n \n", ChunkOptions::default()).is_empty());
    }

    #[test]
    fn short_text_is_one_chunk_spanning_all_lines() {
        let text = "first line\nsecond line\nthird line";
        let chunks = chunk_text(text, opts(256, 32));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 3);
    }

    #[test]
    fn next_chunk_starts_with_overlap_tail() {
        let text: String = (0..60)
            .map(|i| format!("line {i:02} of the sample text"))
            .collect::<Vec<_>>()
            .join("\n");
        assert!(text.chars().count() >= 1500);

        let chunks = chunk_text(&text, opts(64, 8));
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].text.chars().collect();
            let tail: String = prev[prev.len() - 32..].iter().collect();
            assert!(
                pair[1].text.starts_with(&tail),
                "chunk {:?} should start with {tail:?}",
                pair[1].text
            );
        }
    }

    #[test]
    fn chunks_respect_budget_except_oversized_lines() {
        let text = "a".repeat(40) + "\n" + &"b".repeat(40) + "\n" + &"c".repeat(40);
        let chunks = chunk_text(&text, opts(8, 0));
        // 32-char budget: every 40-char line stands alone.
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].text, "b".repeat(40));
        assert_eq!((chunks[1].start_line, chunks[1].end_line), (2, 2));
    }

    #[test]
    fn oversized_single_line_is_kept_whole() {
        let line = "x".repeat(5000);
        let chunks = chunk_text(&line, opts(16, 2));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text.len(), 5000);
    }

    #[test]
    fn overlap_never_splits_code_points() {
        let text = (0..40)
            .map(|_| "记忆检索系统支持中文")
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = chunk_text(&text, opts(16, 3));
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() > 0);
        }
        let first: Vec<char> = chunks[0].text.chars().collect();
        let tail: String = first[first.len() - 12..].iter().collect();
        assert!(chunks[1].text.starts_with(&tail));
    }

    #[test]
    fn line_numbers_are_monotonic() {
        let text = (1..=100).map(|i| format!("entry number {i}")).collect::<Vec<_>>().join("\n");
        let chunks = chunk_text(&text, opts(32, 4));
        assert_eq!(chunks.first().unwrap().start_line, 1);
        assert_eq!(chunks.last().unwrap().end_line, 100);
        for pair in chunks.windows(2) {
            assert!(pair[0].start_line <= pair[1].start_line);
            assert!(pair[0].end_line <= pair[1].end_line);
        }
    }

    proptest! {
        #[test]
        fn chunking_is_deterministic(
            lines in proptest::collection::vec("[a-z ]{0,80}", 0..40),
            tokens in 1usize..64,
            overlap in 0usize..8,
        ) {
            let text = lines.join("\n");
            let first = chunk_text(&text, opts(tokens, overlap));
            let second = chunk_text(&text, opts(tokens, overlap));
            prop_assert_eq!(first, second);
        }

        #[test]
        fn every_line_is_covered(
            lines in proptest::collection::vec("[a-z]{1,30}", 1..40),
            tokens in 1usize..32,
        ) {
            let text = lines.join("\n");
            let chunks = chunk_text(&text, opts(tokens, 0));
            let joined: Vec<String> = chunks
                .iter()
                .flat_map(|c| c.text.lines().map(str::to_string).collect::<Vec<_>>())
                .collect();
            prop_assert_eq!(joined, lines);
        }
    }
}
