use std::collections::VecDeque;

/// Separator cascade tried in order; the empty string falls back to a
/// fixed-size window over characters.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// One split piece with its character offset into the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPiece {
    pub text: String,
    pub start_offset: usize,
}

/// Recursive size-bounded splitter. Text is split on the coarsest
/// separator that keeps pieces under `chunk_size` characters, then
/// adjacent pieces are merged back into chunks with `chunk_overlap`
/// characters carried between consecutive chunks.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn split(&self, text: &str) -> Vec<SplitPiece> {
        let pieces = self.decompose(text, 0, &SEPARATORS);
        self.merge(pieces)
    }

    fn decompose(&self, text: &str, base: usize, separators: &[&str]) -> Vec<SplitPiece> {
        if text.is_empty() {
            return Vec::new();
        }
        if text.chars().count() <= self.chunk_size {
            return vec![SplitPiece {
                text: text.to_string(),
                start_offset: base,
            }];
        }

        let Some((sep, rest)) = separators.split_first() else {
            return self.hard_split(text, base);
        };
        if sep.is_empty() {
            return self.hard_split(text, base);
        }
        if !text.contains(sep) {
            return self.decompose(text, base, rest);
        }

        let mut pieces = Vec::new();
        let mut offset = base;
        for segment in split_keeping_separator(text, sep) {
            let segment_chars = segment.chars().count();
            if segment_chars <= self.chunk_size {
                pieces.push(SplitPiece {
                    text: segment.to_string(),
                    start_offset: offset,
                });
            } else {
                pieces.extend(self.decompose(segment, offset, rest));
            }
            offset += segment_chars;
        }
        pieces
    }

    /// Sliding character window for text with no usable separator.
    fn hard_split(&self, text: &str, base: usize) -> Vec<SplitPiece> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut pieces = Vec::new();
        if total == 0 {
            return pieces;
        }

        let step = self.chunk_size.saturating_sub(self.chunk_overlap).max(1);
        let mut start = 0;
        while start < total {
            let end = (start + self.chunk_size).min(total);
            pieces.push(SplitPiece {
                text: chars[start..end].iter().collect(),
                start_offset: base + start,
            });
            if end == total {
                break;
            }
            start += step;
        }
        pieces
    }

    /// Greedily packs pieces into chunks up to `chunk_size`, re-seeding
    /// each new chunk with the trailing pieces of the previous one until
    /// the carried text drops to `chunk_overlap` characters.
    fn merge(&self, pieces: Vec<SplitPiece>) -> Vec<SplitPiece> {
        let mut chunks = Vec::new();
        let mut current: VecDeque<(SplitPiece, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = piece.text.chars().count();
            if !current.is_empty() && total + len > self.chunk_size {
                if let Some(chunk) = assemble(&current) {
                    chunks.push(chunk);
                }
                while total > self.chunk_overlap
                    || (total + len > self.chunk_size && total > 0)
                {
                    match current.pop_front() {
                        Some((_, dropped_len)) => total -= dropped_len,
                        None => break,
                    }
                }
            }
            total += len;
            current.push_back((piece, len));
        }

        if let Some(chunk) = assemble(&current) {
            chunks.push(chunk);
        }
        chunks
    }
}

fn split_keeping_separator<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut cursor = 0;
    for (idx, _) in text.match_indices(sep) {
        let end = idx + sep.len();
        parts.push(&text[cursor..end]);
        cursor = end;
    }
    if cursor < text.len() {
        parts.push(&text[cursor..]);
    }
    parts
}

fn assemble(parts: &VecDeque<(SplitPiece, usize)>) -> Option<SplitPiece> {
    let first_start = parts.front()?.0.start_offset;
    let text: String = parts.iter().map(|(p, _)| p.text.as_str()).collect();

    let leading = text.chars().take_while(|c| c.is_whitespace()).count();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    Some(SplitPiece {
        text: trimmed.to_string(),
        start_offset: first_start + leading,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars_at(text: &str, start: usize, len: usize) -> String {
        text.chars().skip(start).take(len).collect()
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let splitter = TextSplitter::new(100, 20);
        let pieces = splitter.split("hello world");

        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].text, "hello world");
        assert_eq!(pieces[0].start_offset, 0);
    }

    #[test]
    fn paragraphs_split_at_blank_lines() {
        let text = "First paragraph.\n\nSecond paragraph.";
        let splitter = TextSplitter::new(20, 5);
        let pieces = splitter.split(text);

        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].text, "First paragraph.");
        assert_eq!(pieces[0].start_offset, 0);
        assert_eq!(pieces[1].text, "Second paragraph.");
        assert_eq!(pieces[1].start_offset, 18);
    }

    #[test]
    fn chunks_respect_the_size_bound() {
        let text = "The warranty period is five years. ".repeat(30);
        let splitter = TextSplitter::new(80, 20);
        let pieces = splitter.split(&text);

        assert!(pieces.len() > 1);
        for piece in &pieces {
            assert!(piece.text.chars().count() <= 80);
        }
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let text = "alpha beta gamma delta epsilon zeta theta kappa lambda sigma omega";
        let splitter = TextSplitter::new(30, 12);
        let pieces = splitter.split(text);

        assert!(pieces.len() > 1);
        for pair in pieces.windows(2) {
            let prev_end = pair[0].start_offset + pair[0].text.chars().count();
            assert!(pair[1].start_offset < prev_end);
        }
    }

    #[test]
    fn unbroken_text_hard_splits_with_fixed_step() {
        let text: String = (0..260)
            .map(|i| char::from_digit((i % 10) as u32, 10).unwrap())
            .collect();
        let splitter = TextSplitter::new(100, 20);
        let pieces = splitter.split(&text);

        let offsets: Vec<usize> = pieces.iter().map(|p| p.start_offset).collect();
        assert_eq!(offsets, vec![0, 80, 160]);
        for piece in &pieces {
            assert_eq!(piece.text.chars().count(), 100);
        }
    }

    #[test]
    fn blank_text_yields_no_chunks() {
        let splitter = TextSplitter::new(100, 20);
        assert!(splitter.split("").is_empty());
        assert!(splitter.split("  \n\n   ").is_empty());
    }

    #[test]
    fn offsets_locate_chunk_text_in_the_source() {
        let text = "Invoice total: $452.10.\nDue in 30 days.\n\nLate fees accrue monthly. \
                    Contact billing for questions about the statement or payment terms."
            .to_string();
        let splitter = TextSplitter::new(40, 10);
        let pieces = splitter.split(&text);

        assert!(!pieces.is_empty());
        for piece in &pieces {
            let len = piece.text.chars().count();
            assert_eq!(chars_at(&text, piece.start_offset, len), piece.text);
        }
    }

    #[test]
    fn offsets_are_character_based_for_multibyte_text() {
        let text = "héllo wörld. ".repeat(12);
        let splitter = TextSplitter::new(40, 10);
        let pieces = splitter.split(&text);

        assert!(pieces.len() > 1);
        for piece in &pieces {
            let len = piece.text.chars().count();
            assert_eq!(chars_at(&text, piece.start_offset, len), piece.text);
        }
    }
}
