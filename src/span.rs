//! Source location tracking.
//!
//! Every token and AST node carries a [`Span`]: byte offsets into the source
//! text plus the cached line/column of the start, which is what diagnostics
//! print. [`LineIndex`] recovers line/column for arbitrary offsets without
//! rescanning the file per lookup.

use serde::{Deserialize, Serialize};

/// Precomputed line-start offsets for O(log n) line/column lookup.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset at which each line begins; `line_starts[0] == 0`.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Build the index in one O(n) pass over the source.
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }
        Self { line_starts }
    }

    /// 1-indexed line and column for a byte offset.
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line = (line_idx + 1) as u32;
        let col = (offset - self.line_starts[line_idx] + 1) as u32;
        (line, col)
    }
}

/// A contiguous region of source text.
///
/// `start`/`end` are byte offsets (end exclusive). The starting line and
/// column are carried along so error reporting never needs the source to
/// format a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the start (inclusive).
    pub start: usize,
    /// Byte offset of the end (exclusive).
    pub end: usize,
    /// 1-indexed line of the start.
    pub start_line: u32,
    /// 1-indexed column of the start.
    pub start_col: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, start_line: u32, start_col: u32) -> Self {
        Self {
            start,
            end,
            start_line,
            start_col,
        }
    }

    /// Span for synthesized nodes that have no source text.
    pub fn dummy() -> Self {
        Self {
            start: 0,
            end: 0,
            start_line: 0,
            start_col: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        let (start_line, start_col) = if self.start <= other.start {
            (self.start_line, self.start_col)
        } else {
            (other.start_line, other.start_col)
        };
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            start_line,
            start_col,
        }
    }

    /// Convert a raw logos span, computing line info from the source.
    pub fn from_logos(span: logos::Span, source: &str) -> Self {
        let (line, col) = line_col(source, span.start);
        Self {
            start: span.start,
            end: span.end,
            start_line: line,
            start_col: col,
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::dummy()
    }
}

/// A value paired with the span it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            node: f(self.node),
            span: self.span,
        }
    }
}

impl<T> std::ops::Deref for Spanned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

/// 1-indexed line and column of a byte offset, by direct scan.
///
/// Used when no [`LineIndex`] is on hand (single lookups during lexing).
pub fn line_col(source: &str, offset: usize) -> (u32, u32) {
    let prefix = &source.as_bytes()[..offset.min(source.len())];
    let mut line = 1u32;
    let mut line_start = 0usize;
    for (i, byte) in prefix.iter().enumerate() {
        if *byte == b'\n' {
            line += 1;
            line_start = i + 1;
        }
    }
    (line, (offset - line_start + 1) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_tracks_newlines() {
        let source = "package main;\npub fn main(none) -> i32 {\n    return 0;\n}";
        assert_eq!(line_col(source, 0), (1, 1)); // 'p' of package
        assert_eq!(line_col(source, 8), (1, 9)); // 'm' of main
        assert_eq!(line_col(source, 14), (2, 1)); // 'p' of pub
        assert_eq!(line_col(source, 46), (3, 5)); // 'r' of return
    }

    #[test]
    fn index_matches_direct_scan() {
        let source = "let x: i32 = 1;\nlet y: i32 = 2;\n";
        let index = LineIndex::new(source);
        for offset in 0..source.len() {
            assert_eq!(index.line_col(offset), line_col(source, offset));
        }
    }

    #[test]
    fn merge_is_order_independent() {
        let a = Span::new(4, 9, 1, 5);
        let b = Span::new(12, 20, 2, 3);
        assert_eq!(a.merge(b), b.merge(a));
        assert_eq!(a.merge(b).start, 4);
        assert_eq!(a.merge(b).end, 20);
        assert_eq!(a.merge(b).start_line, 1);
    }
}
