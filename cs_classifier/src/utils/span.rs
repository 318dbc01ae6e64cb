//! Source location tracking
//!
//! Spans are plain byte ranges into the analysed text. Line and column
//! information is derived on demand through [`SourceMap`].
use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved position in source text with line, column, and byte offset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Position {
    /// Byte offset from start of input (0-based)
    pub offset: usize,
    /// Line number (1-based)
    pub line: u32,
    /// Column number (1-based, counted in characters)
    pub column: u32,
}

impl Position {
    pub fn new(offset: usize, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// The starting position (offset 0, line 1, column 1)
    pub fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open byte range `[start, end)` of source text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Span {
    /// Start offset (inclusive)
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "Span start must not be after end");
        Self { start, end }
    }

    /// Create a span from a start offset and a length
    pub fn with_len(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    /// Create an empty span at an offset
    pub fn empty(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Merge two spans into one covering both
    pub fn merge(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span contains an offset
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Check if this span fully contains another span
    pub fn contains_span(&self, other: &Span) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Check if the two spans share at least one byte
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Intersection test that also accepts empty spans touching the range
    pub fn intersects(&self, other: &Span) -> bool {
        if self.is_empty() || other.is_empty() {
            return self.start <= other.end && other.start <= self.end;
        }
        self.overlaps(other)
    }

    /// Shift the span by a signed delta
    pub fn shifted(self, delta: isize) -> Self {
        Self {
            start: (self.start as isize + delta) as usize,
            end: (self.end as isize + delta) as usize,
        }
    }

    /// Get the source text for this span from the input
    pub fn slice<'a>(&self, input: &'a str) -> &'a str {
        input.get(self.start..self.end).unwrap_or("")
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A value with its source location
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }

    /// Map the value while preserving the span
    pub fn map<U, F>(self, f: F) -> Spanned<U>
    where
        F: FnOnce(T) -> U,
    {
        Spanned {
            value: f(self.value),
            span: self.span,
        }
    }

    pub fn as_ref(&self) -> Spanned<&T> {
        Spanned {
            value: &self.value,
            span: self.span,
        }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: fmt::Display> fmt::Display for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// A source map that tracks line starts for position lookup
#[derive(Debug, Clone)]
pub struct SourceMap {
    pub source: String,
    /// Byte offsets of line starts
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: String) -> Self {
        let line_starts = line_starts(&source);
        Self {
            source,
            line_starts,
        }
    }

    /// Number of lines in the source (a trailing newline opens a new line)
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Offset at which a 1-based line starts
    pub fn line_start(&self, line_num: u32) -> Option<usize> {
        if line_num == 0 {
            return None;
        }
        self.line_starts.get((line_num - 1) as usize).copied()
    }

    /// Get the line and column for a byte offset
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        let line = self
            .line_starts
            .binary_search(&offset)
            .unwrap_or_else(|i| i - 1);

        let line_start = self.line_starts[line];
        let column = self
            .source
            .get(line_start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(0);

        Position::new(offset, (line + 1) as u32, (column + 1) as u32)
    }

    /// Get a line of text by line number (1-based), without its line break
    pub fn get_line(&self, line_num: u32) -> Option<&str> {
        let start = self.line_start(line_num)?;
        let end = self
            .line_starts
            .get(line_num as usize)
            .copied()
            .unwrap_or(self.source.len());

        Some(
            self.source[start..end]
                .trim_end_matches('\n')
                .trim_end_matches('\r'),
        )
    }

}

/// Compute the byte offsets at which each line starts.
/// `\r\n`, `\n`, `\r`, U+2028 and U+2029 all terminate lines.
pub fn line_starts(source: &str) -> Vec<usize> {
    let mut starts = vec![0];
    let bytes = source.as_bytes();
    let mut chars = source.char_indices().peekable();
    while let Some((offset, ch)) = chars.next() {
        match ch {
            '\r' => {
                if bytes.get(offset + 1) == Some(&b'\n') {
                    chars.next();
                    starts.push(offset + 2);
                } else {
                    starts.push(offset + 1);
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' | '\u{85}' => starts.push(offset + ch.len_utf8()),
            _ => {}
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge_and_overlap() {
        let a = Span::new(2, 5);
        let b = Span::new(4, 9);
        assert_eq!(a.merge(b), Span::new(2, 9));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&Span::new(5, 6)));
        assert!(Span::new(0, 10).contains_span(&a));
    }

    #[test]
    fn test_empty_span_intersects_boundary() {
        let range = Span::new(3, 3);
        assert!(range.intersects(&Span::new(0, 3)));
        assert!(!Span::new(4, 6).intersects(&range));
    }

    #[test]
    fn test_position_lookup_handles_crlf() {
        let map = SourceMap::new("ab\r\ncd\nef".to_string());
        assert_eq!(map.line_count(), 3);
        assert_eq!(map.position_at(4), Position::new(4, 2, 1));
        assert_eq!(map.position_at(8), Position::new(8, 3, 2));
        assert_eq!(map.get_line(1), Some("ab"));
    }

    #[test]
    fn test_shifted() {
        assert_eq!(Span::new(10, 12).shifted(-4), Span::new(6, 8));
        assert_eq!(Span::new(1, 2).shifted(3), Span::new(4, 5));
    }
}
