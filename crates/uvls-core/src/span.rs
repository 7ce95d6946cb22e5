//! Source locations for scanned tokens.
//!
//! Scanners report positions as byte columns within a line, which makes
//! re-slicing the source text exact. LSP clients count columns in UTF-16
//! code units, so [`LineIndex`] converts spans to [`Range`]s at the protocol
//! boundary.

use serde::{Deserialize, Serialize};
use tower_lsp_server::ls_types::{Position, Range};

/// A `(line, start, end)` locator into a text.
///
/// `line` is 0-based; `start` and `end` are byte offsets within that line
/// (end exclusive), as produced by [`str::lines`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub line: u32,
    pub start: u32,
    pub end: u32,
}

impl SourceSpan {
    pub const fn new(line: u32, start: u32, end: u32) -> Self {
        Self { line, start, end }
    }

    /// Builds a span from `usize` offsets as produced while walking lines.
    pub fn from_offsets(line: usize, start: usize, end: usize) -> Self {
        Self {
            line: line as u32,
            start: start as u32,
            end: end as u32,
        }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Re-extracts the spanned substring from `text`.
    ///
    /// Returns `None` when the span does not fit the text or does not fall on
    /// character boundaries.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.lines()
            .nth(self.line as usize)?
            .get(self.start as usize..self.end as usize)
    }
}

/// Line lookup table for converting [`SourceSpan`]s into LSP ranges.
///
/// # Examples
///
/// ```
/// use uvls_core::{LineIndex, SourceSpan};
///
/// let text = "# é\nflask = \"3.0\"";
/// let index = LineIndex::new(text);
/// assert_eq!(index.line_count(), 2);
/// assert_eq!(index.line(1), Some("flask = \"3.0\""));
///
/// let range = index.range(SourceSpan::new(1, 0, 5));
/// assert_eq!((range.start.character, range.end.character), (0, 5));
/// ```
pub struct LineIndex<'a> {
    lines: Vec<&'a str>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, line: usize) -> Option<&'a str> {
        self.lines.get(line).copied()
    }

    /// Converts a byte-column span into an LSP range (UTF-16 columns).
    ///
    /// Spans that point past the end of the text are passed through unchanged.
    pub fn range(&self, span: SourceSpan) -> Range {
        let Some(line) = self.line(span.line as usize) else {
            return Range::new(
                Position::new(span.line, span.start),
                Position::new(span.line, span.end),
            );
        };

        Range::new(
            Position::new(span.line, utf16_column(line, span.start as usize)),
            Position::new(span.line, utf16_column(line, span.end as usize)),
        )
    }
}

/// Number of UTF-16 code units in `line[..byte_col]`.
fn utf16_column(line: &str, byte_col: usize) -> u32 {
    let byte_col = byte_col.min(line.len());
    line.char_indices()
        .take_while(|(offset, _)| *offset < byte_col)
        .map(|(_, c)| c.len_utf16() as u32)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_roundtrip() {
        let text = "[project]\ndependencies = [\n  \"numpy>=1.20\",\n]\n";
        let span = SourceSpan::new(2, 3, 8);
        assert_eq!(span.slice(text), Some("numpy"));
        assert_eq!(span.len(), 5);
        assert!(!span.is_empty());
    }

    #[test]
    fn test_slice_out_of_bounds() {
        let text = "requests = \"2.31.0\"";
        assert_eq!(SourceSpan::new(3, 0, 2).slice(text), None);
        assert_eq!(SourceSpan::new(0, 10, 99).slice(text), None);
    }

    #[test]
    fn test_slice_handles_crlf() {
        let text = "[dependencies]\r\nflask = \"2.0\"\r\n";
        assert_eq!(SourceSpan::new(1, 0, 5).slice(text), Some("flask"));
    }

    #[test]
    fn test_range_ascii() {
        let text = "[dependencies]\nrequests = \"2.31.0\"";
        let index = LineIndex::new(text);
        let range = index.range(SourceSpan::new(1, 0, 8));
        assert_eq!(range.start, Position::new(1, 0));
        assert_eq!(range.end, Position::new(1, 8));
    }

    #[test]
    fn test_range_counts_utf16_units() {
        // "é" is two bytes in UTF-8 but one UTF-16 unit; "𝄞" is four bytes and two units.
        let text = "é𝄞 = \"x\"";
        let index = LineIndex::new(text);
        let span = SourceSpan::from_offsets(0, 6, 7);
        let range = index.range(span);
        assert_eq!(range.start.character, 3);
        assert_eq!(range.end.character, 4);
    }

    #[test]
    fn test_range_past_end_passthrough() {
        let index = LineIndex::new("");
        let range = index.range(SourceSpan::new(4, 1, 3));
        assert_eq!(range.start, Position::new(4, 1));
        assert_eq!(range.end, Position::new(4, 3));
    }
}
