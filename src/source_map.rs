//! Byte buffer + line index, shared by every other component.

/// A `(line, column)` position. Lines are 1-based, columns 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: i64,
    pub column: usize,
}

impl Position {
    pub const fn file_level() -> Self {
        Position { line: -1, column: 0 }
    }

    pub fn is_file_level(&self) -> bool {
        self.line < 0
    }
}

/// A location within a source file: file-level, point, or range.
///
/// Invariant: `start <= end` lexicographically. A file-level location uses
/// the sentinel line `-1` on both ends and matches the whole file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: String,
    pub start: Position,
    pub end: Position,
}

impl Location {
    pub fn file_level(file: impl Into<String>) -> Self {
        let p = Position::file_level();
        Location { file: file.into(), start: p, end: p }
    }

    pub fn point(file: impl Into<String>, line: i64, column: usize) -> Self {
        let p = Position { line, column };
        Location { file: file.into(), start: p, end: p }
    }

    pub fn range(file: impl Into<String>, start: Position, end: Position) -> Self {
        Location { file: file.into(), start, end }
    }

    pub fn is_file_level(&self) -> bool {
        self.start.is_file_level()
    }
}

/// Precomputed line-start offsets over an immutable source buffer.
///
/// Handles both LF and CRLF line endings transparently: a line's content
/// never includes its trailing newline, regardless of which kind it was.
#[derive(Debug, Clone)]
pub struct SourceMap {
    content: String,
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let mut line_starts = vec![0];
        for (i, b) in content.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        SourceMap { content, line_starts }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Returns the raw content of 0-based line `i`, without its trailing
    /// newline (LF or CRLF).
    pub fn line(&self, i: usize) -> &str {
        let Some(&start) = self.line_starts.get(i) else {
            return "";
        };
        let end = self.line_starts.get(i + 1).copied().unwrap_or(self.content.len());
        let mut raw = &self.content[start..end];
        raw = raw.strip_suffix('\n').unwrap_or(raw);
        raw = raw.strip_suffix('\r').unwrap_or(raw);
        raw
    }

    /// Returns the inclusive multi-line slice between two 0-based lines.
    pub fn snippet(&self, start_line: usize, end_line: usize) -> String {
        (start_line..=end_line)
            .map(|i| self.line(i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Converts a 1-based line / 0-based column position back into a byte
    /// offset. Inverse of `position_for_offset`.
    pub fn offset_for_position(&self, pos: Position) -> usize {
        if pos.line < 1 {
            return 0;
        }
        let line_idx = (pos.line - 1) as usize;
        let Some(&start) = self.line_starts.get(line_idx) else {
            return self.content.len();
        };
        (start + pos.column).min(self.content.len())
    }

    /// Converts a byte offset into a 1-based line / 0-based column position.
    pub fn position_for_offset(&self, offset: usize) -> Position {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts[line_idx];
        Position {
            line: (line_idx + 1) as i64,
            column: offset.saturating_sub(line_start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_lookup_lf() {
        let sm = SourceMap::new("FROM a\nRUN b\n");
        assert_eq!(sm.line(0), "FROM a");
        assert_eq!(sm.line(1), "RUN b");
        assert_eq!(sm.line(2), "");
    }

    #[test]
    fn line_lookup_crlf() {
        let sm = SourceMap::new("FROM a\r\nRUN b\r\n");
        assert_eq!(sm.line(0), "FROM a");
        assert_eq!(sm.line(1), "RUN b");
    }

    #[test]
    fn snippet_multiline() {
        let sm = SourceMap::new("a\nb\nc\n");
        assert_eq!(sm.snippet(0, 2), "a\nb\nc");
    }

    #[test]
    fn offset_to_position() {
        let sm = SourceMap::new("abc\ndef\n");
        assert_eq!(sm.position_for_offset(0).line, 1);
        assert_eq!(sm.position_for_offset(4).line, 2);
        assert_eq!(sm.position_for_offset(4).column, 0);
    }

    #[test]
    fn position_to_offset_round_trips() {
        let sm = SourceMap::new("abc\ndef\n");
        let pos = Position { line: 2, column: 1 };
        let offset = sm.offset_for_position(pos);
        assert_eq!(offset, 5);
        assert_eq!(sm.position_for_offset(offset), pos);
    }
}
