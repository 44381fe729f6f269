//! Byte offset to line number mapping

/// Precomputed start offsets of every line in a source text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                starts.push(i + 1);
            }
        }
        Self { starts }
    }

    /// Number of lines, counting the (possibly empty) text after the last newline
    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Byte offset where `line` begins
    pub fn line_start(&self, line: usize) -> usize {
        self.starts[line]
    }

    /// Zero-based line containing `offset`
    pub fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        }
    }

    /// Text of `line` without its line terminator
    pub fn line_text<'s>(&self, source: &'s str, line: usize) -> &'s str {
        let start = self.starts[line];
        let end = self
            .starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(source.len());
        let text = &source[start..end];
        text.strip_suffix('\r').unwrap_or(text)
    }
}

/// The line terminator used by `source` (`"\r\n"` when any CRLF is present)
pub fn detect_line_ending(source: &str) -> &'static str {
    if source.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_of() {
        let source = "line1\nline2\nline3";
        let index = LineIndex::new(source);
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_of(0), 0);
        assert_eq!(index.line_of(5), 0); // newline
        assert_eq!(index.line_of(6), 1); // start of line2
        assert_eq!(index.line_of(12), 2); // start of line3
    }

    #[test]
    fn test_line_text_strips_terminators() {
        let source = "a\r\nbb\nccc";
        let index = LineIndex::new(source);
        assert_eq!(index.line_text(source, 0), "a");
        assert_eq!(index.line_text(source, 1), "bb");
        assert_eq!(index.line_text(source, 2), "ccc");
    }

    #[test]
    fn test_trailing_newline_adds_empty_line() {
        let source = "a\n";
        let index = LineIndex::new(source);
        assert_eq!(index.line_count(), 2);
        assert_eq!(index.line_text(source, 1), "");
    }

    #[test]
    fn test_detect_line_ending() {
        assert_eq!(detect_line_ending("a\nb"), "\n");
        assert_eq!(detect_line_ending("a\r\nb"), "\r\n");
    }
}
