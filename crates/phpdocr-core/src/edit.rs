//! Line-addressed source editing

use thiserror::Error;

use crate::lines::{detect_line_ending, LineIndex};

/// Errors that can occur during edit application
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EditError {
    #[error("Overlapping edits detected at line {0}")]
    Overlapping(usize),

    #[error("Edit line {line} out of bounds for document with {count} lines")]
    LineOutOfBounds { line: usize, count: usize },

    #[error("Edit column {column} out of bounds on line {line}")]
    ColumnOutOfBounds { line: usize, column: usize },
}

/// Where an edit lands in the document. Lines are zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    /// Insert text at a position; the text carries its own line terminators.
    Insert { line: usize, column: usize },
    /// Replace the full text of `start_line..=end_line`, excluding the
    /// terminator of the last line.
    Replace { start_line: usize, end_line: usize },
}

/// Represents a single code edit operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub target: EditTarget,
    /// The inserted or replacement text
    pub replacement: String,
    /// Human-readable description of the edit
    pub message: String,
}

impl Edit {
    /// Insert `text` at `line`/`column`
    pub fn insert(
        line: usize,
        column: usize,
        text: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            target: EditTarget::Insert { line, column },
            replacement: text.into(),
            message: message.into(),
        }
    }

    /// Replace the inclusive line range `start_line..=end_line` with `text`
    pub fn replace(
        start_line: usize,
        end_line: usize,
        text: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            target: EditTarget::Replace {
                start_line,
                end_line,
            },
            replacement: text.into(),
            message: message.into(),
        }
    }

    /// First line touched by this edit
    pub fn start_line(&self) -> usize {
        match self.target {
            EditTarget::Insert { line, .. } => line,
            EditTarget::Replace { start_line, .. } => start_line,
        }
    }

    /// Last line touched by this edit
    pub fn end_line(&self) -> usize {
        match self.target {
            EditTarget::Insert { line, .. } => line,
            EditTarget::Replace { end_line, .. } => end_line,
        }
    }

    fn byte_range(&self, index: &LineIndex, source: &str) -> Result<(usize, usize), EditError> {
        let count = index.line_count();
        match self.target {
            EditTarget::Insert { line, column } => {
                if line >= count {
                    return Err(EditError::LineOutOfBounds { line, count });
                }
                let start = index.line_start(line);
                if column > index.line_text(source, line).len() {
                    return Err(EditError::ColumnOutOfBounds { line, column });
                }
                Ok((start + column, start + column))
            }
            EditTarget::Replace {
                start_line,
                end_line,
            } => {
                if end_line >= count || start_line > end_line {
                    return Err(EditError::LineOutOfBounds {
                        line: end_line.max(start_line),
                        count,
                    });
                }
                let start = index.line_start(start_line);
                let end = index.line_start(end_line) + index.line_text(source, end_line).len();
                Ok((start, end))
            }
        }
    }
}

/// Apply edits to source code
///
/// Edits are applied in reverse order (from end to start) so that the line
/// numbers of every edit still refer to the original document. Edits that
/// share a start position keep their relative input order in the output.
pub fn apply_edits(source: &str, edits: &[Edit]) -> Result<String, EditError> {
    if edits.is_empty() {
        return Ok(source.to_string());
    }

    let index = LineIndex::new(source);
    let mut ranged = Vec::with_capacity(edits.len());
    for (position, edit) in edits.iter().enumerate() {
        let (start, end) = edit.byte_range(&index, source)?;
        ranged.push((position, start, end, edit));
    }

    // Sort edits by start position (descending) for safe replacement
    ranged.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));

    let mut prev_start: Option<usize> = None;
    for (_, start, end, edit) in &ranged {
        if let Some(prev) = prev_start {
            if *end > prev {
                return Err(EditError::Overlapping(edit.start_line()));
            }
        }
        prev_start = Some(*start);
    }

    let line_ending = detect_line_ending(source);
    let mut result = source.to_string();
    for (_, start, end, edit) in ranged {
        let replacement = if line_ending == "\n" {
            edit.replacement.clone()
        } else {
            normalize_line_endings(&edit.replacement, line_ending)
        };
        result.replace_range(start..end, &replacement);
    }

    Ok(result)
}

fn normalize_line_endings(text: &str, line_ending: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', line_ending)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_above_line() {
        let source = "<?php\nfunction a() {}\n";
        let edit = Edit::insert(1, 0, "/**\n * function a\n */\n", "Add docblock");

        let result = apply_edits(source, &[edit]).unwrap();
        assert_eq!(result, "<?php\n/**\n * function a\n */\nfunction a() {}\n");
    }

    #[test]
    fn test_replace_line_range() {
        let source = "<?php\n/**\n * old\n */\nfunction a() {}";
        let edit = Edit::replace(1, 3, "/**\n * new\n */", "Update docblock");

        let result = apply_edits(source, &[edit]).unwrap();
        assert_eq!(result, "<?php\n/**\n * new\n */\nfunction a() {}");
    }

    #[test]
    fn test_multiple_edits_use_original_lines() {
        let source = "<?php\nfunction a() {}\nfunction b() {}\n";
        let edits = vec![
            Edit::insert(1, 0, "// a\n", "first"),
            Edit::insert(2, 0, "// b\n", "second"),
        ];

        let result = apply_edits(source, &edits).unwrap();
        assert_eq!(result, "<?php\n// a\nfunction a() {}\n// b\nfunction b() {}\n");
    }

    #[test]
    fn test_same_position_keeps_input_order() {
        let source = "x\n";
        let edits = vec![
            Edit::insert(0, 0, "1\n", "first"),
            Edit::insert(0, 0, "2\n", "second"),
        ];

        assert_eq!(apply_edits(source, &edits).unwrap(), "1\n2\nx\n");
    }

    #[test]
    fn test_crlf_is_preserved() {
        let source = "<?php\r\nfunction a() {}\r\n";
        let edit = Edit::insert(1, 0, "/**\n */\n", "Add docblock");

        let result = apply_edits(source, &[edit]).unwrap();
        assert_eq!(result, "<?php\r\n/**\r\n */\r\nfunction a() {}\r\n");
    }

    #[test]
    fn test_empty_edits() {
        let source = "unchanged";
        let result = apply_edits(source, &[]).unwrap();
        assert_eq!(result, "unchanged");
    }

    #[test]
    fn test_out_of_bounds() {
        let source = "short";
        let edit = Edit::replace(0, 4, "replacement", "oob");

        let result = apply_edits(source, &[edit]);
        assert!(matches!(result, Err(EditError::LineOutOfBounds { .. })));
    }

    #[test]
    fn test_overlapping_replacements() {
        let source = "a\nb\nc\nd";
        let edits = vec![
            Edit::replace(0, 2, "x", "first"),
            Edit::replace(1, 3, "y", "second"),
        ];

        assert!(matches!(
            apply_edits(source, &edits),
            Err(EditError::Overlapping(_))
        ));
    }
}
