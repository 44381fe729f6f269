//! Output formatting for phpdocr
//!
//! Supports text (colored terminal), JSON and unified diff output formats.

use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;
use std::path::Path;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Diff,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<OutputFormat> {
        match s.to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "diff" => Some(OutputFormat::Diff),
            _ => None,
        }
    }
}

/// Information about a single docblock edit
#[derive(Debug, Clone, Serialize)]
pub struct EditInfo {
    /// `add` or `update`
    pub action: String,
    /// 1-based line of the declaration or existing docblock
    pub line: usize,
    pub message: String,
}

/// Result of processing a single file
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub edits: Vec<EditInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileResult {
    pub fn success(path: &Path, edits: Vec<EditInfo>) -> Self {
        Self {
            path: path.display().to_string(),
            edits,
            error: None,
        }
    }

    pub fn error(path: &Path, error: String) -> Self {
        Self {
            path: path.display().to_string(),
            edits: Vec::new(),
            error: Some(error),
        }
    }
}

/// Summary statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub files_processed: usize,
    pub files_with_changes: usize,
    pub docblocks_added: usize,
    pub docblocks_updated: usize,
    pub errors: usize,
}

/// Full JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput {
    pub version: String,
    pub summary: Summary,
    pub files: Vec<FileResult>,
}

/// Reporter for accumulating and outputting results
pub struct Reporter {
    format: OutputFormat,
    verbose: bool,
    results: Vec<FileResult>,
    summary: Summary,
}

impl Reporter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self {
            format,
            verbose,
            results: Vec::new(),
            summary: Summary::default(),
        }
    }

    fn count(&mut self, edits: &[EditInfo]) {
        self.summary.files_with_changes += 1;
        for edit in edits {
            if edit.action == "update" {
                self.summary.docblocks_updated += 1;
            } else {
                self.summary.docblocks_added += 1;
            }
        }
    }

    /// Report a file with pending changes (check mode)
    pub fn report_check(
        &mut self,
        path: &Path,
        edits: Vec<EditInfo>,
        old_source: &str,
        new_source: &str,
    ) {
        self.summary.files_processed += 1;
        self.count(&edits);

        match self.format {
            OutputFormat::Text => {
                println!("{}", path.display().to_string().bold());
                print_diff(old_source, new_source);
                println!();
                for edit in &edits {
                    println!("  {} line {}: {}", "->".green(), edit.line, edit.message);
                }
                println!();
            }
            OutputFormat::Diff => {
                print_unified_diff(path, old_source, new_source);
            }
            OutputFormat::Json => {
                // JSON output is handled in finish()
            }
        }

        self.results.push(FileResult::success(path, edits));
    }

    /// Report a file after writing its docblocks
    pub fn report_fix(&mut self, path: &Path, edits: Vec<EditInfo>) {
        self.summary.files_processed += 1;
        self.count(&edits);

        if self.format == OutputFormat::Text {
            println!("{}", path.display().to_string().bold());
            println!("  {} Wrote {} docblock(s)", "OK".green(), edits.len());
            println!();
        }

        self.results.push(FileResult::success(path, edits));
    }

    /// Report a file whose docblocks are already up to date
    pub fn report_skipped(&mut self, path: &Path) {
        self.summary.files_processed += 1;
        if self.verbose && self.format == OutputFormat::Text {
            println!("{}: Docblocks up to date", path.display());
        }
        self.results.push(FileResult::success(path, vec![]));
    }

    /// Report an error processing a file
    pub fn report_error(&mut self, path: &Path, error: &str) {
        self.summary.files_processed += 1;
        self.summary.errors += 1;

        if self.format == OutputFormat::Text {
            eprintln!("{}: {} - {}", "Warning".yellow(), path.display(), error);
        }

        self.results.push(FileResult::error(path, error.to_string()));
    }

    /// Print final summary/output
    pub fn finish(self, check_mode: bool) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                println!("{}", "Summary".bold().underline());
                println!("  Files processed: {}", self.summary.files_processed);
                println!("  Files with changes: {}", self.summary.files_with_changes);
                println!("  Docblocks added: {}", self.summary.docblocks_added);
                println!("  Docblocks updated: {}", self.summary.docblocks_updated);
                if self.summary.errors > 0 {
                    println!("  Errors: {}", self.summary.errors);
                }
                if self.summary.files_with_changes == 0 && self.summary.errors == 0 {
                    println!("  Nothing to document");
                }

                if check_mode && self.summary.files_with_changes > 0 {
                    println!();
                    println!("{}", "Run with --fix to write docblocks".yellow());
                }
            }
            OutputFormat::Json => {
                let output = JsonOutput {
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    summary: self.summary,
                    files: self.results,
                };
                let json = serde_json::to_string_pretty(&output)
                    .context("Failed to serialize JSON output")?;
                println!("{}", json);
            }
            OutputFormat::Diff => {
                // Diffs are printed per file; patch output carries no summary
            }
        }
        Ok(())
    }

    /// Get summary for exit code determination
    pub fn summary(&self) -> &Summary {
        &self.summary
    }
}

/// Print a colored diff between old and new content
fn print_diff(old: &str, new: &str) {
    for diff_result in diff::lines(old, new) {
        match diff_result {
            diff::Result::Left(l) => {
                println!("  {}", format!("- {}", l).red());
            }
            diff::Result::Right(r) => {
                println!("  {}", format!("+ {}", r).green());
            }
            diff::Result::Both(_, _) => {}
        }
    }
}

/// Print unified diff format (standard diff -u compatible)
fn print_unified_diff(path: &Path, old: &str, new: &str) {
    print!("{}", unified_diff(path, old, new));
}

fn unified_diff(path: &Path, old: &str, new: &str) -> String {
    use similar::{ChangeTag, TextDiff};
    use std::fmt::Write;

    let diff = TextDiff::from_lines(old, new);
    let path_str = path.display().to_string();
    let mut out = String::new();

    let _ = writeln!(out, "--- a/{}", path_str);
    let _ = writeln!(out, "+++ b/{}", path_str);

    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        let _ = writeln!(out, "{}", hunk.header());
        for change in hunk.iter_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            let _ = write!(out, "{}{}", sign, change);
            if change.missing_newline() {
                out.push('\n');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("text"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_str("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("diff"), Some(OutputFormat::Diff));
        assert_eq!(OutputFormat::from_str("xml"), None);
    }

    #[test]
    fn test_summary_counts_actions() {
        let mut reporter = Reporter::new(OutputFormat::Json, false);
        let edits = vec![
            EditInfo {
                action: "add".to_string(),
                line: 2,
                message: "Add docblock for function a".to_string(),
            },
            EditInfo {
                action: "update".to_string(),
                line: 9,
                message: "Update docblock for function b".to_string(),
            },
        ];
        reporter.report_fix(Path::new("a.php"), edits);
        reporter.report_skipped(Path::new("b.php"));
        reporter.report_error(Path::new("c.php"), "unreadable");

        let summary = reporter.summary();
        assert_eq!(summary.files_processed, 3);
        assert_eq!(summary.files_with_changes, 1);
        assert_eq!(summary.docblocks_added, 1);
        assert_eq!(summary.docblocks_updated, 1);
        assert_eq!(summary.errors, 1);
    }

    #[test]
    fn test_json_serialization() {
        let output = JsonOutput {
            version: "0.1.0".to_string(),
            summary: Summary {
                files_processed: 2,
                files_with_changes: 1,
                docblocks_added: 1,
                docblocks_updated: 0,
                errors: 0,
            },
            files: vec![
                FileResult::success(
                    Path::new("a.php"),
                    vec![EditInfo {
                        action: "add".to_string(),
                        line: 3,
                        message: "Add docblock for function a".to_string(),
                    }],
                ),
                FileResult::success(Path::new("b.php"), vec![]),
            ],
        };

        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"files_processed\":2"));
        assert!(json.contains("\"action\":\"add\""));
        assert!(json.contains("{\"path\":\"b.php\"}"));
    }

    #[test]
    fn test_unified_diff() {
        let diff = unified_diff(
            Path::new("a.php"),
            "<?php\nfunction a() {}\n",
            "<?php\n/**\n * function a\n */\nfunction a() {}\n",
        );
        assert!(diff.starts_with("--- a/a.php\n+++ b/a.php\n@@"));
        assert!(diff.contains("+/**\n+ * function a\n+ */\n"));
        assert!(diff.contains(" function a() {}\n"));
    }
}
