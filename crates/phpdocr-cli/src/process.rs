//! File processing logic for phpdocr

use anyhow::{Context, Result};
use phpdocr_core::{apply_edits, Edit, EditTarget};
use phpdocr_docblock::{generate, generate_for_line, GeneratorOptions, SettingsLookup};
use std::path::Path;
use tracing::debug;

use crate::output::EditInfo;

/// Result of processing a single file
pub struct ProcessResult {
    /// Edits that were found/applied
    pub edits: Vec<EditInfo>,
    /// Original source code
    pub old_source: String,
    /// New source code after edits (only if edits were found)
    pub new_source: Option<String>,
}

/// Process a single PHP file and return the docblock edits it needs.
///
/// With `line` (zero-based) only the innermost declaration at that line
/// is documented.
pub fn process_file(
    path: &Path,
    options: &GeneratorOptions,
    lookup: &dyn SettingsLookup,
    line: Option<usize>,
) -> Result<ProcessResult> {
    let source_code = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    process_source(source_code, options, lookup, line)
        .with_context(|| format!("Failed to document {}", path.display()))
}

/// Process in-memory source
pub fn process_source(
    source_code: String,
    options: &GeneratorOptions,
    lookup: &dyn SettingsLookup,
    line: Option<usize>,
) -> Result<ProcessResult> {
    let edits = match line {
        Some(line) => generate_for_line(&source_code, line, options, lookup)?,
        None => generate(&source_code, options, lookup)?,
    };
    debug!(edits = edits.len(), "planned docblock edits");

    if edits.is_empty() {
        return Ok(ProcessResult {
            edits: vec![],
            old_source: source_code,
            new_source: None,
        });
    }

    let new_source = apply_edits(&source_code, &edits)?;

    // Report top to bottom
    let mut edit_infos: Vec<EditInfo> = edits.iter().map(edit_info).collect();
    edit_infos.sort_by_key(|info| info.line);

    Ok(ProcessResult {
        edits: edit_infos,
        old_source: source_code,
        new_source: Some(new_source),
    })
}

/// Write the processed result to the file
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write file: {}", path.display()))
}

fn edit_info(edit: &Edit) -> EditInfo {
    let action = match edit.target {
        EditTarget::Insert { .. } => "add",
        EditTarget::Replace { .. } => "update",
    };
    EditInfo {
        action: action.to_string(),
        line: edit.start_line() + 1,
        message: edit.message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phpdocr_docblock::NoDescriptions;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_process_source_reports_one_based_lines() {
        let source = "<?php\n\nfunction a() {}\n".to_string();
        let result =
            process_source(source, &GeneratorOptions::default(), &NoDescriptions, None).unwrap();

        assert_eq!(result.edits.len(), 1);
        assert_eq!(result.edits[0].line, 3);
        assert_eq!(result.edits[0].action, "add");
        assert_eq!(result.edits[0].message, "Add docblock for function a");
        assert!(result.new_source.unwrap().contains("/**\n * function a\n"));
    }

    #[test]
    fn test_process_source_without_changes() {
        let source = "<?php\necho 1;\n".to_string();
        let result =
            process_source(source, &GeneratorOptions::default(), &NoDescriptions, None).unwrap();
        assert!(result.edits.is_empty());
        assert!(result.new_source.is_none());
    }

    #[test]
    fn test_process_file_single_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("two.php");
        fs::write(&path, "<?php\nfunction a() {}\nfunction b() {}\n").unwrap();

        let result =
            process_file(&path, &GeneratorOptions::default(), &NoDescriptions, Some(2)).unwrap();
        assert_eq!(result.edits.len(), 1);
        assert_eq!(result.edits[0].message, "Add docblock for function b");
    }

    #[test]
    fn test_process_file_missing() {
        let temp = TempDir::new().unwrap();
        let result = process_file(
            &temp.path().join("missing.php"),
            &GeneratorOptions::default(),
            &NoDescriptions,
            None,
        );
        assert!(result.is_err());
    }
}
