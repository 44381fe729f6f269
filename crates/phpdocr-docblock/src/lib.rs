//! phpdocr-docblock: PHPDoc synthesis and merge engine
//!
//! Given PHP source, this crate finds every documentable declaration,
//! derives its parameters, return type, thrown exceptions and settings
//! usages from the code, merges them with whatever an author already wrote
//! above the declaration, and returns line edits that bring each docblock
//! up to date.
//!
//! ```ignore
//! use phpdocr_docblock::{document, GeneratorOptions, NoDescriptions};
//!
//! let updated = document(source, &GeneratorOptions::default(), &NoDescriptions)?;
//! ```

pub mod block;
pub mod builder;
pub mod extract;
pub mod lookup;
pub mod merge;
pub mod model;
pub mod parser;
pub mod return_type;
pub mod settings;
pub mod throws;

use std::panic::{catch_unwind, AssertUnwindSafe};

use bumpalo::Bump;
use mago_database::file::FileId;
use phpdocr_core::{apply_edits, Edit, EditError};
use thiserror::Error;
use tracing::warn;

pub use block::{BlockKind, DocumentableBlock, Parameter};
pub use builder::{merge as merge_docblock, render_docblock, RenderTarget};
pub use lookup::{NoDescriptions, SettingsLookup};
pub use merge::find_existing_docblock;
pub use model::{DerivedFields, DocblockModel, OtherTag, ParamDoc, SettingsUsage};
pub use parser::{parse_docblock, parse_docblock_text};
pub use return_type::{collapse_mixed, infer_return_type, ReturnKind};
pub use settings::SettingsScanner;

use merge::MergeContext;

/// Errors for configuration-level failures.
///
/// Anomalies in the PHP being documented never produce an error.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("invalid settings function name '{0}': expected a PHP identifier")]
    InvalidSettingsFunction(String),

    #[error("failed to apply docblock edits: {0}")]
    Edit(#[from] EditError),
}

/// Knobs for docblock generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Names of the configuration-fetch calls scanned for settings usages
    pub settings_functions: Vec<String>,
    /// Add `@var` docblocks above undocumented class properties
    pub document_properties: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            settings_functions: vec!["getSetting".to_string()],
            document_properties: true,
        }
    }
}

impl GeneratorOptions {
    /// Check that every settings function is a plain PHP identifier
    pub fn validate(&self) -> Result<(), GenerateError> {
        for name in &self.settings_functions {
            let mut chars = name.chars();
            let valid = chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(GenerateError::InvalidSettingsFunction(name.clone()));
            }
        }
        Ok(())
    }

    fn scanner(&self) -> SettingsScanner {
        SettingsScanner::new(&self.settings_functions)
    }
}

/// Parse `source` and extract its documentable blocks.
///
/// A parser failure is tolerated: it is logged and yields no blocks.
pub fn extract_source_blocks(source: &str) -> Vec<DocumentableBlock> {
    let result = catch_unwind(AssertUnwindSafe(|| {
        let arena = Bump::new();
        let file_id = FileId::new("input.php");
        let program = mago_syntax::parser::parse_file_content(&arena, file_id, source);
        extract::extract_blocks(program, source)
    }));

    match result {
        Ok(blocks) => blocks,
        Err(_) => {
            warn!("PHP parser panicked; nothing to document");
            Vec::new()
        }
    }
}

/// Compute the edits that document every block in `source`.
///
/// Edits are returned in descending line order and are all expressed
/// against the unmodified `source`.
pub fn generate(
    source: &str,
    options: &GeneratorOptions,
    lookup: &dyn SettingsLookup,
) -> Result<Vec<Edit>, GenerateError> {
    options.validate()?;
    let blocks = extract_source_blocks(source);
    let scanner = options.scanner();
    let ctx = MergeContext::new(source, &scanner, lookup, options.document_properties);
    Ok(ctx.plan_all(&blocks))
}

/// Compute the edits for the innermost block at zero-based `line`.
///
/// A line inside a block's existing docblock counts as part of the block.
/// For class-likes, undocumented properties are included as well.
pub fn generate_for_line(
    source: &str,
    line: usize,
    options: &GeneratorOptions,
    lookup: &dyn SettingsLookup,
) -> Result<Vec<Edit>, GenerateError> {
    options.validate()?;
    let blocks = extract_source_blocks(source);
    let scanner = options.scanner();
    let ctx = MergeContext::new(source, &scanner, lookup, options.document_properties);

    let Some(block) = innermost_block(&blocks, &ctx.lines, line) else {
        return Ok(Vec::new());
    };

    let mut targets = vec![block];
    if block.kind.is_class_like() {
        targets.extend(
            block
                .children
                .iter()
                .filter(|child| child.kind == BlockKind::Property),
        );
    }
    Ok(ctx.plan(targets))
}

/// Generate and apply all edits, returning the documented source
pub fn document(
    source: &str,
    options: &GeneratorOptions,
    lookup: &dyn SettingsLookup,
) -> Result<String, GenerateError> {
    let edits = generate(source, options, lookup)?;
    Ok(apply_edits(source, &edits)?)
}

fn innermost_block<'b>(
    blocks: &'b [DocumentableBlock],
    lines: &[&str],
    line: usize,
) -> Option<&'b DocumentableBlock> {
    let covers = |block: &DocumentableBlock| {
        let start = find_existing_docblock(lines, block.start_line)
            .map(|(start, _)| start)
            .unwrap_or(block.start_line);
        start <= line && line <= block.end_line
    };

    let mut best: Option<&DocumentableBlock> = None;
    let mut candidates: &[DocumentableBlock] = blocks;
    while let Some(found) = candidates.iter().find(|block| covers(block)) {
        best = Some(found);
        candidates = &found.children;
    }
    best
}
