//! Merge orchestrator: decides per block whether to insert or replace a
//! docblock and produces the corresponding line edits

use phpdocr_core::Edit;
use tracing::debug;

use crate::block::{BlockKind, DocumentableBlock};
use crate::builder::{merge, render_docblock, render_property_doc, RenderTarget};
use crate::lookup::SettingsLookup;
use crate::model::DerivedFields;
use crate::parser::parse_docblock;
use crate::settings::SettingsScanner;

/// Locate a docblock directly above `start_line`, skipping blank lines.
///
/// Returns the inclusive line range of the comment.
pub fn find_existing_docblock(lines: &[&str], start_line: usize) -> Option<(usize, usize)> {
    let mut idx = start_line.min(lines.len());
    let end = loop {
        if idx == 0 {
            return None;
        }
        idx -= 1;
        let trimmed = lines[idx].trim();
        if !trimmed.is_empty() {
            break idx;
        }
    };

    let closing = lines[end].trim();
    if !closing.ends_with("*/") {
        return None;
    }
    if closing.starts_with("/**") {
        return Some((end, end));
    }
    if closing.starts_with("/*") {
        return None;
    }

    let mut idx = end;
    while idx > 0 {
        idx -= 1;
        let trimmed = lines[idx].trim();
        if trimmed.starts_with("/**") {
            return Some((idx, end));
        }
        if !trimmed.starts_with('*') {
            return None;
        }
    }
    None
}

/// Shared inputs for planning the edits of one document
pub struct MergeContext<'a> {
    pub source: &'a str,
    pub lines: Vec<&'a str>,
    pub scanner: &'a SettingsScanner,
    pub lookup: &'a dyn SettingsLookup,
    pub document_properties: bool,
}

impl<'a> MergeContext<'a> {
    pub fn new(
        source: &'a str,
        scanner: &'a SettingsScanner,
        lookup: &'a dyn SettingsLookup,
        document_properties: bool,
    ) -> Self {
        Self {
            source,
            lines: source.lines().collect(),
            scanner,
            lookup,
            document_properties,
        }
    }

    /// Plan edits for every block in `roots` and all of their descendants
    pub fn plan_all(&self, roots: &[DocumentableBlock]) -> Vec<Edit> {
        let targets: Vec<&DocumentableBlock> =
            roots.iter().flat_map(|root| root.descendants()).collect();
        self.plan(targets)
    }

    /// Plan edits for the given targets.
    ///
    /// Targets are processed in descending start-line order so that every
    /// edit is expressed against the original document and the resulting
    /// edits run bottom-up.
    pub fn plan(&self, mut targets: Vec<&DocumentableBlock>) -> Vec<Edit> {
        targets.sort_by(|a, b| b.start_line.cmp(&a.start_line));

        let mut claimed: Vec<(usize, usize)> = Vec::new();
        let mut edits = Vec::new();

        for block in targets {
            if block.start_line >= self.lines.len() {
                continue;
            }
            let existing = find_existing_docblock(&self.lines, block.start_line);
            if let Some(range) = existing {
                if claimed.contains(&range) {
                    debug!(block = %block.name, "docblock already claimed by another declaration");
                    continue;
                }
                claimed.push(range);
            }

            let edit = if block.kind == BlockKind::Property {
                if !self.document_properties || existing.is_some() {
                    continue;
                }
                self.property_edit(block)
            } else {
                self.docblock_edit(block, existing)
            };
            if let Some(edit) = edit {
                edits.push(edit);
            }
        }

        edits
    }

    fn padding(&self, line: usize) -> &'a str {
        let text = self.lines[line];
        &text[..text.len() - text.trim_start().len()]
    }

    fn property_edit(&self, block: &DocumentableBlock) -> Option<Edit> {
        let lines = render_property_doc(self.padding(block.start_line), block.type_hint.as_deref());
        debug!(property = %block.name, line = block.start_line, "adding property docblock");
        Some(Edit::insert(
            block.start_line,
            0,
            format!("{}\n", lines.join("\n")),
            format!("Add @var docblock for ${}", block.name),
        ))
    }

    fn docblock_edit(
        &self,
        block: &DocumentableBlock,
        existing: Option<(usize, usize)>,
    ) -> Option<Edit> {
        let settings_names = if block.kind.is_function_like() {
            let end = block.end_line.min(self.lines.len() - 1);
            self.scanner.scan(&self.lines[block.start_line..=end].join("\n"))
        } else {
            Vec::new()
        };
        let derived = DerivedFields::for_block(block, settings_names, self.lookup);

        let old = existing
            .map(|(start, end)| parse_docblock(&self.lines[start..=end]))
            .unwrap_or_default();
        let model = merge(&old, &derived);

        let target = RenderTarget {
            kind: block.kind,
            name: &block.name,
            padding: self.padding(block.start_line),
        };
        let rendered = render_docblock(&model, &target);
        let label = format!("{} {}", block.kind.label(), block.name);

        match existing {
            Some((start, end)) => {
                if self.lines[start..=end] == rendered[..] {
                    debug!(block = %label, "docblock up to date");
                    return None;
                }
                debug!(block = %label, start, end, "updating docblock");
                Some(Edit::replace(
                    start,
                    end,
                    rendered.join("\n"),
                    format!("Update docblock for {}", label),
                ))
            }
            None => {
                debug!(block = %label, line = block.start_line, "adding docblock");
                Some(Edit::insert(
                    block.start_line,
                    0,
                    format!("{}\n", rendered.join("\n")),
                    format!("Add docblock for {}", label),
                ))
            }
        }
    }
}
