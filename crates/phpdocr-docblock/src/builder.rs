//! Docblock builder: merges derived and preserved content and renders it
//!
//! Layout of a rendered block:
//!
//! ```text
//! /**
//!  * function name            <- type line unless the summary already names it
//!  * Summary text
//!  *
//!  * @settings
//!  * - NAME : description
//!  *
//!  * @author me                 <- tags written above @param stay here
//!  * @param type $name description
//!  *
//!  * @throws Type
//!  *
//!  * @other tags
//!  *
//!  * @return type description  <- functions and methods only
//!  */
//! ```

use std::collections::HashMap;

use crate::block::{BlockKind, Parameter};
use crate::model::{DerivedFields, DocblockModel, OtherTag, ParamDoc, SettingsUsage};

/// Where and for what a docblock is rendered
#[derive(Debug, Clone, Copy)]
pub struct RenderTarget<'a> {
    pub kind: BlockKind,
    pub name: &'a str,
    /// Leading whitespace of the documented line
    pub padding: &'a str,
}

/// Merge freshly derived fields into an old model, returning a new model.
///
/// Summary, parameter descriptions and unrelated tags are preserved;
/// parameters, return type, `@throws` and settings follow `derived`
/// wherever it provides them.
pub fn merge(old: &DocblockModel, derived: &DerivedFields) -> DocblockModel {
    let parameters = match &derived.parameters {
        Some(params) => params.iter().map(|p| merge_param(p, old.param(&p.name))).collect(),
        None => old.parameters.clone(),
    };

    let return_type = derived
        .return_type
        .clone()
        .or_else(|| old.return_type.clone());

    let settings = match &derived.settings {
        Some(usages) => merge_settings(usages, &old.settings),
        None => old.settings.clone(),
    };

    let other_tags = match &derived.throws {
        Some(throws) => reconcile_throws(&old.other_tags, throws),
        None => old.other_tags.clone(),
    };

    DocblockModel {
        summary: old.summary.clone(),
        parameters,
        return_type,
        return_description: old.return_description.clone(),
        return_continuation: old.return_continuation.clone(),
        settings,
        other_tags,
    }
}

fn merge_param(param: &Parameter, old: Option<&ParamDoc>) -> ParamDoc {
    let documented = old.and_then(|doc| doc.type_hint.as_deref());
    ParamDoc {
        name: param.name.clone(),
        type_hint: Some(resolve_param_type(param.declared_type.as_deref(), documented)),
        description: old.and_then(|doc| doc.description.clone()),
        continuation: old.map(|doc| doc.continuation.clone()).unwrap_or_default(),
    }
}

/// Pick the type shown for a parameter.
///
/// The declared type wins unless the documented one is a more precise
/// spelling of a native `array`/`iterable`.
pub fn resolve_param_type(declared: Option<&str>, documented: Option<&str>) -> String {
    match (declared, documented) {
        (Some(declared), Some(documented)) if refines(declared, documented) => {
            documented.to_string()
        }
        (Some(declared), _) => declared.to_string(),
        (None, Some(documented)) => documented.to_string(),
        (None, None) => "mixed".to_string(),
    }
}

fn refines(declared: &str, documented: &str) -> bool {
    let native = declared.trim().trim_start_matches('?').to_ascii_lowercase();
    if native != "array" && native != "iterable" {
        return false;
    }
    let documented = documented.trim().to_ascii_lowercase();
    documented.ends_with("[]")
        || ["array<", "list<", "iterable<", "array{", "non-empty-array<", "non-empty-list<"]
            .iter()
            .any(|prefix| documented.starts_with(prefix))
}

fn merge_settings(usages: &[SettingsUsage], old: &[SettingsUsage]) -> Vec<SettingsUsage> {
    let previous: HashMap<&str, &str> = old
        .iter()
        .filter_map(|u| u.description.as_deref().map(|d| (u.name.as_str(), d)))
        .collect();
    usages
        .iter()
        .map(|usage| SettingsUsage {
            name: usage.name.clone(),
            description: usage
                .description
                .clone()
                .or_else(|| previous.get(usage.name.as_str()).map(|d| d.to_string())),
        })
        .collect()
}

/// Keep old `@throws` tags whose type is still thrown, then append tags for
/// newly thrown types. Other tags pass through untouched.
pub fn reconcile_throws(old_tags: &[OtherTag], thrown: &[String]) -> Vec<OtherTag> {
    let still_thrown = |name: &str| thrown.iter().any(|t| same_type(t, name));

    let mut tags: Vec<OtherTag> = old_tags
        .iter()
        .filter(|tag| !tag.is_throws() || tag.throws_type().is_some_and(still_thrown))
        .cloned()
        .collect();

    for exception in thrown {
        let documented = tags
            .iter()
            .filter_map(OtherTag::throws_type)
            .any(|name| same_type(name, exception));
        if !documented {
            tags.push(OtherTag::generated(format!("@throws {}", exception)));
        }
    }
    tags
}

fn same_type(a: &str, b: &str) -> bool {
    a.trim_start_matches('\\')
        .eq_ignore_ascii_case(b.trim_start_matches('\\'))
}

/// Render a model as the lines of a complete docblock
pub fn render_docblock(model: &DocblockModel, target: &RenderTarget<'_>) -> Vec<String> {
    let pad = target.padding;
    let mut body = BodyLines::new(pad);

    // Header: type line, summary, settings
    let type_line = format!("{} {}", target.kind.label(), target.name);
    if !target.name.is_empty() && !summary_names_block(&model.summary, &type_line, target.name) {
        body.text(&type_line);
    }
    for line in &model.summary {
        body.text(line);
    }
    if !model.settings.is_empty() {
        if !body.is_empty() {
            body.blank();
        }
        body.text("@settings");
        for usage in &model.settings {
            body.text(&settings_entry(usage));
        }
    }

    let throws: Vec<&OtherTag> = model.throws_tags().collect();
    let (leading, others): (Vec<&OtherTag>, Vec<&OtherTag>) = model
        .other_tags
        .iter()
        .filter(|t| !t.is_throws())
        .partition(|t| t.leading);
    let has_return = target.kind.is_function_like() || model.return_type.is_some();
    let has_tags = !leading.is_empty()
        || !model.parameters.is_empty()
        || !throws.is_empty()
        || !others.is_empty()
        || has_return;

    if !body.is_empty() && has_tags {
        body.blank();
    }

    // Tags the author wrote above the generated ones keep their place
    for tag in &leading {
        body.other_tag(tag);
    }

    for param in &model.parameters {
        let type_hint = param.type_hint.as_deref().unwrap_or("mixed");
        let mut line = format!("@param {} ${}", type_hint, param.name);
        if let Some(description) = &param.description {
            line.push(' ');
            line.push_str(description);
        }
        body.text(&line);
        body.continuation(&param.continuation);
    }

    let tagged = !leading.is_empty() || !model.parameters.is_empty();

    if !throws.is_empty() {
        if tagged && !body.ends_blank() {
            body.blank();
        }
        for tag in &throws {
            body.other_tag(tag);
        }
        body.blank();
    }

    if !others.is_empty() {
        if tagged && throws.is_empty() && !body.ends_blank() {
            body.blank();
        }
        for tag in &others {
            body.other_tag(tag);
        }
    }

    if has_return {
        if !body.is_empty() && !body.ends_blank() {
            body.blank();
        }
        let return_type = model
            .return_type
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("void");
        let mut line = format!("@return {}", return_type);
        if let Some(description) = &model.return_description {
            line.push(' ');
            line.push_str(description);
        }
        body.text(&line);
        body.continuation(&model.return_continuation);
    }

    let mut lines = Vec::with_capacity(body.lines.len() + 2);
    lines.push(format!("{}/**", pad));
    lines.extend(body.lines.into_iter().filter_map(sanitize_line));
    lines.push(format!("{} */", pad));
    lines
}

/// Minimal docblock for an undocumented property
pub fn render_property_doc(padding: &str, type_hint: Option<&str>) -> Vec<String> {
    vec![
        format!("{}/**", padding),
        format!("{} * @var {}", padding, type_hint.unwrap_or("mixed")),
        format!("{} */", padding),
    ]
}

/// Body lines between the opening and closing delimiters
struct BodyLines<'p> {
    pad: &'p str,
    lines: Vec<String>,
}

impl<'p> BodyLines<'p> {
    fn new(pad: &'p str) -> Self {
        Self {
            pad,
            lines: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn ends_blank(&self) -> bool {
        self.lines
            .last()
            .is_some_and(|line| line.trim_end() == format!("{} *", self.pad).trim_end())
    }

    fn blank(&mut self) {
        self.lines.push(format!("{} *", self.pad));
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            self.blank();
        } else {
            self.lines.push(format!("{} * {}", self.pad, text));
        }
    }

    fn continuation(&mut self, lines: &[String]) {
        for line in lines {
            self.text(line);
        }
    }

    /// Emit a preserved tag, reusing its source line when it is already laid
    /// out for this padding
    fn other_tag(&mut self, tag: &OtherTag) {
        let reusable = tag
            .raw
            .strip_prefix(self.pad)
            .is_some_and(|rest| rest.starts_with(" * ") && !tag.raw.contains("*/"));
        if reusable {
            self.lines.push(tag.raw.trim_end().to_string());
        } else {
            self.text(&tag.text);
        }
        self.continuation(&tag.continuation);
    }
}

fn settings_entry(usage: &SettingsUsage) -> String {
    match usage.description.as_deref().map(str::trim) {
        Some(description) if !description.is_empty() && description != usage.name => {
            format!("- {} : {}", usage.name, description)
        }
        _ => format!("- {}", usage.name),
    }
}

/// Whether the first non-blank summary line already is, or starts with, the
/// block's name
fn summary_names_block(summary: &[String], type_line: &str, name: &str) -> bool {
    let Some(first) = summary.iter().map(|l| l.trim()).find(|l| !l.is_empty()) else {
        return false;
    };
    if first == type_line {
        return true;
    }

    let lower = first.to_lowercase();
    let mut rest = lower.as_str();
    for keyword in ["function", "method", "class", "interface", "trait", "property"] {
        if let Some(after) = rest.strip_prefix(keyword) {
            if after.starts_with(char::is_whitespace) {
                rest = after.trim_start();
                break;
            }
        }
    }
    let rest = rest.strip_prefix('$').unwrap_or(rest);
    let name = name.to_lowercase();
    match rest.strip_prefix(name.as_str()) {
        Some(after) => !after
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_'),
        None => false,
    }
}

/// Drop stray closing delimiters and defuse embedded ones
fn sanitize_line(line: String) -> Option<String> {
    let trimmed = line.trim();
    if trimmed == "*/" || trimmed == "**/" || trimmed == "* */" {
        return None;
    }
    if line.contains("*/") {
        Some(line.replace("*/", "* /"))
    } else {
        Some(line)
    }
}
