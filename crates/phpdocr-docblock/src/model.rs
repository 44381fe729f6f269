//! Structured docblock content and the fields derived from current source

use crate::block::{DocumentableBlock, Parameter};
use crate::lookup::SettingsLookup;
use crate::return_type::collapse_mixed;

/// A documented `@param`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParamDoc {
    /// Name without the `$` prefix
    pub name: String,
    pub type_hint: Option<String>,
    pub description: Option<String>,
    /// Description lines written below the tag
    pub continuation: Vec<String>,
}

/// One entry of the `@settings` list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsUsage {
    pub name: String,
    pub description: Option<String>,
}

impl SettingsUsage {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
        }
    }
}

/// A tag that is not `@param`, `@return` or `@settings`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherTag {
    /// Tag text with the comment marker stripped
    pub text: String,
    /// The source line the tag was read from, empty for generated tags
    pub raw: String,
    pub continuation: Vec<String>,
    /// Written above every `@param`, `@throws`, `@settings` and `@return`
    pub leading: bool,
}

impl OtherTag {
    /// A freshly generated tag with no source line
    pub fn generated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            raw: String::new(),
            continuation: Vec::new(),
            leading: false,
        }
    }

    pub fn is_throws(&self) -> bool {
        tag_name(&self.text) == Some("@throws")
    }

    /// Exception type named by a `@throws` tag
    pub fn throws_type(&self) -> Option<&str> {
        if !self.is_throws() {
            return None;
        }
        self.text.split_whitespace().nth(1)
    }
}

/// The `@tag` word at the start of `text`
pub(crate) fn tag_name(text: &str) -> Option<&str> {
    if !text.starts_with('@') {
        return None;
    }
    let end = text
        .char_indices()
        .skip(1)
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '-' || *c == '_' || *c == '\\'))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    Some(&text[..end])
}

/// Structured representation of one comment block
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocblockModel {
    /// Leading description lines; blank entries separate paragraphs
    pub summary: Vec<String>,
    pub parameters: Vec<ParamDoc>,
    pub return_type: Option<String>,
    pub return_description: Option<String>,
    pub return_continuation: Vec<String>,
    pub settings: Vec<SettingsUsage>,
    pub other_tags: Vec<OtherTag>,
}

impl DocblockModel {
    pub fn param(&self, name: &str) -> Option<&ParamDoc> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn throws_tags(&self) -> impl Iterator<Item = &OtherTag> {
        self.other_tags.iter().filter(|tag| tag.is_throws())
    }
}

/// Docblock content recomputed from the current source.
///
/// `None` leaves the corresponding preserved content untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DerivedFields {
    pub parameters: Option<Vec<Parameter>>,
    pub return_type: Option<String>,
    pub throws: Option<Vec<String>>,
    pub settings: Option<Vec<SettingsUsage>>,
}

impl DerivedFields {
    /// Derive the fields for `block` from its extracted data, the settings
    /// names used in its text, and the description lookup.
    ///
    /// Only function-like blocks carry derived fields. A method without a
    /// body only contributes its signature: parameters and a declared
    /// return type.
    pub fn for_block(
        block: &DocumentableBlock,
        settings_names: Vec<String>,
        lookup: &dyn SettingsLookup,
    ) -> Self {
        if !block.kind.is_function_like() {
            return Self::default();
        }

        let declared = block.declared_return_type.as_deref().map(collapse_mixed);
        if !block.has_body {
            return Self {
                parameters: Some(block.parameters.clone()),
                return_type: declared,
                ..Self::default()
            };
        }

        let return_type = declared
            .or_else(|| block.inferred_return_type.clone())
            .unwrap_or_else(|| "void".to_string());

        let descriptions = lookup.lookup(&settings_names);
        let settings = settings_names
            .into_iter()
            .map(|name| {
                let description = descriptions.get(&name).cloned();
                SettingsUsage { name, description }
            })
            .collect();

        Self {
            parameters: Some(block.parameters.clone()),
            return_type: Some(return_type),
            throws: Some(block.thrown_exceptions.clone()),
            settings: Some(settings),
        }
    }
}
