//! Docblock parser
//!
//! Reads the lines of an existing `/** ... */` comment into a
//! [`DocblockModel`]. Parsing is best-effort: anything that is not a
//! recognized `@param`, `@return` or `@settings` entry is kept as an
//! [`OtherTag`] with its source line, so nothing the author wrote is lost.

use regex::Regex;
use std::sync::OnceLock;

use crate::model::{tag_name, DocblockModel, OtherTag, ParamDoc, SettingsUsage};

static PARAM_RE: OnceLock<Regex> = OnceLock::new();
static RETURN_STRICT_RE: OnceLock<Regex> = OnceLock::new();

fn param_regex() -> &'static Regex {
    PARAM_RE.get_or_init(|| {
        Regex::new(
            r"^@param(?:\s+(?P<type>[^\s$&.].*?))?\s+&?(?:\.\.\.)?\$(?P<name>\w+)(?:\s+(?P<desc>.*))?$",
        )
        .expect("valid @param regex")
    })
}

fn return_strict_regex() -> &'static Regex {
    RETURN_STRICT_RE.get_or_init(|| {
        Regex::new(
            r"^@return\s+(?P<type>\??\\?[A-Za-z_][\w\\]*(?:\[\])*(?:\|\??\\?[A-Za-z_][\w\\]*(?:\[\])*)*)(?:\s+(?P<desc>.+))?$",
        )
        .expect("valid @return regex")
    })
}

/// The tag a non-tag line continues
#[derive(Debug, Clone, Copy)]
enum Continues {
    Nothing,
    Param(usize),
    Return,
    Other(usize),
}

/// One content line: marker-stripped text plus the original line
struct ContentLine<'s> {
    text: String,
    raw: &'s str,
}

/// Parse docblock text (one or more lines, opening and closing delimiters
/// included) into a model
pub fn parse_docblock_text(text: &str) -> DocblockModel {
    let lines: Vec<&str> = text.lines().collect();
    parse_docblock(&lines)
}

/// Parse the lines of a docblock into a model
pub fn parse_docblock(lines: &[&str]) -> DocblockModel {
    let content = content_lines(lines);
    let mut model = DocblockModel::default();
    let mut in_summary = true;
    // Set once a tag the builder regenerates has been seen
    let mut in_generated = false;
    let mut continues = Continues::Nothing;

    let mut i = 0;
    while i < content.len() {
        let line = &content[i];
        let text = line.text.as_str();
        let tag_text = text.trim_start();
        i += 1;

        if text.is_empty() {
            if in_summary {
                model.summary.push(String::new());
            }
            continues = Continues::Nothing;
            continue;
        }

        match tag_name(tag_text) {
            Some("@settings") => {
                in_summary = false;
                in_generated = true;
                continues = Continues::Nothing;
                while i < content.len() {
                    let Some(entry) = content[i].text.strip_prefix("- ") else {
                        break;
                    };
                    model.settings.push(parse_settings_entry(entry));
                    i += 1;
                }
            }
            Some("@param") => {
                in_summary = false;
                in_generated = true;
                match parse_param(tag_text) {
                    Some(param) => {
                        model.parameters.push(param);
                        continues = Continues::Param(model.parameters.len() - 1);
                    }
                    None => {
                        model.other_tags.push(other_tag(tag_text, line.raw));
                        continues = Continues::Other(model.other_tags.len() - 1);
                    }
                }
            }
            Some("@return") => {
                in_summary = false;
                in_generated = true;
                match parse_return(tag_text) {
                    Some((type_hint, description)) => {
                        model.return_type = Some(type_hint);
                        model.return_description = description;
                        model.return_continuation.clear();
                        continues = Continues::Return;
                    }
                    None => {
                        // No usable type: the derived one fills in, any text is kept
                        let rest = tag_text["@return".len()..].trim();
                        model.return_type = None;
                        model.return_description =
                            (!rest.is_empty()).then(|| rest.to_string());
                        model.return_continuation.clear();
                        continues = Continues::Return;
                    }
                }
            }
            Some(name) => {
                in_summary = false;
                in_generated |= name == "@throws";
                let mut tag = other_tag(tag_text, line.raw);
                tag.leading = !in_generated;
                model.other_tags.push(tag);
                continues = Continues::Other(model.other_tags.len() - 1);
            }
            None if in_summary => model.summary.push(text.to_string()),
            None => match continues {
                Continues::Param(idx) => model.parameters[idx].continuation.push(text.to_string()),
                Continues::Return => model.return_continuation.push(text.to_string()),
                Continues::Other(idx) => model.other_tags[idx].continuation.push(text.to_string()),
                Continues::Nothing => {
                    // Free text between tags is kept in place like a tag
                    let mut tag = other_tag(text, line.raw);
                    tag.leading = !in_generated;
                    model.other_tags.push(tag);
                    continues = Continues::Other(model.other_tags.len() - 1);
                }
            },
        }
    }

    model.summary = collapse_blank_lines(model.summary);
    model
}

/// Strip delimiters and comment markers, stopping at the closing line
fn content_lines<'s>(lines: &[&'s str]) -> Vec<ContentLine<'s>> {
    let mut out = Vec::new();

    for (idx, raw) in lines.iter().enumerate() {
        let mut trimmed = raw.trim();
        if idx == 0 {
            trimmed = trimmed.strip_prefix("/**").unwrap_or(trimmed).trim_start();
        }

        let closing = trimmed.ends_with("*/");
        if closing {
            trimmed = trimmed[..trimmed.len() - 2].trim_end();
        }

        let text = if idx == 0 {
            trimmed
        } else {
            let body = trimmed.strip_prefix('*').unwrap_or(trimmed);
            body.strip_prefix(' ').unwrap_or(body)
        };
        // `**/` closers leave a lone marker behind
        let text = if closing && text == "*" { "" } else { text.trim_end() };

        if !(idx == 0 && text.is_empty()) && !(closing && text.is_empty()) {
            out.push(ContentLine {
                text: text.to_string(),
                raw,
            });
        }

        if closing {
            break;
        }
    }

    out
}

fn other_tag(text: &str, raw: &str) -> OtherTag {
    OtherTag {
        text: text.to_string(),
        raw: raw.to_string(),
        continuation: Vec::new(),
        leading: false,
    }
}

fn parse_settings_entry(entry: &str) -> SettingsUsage {
    let entry = entry.trim();
    match entry.split_once(" : ") {
        Some((name, description)) => {
            let description = description.trim();
            SettingsUsage::new(
                name.trim(),
                (!description.is_empty()).then(|| description.to_string()),
            )
        }
        None => SettingsUsage::new(entry, None),
    }
}

fn parse_param(text: &str) -> Option<ParamDoc> {
    let caps = param_regex().captures(text)?;
    Some(ParamDoc {
        name: caps["name"].to_string(),
        type_hint: caps.name("type").map(|m| m.as_str().trim().to_string()),
        description: caps
            .name("desc")
            .map(|m| m.as_str().trim().to_string())
            .filter(|d| !d.is_empty()),
        continuation: Vec::new(),
    })
}

/// Parse `@return <type> <description>?`, preferring the strict union
/// pattern and falling back to a bracket-aware type token
fn parse_return(text: &str) -> Option<(String, Option<String>)> {
    if let Some(caps) = return_strict_regex().captures(text) {
        let description = caps.name("desc").map(|m| m.as_str().trim().to_string());
        return Some((caps["type"].to_string(), description));
    }

    let rest = text.strip_prefix("@return")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    let type_end = type_token_end(rest);
    if type_end == 0 {
        return None;
    }
    let description = rest[type_end..].trim();
    Some((
        rest[..type_end].to_string(),
        (!description.is_empty()).then(|| description.to_string()),
    ))
}

/// Length of the leading type token, which ends at whitespace outside of
/// any `<>`, `{}` or `()` nesting
fn type_token_end(text: &str) -> usize {
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '<' | '{' | '(' => depth += 1,
            '>' | '}' | ')' => depth -= 1,
            c if c.is_whitespace() && depth <= 0 => return i,
            _ => {}
        }
    }
    text.len()
}

/// Collapse runs of blank lines and trim blank lines at both ends
fn collapse_blank_lines(lines: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.is_empty() && out.last().map_or(true, |prev| prev.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|line| line.is_empty()) {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_params_return() {
        let model = parse_docblock_text(
            "/**\n * function add\n *\n * Adds numbers.\n *\n * @param int $a first operand\n * @param $b\n *\n * @return int the sum\n */",
        );
        assert_eq!(model.summary, vec!["function add", "", "Adds numbers."]);
        assert_eq!(model.parameters.len(), 2);
        assert_eq!(model.parameters[0].name, "a");
        assert_eq!(model.parameters[0].type_hint.as_deref(), Some("int"));
        assert_eq!(model.parameters[0].description.as_deref(), Some("first operand"));
        assert_eq!(model.parameters[1].name, "b");
        assert_eq!(model.parameters[1].type_hint, None);
        assert_eq!(model.return_type.as_deref(), Some("int"));
        assert_eq!(model.return_description.as_deref(), Some("the sum"));
    }

    #[test]
    fn test_blank_summary_lines_collapse() {
        let model = parse_docblock_text("/**\n *\n * one\n *\n *\n *\n * two\n *\n */");
        assert_eq!(model.summary, vec!["one", "", "two"]);
    }

    #[test]
    fn test_param_variants() {
        let model = parse_docblock_text(
            "/**\n * @param array<string, int> $map the map\n * @param string ...$rest\n * @param Foo &$ref\n */",
        );
        assert_eq!(model.parameters[0].type_hint.as_deref(), Some("array<string, int>"));
        assert_eq!(model.parameters[0].description.as_deref(), Some("the map"));
        assert_eq!(model.parameters[1].name, "rest");
        assert_eq!(model.parameters[2].name, "ref");
    }

    #[test]
    fn test_param_without_type_keeps_dollar_in_description() {
        let model = parse_docblock_text("/**\n * @param $a compared with $b\n */");
        assert_eq!(model.parameters[0].name, "a");
        assert_eq!(model.parameters[0].type_hint, None);
        assert_eq!(model.parameters[0].description.as_deref(), Some("compared with $b"));
    }

    #[test]
    fn test_return_union_and_loose_fallback() {
        let strict = parse_docblock_text("/**\n * @return \\Foo\\Bar[]|null maybe\n */");
        assert_eq!(strict.return_type.as_deref(), Some("\\Foo\\Bar[]|null"));
        assert_eq!(strict.return_description.as_deref(), Some("maybe"));

        let loose = parse_docblock_text("/**\n * @return array<int, string> names\n */");
        assert_eq!(loose.return_type.as_deref(), Some("array<int, string>"));
        assert_eq!(loose.return_description.as_deref(), Some("names"));
    }

    #[test]
    fn test_settings_block_rewinds() {
        let model = parse_docblock_text(
            "/**\n * function a\n *\n * @settings\n * - FOO : Enables foo\n * - BAR\n * @author me\n */",
        );
        assert_eq!(
            model.settings,
            vec![
                SettingsUsage::new("FOO", Some("Enables foo".into())),
                SettingsUsage::new("BAR", None),
            ]
        );
        assert_eq!(model.other_tags.len(), 1);
        assert_eq!(model.other_tags[0].text, "@author me");
    }

    #[test]
    fn test_other_tags_keep_raw_line() {
        let model = parse_docblock_text("/**\n *   @deprecated   use b()\n * @throws RuntimeException\n */");
        assert_eq!(model.other_tags.len(), 2);
        assert_eq!(model.other_tags[0].text, "@deprecated   use b()");
        assert_eq!(model.other_tags[0].raw, " *   @deprecated   use b()");
        assert!(model.other_tags[1].is_throws());
    }

    #[test]
    fn test_continuation_lines() {
        let model = parse_docblock_text(
            "/**\n * @param int $a first\n *   more about a\n * @return int\n *   more about return\n * @see other\n *   and this\n */",
        );
        assert_eq!(model.parameters[0].continuation, vec!["  more about a"]);
        assert_eq!(model.return_continuation, vec!["  more about return"]);
        assert_eq!(model.other_tags[0].continuation, vec!["  and this"]);
    }

    #[test]
    fn test_single_line_docblock() {
        let model = parse_docblock_text("/** @var int */");
        assert_eq!(model.other_tags.len(), 1);
        assert_eq!(model.other_tags[0].text, "@var int");

        let summary = parse_docblock_text("/** Short description. */");
        assert_eq!(summary.summary, vec!["Short description."]);
    }

    #[test]
    fn test_malformed_closing_lines() {
        let model = parse_docblock_text("/**\n * text\n **/");
        assert_eq!(model.summary, vec!["text"]);

        let trailing = parse_docblock_text("/**\n * text */");
        assert_eq!(trailing.summary, vec!["text"]);
    }

    #[test]
    fn test_malformed_param_is_preserved() {
        let model = parse_docblock_text("/**\n * @param int\n */");
        assert!(model.parameters.is_empty());
        assert_eq!(model.other_tags[0].text, "@param int");
    }

    #[test]
    fn test_untyped_return_keeps_description() {
        let bare = parse_docblock_text("/**\n * function a\n *\n * @return\n */");
        assert_eq!(bare.return_type, None);
        assert_eq!(bare.return_description, None);
        assert!(bare.other_tags.is_empty());

        let model = parse_docblock_text("/**\n * @return\n *   the total\n */");
        assert_eq!(model.return_type, None);
        assert!(model.other_tags.is_empty());
        assert_eq!(model.return_continuation, vec!["  the total"]);
    }

    #[test]
    fn test_leading_tags_are_marked() {
        let model = parse_docblock_text(
            "/**\n * Does a.\n *\n * @author me\n * @param int $a\n * @see b()\n * @throws X\n */",
        );
        let leading: Vec<(&str, bool)> = model
            .other_tags
            .iter()
            .map(|tag| (tag.text.as_str(), tag.leading))
            .collect();
        assert_eq!(
            leading,
            vec![("@author me", true), ("@see b()", false), ("@throws X", false)]
        );

        let throws_first = parse_docblock_text("/**\n * @throws X\n * @author me\n */");
        assert!(!throws_first.other_tags[1].leading);
    }
}
