//! Settings-usage scanner
//!
//! Finds literal names passed to configuration-fetch calls such as
//! `getSetting('FOO')` in the raw text of a block. A small state machine
//! tracks comments and string literals so that commented-out calls and
//! calls spelled inside strings are not reported.

/// Lexical state of the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    LineComment,
    BlockComment,
    SingleQuoted,
    DoubleQuoted,
}

/// Scans source text for configuration-fetch calls
#[derive(Debug, Clone)]
pub struct SettingsScanner {
    functions: Vec<String>,
}

impl SettingsScanner {
    /// Build a scanner for the given call names (matched case-insensitively,
    /// as PHP function names are)
    pub fn new<I, S>(functions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            functions: functions
                .into_iter()
                .map(|f| f.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Distinct setting names referenced in `text`, in first-seen order
    pub fn scan(&self, text: &str) -> Vec<String> {
        let bytes = text.as_bytes();
        let mut names: Vec<String> = Vec::new();
        let mut state = State::Code;
        let mut i = 0;

        while i < bytes.len() {
            let b = bytes[i];
            match state {
                State::LineComment => {
                    if b == b'\n' {
                        state = State::Code;
                    } else if b == b'?' && bytes.get(i + 1) == Some(&b'>') {
                        // `?>` ends a line comment in PHP
                        state = State::Code;
                    }
                    i += 1;
                }
                State::BlockComment => {
                    if b == b'*' && bytes.get(i + 1) == Some(&b'/') {
                        state = State::Code;
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
                State::SingleQuoted | State::DoubleQuoted => {
                    let quote = if state == State::SingleQuoted { b'\'' } else { b'"' };
                    if b == b'\\' {
                        i += 2;
                    } else {
                        if b == quote {
                            state = State::Code;
                        }
                        i += 1;
                    }
                }
                State::Code => {
                    if b == b'/' && bytes.get(i + 1) == Some(&b'/') {
                        state = State::LineComment;
                        i += 2;
                    } else if b == b'#' && bytes.get(i + 1) != Some(&b'[') {
                        state = State::LineComment;
                        i += 1;
                    } else if b == b'/' && bytes.get(i + 1) == Some(&b'*') {
                        state = State::BlockComment;
                        i += 2;
                    } else if b == b'\'' {
                        state = State::SingleQuoted;
                        i += 1;
                    } else if b == b'"' {
                        state = State::DoubleQuoted;
                        i += 1;
                    } else if is_ident_start(b) {
                        let start = i;
                        while i < bytes.len() && is_ident_char(bytes[i]) {
                            i += 1;
                        }
                        let preceded_by_dollar = start > 0 && bytes[start - 1] == b'$';
                        if preceded_by_dollar || !self.is_fetch_call(&text[start..i]) {
                            continue;
                        }
                        if let Some((name, end)) = match_literal_call(text, i) {
                            if !names.contains(&name) {
                                names.push(name);
                            }
                            i = end;
                        }
                    } else {
                        i += 1;
                    }
                }
            }
        }

        names
    }

    fn is_fetch_call(&self, ident: &str) -> bool {
        let lower = ident.to_ascii_lowercase();
        self.functions.iter().any(|f| *f == lower)
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_char(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Match `( 'LITERAL' )` starting at `pos`; returns the unescaped literal and
/// the offset just past the closing parenthesis.
fn match_literal_call(text: &str, pos: usize) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    let mut i = skip_whitespace(bytes, pos);
    if bytes.get(i) != Some(&b'(') {
        return None;
    }
    i = skip_whitespace(bytes, i + 1);
    let quote = *bytes.get(i)?;
    if quote != b'\'' && quote != b'"' {
        return None;
    }
    i += 1;

    let content_start = i;
    while i < bytes.len() && bytes[i] != quote {
        if bytes[i] == b'\\' {
            i += 1;
        }
        i += 1;
    }
    if i >= bytes.len() {
        return None;
    }
    let raw = &text[content_start..i];
    // Interpolated names are not literals
    if quote == b'"' && raw.contains('$') {
        return None;
    }

    i = skip_whitespace(bytes, i + 1);
    if bytes.get(i) != Some(&b')') {
        return None;
    }
    Some((unescape(raw, quote as char), i + 1))
}

fn unescape(raw: &str, quote: char) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some(q) if q == quote => out.push(q),
            Some('n') if quote == '"' => out.push('\n'),
            Some('t') if quote == '"' => out.push('\t'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
