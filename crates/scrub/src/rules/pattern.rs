//! Compiled regex patterns and replacement templates.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A compiled regular expression that (de)serializes as its source text.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Compile a pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self)
    }

    /// Compile a pattern that only matches at the start of the text.
    pub fn anchored(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source)?;
        Regex::new(&format!("^(?:{})", source)).map(Self)
    }

    /// Source text of the pattern.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The compiled regex.
    pub fn regex(&self) -> &Regex {
        &self.0
    }

    /// Returns true if the pattern matches anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    /// Replace every match in `text`, expanding `template` (regex crate syntax).
    ///
    /// Returns `None` when the pattern does not match.
    pub fn replace_all(&self, text: &str, template: &str) -> Option<String> {
        if !self.0.is_match(text) {
            return None;
        }
        Some(self.0.replace_all(text, template).into_owned())
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(&source).map_err(serde::de::Error::custom)
    }
}

/// Convert a replacement template to regex crate syntax.
///
/// Rule generators write Python-style templates: `\1` and `\g<name>` become
/// `${1}` and `${name}`, `\\` is a literal backslash, and `\n`/`\t` are
/// control characters.
///
/// In a template with Python back-references every `$` is literal. Otherwise
/// `$1`, `${name}` and `$$` keep their regex crate meaning and any other `$`
/// is literal.
pub fn normalize_replacement(template: &str) -> String {
    let python = uses_python_references(template);
    let mut out = String::with_capacity(template.len() + 8);
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' {
            match chars.peek().copied() {
                Some(next) if !python && (next.is_ascii_digit() || next == '{') => out.push('$'),
                Some('$') if !python => {
                    chars.next();
                    out.push_str("$$");
                }
                _ => out.push_str("$$"),
            }
            continue;
        }
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        match chars.peek().copied() {
            Some(d) if d.is_ascii_digit() => {
                let mut group = String::new();
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                    group.push(d);
                    chars.next();
                }
                out.push_str(&format!("${{{}}}", group));
            }
            Some('g') => {
                chars.next();
                if chars.peek() == Some(&'<') {
                    chars.next();
                    let name: String = chars.by_ref().take_while(|c| *c != '>').collect();
                    out.push_str(&format!("${{{}}}", name));
                } else {
                    out.push_str("\\g");
                }
            }
            Some('\\') => {
                chars.next();
                out.push('\\');
            }
            Some('n') => {
                chars.next();
                out.push('\n');
            }
            Some('t') => {
                chars.next();
                out.push('\t');
            }
            _ => out.push('\\'),
        }
    }

    out
}

/// Returns true if `template` contains `\N` or `\g<name>` back-references.
fn uses_python_references(template: &str) -> bool {
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            continue;
        }
        match chars.next() {
            Some(d) if d.is_ascii_digit() => return true,
            Some('g') if chars.peek() == Some(&'<') => return true,
            _ => {}
        }
    }
    false
}
