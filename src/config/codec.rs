//! Sectioned `key = value` text documents, the format of `gmapcatcher.conf`.
//!
//! Parsing is lenient: unknown or malformed lines are skipped with a warning
//! rather than failing the whole document, so one bad line never costs the
//! remaining options.
//!
//! Values that would not survive a plain `key = value` line (line breaks,
//! surrounding whitespace, a leading `"`) are written as a double-quoted
//! string with `\\`, `\"`, `\n`, `\r` and `\t` escapes, and unquoted again
//! on read.

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::path::Path;

use tracing::warn;

use crate::error::AppResult;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let key = key.to_lowercase();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    fn last_value_mut(&mut self) -> Option<&mut String> {
        self.entries.last_mut().map(|(_, v)| v)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    sections: Vec<Section>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(path: impl AsRef<Path>) -> AppResult<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(Self::parse(&raw))
    }

    pub fn write(&self, path: impl AsRef<Path>) -> AppResult<()> {
        fs::write(path, self.to_string())?;
        Ok(())
    }

    pub fn parse(raw: &str) -> Self {
        let mut doc = Self::new();
        let mut current: Option<usize> = None;
        let mut in_value = false;

        for (index, line) in raw.lines().enumerate() {
            let lineno = index + 1;
            let trimmed = line.trim();

            // Blank and comment lines do not end a value: an indented line
            // after them still continues the previous option.
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            if line.starts_with(char::is_whitespace) && in_value {
                if let Some(value) = current
                    .and_then(|i| doc.sections.get_mut(i))
                    .and_then(Section::last_value_mut)
                {
                    value.push('\n');
                    value.push_str(trimmed);
                }
                continue;
            }

            if let Some(name) = trimmed
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
            {
                current = Some(doc.section_index(name.trim()));
                in_value = false;
                continue;
            }

            let Some((key, value)) = split_option(trimmed) else {
                warn!(line = lineno, "skipping unrecognized configuration line");
                in_value = false;
                continue;
            };

            match current {
                Some(i) => {
                    let value = decode_value(value).unwrap_or_else(|| value.to_string());
                    doc.sections[i].set(key, value);
                    in_value = true;
                }
                None => {
                    warn!(line = lineno, key, "skipping option outside of any section");
                    in_value = false;
                }
            }
        }

        doc
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn add_section(&mut self, name: &str) -> &mut Section {
        let index = self.section_index(name);
        &mut self.sections[index]
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?.get(key)
    }

    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.add_section(section).set(key, value);
    }

    fn section_index(&mut self, name: &str) -> usize {
        match self.sections.iter().position(|s| s.name == name) {
            Some(index) => index,
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            writeln!(f, "[{}]", section.name)?;
            for (key, value) in &section.entries {
                writeln!(f, "{key} = {}", encode_value(value))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// Whichever of `=` or `:` comes first separates key from value.
fn split_option(line: &str) -> Option<(&str, &str)> {
    let at = line.find(['=', ':'])?;
    let key = line[..at].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, line[at + 1..].trim()))
}

fn needs_quoting(value: &str) -> bool {
    value.starts_with('"')
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace)
        || value.contains(['\n', '\r'])
}

fn encode_value(value: &str) -> Cow<'_, str> {
    if !needs_quoting(value) {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    Cow::Owned(out)
}

// `None` when `raw` is not a well-formed quoted value; the caller then keeps
// it verbatim.
fn decode_value(raw: &str) -> Option<String> {
    let inner = raw.strip_prefix('"')?.strip_suffix('"')?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push(match chars.next()? {
                '\\' => '\\',
                '"' => '"',
                'n' => '\n',
                'r' => '\r',
                't' => '\t',
                _ => return None,
            }),
            '"' => return None,
            other => out.push(other),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_and_options() {
        let doc = Document::parse(
            "# comment\n[init]\nwidth = 800\nzoom: 5\n; another\n\n[other]\nwidth=1\n",
        );

        assert_eq!(doc.get("init", "width"), Some("800"));
        assert_eq!(doc.get("init", "zoom"), Some("5"));
        assert_eq!(doc.get("other", "width"), Some("1"));
        assert_eq!(doc.get("missing", "width"), None);
    }

    #[test]
    fn folds_key_case() {
        let doc = Document::parse("[init]\noneDirPerMap = 1\n");

        assert_eq!(doc.get("init", "onedirpermap"), Some("1"));
        assert_eq!(doc.get("init", "ONEDIRPERMAP"), Some("1"));
    }

    #[test]
    fn later_duplicates_win() {
        let doc = Document::parse("[init]\nwidth = 1\nwidth = 2\n");
        assert_eq!(doc.get("init", "width"), Some("2"));
    }

    #[test]
    fn keeps_separators_inside_values() {
        let doc = Document::parse("[init]\nversion_url = http://example.com/a=b\n");
        assert_eq!(doc.get("init", "version_url"), Some("http://example.com/a=b"));
    }

    #[test]
    fn skips_garbage_and_orphan_options() {
        let doc = Document::parse("orphan = 1\n[init]\nthis line has no separator\nwidth = 3\n");

        assert_eq!(doc.get("init", "orphan"), None);
        assert_eq!(doc.get("init", "width"), Some("3"));
        assert_eq!(doc.section("init").map(|s| s.entries().count()), Some(1));
    }

    #[test]
    fn joins_continuation_lines() {
        let doc = Document::parse("[init]\nnote = first\n  second\nwidth = 3\n");

        assert_eq!(doc.get("init", "note"), Some("first\nsecond"));
        assert_eq!(doc.get("init", "width"), Some("3"));
    }

    #[test]
    fn continuation_survives_blank_and_comment_lines() {
        let doc = Document::parse("[init]\nnote = first\n\n# aside\n  zoom = 3\nwidth = 3\n");

        assert_eq!(doc.get("init", "note"), Some("first\nzoom = 3"));
        assert_eq!(doc.get("init", "zoom"), None);
        assert_eq!(doc.get("init", "width"), Some("3"));
    }

    #[test]
    fn renders_in_insertion_order() {
        let mut doc = Document::new();
        doc.set("init", "width", "550");
        doc.set("init", "center", "((1, 0), (9, 200))");
        doc.set("init", "width", "600");

        assert_eq!(
            doc.to_string(),
            "[init]\nwidth = 600\ncenter = ((1, 0), (9, 200))\n\n"
        );
    }

    #[test]
    fn rendered_document_parses_back() {
        let mut doc = Document::new();
        doc.set("init", "language", "en");
        doc.set("init", "note", "a\nb");

        assert_eq!(Document::parse(&doc.to_string()), doc);
    }

    #[test]
    fn awkward_values_parse_back_exactly() {
        let values = [
            "a\n\nb",
            "a\n#b",
            "a\n;b",
            "Google\n\nzoom = 3",
            " en ",
            "\ttabbed",
            "trailing\r\n",
            "\"quoted\"",
            "\"",
            "back\\slash \"mid\" quote",
            "",
        ];

        for value in values {
            let mut doc = Document::new();
            doc.set("init", "value", value);
            doc.set("init", "zoom", "10");

            let parsed = Document::parse(&doc.to_string());

            assert_eq!(parsed.get("init", "value"), Some(value), "{value:?}");
            assert_eq!(parsed.get("init", "zoom"), Some("10"), "{value:?}");
        }
    }

    #[test]
    fn plain_values_are_written_unquoted() {
        let mut doc = Document::new();
        doc.set("init", "version_url", "http://example.com/v?x=\"1\"");
        doc.set("init", "language", " en");

        assert_eq!(
            doc.to_string(),
            "[init]\nversion_url = http://example.com/v?x=\"1\"\nlanguage = \" en\"\n\n"
        );
    }

    #[test]
    fn malformed_quoted_values_are_kept_verbatim() {
        let doc = Document::parse("[init]\na = \"open\nb = \"bad\\qescape\"\nc = \"in\"side\"\n");

        assert_eq!(doc.get("init", "a"), Some("\"open"));
        assert_eq!(doc.get("init", "b"), Some("\"bad\\qescape\""));
        assert_eq!(doc.get("init", "c"), Some("\"in\"side\""));
    }

    #[test]
    fn lists_sections_in_order() {
        let doc = Document::parse("[init]\nwidth = 1\n[extra]\nkey = v\n");
        let names: Vec<&str> = doc.sections().map(Section::name).collect();

        assert_eq!(names, ["init", "extra"]);
    }
}
