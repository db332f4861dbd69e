//! Registry descriptors: `supertype = subtype, subtype, ...` text files.
//!
//! The format follows `.properties` conventions:
//!
//! ```text
//! # geometry
//! Shape = Circle, Square
//! Polygon: Triangle \
//!          Rect
//! ```
//!
//! - lines starting with `#` or `!` are comments, blank lines are skipped
//! - the first `=`, or failing that the first `:` that is not part of a
//!   `::` path separator, splits the supertype from its subtypes
//! - a trailing backslash continues the logical line
//! - subtypes are separated by commas, whitespace, or both
//!
//! Declaration order is preserved, both across lines and within a line.

use std::collections::HashMap;
use std::path::Path;

use crate::DescriptorError;

/// One `supertype = subtypes` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorEntry {
    /// Supertype name as written
    pub supertype: String,
    /// Subtype names as written, in declaration order
    pub subtypes: Vec<String>,
    /// 1-based line the declaration starts on
    pub line: usize,
}

/// A parsed registry descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptor {
    entries: Vec<DescriptorEntry>,
}

impl Descriptor {
    /// Parse descriptor text.
    pub fn parse(text: &str) -> Result<Self, DescriptorError> {
        let mut entries: Vec<DescriptorEntry> = Vec::new();
        let mut first_seen: HashMap<String, usize> = HashMap::new();

        for (line, logical) in logical_lines(text) {
            let Some(split) = find_separator(&logical) else {
                return Err(DescriptorError::MissingSeparator { line });
            };
            let key = logical[..split].trim();
            if key.is_empty() {
                return Err(DescriptorError::EmptyKey { line });
            }
            if let Some(&first_line) = first_seen.get(key) {
                return Err(DescriptorError::DuplicateKey {
                    key: key.to_string(),
                    line,
                    first_line,
                });
            }
            first_seen.insert(key.to_string(), line);

            let subtypes = logical[split + 1..]
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();

            entries.push(DescriptorEntry {
                supertype: key.to_string(),
                subtypes,
                line,
            });
        }

        tracing::debug!(entries = entries.len(), "parsed descriptor");
        Ok(Self { entries })
    }

    /// Read and parse a descriptor file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DescriptorError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DescriptorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Declarations in order.
    pub fn entries(&self) -> &[DescriptorEntry] {
        &self.entries
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the descriptor declares nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Join continuation lines and drop comments and blanks.
///
/// Yields `(first physical line number, logical line)`.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw.trim_start();

        if pending.is_none() && (trimmed.is_empty() || trimmed.starts_with(['#', '!'])) {
            continue;
        }

        let (body, continues) = match trimmed.strip_suffix('\\') {
            Some(body) if !ends_with_escaped_backslash(trimmed) => (body, true),
            _ => (trimmed, false),
        };

        let (start, mut buf) = pending.take().unwrap_or_else(|| (line_no, String::new()));
        buf.push_str(body);
        if continues {
            // keep a separator so `a,\` + `b` and `a \` + `b` both split
            buf.push(' ');
            pending = Some((start, buf));
        } else {
            out.push((start, buf));
        }
    }

    if let Some(last) = pending {
        out.push(last);
    }
    out
}

/// Byte offset of the key/value separator.
fn find_separator(line: &str) -> Option<usize> {
    if let Some(idx) = line.find('=') {
        return Some(idx);
    }
    let bytes = line.as_bytes();
    (0..bytes.len()).find(|&i| {
        bytes[i] == b':'
            && bytes.get(i + 1) != Some(&b':')
            && (i == 0 || bytes[i - 1] != b':')
    })
}

/// A line ending in `\\` ends in a literal backslash, not a continuation.
fn ends_with_escaped_backslash(line: &str) -> bool {
    let trailing = line.chars().rev().take_while(|&c| c == '\\').count();
    trailing % 2 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_declaration_order() {
        let descriptor = Descriptor::parse(
            "Shape = Square, Circle\n\
             Animal=Dog Cat,  Puppy\n",
        )
        .unwrap();
        let entries = descriptor.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].supertype, "Shape");
        assert_eq!(entries[0].subtypes, ["Square", "Circle"]);
        assert_eq!(entries[1].supertype, "Animal");
        assert_eq!(entries[1].subtypes, ["Dog", "Cat", "Puppy"]);
        assert_eq!(entries[1].line, 2);
    }

    #[test]
    fn skips_comments_and_blanks() {
        let descriptor = Descriptor::parse(
            "# geometry\n\
             \n\
             ! legacy comment style\n\
             geo::Shape: geo::Circle\n",
        )
        .unwrap();
        assert_eq!(descriptor.len(), 1);
        assert_eq!(descriptor.entries()[0].supertype, "geo::Shape");
        assert_eq!(descriptor.entries()[0].subtypes, ["geo::Circle"]);
        assert_eq!(descriptor.entries()[0].line, 4);
    }

    #[test]
    fn path_separators_are_not_key_separators() {
        let descriptor = Descriptor::parse("geo::Shape = geo::Circle").unwrap();
        assert_eq!(descriptor.entries()[0].supertype, "geo::Shape");
        assert_eq!(descriptor.entries()[0].subtypes, ["geo::Circle"]);

        let descriptor = Descriptor::parse("geo::Shape:geo::Circle geo::Square").unwrap();
        assert_eq!(descriptor.entries()[0].supertype, "geo::Shape");
        assert_eq!(descriptor.entries()[0].subtypes, ["geo::Circle", "geo::Square"]);
    }

    #[test]
    fn joins_continuation_lines() {
        let descriptor = Descriptor::parse(
            "Polygon = Triangle,\\\n    Rect \\\n    Pentagon\nShape = Circle\n",
        )
        .unwrap();
        assert_eq!(descriptor.entries()[0].subtypes, ["Triangle", "Rect", "Pentagon"]);
        assert_eq!(descriptor.entries()[1].line, 4);
    }

    #[test]
    fn empty_value_declares_no_candidates() {
        let descriptor = Descriptor::parse("Shape =").unwrap();
        assert!(descriptor.entries()[0].subtypes.is_empty());
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(matches!(
            Descriptor::parse("Shape Circle"),
            Err(DescriptorError::MissingSeparator { line: 1 })
        ));
        assert!(matches!(
            Descriptor::parse("\n = Circle"),
            Err(DescriptorError::EmptyKey { line: 2 })
        ));
        assert!(matches!(
            Descriptor::parse("Shape = Circle\nShape = Square"),
            Err(DescriptorError::DuplicateKey { line: 2, first_line: 1, .. })
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.properties");
        let err = Descriptor::load(&path).unwrap_err();
        assert!(matches!(err, DescriptorError::Io { .. }));
        assert!(err.to_string().contains("nope.properties"));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("types.properties");
        std::fs::write(&path, "Shape = Circle, Square\n").unwrap();
        let descriptor = Descriptor::load(&path).unwrap();
        assert_eq!(descriptor.entries()[0].subtypes, ["Circle", "Square"]);
    }
}
