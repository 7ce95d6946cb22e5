//! Line classifier for pyproject.toml and uv.lock text.
//!
//! Every grammar assumption the scanners rely on lives here: what counts as a
//! section header, how an array block opens and closes, and which characters
//! make up a package name. The extractor and the link resolver only ever look
//! at [`LineKind`] values and the [`NameToken`]s they carry.
//!
//! Columns are byte offsets into the untrimmed line.

use uvls_core::is_name_char;

/// Bracketed section header recognized by the scanners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// `[project]`
    Project,
    /// `[dependencies]`
    Dependencies,
    /// `[dev-dependencies]`
    DevDependencies,
    /// Any other `[...]` header, including array-of-tables headers
    Other,
}

impl Section {
    fn from_header(header: &str) -> Self {
        match header {
            "[project]" => Self::Project,
            "[dependencies]" => Self::Dependencies,
            "[dev-dependencies]" => Self::DevDependencies,
            _ => Self::Other,
        }
    }
}

/// A package name found on a line, with whatever followed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameToken<'a> {
    pub name: &'a str,
    /// Byte column of the first name character
    pub start: usize,
    /// Byte column one past the last name character
    pub end: usize,
    /// Quoted value of a table entry, or the rest of an array literal
    pub constraint: Option<&'a str>,
}

/// Classification of a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    /// First non-whitespace character is `#`
    Comment,
    /// The whole trimmed line is `[...]`
    SectionHeader(Section),
    /// Exactly `dependencies = [`; carries the `dependencies` key token
    ArrayOpener(NameToken<'a>),
    /// Exactly `]`
    ArrayCloser,
    /// `name = ...` at the start of the line
    TableEntry(NameToken<'a>),
    /// One or more quoted requirement strings, e.g. `"numpy>=1.20", "pandas",`
    ArrayEntries(Vec<NameToken<'a>>),
    Other,
}

/// Classifies one line of manifest text.
///
/// # Examples
///
/// ```
/// use uvls_pyproject::lexer::{classify, LineKind, Section};
///
/// assert_eq!(classify("[project]"), LineKind::SectionHeader(Section::Project));
/// assert_eq!(classify("  # dependencies = ["), LineKind::Comment);
///
/// let LineKind::TableEntry(token) = classify("requests = \"2.31.0\"") else {
///     panic!("expected a table entry");
/// };
/// assert_eq!(token.name, "requests");
/// assert_eq!(token.constraint, Some("2.31.0"));
/// ```
pub fn classify(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();
    let indent = line.len() - line.trim_start().len();

    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if trimmed.starts_with('#') {
        return LineKind::Comment;
    }
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        return LineKind::SectionHeader(Section::from_header(trimmed));
    }
    if trimmed == "]" {
        return LineKind::ArrayCloser;
    }
    if trimmed == "dependencies = [" {
        let key = NameToken {
            name: "dependencies",
            start: indent,
            end: indent + "dependencies".len(),
            constraint: None,
        };
        return LineKind::ArrayOpener(key);
    }
    if let Some(token) = table_key(line, indent) {
        return LineKind::TableEntry(token);
    }
    if trimmed.starts_with(['"', '\'']) {
        let entries = array_entries(line, indent);
        if !entries.is_empty() {
            return LineKind::ArrayEntries(entries);
        }
    }

    LineKind::Other
}

/// Finds every `name = "value"` (or single-quoted) assignment on a line.
///
/// Unlike [`classify`], matches are not anchored to the start of the line, so
/// inline tables such as `a = "1", b = "2"` yield one token per key. Empty
/// values are not matched and scanning stops at a `#` outside of a value.
///
/// # Examples
///
/// ```
/// use uvls_pyproject::lexer::scan_table_assignments;
///
/// let tokens = scan_table_assignments("flask='2.0.0'  # web");
/// assert_eq!(tokens.len(), 1);
/// assert_eq!((tokens[0].name, tokens[0].start, tokens[0].end), ("flask", 0, 5));
/// assert_eq!(tokens[0].constraint, Some("2.0.0"));
/// ```
pub fn scan_table_assignments(line: &str) -> Vec<NameToken<'_>> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(rel) = line[pos..].find(|c: char| is_name_char(c) || c == '#') {
        let start = pos + rel;
        if line[start..].starts_with('#') {
            break;
        }

        let end = name_end(line, start);
        match quoted_assignment(line, end) {
            Some((value_start, value_end)) => {
                tokens.push(NameToken {
                    name: &line[start..end],
                    start,
                    end,
                    constraint: Some(&line[value_start..value_end]),
                });
                pos = value_end + 1;
            }
            None => pos = end,
        }
    }

    tokens
}

/// Extracts the package name from a lock file `name = "<pkg>"` line.
///
/// Only lines that begin exactly with `name = "` are considered; the returned
/// token covers the value, not the key.
///
/// # Examples
///
/// ```
/// use uvls_pyproject::lexer::lock_package_name;
///
/// let token = lock_package_name("name = \"charset-normalizer\"").unwrap();
/// assert_eq!(token.name, "charset-normalizer");
/// assert_eq!(token.start, 8);
///
/// assert!(lock_package_name("version = \"3.3.2\"").is_none());
/// assert!(lock_package_name("  name = \"indented\"").is_none());
/// ```
pub fn lock_package_name(line: &str) -> Option<NameToken<'_>> {
    const PREFIX: &str = "name = \"";

    let rest = line.strip_prefix(PREFIX)?;
    let len = rest.find(|c: char| !is_name_char(c))?;
    if len == 0 || !rest[len..].starts_with('"') {
        return None;
    }

    let start = PREFIX.len();
    Some(NameToken {
        name: &rest[..len],
        start,
        end: start + len,
        constraint: None,
    })
}

/// Byte offset one past the identifier run starting at `start`.
fn name_end(line: &str, start: usize) -> usize {
    line[start..]
        .find(|c: char| !is_name_char(c))
        .map_or(line.len(), |len| start + len)
}

/// Matches `\s*=` after a key at the start of the trimmed line.
fn table_key(line: &str, indent: usize) -> Option<NameToken<'_>> {
    let end = name_end(line, indent);
    if end == indent {
        return None;
    }

    let after_key = line[end..].trim_start();
    let value = after_key.strip_prefix('=')?.trim_start();

    let constraint = value
        .chars()
        .next()
        .filter(|c| matches!(c, '"' | '\''))
        .and_then(|quote| {
            let body = &value[1..];
            body.find(quote).map(|close| &body[..close])
        });

    Some(NameToken {
        name: &line[indent..end],
        start: indent,
        end,
        constraint,
    })
}

/// Matches `\s*=\s*` then a non-empty value in `"` or `'` quotes after `from`.
///
/// Returns the byte range of the value. As with the quote handling of the
/// manifest grammar, either quote character closes the value.
fn quoted_assignment(line: &str, from: usize) -> Option<(usize, usize)> {
    let rest = &line[from..];
    let after_eq = rest.trim_start().strip_prefix('=')?;
    let value = after_eq.trim_start();
    let body = value.strip_prefix(['"', '\''])?;

    let value_start = line.len() - body.len();
    let len = body.find(['"', '\''])?;
    if len == 0 {
        return None;
    }

    Some((value_start, value_start + len))
}

/// Collects the quoted requirement strings of an array-entry line.
///
/// Literals are separated by commas and whitespace; a `#` or any other
/// unexpected character ends the scan.
fn array_entries(line: &str, indent: usize) -> Vec<NameToken<'_>> {
    let mut entries = Vec::new();
    let mut pos = indent;

    loop {
        let rest = &line[pos..];
        let skipped = rest.len() - rest.trim_start_matches([' ', '\t', ',']).len();
        pos += skipped;

        let Some(quote) = line[pos..].chars().next().filter(|c| matches!(c, '"' | '\''))
        else {
            break;
        };

        let body_start = pos + 1;
        let Some(len) = line[body_start..].find(quote) else {
            break;
        };
        let body_end = body_start + len;

        let name_stop = name_end(line, body_start).min(body_end);
        if name_stop > body_start {
            let trailing = line[name_stop..body_end].trim();
            entries.push(NameToken {
                name: &line[body_start..name_stop],
                start: body_start,
                end: name_stop,
                constraint: (!trailing.is_empty()).then_some(trailing),
            });
        }

        pos = body_end + 1;
    }

    entries
}
