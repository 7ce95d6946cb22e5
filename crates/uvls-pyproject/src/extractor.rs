//! Dependency extraction from `[dependencies]` tables.
//!
//! Only the table form is recognized here; array-style
//! `dependencies = [ ... ]` blocks are the link resolver's concern.

use crate::lexer::{LineKind, Section, classify, scan_table_assignments};
use crate::types::{DependencyDeclaration, SyntaxForm};
use uvls_core::SourceSpan;

/// Returns every `name = "value"` declaration found in `[dependencies]` tables.
///
/// A table runs from a line whose trimmed content is `[dependencies]` up to the
/// next line starting with `[` or the end of the text. A header followed by a
/// comment, such as `[tool.uv] # settings`, therefore ends the table too. Several tables are scanned in
/// order and their entries concatenated. Duplicates are kept, and lines that
/// do not match are skipped.
///
/// # Examples
///
/// ```
/// use uvls_pyproject::extract_dependencies;
///
/// let manifest = "[dependencies]\nrequests = \"2.31.0\"\nflask='2.0.0'\n[tool]\n";
/// let deps = extract_dependencies(manifest);
///
/// let names: Vec<_> = deps.iter().map(|d| d.name.as_str()).collect();
/// assert_eq!(names, ["requests", "flask"]);
/// assert_eq!(deps[1].version_constraint.as_deref(), Some("2.0.0"));
/// ```
pub fn extract_dependencies(text: &str) -> Vec<DependencyDeclaration> {
    let mut declarations = Vec::new();
    let mut in_table = false;

    for (line_no, line) in text.lines().enumerate() {
        match classify(line) {
            LineKind::SectionHeader(section) => {
                in_table = section == Section::Dependencies;
                continue;
            }
            LineKind::Comment | LineKind::Blank => continue,
            LineKind::Other if line.trim_start().starts_with('[') => {
                in_table = false;
                continue;
            }
            _ if !in_table => continue,
            _ => {}
        }

        declarations.extend(scan_table_assignments(line).into_iter().map(|token| {
            DependencyDeclaration {
                name: token.name.to_string(),
                version_constraint: token.constraint.map(str::to_string),
                source_span: SourceSpan::from_offsets(line_no, token.start, token.end),
                syntax_form: SyntaxForm::TableEntry,
            }
        }));
    }

    tracing::debug!("extracted {} table dependencies", declarations.len());
    declarations
}
