//! Registry links for dependency names.
//!
//! Manifests are scanned with a small state machine threaded through a fold
//! over the classified lines. Lock files have no sections: every
//! `name = "<pkg>"` record is linked directly.

use crate::lexer::{LineKind, NameToken, Section, classify, lock_package_name};
use crate::registry::PYPI_PROJECT_URL;
use crate::types::{DependencyDeclaration, DependencyLink, SyntaxForm};
use uvls_core::SourceSpan;

/// Section the manifest scanner is currently in.
///
/// | line                                 | transition                       |
/// |--------------------------------------|----------------------------------|
/// | `[project]`                          | any → `Project`                  |
/// | `[dependencies]`, `[dev-dependencies]` | any → `Dependencies`           |
/// | other `[...]`                        | any → `Outside`                  |
/// | `dependencies = [`                   | `Project` → `ProjectArray`       |
/// | `]`                                  | `ProjectArray` → `Project`       |
///
/// Blank and comment lines never change the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Outside,
    Project,
    ProjectArray,
    Dependencies,
}

/// Tokens a line contributes in the state it was read in.
#[derive(Debug, PartialEq, Eq)]
pub enum Recognized<'k, 'a> {
    Nothing,
    Table(&'k NameToken<'a>),
    Array(&'k [NameToken<'a>]),
}

impl ScanState {
    /// Applies one classified line, returning the next state and what the
    /// line declares.
    ///
    /// # Examples
    ///
    /// ```
    /// use uvls_pyproject::lexer::classify;
    /// use uvls_pyproject::links::{Recognized, ScanState};
    ///
    /// let opener = classify("dependencies = [");
    /// let (state, found) = ScanState::Project.advance(&opener);
    /// assert_eq!(state, ScanState::ProjectArray);
    /// assert_eq!(found, Recognized::Nothing);
    /// ```
    pub fn advance<'k, 'a>(self, line: &'k LineKind<'a>) -> (Self, Recognized<'k, 'a>) {
        use Recognized::Nothing;

        match (self, line) {
            (_, LineKind::Blank | LineKind::Comment) => (self, Nothing),
            (_, LineKind::SectionHeader(Section::Project)) => (Self::Project, Nothing),
            (_, LineKind::SectionHeader(Section::Dependencies | Section::DevDependencies)) => {
                (Self::Dependencies, Nothing)
            }
            (_, LineKind::SectionHeader(Section::Other)) => (Self::Outside, Nothing),
            (Self::Project, LineKind::ArrayOpener(_)) => (Self::ProjectArray, Nothing),
            (Self::ProjectArray, LineKind::ArrayCloser) => (Self::Project, Nothing),
            (Self::ProjectArray, LineKind::ArrayEntries(entries)) => {
                (self, Recognized::Array(entries))
            }
            (Self::Dependencies, LineKind::TableEntry(token) | LineKind::ArrayOpener(token)) => {
                (self, Recognized::Table(token))
            }
            _ => (self, Nothing),
        }
    }
}

/// Returns every dependency the manifest scanner recognizes, in line order
/// and left to right within a line.
///
/// Unlike [`extract_dependencies`](crate::extract_dependencies) this covers
/// both `[project]` dependency arrays and `[dependencies]`/`[dev-dependencies]`
/// tables.
///
/// # Examples
///
/// ```
/// use uvls_pyproject::links::scan_declarations;
/// use uvls_pyproject::types::SyntaxForm;
///
/// let manifest = "[project]\ndependencies = [\n  \"numpy>=1.20\",\n  \"pandas\"\n]\n";
/// let deps = scan_declarations(manifest);
///
/// assert_eq!(deps.len(), 2);
/// assert_eq!(deps[0].name, "numpy");
/// assert_eq!(deps[0].version_constraint.as_deref(), Some(">=1.20"));
/// assert_eq!(deps[1].syntax_form, SyntaxForm::ArrayEntry);
/// ```
pub fn scan_declarations(text: &str) -> Vec<DependencyDeclaration> {
    let (_, declarations) = text.lines().enumerate().fold(
        (ScanState::default(), Vec::new()),
        |(state, mut declarations), (line_no, line)| {
            let kind = classify(line);
            let (next, recognized) = state.advance(&kind);

            match recognized {
                Recognized::Table(token) => {
                    declarations.push(declaration(line_no, token, SyntaxForm::TableEntry));
                }
                Recognized::Array(tokens) => declarations.extend(
                    tokens
                        .iter()
                        .map(|token| declaration(line_no, token, SyntaxForm::ArrayEntry)),
                ),
                Recognized::Nothing => {}
            }

            (next, declarations)
        },
    );

    declarations
}

fn declaration(
    line_no: usize,
    token: &NameToken<'_>,
    syntax_form: SyntaxForm,
) -> DependencyDeclaration {
    DependencyDeclaration {
        name: token.name.to_string(),
        version_constraint: token.constraint.map(str::to_string),
        source_span: SourceSpan::from_offsets(line_no, token.start, token.end),
        syntax_form,
    }
}

/// Builds the registry page URL for a package: base, name, trailing slash.
///
/// # Examples
///
/// ```
/// use uvls_pyproject::links::package_page_url;
///
/// assert_eq!(package_page_url("https://pypi.org/project/", "flask"), "https://pypi.org/project/flask/");
/// assert_eq!(package_page_url("https://mirror.local/project", "flask"), "https://mirror.local/project/flask/");
/// ```
pub fn package_page_url(base_url: &str, name: &str) -> String {
    format!("{}/{}/", base_url.trim_end_matches('/'), name)
}

/// Produces position-anchored registry links for manifests and lock files.
#[derive(Debug, Clone)]
pub struct LinkResolver {
    registry_url: String,
}

impl LinkResolver {
    pub fn new(registry_url: impl Into<String>) -> Self {
        Self {
            registry_url: registry_url.into(),
        }
    }

    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }

    /// Links every dependency declared in a pyproject.toml.
    pub fn manifest_links(&self, text: &str) -> Vec<DependencyLink> {
        let links: Vec<_> = scan_declarations(text)
            .into_iter()
            .map(|dep| self.link(dep.name, dep.source_span))
            .collect();

        tracing::debug!("resolved {} manifest links", links.len());
        links
    }

    /// Links every `name = "<pkg>"` record of a uv.lock.
    pub fn lock_links(&self, text: &str) -> Vec<DependencyLink> {
        let links: Vec<_> = text
            .lines()
            .enumerate()
            .filter_map(|(line_no, line)| {
                let token = lock_package_name(line)?;
                let span = SourceSpan::from_offsets(line_no, token.start, token.end);
                Some(self.link(token.name.to_string(), span))
            })
            .collect();

        tracing::debug!("resolved {} lock file links", links.len());
        links
    }

    fn link(&self, name: String, source_span: SourceSpan) -> DependencyLink {
        DependencyLink {
            target: package_page_url(&self.registry_url, &name),
            name,
            source_span,
        }
    }
}

impl Default for LinkResolver {
    fn default() -> Self {
        Self::new(PYPI_PROJECT_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link_names(links: &[DependencyLink]) -> Vec<&str> {
        links.iter().map(|l| l.name.as_str()).collect()
    }

    #[test]
    fn test_project_array_links() {
        let manifest = "[project]\ndependencies = [\n  \"numpy>=1.20\",\n  \"pandas\"\n]\n";
        let links = LinkResolver::default().manifest_links(manifest);

        assert_eq!(link_names(&links), ["numpy", "pandas"]);
        assert_eq!(links[0].target, "https://pypi.org/project/numpy/");
        assert_eq!(links[1].target, "https://pypi.org/project/pandas/");
        assert_eq!(links[0].source_span, SourceSpan::new(2, 3, 8));
        assert_eq!(links[1].source_span, SourceSpan::new(3, 3, 9));
    }

    #[test]
    fn test_commented_opener_emits_nothing() {
        let manifest = "# dependencies = [\n\"fake\"\n]";
        assert!(LinkResolver::default().manifest_links(manifest).is_empty());
    }

    #[test]
    fn test_commented_opener_inside_project() {
        let manifest = "[project]\n# dependencies = [\n\"fake\"\n]";
        assert!(scan_declarations(manifest).is_empty());
    }

    #[test]
    fn test_empty_inputs() {
        let resolver = LinkResolver::default();
        assert!(resolver.manifest_links("").is_empty());
        assert!(resolver.lock_links("").is_empty());
        assert!(scan_declarations("").is_empty());
    }

    #[test]
    fn test_dependencies_and_dev_tables() {
        let manifest = "[dependencies]\nrequests = \"2.31\"\n\n[dev-dependencies]\npytest = \"8\"\n";
        let deps = scan_declarations(manifest);

        let names: Vec<_> = deps.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["requests", "pytest"]);
        assert!(deps.iter().all(|d| d.syntax_form == SyntaxForm::TableEntry));
        assert_eq!(deps[1].version_constraint.as_deref(), Some("8"));
    }

    #[test]
    fn test_other_header_closes_sections() {
        let manifest = "[dependencies]\na = \"1\"\n[tool.uv]\nb = \"2\"\n[project]\n\"c\"\ndependencies = [\n\"d\"\n]\n\"e\"\n";
        let deps = scan_declarations(manifest);

        let names: Vec<_> = deps.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["a", "d"]);
    }

    #[test]
    fn test_header_inside_array_closes_it() {
        let manifest = "[project]\ndependencies = [\n\"a\",\n[tool]\n\"b\"\n]\n";
        let names: Vec<_> = scan_declarations(manifest)
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, ["a"]);
    }

    #[test]
    fn test_array_opener_in_dependencies_table_links_key() {
        let manifest = "[dependencies]\ndependencies = [\n\"numpy\"\n]\n";
        let deps = scan_declarations(manifest);

        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "dependencies");
        assert_eq!(deps[0].syntax_form, SyntaxForm::TableEntry);
    }

    #[test]
    fn test_table_entry_without_quoted_value_is_linked() {
        let manifest = "[dependencies]\ndjango = { version = \"4.2\" }\n";
        let deps = scan_declarations(manifest);
        assert_eq!(deps[0].name, "django");
        assert_eq!(deps[0].version_constraint, None);
    }

    #[test]
    fn test_project_table_entries_are_not_links() {
        let manifest = "[project]\nname = \"demo\"\nrequires-python = \">=3.10\"\n";
        assert!(scan_declarations(manifest).is_empty());
    }

    #[test]
    fn test_ordering_left_to_right() {
        let manifest = "[project]\ndependencies = [\n\"b\", \"a\",\n\"c\"\n]\n";
        let links = LinkResolver::default().manifest_links(manifest);
        assert_eq!(link_names(&links), ["b", "a", "c"]);
    }

    #[test]
    fn test_scan_is_idempotent() {
        let manifest = "[project]\ndependencies = [\n\"httpx>=0.27\",\n]\n[dependencies]\nflask = \"3\"\n";
        let resolver = LinkResolver::default();
        assert_eq!(resolver.manifest_links(manifest), resolver.manifest_links(manifest));
    }

    #[test]
    fn test_spans_roundtrip() {
        let manifest = "[project]\r\ndependencies = [\r\n    'rich~=13.7', \"typer[all]\"\r\n]\r\n[dev-dependencies]\r\n  ruff = \"0.5\"\r\n";
        let deps = scan_declarations(manifest);

        assert_eq!(deps.len(), 3);
        for dep in &deps {
            assert_eq!(dep.source_span.slice(manifest), Some(dep.name.as_str()));
        }
    }

    #[test]
    fn test_lock_links() {
        let lock = "version = 1\n\n[[package]]\nname = \"certifi\"\nversion = \"2024.2.2\"\n\n[[package]]\nname = \"charset-normalizer\"\n";
        let links = LinkResolver::default().lock_links(lock);

        assert_eq!(link_names(&links), ["certifi", "charset-normalizer"]);
        assert_eq!(links[0].source_span, SourceSpan::new(3, 8, 15));
        assert_eq!(
            links[1].target,
            "https://pypi.org/project/charset-normalizer/"
        );
    }

    #[test]
    fn test_custom_registry_url() {
        let resolver = LinkResolver::new("https://pypi.internal/project");
        let links = resolver.manifest_links("[dependencies]\nflask = \"3\"\n");
        assert_eq!(links[0].target, "https://pypi.internal/project/flask/");
        assert_eq!(resolver.registry_url(), "https://pypi.internal/project");
    }

    #[test]
    fn test_state_transitions() {
        let opener = classify("dependencies = [");
        let closer = classify("]");
        let project = classify("[project]");
        let other = classify("[build-system]");
        let comment = classify("# [project]");

        assert_eq!(ScanState::Outside.advance(&opener).0, ScanState::Outside);
        assert_eq!(ScanState::Outside.advance(&project).0, ScanState::Project);
        assert_eq!(ScanState::Project.advance(&opener).0, ScanState::ProjectArray);
        assert_eq!(ScanState::ProjectArray.advance(&closer).0, ScanState::Project);
        assert_eq!(ScanState::Project.advance(&closer).0, ScanState::Project);
        assert_eq!(ScanState::Dependencies.advance(&other).0, ScanState::Outside);
        assert_eq!(ScanState::ProjectArray.advance(&comment).0, ScanState::ProjectArray);
    }
}
