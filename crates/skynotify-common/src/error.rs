//! Error types for preference validation, persistence and the config store

use miette::Diagnostic;
use smol_str::SmolStr;
use std::error::Error as StdError;
use std::fmt;

/// Dotted path to a field inside a preference document, e.g. `like.include`.
///
/// The empty path refers to the document itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<SmolStr>);

impl FieldPath {
    /// Path of the document root
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path of a named child of this path
    pub fn child(&self, name: impl Into<SmolStr>) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    /// Path segments, outermost first
    pub fn segments(&self) -> &[SmolStr] {
        &self.0
    }

    /// Whether this is the document root
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl From<&str> for FieldPath {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            return Self::root();
        }
        Self(value.split('.').map(SmolStr::new).collect())
    }
}

/// Why a single field failed validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IssueKind {
    /// A required field is absent
    #[error("required field is missing")]
    Missing,
    /// The field holds the wrong JSON type
    #[error("expected {expected}, found {found}")]
    WrongType {
        /// JSON type the schema requires
        expected: &'static str,
        /// JSON type actually present
        found: &'static str,
    },
    /// A string outside its closed set of values
    #[error("{value:?} is not one of {allowed:?}")]
    InvalidEnum {
        /// Value that was found
        value: SmolStr,
        /// Values the schema accepts
        allowed: &'static [&'static str],
    },
    /// A field the schema does not know about
    #[error("unknown field")]
    UnknownField,
    /// The in-memory document could not be turned into JSON
    #[error("document could not be encoded: {0}")]
    Unencodable(SmolStr),
}

/// A single validation problem, located by field path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
#[error("{path}: {kind}")]
#[diagnostic(code(skynotify::schema::issue))]
pub struct Issue {
    /// Where the problem is
    pub path: FieldPath,
    /// What the problem is
    pub kind: IssueKind,
}

impl Issue {
    /// Create an issue at `path`
    pub fn new(path: FieldPath, kind: IssueKind) -> Self {
        Self { path, kind }
    }
}

/// A candidate document did not match the notification preference schema.
///
/// Validation is all-or-nothing and collects every issue it finds, so a
/// single error can be logged in full.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
#[error("invalid notification preferences: {}", summarize(.issues))]
#[diagnostic(
    code(skynotify::schema::invalid),
    help("every preference must be present with boolean `list`/`push` flags, and `include` must be \"all\" or \"follows\"")
)]
pub struct ValidationError {
    /// All problems found, in document order
    #[related]
    pub issues: Vec<Issue>,
}

impl ValidationError {
    /// Wrap a list of issues
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    /// Whether any issue sits at exactly this path
    pub fn has_issue_at(&self, path: &str) -> bool {
        let path = FieldPath::from(path);
        self.issues.iter().any(|issue| issue.path == path)
    }
}

fn summarize(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors emitted by key-value stores.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum StoreError {
    /// Filesystem or I/O error
    #[error("I/O error: {0}")]
    #[diagnostic(code(skynotify::store::io))]
    Io(#[from] std::io::Error),
    /// The backing file is not valid JSON
    #[error("serialization error: {0}")]
    #[diagnostic(code(skynotify::store::serde))]
    Serde(#[from] serde_json::Error),
    /// The store cannot currently be used (poisoned lock, storage disabled, ...)
    #[error("storage unavailable: {0}")]
    #[diagnostic(code(skynotify::store::unavailable))]
    Unavailable(SmolStr),
    /// Any other error from a backend implementation
    #[error(transparent)]
    #[diagnostic(code(skynotify::store::other))]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

/// Errors from loading or saving the preference document
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ConfigError {
    /// The document does not match the schema
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    /// The stored value is not JSON at all
    #[error("stored preferences are not valid JSON: {0}")]
    #[diagnostic(code(skynotify::config::parse))]
    Parse(#[source] serde_json::Error),

    /// The document could not be serialized
    #[error("preferences could not be encoded: {0}")]
    #[diagnostic(code(skynotify::config::encode))]
    Encode(#[source] serde_json::Error),

    /// The persistence layer failed
    #[error("storage error: {0}")]
    #[diagnostic(code(skynotify::config::store))]
    Store(
        #[from]
        #[diagnostic_source]
        StoreError,
    ),
}
