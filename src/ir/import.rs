//! Imports — dependency declarations inside a File (spec §3.1 "Import").

use super::position::SourceRange;

/// A single `import` declaration inside a File.
#[derive(Debug, Clone)]
pub struct Import {
    /// The target import path as written in source.
    pub target: String,
    /// Optional local binding name (e.g. a renamed import `alias "pkg"`).
    pub alias: Option<String>,
    /// Source range of the import declaration.
    pub range: SourceRange,
}
