//! References — use-sites of a Symbol (spec §3.1 "Reference").

use std::path::PathBuf;

use super::position::SourceRange;
use super::symbol::{ReferenceKind, SymbolId};

/// A single use-site of a Symbol.
#[derive(Debug, Clone)]
pub struct Reference {
    /// The Symbol being referenced.
    pub symbol: SymbolId,
    /// Absolute path of the file containing the use-site.
    pub file: PathBuf,
    /// The Symbol enclosing the use-site (the containing function, method
    /// or type), if any — `None` for references at package scope.
    pub containing_symbol: Option<SymbolId>,
    /// How the reference relates to its Symbol.
    pub kind: ReferenceKind,
    /// Source range of the use-site.
    pub range: SourceRange,
}
