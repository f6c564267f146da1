//! Modules — a cohesive collection of source packages (spec §3.1 "Module").

use std::collections::HashMap;
use std::path::PathBuf;

use super::package::Package;
use super::position::PositionTable;
use crate::error::{Error, Result};
use crate::manifest::Replacement;

/// A unit with a manifest: an import path, root directory, source-language
/// version, and the Packages it contains.
pub struct Module {
    /// Import path (e.g. `example.com/foo`).
    pub import_path: String,
    /// Absolute root directory.
    pub root: PathBuf,
    /// Source-language version declared in the manifest (e.g. `"1.21"`).
    pub language_version: String,
    /// Direct dependency requirements, `import_path -> version`.
    pub requires: HashMap<String, String>,
    /// Replacement rules read from the manifest.
    pub replacements: Vec<Replacement>,
    /// Packages, keyed by import path (exclusive ownership, spec §3.2).
    pub packages: HashMap<String, Package>,
    /// Position table shared by every File in this Module.
    pub positions: PositionTable,
}

impl Module {
    /// Create an empty Module shell (the Loader populates `packages`).
    pub fn new(import_path: String, root: PathBuf) -> Self {
        Self {
            import_path,
            root,
            language_version: String::new(),
            requires: HashMap::new(),
            replacements: Vec::new(),
            packages: HashMap::new(),
            positions: PositionTable::new(),
        }
    }

    /// Check the invariants spec §4.2 requires after a build:
    /// - No two Symbols share an ID within the Module.
    /// - Every Method Symbol either resolves its parent within the same
    ///   Package, or is flagged `orphan`.
    pub fn check_invariants(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for pkg in self.packages.values() {
            for (id, sym) in &pkg.symbols {
                if !seen.insert(id.clone()) {
                    return Err(Error::InternalInvariantViolation(format!(
                        "duplicate symbol id within module: {id}"
                    )));
                }
                if matches!(sym.kind, crate::ir::symbol::SymbolKind::Method)
                    && sym.parent.is_none()
                    && !sym.orphan
                {
                    return Err(Error::InternalInvariantViolation(format!(
                        "method {id} has no parent and is not flagged orphan"
                    )));
                }
                if let Some(parent) = &sym.parent {
                    if !pkg.symbols.contains_key(parent) {
                        return Err(Error::InternalInvariantViolation(format!(
                            "symbol {id} has dangling parent {parent}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Total symbol count across every Package.
    pub fn symbol_count(&self) -> usize {
        self.packages.values().map(|p| p.symbols.len()).sum()
    }

    /// Total file count across every Package.
    pub fn file_count(&self) -> usize {
        self.packages.values().map(|p| p.files.len()).sum()
    }
}
