//! Packages — a directory of source files sharing a declared name
//! (spec §3.1 "Package").

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::file::File;
use super::symbol::{Symbol, SymbolId, SymbolKind};

/// Opaque per-package type information handed back by the external parser
/// seam (spec §6.1 `types_info`). Kept intentionally small: a map from
/// Symbol ID to a canonical signature string, enough for the interface
/// extractor's bipartite grouping (spec §4.9) and the TypeBridge's
/// implementer lookup (spec §4.6) without depending on a real type checker.
#[derive(Debug, Clone, Default)]
pub struct TypeInfo {
    /// Canonical signature string per Symbol ID (e.g. a method's parameter/
    /// return shape), used to detect structurally-identical methods across
    /// types.
    pub signatures: HashMap<SymbolId, String>,
}

/// A directory of source files sharing a declared package name.
pub struct Package {
    /// Declared package name (e.g. `foo` for `package foo`).
    pub name: String,
    /// Fully-qualified import path (e.g. `example.com/repo/foo`).
    pub import_path: String,
    /// Absolute directory path.
    pub directory: PathBuf,
    /// Import path of the owning Module.
    pub module: String,
    /// Files, keyed by absolute path (exclusive ownership, spec §3.2).
    pub files: HashMap<PathBuf, File>,
    /// Symbols, keyed by stable ID (exclusive ownership, spec §3.2).
    pub symbols: HashMap<SymbolId, Symbol>,
    /// Opaque type information from the external parser.
    pub type_info: TypeInfo,
}

impl Package {
    /// Create an empty package.
    pub fn new(name: String, import_path: String, directory: PathBuf, module: String) -> Self {
        Self {
            name,
            import_path,
            directory,
            module,
            files: HashMap::new(),
            symbols: HashMap::new(),
            type_info: TypeInfo::default(),
        }
    }

    /// Linear scan for symbols by display name, restricted to `kinds`
    /// (empty `kinds` means "any kind") — spec §4.2 `symbol_by_name`.
    pub fn symbol_by_name(&self, name: &str, kinds: &[SymbolKind]) -> Vec<&Symbol> {
        self.symbols
            .values()
            .filter(|s| s.name == name)
            .filter(|s| kinds.is_empty() || kinds.contains(&s.kind))
            .collect()
    }

    /// Look up a File by canonicalized absolute path — spec §4.2
    /// `file_by_path`.
    pub fn file_by_path(&self, path: &Path) -> Option<&File> {
        self.files.get(path)
    }

    /// Insert a Symbol into this Package, maintaining the owning File's
    /// ordered symbol list atomically (spec §4.2 `add_symbol`).
    pub fn add_symbol(&mut self, sym: Symbol) {
        let id = sym.id.clone();
        let file_path = sym.file.clone();
        self.symbols.insert(id.clone(), sym);
        if let Some(file) = self.files.get_mut(&file_path) {
            if !file.symbols.contains(&id) {
                file.symbols.push(id);
            }
        }
    }

    /// Remove a Symbol, cascading to clear any Reference lists that
    /// pointed at it (the removal of the *referencing* symbols' own
    /// Reference entries is the Index's job during rebuild — spec §4.2
    /// `remove_symbol` only owns the Package/File-side bookkeeping).
    pub fn remove_symbol(&mut self, id: &SymbolId) -> Option<Symbol> {
        let removed = self.symbols.remove(id)?;
        if let Some(file) = self.files.get_mut(&removed.file) {
            file.symbols.retain(|s| s != id);
        }
        Some(removed)
    }
}
