//! Files — one parsed source file (spec §3.1 "File").

use std::path::PathBuf;

use super::import::Import;
use super::symbol::SymbolId;

/// One parsed source file within a Package.
#[derive(Debug, Clone)]
pub struct File {
    /// Absolute path.
    pub path: PathBuf,
    /// File name without its directory component.
    pub basename: String,
    /// Import path of the owning Package.
    pub package: String,
    /// Symbols defined at file scope, in declaration order. Non-owning —
    /// the Package's symbol map is the sole owner (spec §3.2).
    pub symbols: Vec<SymbolId>,
    /// Imports declared in this file.
    pub imports: Vec<Import>,
    /// `true` if this file matches the source language's test-file naming
    /// convention (e.g. `*_test.go`); used by `LoadOptions::include_tests`
    /// (SPEC_FULL §4 C3 supplement).
    pub is_test_file: bool,
}

impl File {
    /// `true` if `sym` is recorded as defined in this file.
    pub fn defines(&self, sym: &SymbolId) -> bool {
        self.symbols.contains(sym)
    }
}

/// `true` if `basename` matches the Go test-file convention.
pub fn looks_like_test_file(basename: &str) -> bool {
    basename.ends_with("_test.go")
}
