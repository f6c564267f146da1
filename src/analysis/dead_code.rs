//! Dead-code detector (spec §4.7 "Dead-code detector").

use std::path::PathBuf;

use super::usage::UsageCollector;
use crate::index::Index;
use crate::ir::{Symbol, SymbolId, SymbolKind};

/// Options governing what the dead-code detector considers (spec §4.7).
#[derive(Debug, Clone, Default)]
pub struct DeadCodeOptions {
    /// Skip exported symbols entirely.
    pub ignore_exported: bool,
    /// Skip the `main` entry-point function.
    pub ignore_main: bool,
    /// Skip `TestXxx` functions.
    pub ignore_tests: bool,
    /// Lower confidence for exported methods/fields, on the theory they
    /// may be used only via reflection (serialization, RPC dispatch) that
    /// this engine's syntactic References can't see.
    pub consider_reflection: bool,
    /// Files to skip entirely (generated code, vendored sources).
    pub excluded_files: Vec<PathBuf>,
}

/// One dead-code finding: a Symbol with no incoming reference, plus a
/// confidence score.
#[derive(Debug, Clone)]
pub struct DeadCodeFinding {
    /// The unreferenced Symbol.
    pub symbol: SymbolId,
    /// Confidence the symbol is genuinely dead, 0-100.
    pub confidence: u8,
}

/// `true` if `sym` is the package `main`'s entry-point function.
pub fn is_main_function(sym: &Symbol) -> bool {
    sym.kind == SymbolKind::Function && sym.name == "main" && sym.parent.is_none()
}

/// `true` if `sym` is a package `init` function (always called implicitly
/// by the runtime, never by a syntactic reference).
pub fn is_init_function(sym: &Symbol) -> bool {
    sym.kind == SymbolKind::Function && sym.name == "init"
}

/// `true` if `sym` matches the `TestXxx` naming convention (called by the
/// test runner, not by any reference this engine can see).
pub fn is_test_function(sym: &Symbol) -> bool {
    sym.kind == SymbolKind::Function
        && sym
            .name
            .strip_prefix("Test")
            .is_some_and(|rest| rest.chars().next().is_some_and(|c| c.is_uppercase()))
}

/// Whether `sym` should be considered by the detector at all (spec §4.7
/// `needs_analysis`).
pub fn needs_analysis(sym: &Symbol, opts: &DeadCodeOptions) -> bool {
    if opts.ignore_exported && sym.exported {
        return false;
    }
    if opts.ignore_main && is_main_function(sym) {
        return false;
    }
    if is_init_function(sym) {
        return false;
    }
    if opts.ignore_tests && is_test_function(sym) {
        return false;
    }
    if opts.excluded_files.iter().any(|f| f == &sym.file) {
        return false;
    }
    true
}

/// Whether `sym` is an entry point the runtime calls implicitly — never
/// reportable as dead regardless of `ignore_main`/`ignore_exported` (spec
/// §4.7 `is_entry_point`).
pub fn is_entry_point(sym: &Symbol, opts: &DeadCodeOptions) -> bool {
    is_main_function(sym) || is_init_function(sym) || (!opts.ignore_tests && is_test_function(sym))
}

fn confidence(sym: &Symbol, opts: &DeadCodeOptions) -> u8 {
    if opts.consider_reflection && sym.exported && matches!(sym.kind, SymbolKind::Method | SymbolKind::Field) {
        60
    } else {
        90
    }
}

/// Finds Symbols with no recorded incoming reference, per `opts`.
pub struct DeadCodeDetector;

impl DeadCodeDetector {
    /// Run the detector over `index`.
    pub fn find_dead_code(index: &Index, opts: &DeadCodeOptions) -> Vec<DeadCodeFinding> {
        let collector = UsageCollector::new(index);
        collector
            .unreferenced()
            .into_iter()
            .filter(|s| needs_analysis(s, opts))
            .filter(|s| !is_entry_point(s, opts))
            .map(|s| DeadCodeFinding { symbol: s.id.clone(), confidence: confidence(s, opts) })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::RealFilesystem;
    use crate::loader::{load, LoadOptions};
    use crate::parser::go_parser::GoTreeSitterParser;
    use std::fs;

    #[test]
    fn finds_one_unreferenced_unexported_function() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("go.mod"), "module example.com/app\n\ngo 1.21\n").unwrap();
        fs::write(
            dir.path().join("app.go"),
            "package app\n\nfunc helper() int {\n\treturn 1\n}\n\nfunc Exported() int {\n\treturn 2\n}\n",
        )
        .unwrap();
        let parser = GoTreeSitterParser::new();
        let module = load(dir.path(), &parser, &RealFilesystem, &LoadOptions { include_private: true, ..LoadOptions::default() })
            .unwrap()
            .module;
        let index = Index::build(&[&module]);

        let opts = DeadCodeOptions { ignore_exported: true, ..DeadCodeOptions::default() };
        let findings = DeadCodeDetector::find_dead_code(&index, &opts);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].symbol, SymbolId::top_level("example.com/app", "helper"));
        assert_eq!(findings[0].confidence, 90);
    }

    #[test]
    fn main_is_never_reported_dead() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("go.mod"), "module example.com/app\n\ngo 1.21\n").unwrap();
        fs::write(dir.path().join("app.go"), "package app\n\nfunc main() {}\n").unwrap();
        let parser = GoTreeSitterParser::new();
        let module = load(dir.path(), &parser, &RealFilesystem, &LoadOptions { include_private: true, ..LoadOptions::default() })
            .unwrap()
            .module;
        let index = Index::build(&[&module]);

        let findings = DeadCodeDetector::find_dead_code(&index, &DeadCodeOptions::default());
        assert!(findings.is_empty());
    }
}
