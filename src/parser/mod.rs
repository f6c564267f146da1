//! The external parser seam (spec §6.1, component C3 collaborator) and its
//! one concrete implementation.
//!
//! Real type-checking (resolving identifiers to a stable type object with
//! identity equality) is explicitly out of scope for this engine — spec §1
//! calls the parser/type-checker an assumed external collaborator. What is
//! implemented here is a genuine syntactic extractor: a `SourceParser`
//! trait plus a `tree-sitter-go` backed implementation, so the seam has a
//! real binding rather than being left abstract. Grounded in the teacher's
//! `parser/mod.rs` (`ParseResult`, thread-local `Parser` reuse) and
//! `parser/symbols.rs` (tree-sitter `Query`/`QueryCursor` extraction style).

pub mod go_parser;

use std::path::PathBuf;

pub use go_parser::GoTreeSitterParser;

use crate::ir::{ReferenceKind, SymbolKind};

/// Options controlling what the parser extracts, threaded down from
/// `LoadOptions` (spec §4.3 "Input").
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Include `*_test.go` files in the returned file list.
    pub include_tests: bool,
    /// Skip files larger than this many bytes (SPEC_FULL §4 C3 supplement:
    /// `LoadOptions::max_file_bytes`, a resource bound for pathologically
    /// large generated files). `None` means unbounded.
    pub max_file_bytes: Option<u64>,
}

/// A symbol extracted from one file, before it has been interned into the
/// IR (parent-linking and ID assignment happen in the Loader, spec §4.3
/// step 5/"Parent-linking pass").
#[derive(Debug, Clone)]
pub struct ExtractedSymbol {
    /// Declared name.
    pub name: String,
    /// Syntactic category.
    pub kind: SymbolKind,
    /// For Method symbols: the receiver type's base name (pointer
    /// unwrapped — spec §4.3 step 5).
    pub receiver_type: Option<String>,
    /// For Field symbols: the enclosing struct's name. For interface
    /// Method symbols: the enclosing interface's name.
    pub parent_name: Option<String>,
    /// Byte offset of the declaration's first character.
    pub start_offset: usize,
    /// Byte offset one past the declaration's last character.
    pub end_offset: usize,
    /// For Method symbols: a canonical `(paramType,paramType)(resultTypes)`
    /// signature string, parameter names stripped — enough to detect
    /// structurally-identical methods across types for the interface
    /// extractor's bipartite grouping (spec §4.9), without a real
    /// type-checker's resolved signatures.
    pub signature: Option<String>,
}

/// A syntactic use-site found while scanning a declaration body (spec
/// §3.1 "Reference"), before symbol resolution. The Loader resolves
/// `name`/`qualifier` against the Module's interned Symbols once every
/// package has been scanned (spec §4.3: "References (per-file scan, after
/// all Symbols are interned)").
///
/// Resolution here is purely syntactic — it does not have a real
/// type-checker's identity equality to fall back on (spec §1 treats the
/// type-checker as an external, out-of-scope collaborator), so a bare
/// identifier reference whose name does not match any known Symbol (e.g. a
/// local variable or a method call through an unresolved receiver type) is
/// simply dropped by the Loader rather than fabricating a guess.
#[derive(Debug, Clone)]
pub struct ExtractedReference {
    /// The identifier actually used (the selector's field, or the bare
    /// name).
    pub name: String,
    /// For `qualifier.name` selector expressions: the qualifier text
    /// (an import alias/package name, or a receiver variable name — the
    /// two are indistinguishable without type information).
    pub qualifier: Option<String>,
    /// How this use-site relates to the eventual Symbol.
    pub kind: ReferenceKind,
    /// Declared name of the enclosing Function/Method/Type, if any.
    pub enclosing_name: Option<String>,
    /// Byte offset of the reference's first character.
    pub start_offset: usize,
    /// Byte offset one past the reference's last character.
    pub end_offset: usize,
}

/// A single `import` statement extracted from a file.
#[derive(Debug, Clone)]
pub struct ExtractedImport {
    /// Import path string.
    pub target: String,
    /// Local binding name, if the import was aliased.
    pub alias: Option<String>,
    /// Byte offset of the import declaration's first character.
    pub start_offset: usize,
    /// Byte offset one past the import declaration's last character.
    pub end_offset: usize,
}

/// Everything extracted from one source file. The AST itself is not
/// retained (same memory-budget rationale the teacher documents in its own
/// `ParseResult`: ASTs are dropped once extraction is done).
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Absolute path.
    pub path: PathBuf,
    /// File name without directory component.
    pub basename: String,
    /// Full UTF-8 source text, kept only long enough to register the
    /// Module's position table and then dropped by the Loader.
    pub source: String,
    /// Top-level and child symbols found in the file.
    pub symbols: Vec<ExtractedSymbol>,
    /// Imports found in the file.
    pub imports: Vec<ExtractedImport>,
    /// Syntactic use-sites found in declaration bodies and signatures,
    /// not yet resolved to a Symbol.
    pub references: Vec<ExtractedReference>,
    /// `true` if the file matches the test-file naming convention.
    pub is_test_file: bool,
}

/// Everything extracted from one package directory (spec §6.1
/// `ParsedPackage`).
#[derive(Debug, Clone, Default)]
pub struct ParsedPackage {
    /// Declared package name (from the `package` clause).
    pub name: String,
    /// Every file the parser accepted.
    pub files: Vec<ParsedFile>,
    /// Per-file parse errors; a file that errored is dropped from `files`
    /// but recorded here so the Loader can report it without aborting the
    /// rest of the load (spec §4.3 step 2, §7).
    pub errors: Vec<String>,
}

/// The external parser/type-checker seam (spec §6.1).
///
/// Implementations must isolate panics internally — a single malformed
/// declaration must not prevent the rest of a package from loading
/// (spec §4.3 step 6).
pub trait SourceParser: Send + Sync {
    /// Parse every source file directly inside `dir` (non-recursive — the
    /// Loader walks subdirectories itself, since each becomes its own
    /// Package) and return the extracted package.
    fn load_package(&self, dir: &std::path::Path, opts: &ParseOptions) -> ParsedPackage;
}
