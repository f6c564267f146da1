//! Symbols — named declarations (spec §3.1 "Symbol").

use std::fmt;

use super::position::SourceRange;
use super::reference::Reference;

/// A stable, string-keyed symbol identifier: `package-path "." [parent-name
/// "."] name`. Unique within a Module (spec §3.1 invariant).
///
/// Newtyped (rather than a bare `String`) so the Index's seven projection
/// maps and the IR's uniqueness invariant are enforced at the type level —
/// a `HashMap<SymbolId, _>` can't accidentally be keyed by a plain display
/// name (see SPEC_FULL §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub String);

impl SymbolId {
    /// Build the canonical ID for a top-level symbol: `pkg.name`.
    pub fn top_level(package_path: &str, name: &str) -> Self {
        Self(format!("{package_path}.{name}"))
    }

    /// Build the canonical ID for a symbol with a parent (method receiver,
    /// struct field): `pkg.parent.name`.
    pub fn with_parent(package_path: &str, parent_name: &str, name: &str) -> Self {
        Self(format!("{package_path}.{parent_name}.{name}"))
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SymbolId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for SymbolId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The syntactic category of a Symbol (spec §3.1; closed set per §9
/// "tagged-variant enums for closed sets").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Top-level function declaration.
    Function,
    /// Method with a receiver.
    Method,
    /// Type declaration (alias or named type that is neither struct nor interface).
    Type,
    /// Struct (record) type declaration.
    Struct,
    /// Interface type declaration.
    Interface,
    /// A struct field.
    Field,
    /// A package-level variable.
    Variable,
    /// A package-level constant.
    Constant,
    /// A function or method parameter.
    Parameter,
    /// An import declaration (mirrors `Import` for uniform Index treatment).
    Import,
    /// The package clause itself.
    Package,
}

/// A use-site kind, distinguishing how a Reference relates to its Symbol.
/// Consumed by the dependency-graph analyzer's per-kind edge counters
/// (spec §4.7 "Dependency graph").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// A value read (identifier used as an expression).
    Read,
    /// A value written (assignment target).
    Write,
    /// A function or method call.
    Call,
    /// A use of a Symbol as a type (annotation, field type, parameter type).
    TypeUse,
    /// A struct embedding another type (anonymous field).
    Embed,
}

/// A named declaration (spec §3.1 "Symbol").
#[derive(Debug, Clone)]
pub struct Symbol {
    /// Stable, Module-unique identifier.
    pub id: SymbolId,
    /// Display name as written in source.
    pub name: String,
    /// Syntactic category.
    pub kind: SymbolKind,
    /// Absolute path of the owning File.
    pub file: std::path::PathBuf,
    /// Import path of the owning Package.
    pub package: String,
    /// For methods: the receiver type symbol. For fields: the enclosing
    /// struct symbol. `None` for everything else, or for a Method whose
    /// receiver type could not be resolved (see `orphan`).
    pub parent: Option<SymbolId>,
    /// `true` if `parent` is expected to be absent because the symbol is a
    /// Method whose receiver type lives outside this Module (spec §4.2
    /// invariant: "explicitly flagged as orphan… permitted only for
    /// receivers whose types are external").
    pub orphan: bool,
    /// Source range of the declaration.
    pub range: SourceRange,
    /// Derived from the display name per the source-language export rule
    /// (uppercase initial); recomputed on rename (spec §3.1 invariant).
    pub exported: bool,
    /// Incoming use-sites, owned by the Symbol (spec §3.2).
    pub references: Vec<Reference>,
}

impl Symbol {
    /// Recompute `exported` from `name` using the Go convention: exported
    /// iff the first character is uppercase.
    pub fn recompute_exported(&mut self) {
        self.exported = is_exported_name(&self.name);
    }
}

/// The source-language exported-name rule (spec §3.1, §4.3 step 5: "first
/// character is not uppercase").
pub fn is_exported_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}
