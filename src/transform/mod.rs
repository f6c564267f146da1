//! The transform framework (spec §4.8, component C8) and its concrete
//! transformers (spec §4.9, component C9).
//!
//! No direct teacher analogue exists for a mutating transform pipeline —
//! the teacher is a read-only analysis tool. This framework is designed
//! from spec §4.8/§4.9 directly, in the teacher's idiom: a small sealed
//! trait at the seam (mirroring `SourceParser`/`Toolchain`), a `Result`
//! threaded through with `?`, and a `Chained` composite mirroring the
//! Resolver's own middleware-chain composition style (`resolver/middleware.rs`).

pub mod interface_extractor;
pub mod rename;

pub use interface_extractor::{InterfaceExtractor, InterfaceExtractorOptions, MethodPattern};
pub use rename::SymbolRename;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::Result;
use crate::index::Index;
use crate::ir::{Module, SymbolId};

/// One textual edit produced by a transformer (spec §4.8 "Changes").
#[derive(Debug, Clone)]
pub struct Change {
    /// File the edit applies to.
    pub file: PathBuf,
    /// Inclusive start line (1-based).
    pub start_line: usize,
    /// Inclusive start column (1-based).
    pub start_col: usize,
    /// Inclusive end line (1-based).
    pub end_line: usize,
    /// Inclusive end column (1-based).
    pub end_col: usize,
    /// Text being replaced.
    pub original_text: String,
    /// Replacement text.
    pub new_text: String,
    /// The Symbol this edit is about, if any.
    pub affected_symbol: Option<SymbolId>,
}

/// The outcome of running one transformer (spec §4.8 "TransformResult").
#[derive(Debug, Clone)]
pub struct TransformResult {
    /// One-line human summary.
    pub summary: String,
    /// Longer, multi-line detail.
    pub detail: String,
    /// Whether the transform completed successfully.
    pub success: bool,
    /// Whether this result came from a dry run (no IR mutation).
    pub dry_run: bool,
    /// Failure reason, if `success` is `false`.
    pub error: Option<String>,
    /// Every file touched, deduplicated, insertion-ordered.
    pub affected_files: Vec<PathBuf>,
    /// Every textual edit produced.
    pub changes: Vec<Change>,
}

impl TransformResult {
    /// Number of distinct files touched.
    pub fn affected_file_count(&self) -> usize {
        self.affected_files.len()
    }
}

/// Mutable context handed to a [`Transformer`]: the target Module, the
/// Index built over it, a dry-run flag, and a string-keyed options bag
/// for caller-supplied parameters the framework itself doesn't need to
/// know about (spec §4.8 "Context").
pub struct Context<'a> {
    /// The Module being transformed.
    pub module: &'a mut Module,
    /// The Index built over `module` before this transform ran. Stays
    /// stale across a non-dry-run mutation — callers re-run `Index::update`
    /// themselves once a transform chain completes (spec §5: the Index
    /// never mutates the IR and reconciliation is the caller's job).
    pub index: &'a Index,
    /// When `true`, transformers must not mutate `module` — they still
    /// compute and return the `Change`s they would have made.
    pub dry_run: bool,
    /// Caller-supplied parameters, keyed by name.
    pub options: HashMap<String, String>,
}

impl<'a> Context<'a> {
    /// Construct a context for a non-dry-run transform.
    pub fn new(module: &'a mut Module, index: &'a Index) -> Self {
        Self { module, index, dry_run: false, options: HashMap::new() }
    }

    /// Construct a dry-run context: transformers compute but don't apply.
    pub fn dry_run(module: &'a mut Module, index: &'a Index) -> Self {
        Self { module, index, dry_run: true, options: HashMap::new() }
    }
}

/// A named, validated, IR-mutating operation (spec §4.8 "Transformer
/// contract").
pub trait Transformer {
    /// Short identifier (e.g. `"rename"`).
    fn name(&self) -> &str;
    /// One-line human description.
    fn description(&self) -> &str;
    /// Check preconditions without mutating anything. Called before
    /// `transform`, and up-front for every child of a [`Chained`].
    fn validate(&self, ctx: &Context) -> Result<()>;
    /// Perform the transform (or, in dry-run mode, compute what it would
    /// have done) and return the result.
    fn transform(&self, ctx: &mut Context) -> Result<TransformResult>;
}

/// Runs a sequence of transformers, aborting at the first failure (spec
/// §4.8 "Chained transformer").
pub struct Chained {
    name: String,
    children: Vec<Box<dyn Transformer>>,
}

impl Chained {
    /// Build a chain from `children`, run in order.
    pub fn new(name: impl Into<String>, children: Vec<Box<dyn Transformer>>) -> Self {
        Self { name: name.into(), children }
    }
}

impl Transformer for Chained {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "runs a sequence of transformers, aborting at the first failure"
    }

    fn validate(&self, ctx: &Context) -> Result<()> {
        for child in &self.children {
            child.validate(ctx)?;
        }
        Ok(())
    }

    fn transform(&self, ctx: &mut Context) -> Result<TransformResult> {
        let mut affected_files = Vec::new();
        let mut changes = Vec::new();
        let mut summaries = Vec::new();

        for child in &self.children {
            let result = child.transform(ctx)?;
            if !result.success {
                return Ok(result);
            }
            summaries.push(result.summary);
            for file in result.affected_files {
                if !affected_files.contains(&file) {
                    affected_files.push(file);
                }
            }
            changes.extend(result.changes);
        }

        Ok(TransformResult {
            summary: summaries.join("; "),
            detail: format!("chain `{}`: {} transformer(s) applied", self.name, self.children.len()),
            success: true,
            dry_run: ctx.dry_run,
            error: None,
            affected_files,
            changes,
        })
    }
}
