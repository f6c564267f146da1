//! The library's closed error sum (spec §6.5).
//!
//! Every fallible public operation returns `Result<T, Error>`. Collaborator
//! seams (`Toolchain`, `Filesystem`) may fail for arbitrary reasons; those
//! failures are captured with `anyhow` and wrapped at the boundary rather
//! than threaded through as their own variants, so adding a new toolchain
//! implementation never requires touching this enum.

use std::path::PathBuf;

use thiserror::Error;

/// All errors the `modgraph` public API can return.
#[derive(Debug, Error)]
pub enum Error {
    /// The module root does not contain a package manifest.
    #[error("manifest missing under module root {0}")]
    ManifestMissing(PathBuf),

    /// The manifest exists but could not be parsed.
    #[error("manifest at {path} is malformed: {reason}")]
    ManifestMalformed {
        /// Path to the offending manifest file.
        path: PathBuf,
        /// Human-readable reason the manifest was rejected.
        reason: String,
    },

    /// The resolved manifest path would fall outside the module root.
    #[error("manifest path {0} escapes its module root")]
    PathOutsideModule(PathBuf),

    /// The external parser reported per-package failures. The load still
    /// proceeds with the packages that did parse; this error is only
    /// returned when *zero* packages parsed successfully.
    #[error("parser failed on every package under {root}: {details:?}")]
    ParserFailure {
        /// Module root that was being loaded.
        root: PathBuf,
        /// One message per failing package.
        details: Vec<String>,
    },

    /// A dependency's module could not be located or downloaded.
    #[error("module not found: {path}@{version}")]
    ModuleNotFound {
        /// Import path of the missing module.
        path: String,
        /// Requested version string.
        version: String,
    },

    /// A dependency download failed after exhausting retries.
    #[error("download failed for {path}@{version}: {cause}")]
    DownloadFailed {
        /// Import path of the module being downloaded.
        path: String,
        /// Requested version string.
        version: String,
        /// Underlying failure reason.
        cause: String,
    },

    /// Strict-mode circular dependency detection tripped.
    #[error("circular dependency: {}", .path.join(" -> "))]
    CircularDependency {
        /// The cycle, in discovery order, with the repeated module last.
        path: Vec<String>,
    },

    /// A symbol ID was not found where one was required.
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    /// An import path could not be resolved to any loaded Package.
    #[error("import not found: {0}")]
    ImportNotFound(String),

    /// A transformer's `validate` step rejected the request.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// A graph traversal requiring acyclicity found a cycle.
    #[error("cycle detected")]
    CycleDetected,

    /// An invariant this library is supposed to maintain did not hold.
    /// Reaching this is always a bug in `modgraph` itself, not caller error.
    #[error("internal invariant violation: {0}")]
    InternalInvariantViolation(String),

    /// Filesystem I/O failure at a seam (manifest read, cache write, ...).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A `Toolchain`/`Filesystem` collaborator failed for an implementation
    /// specific reason not covered by the variants above.
    #[error("toolchain error: {0}")]
    Toolchain(#[source] anyhow::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
