//! The Resolver (spec §4.5, component C5): given `(import_path, version)`,
//! produces a loaded [`Module`], transitively resolving dependencies up to
//! a configured depth. Pipeline style — locate, load, recurse, gate —
//! grounded in the teacher's `resolver/mod.rs::resolve_all`.

pub mod middleware;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub use middleware::{Middleware, ResolveRequest, TracingMiddleware};

use crate::diagnostic;
use crate::error::{Error, Result};
use crate::filesystem::{Filesystem, RealFilesystem};
use crate::ir::Module;
use crate::loader::{load, LoadOptions};
use crate::parser::SourceParser;
use crate::toolchain::{locate_with_retry, CancellationToken, Toolchain};

/// How a bare or ambiguous version request is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionPolicy {
    /// A version must always be given explicitly.
    Strict,
    /// An empty version is passed through to the Toolchain as-is.
    Lenient,
    /// An empty version is resolved to "latest" via `get_module_info`.
    Latest,
}

/// How far, and whether, dependency recursion descends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyPolicy {
    /// Resolve the full transitive tree up to `dependency_depth`.
    All,
    /// Resolve only direct dependencies, regardless of `dependency_depth`.
    Direct,
    /// Do not resolve any dependencies.
    None,
}

/// Options controlling one [`Resolver::resolve`] call (spec §4.5 "Inputs").
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Include `*_test.go` files when loading each module.
    pub include_tests: bool,
    /// Keep unexported symbols when loading each module.
    pub include_private: bool,
    /// How many levels beyond the direct dependency set to descend.
    /// `0` means "direct only; don't descend into their deps" (spec §4.5
    /// step 5). Direct dependencies are always attempted when
    /// `dependency_policy != None`, since depth 0 is the root itself.
    pub dependency_depth: usize,
    /// Attempt a Toolchain download when a module isn't already cached.
    pub download_missing: bool,
    /// How ambiguous/missing versions are resolved.
    pub version_policy: VersionPolicy,
    /// Whether, and how far, to recurse into dependencies.
    pub dependency_policy: DependencyPolicy,
    /// Fail on a dependency cycle instead of skipping the repeated edge.
    pub strict_circular_deps: bool,
    /// Emit diagnostic lines to stderr as resolution proceeds.
    pub verbose: bool,
    /// Consult and populate the resolution cache keyed on
    /// `(import_path, version)`.
    pub use_resolution_cache: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            include_tests: false,
            include_private: true,
            dependency_depth: 0,
            download_missing: true,
            version_policy: VersionPolicy::Lenient,
            dependency_policy: DependencyPolicy::All,
            strict_circular_deps: true,
            verbose: false,
            use_resolution_cache: true,
        }
    }
}

/// Resolves `(import_path, version)` pairs to loaded Modules, recursing
/// into their declared dependencies.
pub struct Resolver {
    toolchain: Arc<dyn Toolchain>,
    parser: Arc<dyn SourceParser>,
    filesystem: Arc<dyn Filesystem>,
    cache: RwLock<HashMap<String, Arc<Module>>>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Resolver {
    /// Construct a Resolver over the given Toolchain and parser
    /// collaborators, with no middlewares installed and a real,
    /// `std::fs`-backed [`Filesystem`] (see [`Resolver::with_filesystem`]
    /// to swap in a test double).
    pub fn new(toolchain: Arc<dyn Toolchain>, parser: Arc<dyn SourceParser>) -> Self {
        Self {
            toolchain,
            parser,
            filesystem: Arc::new(RealFilesystem),
            cache: RwLock::new(HashMap::new()),
            middlewares: Vec::new(),
        }
    }

    /// Swap in a [`Filesystem`] other than the default [`RealFilesystem`]
    /// (spec §6.3).
    pub fn with_filesystem(mut self, filesystem: Arc<dyn Filesystem>) -> Self {
        self.filesystem = filesystem;
        self
    }

    /// Append a middleware to the end of the chain (innermost, closest to
    /// the base `resolve_one` step).
    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Resolve `(import_path, version)`, recursing into dependencies per
    /// `opts` (spec §4.5 full algorithm). The root itself counts as "in
    /// progress" for the duration of the call, so a cycle that loops back
    /// to it is caught at the point it actually closes.
    pub fn resolve(&self, import_path: &str, version: &str, opts: &ResolveOptions) -> Result<Arc<Module>> {
        let mut in_progress = vec![import_path.to_owned()];
        self.resolve_internal(import_path, version, 0, &mut in_progress, opts)
    }

    fn resolve_internal(
        &self,
        import_path: &str,
        version: &str,
        depth: usize,
        in_progress: &mut Vec<String>,
        opts: &ResolveOptions,
    ) -> Result<Arc<Module>> {
        let resolved_version = self.resolve_version(import_path, version, opts)?;
        let cache_key = format!("{import_path}@{resolved_version}");

        if opts.use_resolution_cache {
            if let Some(hit) = self.cache.read().unwrap().get(&cache_key) {
                diagnostic!(opts.verbose, "cache hit: {cache_key}");
                return Ok(hit.clone());
            }
        }

        let req = ResolveRequest {
            import_path: import_path.to_owned(),
            version: resolved_version.clone(),
        };
        let module = self.run_chain(&req, opts)?;

        if should_recurse(opts, depth) {
            self.expand_dependencies(&module, depth, in_progress, opts)?;
        }

        // Only cache once the module's own dependency subtree has resolved
        // successfully, so a cyclic path revisiting `import_path` mid-recursion
        // cannot hit this entry and short-circuit past the `in_progress` check
        // above it.
        if opts.use_resolution_cache {
            self.cache.write().unwrap().insert(cache_key, module.clone());
        }

        Ok(module)
    }

    fn resolve_version(&self, import_path: &str, version: &str, opts: &ResolveOptions) -> Result<String> {
        if !version.is_empty() {
            return Ok(version.to_owned());
        }
        match opts.version_policy {
            VersionPolicy::Strict => Err(Error::ModuleNotFound {
                path: import_path.to_owned(),
                version: "<missing>".to_owned(),
            }),
            VersionPolicy::Lenient => Ok(String::new()),
            VersionPolicy::Latest => {
                let (_, resolved) = self.toolchain.get_module_info(import_path)?;
                Ok(resolved)
            }
        }
    }

    fn run_chain(&self, req: &ResolveRequest, opts: &ResolveOptions) -> Result<Arc<Module>> {
        self.invoke_chain(0, req, opts)
    }

    fn invoke_chain(&self, idx: usize, req: &ResolveRequest, opts: &ResolveOptions) -> Result<Arc<Module>> {
        if idx >= self.middlewares.len() {
            return self.resolve_one(req, opts);
        }
        let middleware = &self.middlewares[idx];
        let next = |r: &ResolveRequest| self.invoke_chain(idx + 1, r, opts);
        middleware.call(req, &next)
    }

    /// Locate (with retry/backoff) and load a single module, with no
    /// dependency recursion. This is the step the middleware chain wraps.
    fn resolve_one(&self, req: &ResolveRequest, opts: &ResolveOptions) -> Result<Arc<Module>> {
        let token = CancellationToken::new();
        let dir = locate_with_retry(
            self.toolchain.as_ref(),
            &req.import_path,
            &req.version,
            opts.download_missing,
            &token,
        )?;
        self.load_dir(&dir, opts)
    }

    fn load_dir(&self, dir: &std::path::Path, opts: &ResolveOptions) -> Result<Arc<Module>> {
        let report = load(
            dir,
            self.parser.as_ref(),
            self.filesystem.as_ref(),
            &LoadOptions {
                include_tests: opts.include_tests,
                include_private: opts.include_private,
                trace: opts.verbose,
                max_file_bytes: None,
            },
        )?;
        Ok(Arc::new(report.module))
    }

    /// Resolve every dependency declared in `module`'s manifest, handling
    /// replacement routing and cycle detection (spec §4.5 steps 4, depth
    /// gate applied to the *children*'s own recursion).
    pub fn expand_dependencies(
        &self,
        module: &Module,
        depth: usize,
        in_progress: &mut Vec<String>,
        opts: &ResolveOptions,
    ) -> Result<()> {
        if matches!(opts.dependency_policy, DependencyPolicy::None) {
            return Ok(());
        }

        for (dep_path, dep_version) in module.requires.iter() {
            if in_progress.contains(dep_path) {
                if opts.strict_circular_deps {
                    let mut path = in_progress.clone();
                    path.push(dep_path.clone());
                    return Err(Error::CircularDependency { path });
                }
                diagnostic!(opts.verbose, "skipping circular dependency: {dep_path}");
                continue;
            }

            in_progress.push(dep_path.clone());

            // Replacement lookups are scoped to the consuming module
            // (spec §4.5 step 4).
            let step_result = if let Some(replacement) =
                module.replacements.iter().find(|r| &r.original == dep_path)
            {
                if replacement.is_filesystem() {
                    let target = module.root.join(&replacement.replacement);
                    diagnostic!(opts.verbose, "{dep_path} replaced by filesystem path {}", target.display());
                    self.load_dir(&target, opts).and_then(|replaced| {
                        if should_recurse(opts, depth + 1) {
                            self.expand_dependencies(&replaced, depth + 1, in_progress, opts)?;
                        }
                        Ok(())
                    })
                } else {
                    let replacement_version = replacement.replacement_version.clone().unwrap_or_default();
                    self.resolve_internal(&replacement.replacement, &replacement_version, depth + 1, in_progress, opts)
                        .map(|_| ())
                }
            } else {
                self.resolve_internal(dep_path, dep_version, depth + 1, in_progress, opts).map(|_| ())
            };

            in_progress.pop();
            step_result?;
        }

        Ok(())
    }

    /// Re-run dependency resolution for an already-loaded module at depth
    /// 0, refreshing the cache after `add_dependency`/`remove_dependency`
    /// (spec §4.5 "Add/Remove dependency").
    pub fn resolve_dependencies(&self, module: &Module, opts: &ResolveOptions) -> Result<()> {
        let mut in_progress = vec![module.import_path.clone()];
        self.expand_dependencies(module, 0, &mut in_progress, opts)
    }

    /// `go get <path>@<version>`-equivalent, followed by a depth-0 refresh
    /// of `parent`'s dependency view (spec §4.5 "Add/Remove dependency").
    pub fn add_dependency(&self, parent: &Module, path: &str, version: &str, opts: &ResolveOptions) -> Result<()> {
        self.toolchain.run_command("get", &[&format!("{path}@{version}")])?;
        self.resolve_dependencies(parent, &ResolveOptions { dependency_depth: 0, ..opts.clone() })
    }

    /// `go get <path>@none`-equivalent.
    pub fn remove_dependency(&self, parent: &Module, path: &str, opts: &ResolveOptions) -> Result<()> {
        self.toolchain.run_command("get", &[&format!("{path}@none")])?;
        self.resolve_dependencies(parent, &ResolveOptions { dependency_depth: 0, ..opts.clone() })
    }

    /// Build `module_path -> [direct_dep_path...]` over every Module
    /// currently present in the resolution cache (spec §4.5 "Dependency
    /// graph construction").
    pub fn build_dependency_graph(&self) -> HashMap<String, Vec<String>> {
        let cache = self.cache.read().unwrap();
        let mut graph = HashMap::new();
        for module in cache.values() {
            let deps: Vec<String> = module.requires.keys().cloned().collect();
            graph.insert(module.import_path.clone(), deps);
        }
        graph
    }
}

/// Whether the module currently at `depth` should have its own
/// dependencies expanded (spec §4.5 step 5 depth gate).
///
/// `depth == 0` (the root call) always expands once when the policy isn't
/// `None`/limited to `Direct` beyond level 0, since `dependency_depth` is
/// defined relative to the *direct* dependency set, not the root itself.
fn should_recurse(opts: &ResolveOptions, depth: usize) -> bool {
    match opts.dependency_policy {
        DependencyPolicy::None => false,
        DependencyPolicy::Direct => depth == 0,
        DependencyPolicy::All => depth == 0 || depth < opts.dependency_depth,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::go_parser::GoTreeSitterParser;
    use crate::toolchain::LocalToolchain;
    use std::fs;

    fn write_module(dir: &std::path::Path, module_path: &str, requires: &[(&str, &str)]) {
        let mut manifest = format!("module {module_path}\n\ngo 1.21\n\n");
        for (path, version) in requires {
            manifest.push_str(&format!("require {path} {version}\n"));
        }
        fs::write(dir.join("go.mod"), manifest).unwrap();
        fs::write(dir.join("main.go"), "package main\n\nfunc Main() {}\n").unwrap();
    }

    #[test]
    fn resolves_a_direct_dependency_chain() {
        let root_dir = tempfile::tempdir().unwrap();
        let dep_dir = tempfile::tempdir().unwrap();
        write_module(root_dir.path(), "example.com/app", &[("example.com/dep", "v1.0.0")]);
        write_module(dep_dir.path(), "example.com/dep", &[]);

        let mut toolchain = LocalToolchain::new();
        toolchain.register("example.com/app", "v0.0.0", root_dir.path());
        toolchain.register("example.com/dep", "v1.0.0", dep_dir.path());

        let resolver = Resolver::new(Arc::new(toolchain), Arc::new(GoTreeSitterParser::new()));
        let opts = ResolveOptions { dependency_depth: 0, ..ResolveOptions::default() };
        let module = resolver.resolve("example.com/app", "v0.0.0", &opts).unwrap();
        assert_eq!(module.import_path, "example.com/app");

        let graph = resolver.build_dependency_graph();
        assert_eq!(graph.get("example.com/app").unwrap(), &vec!["example.com/dep".to_string()]);
    }

    #[test]
    fn strict_circular_dependency_fails() {
        let a_dir = tempfile::tempdir().unwrap();
        let b_dir = tempfile::tempdir().unwrap();
        write_module(a_dir.path(), "example.com/a", &[("example.com/b", "v1.0.0")]);
        write_module(b_dir.path(), "example.com/b", &[("example.com/a", "v1.0.0")]);

        let mut toolchain = LocalToolchain::new();
        toolchain.register("example.com/a", "v1.0.0", a_dir.path());
        toolchain.register("example.com/b", "v1.0.0", b_dir.path());

        let resolver = Resolver::new(Arc::new(toolchain), Arc::new(GoTreeSitterParser::new()));
        let opts = ResolveOptions {
            dependency_depth: 5,
            strict_circular_deps: true,
            use_resolution_cache: false,
            ..ResolveOptions::default()
        };
        let err = resolver.resolve("example.com/a", "v1.0.0", &opts).unwrap_err();
        assert!(matches!(err, Error::CircularDependency { .. }));
    }

    #[test]
    fn strict_circular_dependency_fails_with_resolution_cache_enabled() {
        let a_dir = tempfile::tempdir().unwrap();
        let b_dir = tempfile::tempdir().unwrap();
        write_module(a_dir.path(), "example.com/a", &[("example.com/b", "v1.0.0")]);
        write_module(b_dir.path(), "example.com/b", &[("example.com/a", "v1.0.0")]);

        let mut toolchain = LocalToolchain::new();
        toolchain.register("example.com/a", "v1.0.0", a_dir.path());
        toolchain.register("example.com/b", "v1.0.0", b_dir.path());

        let resolver = Resolver::new(Arc::new(toolchain), Arc::new(GoTreeSitterParser::new()));
        let opts = ResolveOptions {
            dependency_depth: 5,
            strict_circular_deps: true,
            ..ResolveOptions::default()
        };
        assert!(opts.use_resolution_cache, "this test only means something with the cache on");
        let err = resolver.resolve("example.com/a", "v1.0.0", &opts).unwrap_err();
        match err {
            Error::CircularDependency { path } => {
                assert_eq!(path, vec!["example.com/a".to_string(), "example.com/b".to_string(), "example.com/a".to_string()]);
            }
            other => panic!("expected CircularDependency, got {other:?}"),
        }
    }

    #[test]
    fn lenient_circular_dependency_is_skipped() {
        let a_dir = tempfile::tempdir().unwrap();
        let b_dir = tempfile::tempdir().unwrap();
        write_module(a_dir.path(), "example.com/a", &[("example.com/b", "v1.0.0")]);
        write_module(b_dir.path(), "example.com/b", &[("example.com/a", "v1.0.0")]);

        let mut toolchain = LocalToolchain::new();
        toolchain.register("example.com/a", "v1.0.0", a_dir.path());
        toolchain.register("example.com/b", "v1.0.0", b_dir.path());

        let resolver = Resolver::new(Arc::new(toolchain), Arc::new(GoTreeSitterParser::new()));
        let opts = ResolveOptions {
            dependency_depth: 5,
            strict_circular_deps: false,
            use_resolution_cache: false,
            ..ResolveOptions::default()
        };
        let module = resolver.resolve("example.com/a", "v1.0.0", &opts).unwrap();
        assert_eq!(module.import_path, "example.com/a");
    }
}
