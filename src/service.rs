//! The Service façade (spec §4.10, component C10): the multi-module
//! container sitting above a single [`crate::resolver::Resolver`], holding
//! every Module/Index pair it has loaded and answering the cross-module
//! questions a single Module/Index pair can't — import resolution across
//! module boundaries, reference lookup under a version policy, and
//! cross-version type-compatibility analysis.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::index::Index;
use crate::ir::{Module, Reference, Symbol, SymbolId, SymbolKind};
use crate::resolver::{DependencyPolicy, Resolver, ResolveOptions};

/// A successfully resolved import: which module declares the package, and
/// under what import path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImport {
    /// Import path of the Module that declares the package.
    pub module_path: String,
    /// Import path of the resolved Package itself.
    pub package_import_path: String,
}

/// How [`Service::find_references`] scopes its search when a Symbol ID
/// could in principle exist in more than one loaded Module version (spec
/// §4.10 "find_references").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferencePolicy {
    /// Only the Module that declares the Symbol.
    FromCallingModule,
    /// Every loaded Module, preferring the highest lexicographic version
    /// when more than one declares the same Symbol ID.
    PreferLatest,
    /// Only the exact Module version that declares the Symbol (identical
    /// to `FromCallingModule` here: this API has no separate version
    /// parameter to disambiguate against, so both resolve to "the one
    /// Module whose Index contains this ID").
    VersionSpecific,
    /// Every loaded Module: Symbols sharing this exact ID, plus Symbols in
    /// other Modules with the same name and kind (spec "name-matching
    /// across distinct Symbols of the same kind").
    Reconcile,
}

fn module_key(import_path: &str, version: &str) -> String {
    format!("{import_path}@{version}")
}

/// One field-level or method-level change between a base type and another
/// version of it (spec §4.10 "Compatibility analysis").
///
/// Struct diffing is limited to what the IR's `Field` Symbols actually
/// carry (name and exported/visibility) — there is no field-type or
/// struct-tag data on [`Symbol`] to compare, since no real type-checker
/// seam backs this crate (spec §6.1). Interface diffing is richer because
/// Method Symbols do carry a canonical signature string (§4.9).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDiff {
    /// A field present in the other version but not the base.
    FieldAdded(String),
    /// A field present in the base but missing from the other version.
    FieldRemoved(String),
    /// A field's exported/visibility flag differs between versions.
    FieldVisibilityChanged(String),
    /// An interface method present in the other version but not the base.
    MethodAdded(String),
    /// An interface method present in the base but missing from the other.
    MethodRemoved(String),
    /// An interface method whose canonical signature differs.
    MethodSignatureChanged { name: String, base: String, other: String },
}

/// Semver impact bucket a single [`TypeDiff`] maps to (spec §4.10 "Semver
/// impact classification").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SemverImpact {
    /// No observable change.
    None,
    /// Backward-compatible, additive.
    Patch,
    /// Backward-compatible, additive, larger surface (field addition).
    Minor,
    /// Breaking change.
    Major,
}

fn classify(diff: &TypeDiff) -> SemverImpact {
    match diff {
        TypeDiff::FieldAdded(_) => SemverImpact::Minor,
        TypeDiff::FieldRemoved(_) => SemverImpact::Major,
        TypeDiff::FieldVisibilityChanged(_) => SemverImpact::Patch,
        TypeDiff::MethodAdded(_) => SemverImpact::Major,
        TypeDiff::MethodRemoved(_) => SemverImpact::Major,
        TypeDiff::MethodSignatureChanged { .. } => SemverImpact::Major,
    }
}

/// One other version's diff against the base, plus its rolled-up impact.
#[derive(Debug, Clone)]
pub struct VersionCompatibility {
    /// The other version's Module import path key (`path@version`).
    pub version: String,
    /// Every diff found against the base version.
    pub diffs: Vec<TypeDiff>,
    /// The worst (highest) impact among `diffs`.
    pub impact: SemverImpact,
}

/// Full compatibility report across every loaded version of a type (spec
/// §4.10 "analyze_type_compatibility").
#[derive(Debug, Clone)]
pub struct CompatibilityReport {
    /// The version chosen as the comparison base (lexicographically first).
    pub base_version: String,
    /// Per-other-version diff results.
    pub versions: Vec<VersionCompatibility>,
    /// The worst impact across every version's diffs.
    pub overall_impact: SemverImpact,
    /// `100 - 100 * (#major diffs / #total diffs)`, clamped to `[0, 100]`.
    pub compatibility_score: u8,
}

/// Holds every Module/Index pair the caller has loaded and answers
/// cross-module questions (spec §4.10).
pub struct Service {
    resolver: Resolver,
    modules: RwLock<HashMap<String, Arc<Module>>>,
    indexes: RwLock<HashMap<String, Index>>,
}

impl Service {
    /// Build a Service over the given Resolver.
    pub fn new(resolver: Resolver) -> Self {
        Self { resolver, modules: RwLock::new(HashMap::new()), indexes: RwLock::new(HashMap::new()) }
    }

    /// Register an already-loaded Module under `version`, building a fresh
    /// Index over it. Exposed so a caller that resolved a Module through
    /// some other path (e.g. a standalone [`crate::loader::load`] call) can
    /// still fold it into this Service.
    pub fn register(&self, version: &str, module: Arc<Module>) {
        let key = module_key(&module.import_path, version);
        let index = Index::build(&[module.as_ref()]);
        self.modules.write().expect("modules lock poisoned").insert(key.clone(), module);
        self.indexes.write().expect("indexes lock poisoned").insert(key, index);
    }

    /// Resolve and load `import_path@version`, plus its dependencies per
    /// `opts`, registering every loaded Module (and a freshly built Index
    /// over it) under this Service.
    pub fn load(&self, import_path: &str, version: &str, opts: &ResolveOptions) -> Result<Arc<Module>> {
        let root_opts = ResolveOptions { dependency_policy: DependencyPolicy::None, ..opts.clone() };
        let module = self.resolver.resolve(import_path, version, &root_opts)?;
        self.register(version, module.clone());

        if !matches!(opts.dependency_policy, DependencyPolicy::None) {
            let mut seen = std::collections::HashSet::new();
            seen.insert(module.import_path.clone());
            self.load_dependencies(&module, 0, opts, &mut seen)?;
        }

        Ok(module)
    }

    fn load_dependencies(
        &self,
        module: &Module,
        depth: usize,
        opts: &ResolveOptions,
        seen: &mut std::collections::HashSet<String>,
    ) -> Result<()> {
        let go_deeper = match opts.dependency_policy {
            DependencyPolicy::None => false,
            DependencyPolicy::Direct => depth == 0,
            DependencyPolicy::All => depth == 0 || depth < opts.dependency_depth,
        };
        if !go_deeper {
            return Ok(());
        }

        for (dep_path, dep_version) in module.requires.iter() {
            if seen.contains(dep_path) {
                continue;
            }
            seen.insert(dep_path.clone());
            let dep_opts = ResolveOptions { dependency_policy: DependencyPolicy::None, ..opts.clone() };
            let dep_module = self.resolver.resolve(dep_path, dep_version, &dep_opts)?;
            self.register(dep_version, dep_module.clone());
            self.load_dependencies(&dep_module, depth + 1, opts, seen)?;
        }
        Ok(())
    }

    /// Every loaded Module version for `import_path`, sorted
    /// lexicographically.
    pub fn versions_of(&self, import_path: &str) -> Vec<String> {
        let modules = self.modules.read().expect("modules lock poisoned");
        let prefix = format!("{import_path}@");
        let mut versions: Vec<String> = modules
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix).map(str::to_owned))
            .collect();
        versions.sort();
        versions
    }

    fn module_by_import_path(&self, modules: &HashMap<String, Arc<Module>>, import_path: &str) -> Option<Arc<Module>> {
        modules.values().find(|m| m.import_path == import_path).cloned()
    }

    /// Search the declared module first, then every other loaded module,
    /// for a Package at `import_path` (spec §4.10 "resolve_import").
    pub fn resolve_import(&self, import_path: &str, from_module: &str) -> Result<ResolvedImport> {
        let modules = self.modules.read().expect("modules lock poisoned");

        if let Some(from) = self.module_by_import_path(&modules, from_module) {
            if from.packages.contains_key(import_path) {
                return Ok(ResolvedImport {
                    module_path: from.import_path.clone(),
                    package_import_path: import_path.to_owned(),
                });
            }
            if let Some(version) = from.requires.get(import_path) {
                if let Some(declared) = modules.get(&module_key(import_path, version)) {
                    if declared.packages.contains_key(import_path) {
                        return Ok(ResolvedImport {
                            module_path: declared.import_path.clone(),
                            package_import_path: import_path.to_owned(),
                        });
                    }
                }
            }
        }

        for module in modules.values() {
            if module.packages.contains_key(import_path) {
                return Ok(ResolvedImport {
                    module_path: module.import_path.clone(),
                    package_import_path: import_path.to_owned(),
                });
            }
        }

        Err(Error::ImportNotFound(import_path.to_owned()))
    }

    /// Map Module key (`path@version`) → Symbol for every loaded Module
    /// declaring `type_name` under package `import_path` (spec §4.10
    /// "find_type_across_modules").
    pub fn find_type_across_modules(&self, import_path: &str, type_name: &str) -> HashMap<String, Symbol> {
        let modules = self.modules.read().expect("modules lock poisoned");
        let mut found = HashMap::new();
        for (key, module) in modules.iter() {
            let Some(package) = module.packages.get(import_path) else { continue };
            let matches = package.symbol_by_name(type_name, &[SymbolKind::Struct, SymbolKind::Interface, SymbolKind::Type]);
            if let Some(symbol) = matches.first() {
                found.insert(key.clone(), (*symbol).clone());
            }
        }
        found
    }

    fn index_containing(&self, indexes: &HashMap<String, Index>, id: &SymbolId) -> Vec<String> {
        let mut keys: Vec<String> =
            indexes.iter().filter(|(_, index)| index.get_symbol(id).is_some()).map(|(k, _)| k.clone()).collect();
        keys.sort();
        keys
    }

    /// Find References to `symbol`, scoped per `policy` (spec §4.10
    /// "find_references").
    pub fn find_references(&self, symbol: &SymbolId, policy: ReferencePolicy) -> Vec<Reference> {
        let indexes = self.indexes.read().expect("indexes lock poisoned");
        let owners = self.index_containing(&indexes, symbol);

        match policy {
            ReferencePolicy::FromCallingModule | ReferencePolicy::VersionSpecific => owners
                .first()
                .and_then(|key| indexes.get(key))
                .map(|index| index.find_references(symbol).to_vec())
                .unwrap_or_default(),
            ReferencePolicy::PreferLatest => owners
                .last()
                .and_then(|key| indexes.get(key))
                .map(|index| index.find_references(symbol).to_vec())
                .unwrap_or_default(),
            ReferencePolicy::Reconcile => {
                let mut refs = Vec::new();
                let mut seen_keys = std::collections::HashSet::new();
                for key in &owners {
                    if let Some(index) = indexes.get(key) {
                        refs.extend(index.find_references(symbol).iter().cloned());
                    }
                    seen_keys.insert(key.clone());
                }
                if let Some(anchor) = owners.first().and_then(|key| indexes.get(key)).and_then(|i| i.get_symbol(symbol)) {
                    for (key, index) in indexes.iter() {
                        if seen_keys.contains(key) {
                            continue;
                        }
                        for candidate in index.find_symbols_by_name(&anchor.name) {
                            if candidate.kind == anchor.kind {
                                refs.extend(index.find_references(&candidate.id).iter().cloned());
                            }
                        }
                    }
                }
                refs
            }
        }
    }

    /// Given a type found across multiple Module versions, diff every
    /// other version against the lexicographically-first base version
    /// (spec §4.10 "Compatibility analysis" / "Semver impact
    /// classification").
    pub fn analyze_type_compatibility(&self, import_path: &str, type_name: &str) -> Option<CompatibilityReport> {
        let by_version = self.find_type_across_modules(import_path, type_name);
        if by_version.len() < 2 {
            return None;
        }

        let mut keys: Vec<&String> = by_version.keys().collect();
        keys.sort();
        let base_key = keys[0].clone();
        let base_symbol = by_version.get(&base_key)?;

        let indexes = self.indexes.read().expect("indexes lock poisoned");
        let base_index = indexes.get(&base_key)?;

        let mut versions = Vec::new();
        for key in keys.into_iter().skip(1) {
            let Some(other_symbol) = by_version.get(key) else { continue };
            let Some(other_index) = indexes.get(key) else { continue };
            let diffs = diff_types(base_symbol, base_index, other_symbol, other_index);
            let impact = diffs.iter().map(classify).max().unwrap_or(SemverImpact::None);
            versions.push(VersionCompatibility { version: key.clone(), diffs, impact });
        }

        let overall_impact = versions.iter().map(|v| v.impact).max().unwrap_or(SemverImpact::None);
        let total_diffs: usize = versions.iter().map(|v| v.diffs.len()).sum();
        let major_diffs: usize =
            versions.iter().map(|v| v.diffs.iter().filter(|d| classify(d) == SemverImpact::Major).count()).sum();
        let compatibility_score = if total_diffs == 0 {
            100
        } else {
            (100.0 - 100.0 * (major_diffs as f64 / total_diffs as f64)).clamp(0.0, 100.0).round() as u8
        };

        Some(CompatibilityReport { base_version: base_key, versions, overall_impact, compatibility_score })
    }

    /// Render the dependency graph of every currently-loaded Module as a
    /// DOT string, for ad-hoc inspection — the graph substrate's own debug
    /// affordance (`Graph::to_dot`) applied over `build_dependency_graph`.
    pub fn dependency_report(&self) -> String {
        let modules = self.modules.read().expect("modules lock poisoned");
        let graph: Graph<String, (), ()> = Graph::new();
        for module in modules.values() {
            graph.add_node(module.import_path.clone(), ());
            for dep in module.requires.keys() {
                graph.add_node(dep.clone(), ());
                let _ = graph.add_edge(module.import_path.clone(), dep.clone(), ());
            }
        }
        graph.to_dot()
    }
}

fn struct_fields<'a>(symbol: &Symbol, index: &'a Index) -> HashMap<String, &'a Symbol> {
    index
        .find_symbols_by_kind(SymbolKind::Field)
        .into_iter()
        .filter(|f| f.parent.as_ref() == Some(&symbol.id))
        .map(|f| (f.name.clone(), f))
        .collect()
}

fn interface_methods<'a>(symbol: &Symbol, index: &'a Index) -> HashMap<String, &'a Symbol> {
    index
        .find_symbols_by_kind(SymbolKind::Method)
        .into_iter()
        .filter(|m| m.parent.as_ref() == Some(&symbol.id))
        .map(|m| (m.name.clone(), m))
        .collect()
}

fn diff_types(base: &Symbol, base_index: &Index, other: &Symbol, other_index: &Index) -> Vec<TypeDiff> {
    let mut diffs = Vec::new();

    if base.kind == SymbolKind::Interface || other.kind == SymbolKind::Interface {
        let base_methods = interface_methods(base, base_index);
        let other_methods = interface_methods(other, other_index);

        for (name, method) in &other_methods {
            if !base_methods.contains_key(name) {
                diffs.push(TypeDiff::MethodAdded(name.clone()));
            } else if let (Some(base_sig), Some(other_sig)) =
                (base_index.signature_of(&base_methods[name].id), other_index.signature_of(&method.id))
            {
                if base_sig != other_sig {
                    diffs.push(TypeDiff::MethodSignatureChanged {
                        name: name.clone(),
                        base: base_sig.to_owned(),
                        other: other_sig.to_owned(),
                    });
                }
            }
        }
        for name in base_methods.keys() {
            if !other_methods.contains_key(name) {
                diffs.push(TypeDiff::MethodRemoved(name.clone()));
            }
        }
        return diffs;
    }

    let base_fields = struct_fields(base, base_index);
    let other_fields = struct_fields(other, other_index);

    for (name, field) in &other_fields {
        match base_fields.get(name) {
            None => diffs.push(TypeDiff::FieldAdded(name.clone())),
            Some(base_field) if base_field.exported != field.exported => {
                diffs.push(TypeDiff::FieldVisibilityChanged(name.clone()))
            }
            _ => {}
        }
    }
    for name in base_fields.keys() {
        if !other_fields.contains_key(name) {
            diffs.push(TypeDiff::FieldRemoved(name.clone()));
        }
    }

    diffs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::RealFilesystem;
    use crate::loader::{load, LoadOptions};
    use crate::parser::go_parser::GoTreeSitterParser;
    use crate::toolchain::LocalToolchain;
    use std::fs;

    fn write_module(dir: &std::path::Path, module_path: &str, version_suffix: &str, source: &str) {
        fs::write(dir.join("go.mod"), format!("module {module_path}\n\ngo 1.{version_suffix}\n")).unwrap();
        fs::write(dir.join("main.go"), source).unwrap();
    }

    fn build_service() -> (Service, std::path::PathBuf, std::path::PathBuf) {
        let v1_dir = tempfile::tempdir().unwrap().into_path();
        let v2_dir = tempfile::tempdir().unwrap().into_path();
        write_module(
            &v1_dir,
            "example.com/widget",
            "20",
            "package widget\n\ntype Box struct {\n\tWidth int\n}\n",
        );
        write_module(
            &v2_dir,
            "example.com/widget",
            "21",
            "package widget\n\ntype Box struct {\n\tWidth int\n\tHeight int\n}\n",
        );

        let mut toolchain = LocalToolchain::new();
        toolchain.register("example.com/widget", "v1.0.0", &v1_dir);
        toolchain.register("example.com/widget", "v2.0.0", &v2_dir);

        let resolver = Resolver::new(Arc::new(toolchain), Arc::new(GoTreeSitterParser::new()));
        let service = Service::new(resolver);
        (service, v1_dir, v2_dir)
    }

    #[test]
    fn loads_two_versions_and_reports_field_addition_as_minor() {
        let (service, _v1, _v2) = build_service();
        let opts = ResolveOptions { dependency_policy: DependencyPolicy::None, ..ResolveOptions::default() };
        service.load("example.com/widget", "v1.0.0", &opts).unwrap();
        service.load("example.com/widget", "v2.0.0", &opts).unwrap();

        assert_eq!(service.versions_of("example.com/widget"), vec!["v1.0.0".to_owned(), "v2.0.0".to_owned()]);

        let report = service.analyze_type_compatibility("example.com/widget", "Box").unwrap();
        assert_eq!(report.overall_impact, SemverImpact::Minor);
        assert_eq!(report.versions.len(), 1);
        assert!(report.versions[0].diffs.contains(&TypeDiff::FieldAdded("Height".to_owned())));
    }

    #[test]
    fn resolve_import_finds_declared_package_in_own_module() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "example.com/app", "21", "package app\n\nfunc Main() {}\n");
        let parser = GoTreeSitterParser::new();
        let module = load(dir.path(), &parser, &RealFilesystem, &LoadOptions::default()).unwrap().module;

        let mut toolchain = LocalToolchain::new();
        toolchain.register("example.com/app", "v0.0.0", dir.path());
        let resolver = Resolver::new(Arc::new(toolchain), Arc::new(GoTreeSitterParser::new()));
        let service = Service::new(resolver);
        service.register("v0.0.0", Arc::new(module));

        let resolved = service.resolve_import("example.com/app", "example.com/app").unwrap();
        assert_eq!(resolved.module_path, "example.com/app");
    }

    #[test]
    fn resolve_import_fails_for_unknown_package() {
        let (service, _v1, _v2) = build_service();
        let opts = ResolveOptions { dependency_policy: DependencyPolicy::None, ..ResolveOptions::default() };
        service.load("example.com/widget", "v1.0.0", &opts).unwrap();
        assert!(service.resolve_import("example.com/nope", "example.com/widget").is_err());
    }
}
