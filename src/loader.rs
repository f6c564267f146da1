//! The Loader (spec §4.3, component C3): turns a module root directory into
//! a populated [`Module`], driving the manifest parser and the external
//! `SourceParser` collaborator. Package discovery walks the tree with
//! `ignore`, mirroring the teacher's own `walker.rs`; per-package parsing
//! runs in parallel with `rayon`, mirroring the teacher's `Engine::build`
//! fan-out over packages.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use rayon::prelude::*;

use crate::diagnostic;
use crate::error::{Error, Result};
use crate::filesystem::Filesystem;
use crate::ir::symbol::SymbolId;
use crate::ir::{File, Import, Module, Package, Reference, Symbol, SymbolKind};
use crate::manifest::{parse_manifest, MANIFEST_FILE_NAME};
use crate::parser::{ExtractedReference, ExtractedSymbol, ParseOptions, ParsedPackage, SourceParser};

/// Directory names never treated as packages (spec's "a real loader needs
/// *some* resource bound", SPEC_FULL §4 C3 supplement — mirrors the
/// teacher's `node_modules` exclusion reflex for this source language).
const SKIP_DIR_NAMES: &[&str] = &[".git", "vendor"];

/// Options controlling a single `load` call (spec §4.3 "Input").
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Include `*_test.go` files.
    pub include_tests: bool,
    /// Keep unexported symbols. When `false`, symbols whose name's first
    /// character is not uppercase are dropped during extraction.
    pub include_private: bool,
    /// Emit diagnostic lines to stderr as the load proceeds.
    pub trace: bool,
    /// Skip files larger than this many bytes (SPEC_FULL §4 C3 supplement).
    pub max_file_bytes: Option<u64>,
}

/// The result of a load: the populated Module plus any per-package parser
/// errors that were recorded but did not prevent the rest of the Module
/// from loading (spec §4.3 step 2: "skipped, not fatal").
#[derive(Debug)]
pub struct LoadReport {
    /// The populated Module.
    pub module: Module,
    /// `"<package dir>: <message>"` for every package-level parse failure.
    pub package_errors: Vec<String>,
}

/// Load a Module rooted at `root`, using `parser` as the external syntax
/// collaborator (spec §4.3) and `fs` to read the manifest (spec §6.3 — a
/// test double can stand in for the manifest read without touching disk).
pub fn load(root: &Path, parser: &dyn SourceParser, fs: &dyn Filesystem, opts: &LoadOptions) -> Result<LoadReport> {
    let root = root
        .canonicalize()
        .map_err(|_| Error::ManifestMissing(root.to_path_buf()))?;

    let manifest_path = root.join(MANIFEST_FILE_NAME);
    let canonical_manifest = manifest_path
        .canonicalize()
        .map_err(|_| Error::ManifestMissing(manifest_path.clone()))?;
    if !canonical_manifest.starts_with(&root) {
        return Err(Error::PathOutsideModule(canonical_manifest));
    }

    let manifest_bytes = fs.read_file(&canonical_manifest)?;
    let manifest_content = String::from_utf8(manifest_bytes).map_err(|e| Error::ManifestMalformed {
        path: canonical_manifest.clone(),
        reason: e.to_string(),
    })?;
    let manifest_info = parse_manifest(&manifest_content)?;

    diagnostic!(opts.trace, "loading module {} from {}", manifest_info.module_path, root.display());

    let module_path = manifest_info.module_path.clone();
    let mut module = Module::new(module_path.clone(), root.clone());
    module.language_version = manifest_info.language_version;
    module.requires = manifest_info.requires.into_iter().collect();
    module.replacements = manifest_info.replacements;

    let package_dirs = discover_package_dirs(&root);
    diagnostic!(opts.trace, "discovered {} candidate package directories", package_dirs.len());

    let parse_opts = ParseOptions {
        include_tests: opts.include_tests,
        max_file_bytes: opts.max_file_bytes,
    };

    let parsed: Vec<(PathBuf, ParsedPackage)> = package_dirs
        .par_iter()
        .map(|dir| (dir.clone(), parser.load_package(dir, &parse_opts)))
        .collect();

    let mut package_errors = Vec::new();
    let mut any_loaded = false;
    let mut pending_references: Vec<(String, PathBuf, Vec<ExtractedReference>)> = Vec::new();

    for (dir, parsed_package) in parsed {
        for err in &parsed_package.errors {
            package_errors.push(format!("{}: {err}", dir.display()));
        }
        if parsed_package.files.is_empty() {
            continue;
        }

        let import_path = package_import_path(&module_path, &root, &dir);
        let package_name = if parsed_package.name.is_empty() {
            dir.file_name().and_then(|n| n.to_str()).unwrap_or("main").to_owned()
        } else {
            parsed_package.name
        };

        let owning_module = module_path.clone();
        let (package, file_refs) =
            build_package(package_name, import_path.clone(), dir, owning_module, parsed_package.files, &mut module, opts);
        module.packages.insert(import_path.clone(), package);
        for (file_path, refs) in file_refs {
            pending_references.push((import_path.clone(), file_path, refs));
        }
        any_loaded = true;
    }

    if !package_dirs.is_empty() && !any_loaded {
        return Err(Error::ParserFailure {
            root: root.clone(),
            details: package_errors,
        });
    }

    let reference_count = link_references(&mut module, pending_references);
    diagnostic!(opts.trace, "resolved {reference_count} references");

    module
        .check_invariants()
        .map_err(|e| Error::InternalInvariantViolation(e.to_string()))?;

    Ok(LoadReport { module, package_errors })
}

/// Walk `root` with `ignore` (respecting `.gitignore`, skipping hidden
/// directories and the fixed exclusion list) and return every directory
/// that directly contains at least one `.go` file.
fn discover_package_dirs(root: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    let mut seen: std::collections::HashSet<PathBuf> = std::collections::HashSet::new();

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .filter_entry(|entry| {
            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with('.') || SKIP_DIR_NAMES.contains(&name) {
                    return entry.depth() == 0;
                }
            }
            true
        })
        .build();

    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("go") {
            continue;
        }
        if let Some(dir) = path.parent() {
            if seen.insert(dir.to_path_buf()) {
                dirs.push(dir.to_path_buf());
            }
        }
    }

    dirs.sort();
    dirs
}

fn package_import_path(module_path: &str, root: &Path, dir: &Path) -> String {
    let rel = dir.strip_prefix(root).unwrap_or(dir);
    if rel.as_os_str().is_empty() {
        module_path.to_owned()
    } else {
        let rel_str = rel.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/");
        format!("{module_path}/{rel_str}")
    }
}

/// Build an IR [`Package`] from one directory's [`ParsedPackage`], per
/// spec §4.3 steps 3–6.
fn build_package(
    name: String,
    import_path: String,
    directory: PathBuf,
    module_path: String,
    parsed_files: Vec<crate::parser::ParsedFile>,
    module: &mut Module,
    opts: &LoadOptions,
) -> (Package, Vec<(PathBuf, Vec<ExtractedReference>)>) {
    let mut package = Package::new(name, import_path.clone(), directory, module_path);
    let mut file_refs = Vec::new();

    // Pass A: register every type-like symbol first so method/field parent
    // resolution can look it up regardless of declaration order within the
    // package (spec §4.3 step 5: "among already-seen Type/Struct/Interface
    // symbols").
    let mut type_names: HashMap<String, SymbolId> = HashMap::new();
    for file in &parsed_files {
        for sym in &file.symbols {
            if matches!(sym.kind, SymbolKind::Struct | SymbolKind::Interface | SymbolKind::Type) {
                type_names.insert(sym.name.clone(), SymbolId::top_level(&import_path, &sym.name));
            }
        }
    }

    for parsed_file in parsed_files {
        module.positions.register_file(&parsed_file.path, &parsed_file.source);

        let mut file = File {
            path: parsed_file.path.clone(),
            basename: parsed_file.basename,
            package: import_path.clone(),
            symbols: Vec::new(),
            imports: Vec::new(),
            is_test_file: parsed_file.is_test_file,
        };

        for extracted in &parsed_file.imports {
            let range = module
                .positions
                .range(&parsed_file.path, extracted.start_offset, extracted.end_offset)
                .unwrap_or_default();
            file.imports.push(Import {
                target: extracted.target.clone(),
                alias: extracted.alias.clone(),
                range,
            });
        }

        package.files.insert(parsed_file.path.clone(), file);

        for extracted in parsed_file.symbols {
            if !opts.include_private && !crate::ir::is_exported_name(&extracted.name) {
                continue;
            }
            let signature = extracted.signature.clone();
            let symbol = build_symbol(&extracted, &import_path, &parsed_file.path, &type_names, module);
            let id = symbol.id.clone();
            package.add_symbol(symbol);
            if let Some(signature) = signature {
                package.type_info.signatures.insert(id, signature);
            }
        }

        diagnostic!(opts.trace, "  {}: {} symbols", parsed_file.path.display(), package.symbols.len());

        if !parsed_file.references.is_empty() {
            file_refs.push((parsed_file.path, parsed_file.references));
        }
    }

    (package, file_refs)
}

fn build_symbol(
    extracted: &ExtractedSymbol,
    import_path: &str,
    file_path: &Path,
    type_names: &HashMap<String, SymbolId>,
    module: &Module,
) -> Symbol {
    let range = module
        .positions
        .range(file_path, extracted.start_offset, extracted.end_offset)
        .unwrap_or_default();

    let (id, parent, orphan) = match (&extracted.parent_name, &extracted.receiver_type) {
        (Some(parent_name), _) => {
            let id = SymbolId::with_parent(import_path, parent_name, &extracted.name);
            let parent = type_names.get(parent_name).cloned();
            (id, parent.clone(), parent.is_none())
        }
        (None, Some(receiver)) => {
            let id = SymbolId::top_level(import_path, &extracted.name);
            let parent = type_names.get(receiver).cloned();
            (id, parent.clone(), parent.is_none())
        }
        (None, None) => (SymbolId::top_level(import_path, &extracted.name), None, false),
    };

    let exported = crate::ir::is_exported_name(&extracted.name);
    Symbol {
        id,
        name: extracted.name.clone(),
        kind: extracted.kind,
        file: file_path.to_path_buf(),
        package: import_path.to_owned(),
        parent,
        orphan,
        range,
        exported,
        references: Vec::new(),
    }
}

/// Resolve every syntactic [`ExtractedReference`] gathered while parsing
/// and attach it to its target Symbol's owned reference list (spec §3.1
/// "Symbols own their Reference lists"; §4.3 "References (per-file scan,
/// after all Symbols are interned)"). Runs once every package of the
/// Module has been built, so cross-package references within the same
/// Module resolve correctly regardless of package discovery order.
///
/// Returns the number of references successfully resolved. A reference
/// whose name/qualifier does not match any known Symbol is silently
/// dropped — without the real type-checker seam (spec §1) a bare
/// identifier or a method call through an unresolved receiver variable
/// cannot be told apart from one that simply has no match.
fn link_references(module: &mut Module, pending: Vec<(String, PathBuf, Vec<ExtractedReference>)>) -> usize {
    struct Resolved {
        owning_package: String,
        symbol_id: SymbolId,
        file: PathBuf,
        containing_symbol: Option<SymbolId>,
        kind: crate::ir::ReferenceKind,
        start_offset: usize,
        end_offset: usize,
    }

    let mut resolved_list = Vec::new();
    for (pkg_path, file_path, refs) in &pending {
        for ext in refs {
            let Some((owning_package, symbol_id)) = resolve_reference_target(module, pkg_path, file_path, ext) else {
                continue;
            };
            let containing_symbol = ext.enclosing_name.as_ref().and_then(|n| {
                module
                    .packages
                    .get(pkg_path)
                    .and_then(|pkg| pkg.symbol_by_name(n, &[]).into_iter().next().map(|s| s.id.clone()))
            });
            resolved_list.push(Resolved {
                owning_package,
                symbol_id,
                file: file_path.clone(),
                containing_symbol,
                kind: ext.kind,
                start_offset: ext.start_offset,
                end_offset: ext.end_offset,
            });
        }
    }

    let mut count = 0;
    for r in resolved_list {
        let range = module.positions.range(&r.file, r.start_offset, r.end_offset).unwrap_or_default();
        let reference = Reference {
            symbol: r.symbol_id.clone(),
            file: r.file,
            containing_symbol: r.containing_symbol,
            kind: r.kind,
            range,
        };
        if let Some(pkg) = module.packages.get_mut(&r.owning_package) {
            if let Some(sym) = pkg.symbols.get_mut(&r.symbol_id) {
                sym.references.push(reference);
                count += 1;
            }
        }
    }
    count
}

/// Resolve one [`ExtractedReference`] to `(owning package import path,
/// symbol ID)`, following an import alias for qualified names (spec §4.5
/// "Replacement handling" sibling concept — here it's import-alias
/// resolution rather than module replacement) or falling back to a
/// same-package name lookup.
fn resolve_reference_target(
    module: &Module,
    pkg_path: &str,
    file_path: &Path,
    ext: &ExtractedReference,
) -> Option<(String, SymbolId)> {
    if let Some(qualifier) = &ext.qualifier {
        let file = module.packages.get(pkg_path)?.files.get(file_path)?;
        let target_import = file.imports.iter().find(|imp| {
            imp.alias.as_deref() == Some(qualifier.as_str())
                || (imp.alias.is_none() && imp.target.rsplit('/').next() == Some(qualifier.as_str()))
        })?;
        let target_pkg = module.packages.get(&target_import.target)?;
        let sym = target_pkg.symbol_by_name(&ext.name, &[]).into_iter().next()?;
        Some((target_pkg.import_path.clone(), sym.id.clone()))
    } else {
        let pkg = module.packages.get(pkg_path)?;
        let sym = pkg.symbol_by_name(&ext.name, &[]).into_iter().next()?;
        Some((pkg.import_path.clone(), sym.id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::RealFilesystem;
    use crate::parser::go_parser::GoTreeSitterParser;
    use std::fs;

    fn write_module(dir: &Path) {
        fs::write(dir.join("go.mod"), "module example.com/widget\n\ngo 1.21\n").unwrap();
        fs::write(
            dir.join("widget.go"),
            r#"package widget

type Widget struct {
	Name string
}

func (w *Widget) Label() string {
	return w.Name
}

func New(name string) *Widget {
	return &Widget{Name: name}
}
"#,
        )
        .unwrap();
    }

    #[test]
    fn loads_a_simple_module() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path());

        let parser = GoTreeSitterParser::new();
        let report = load(dir.path(), &parser, &RealFilesystem, &LoadOptions::default()).unwrap();

        assert_eq!(report.module.import_path, "example.com/widget");
        assert_eq!(report.module.language_version, "v1.21");
        assert!(report.package_errors.is_empty());

        let pkg = report.module.packages.get("example.com/widget").unwrap();
        let label = pkg
            .symbols
            .values()
            .find(|s| s.name == "Label")
            .expect("Label method present");
        assert_eq!(label.kind, SymbolKind::Method);
        let widget_id = SymbolId::top_level("example.com/widget", "Widget");
        assert_eq!(label.parent.as_ref(), Some(&widget_id));
        assert!(!label.orphan);
    }

    #[test]
    fn missing_manifest_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let parser = GoTreeSitterParser::new();
        let err = load(dir.path(), &parser, &RealFilesystem, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::ManifestMissing(_)));
    }

    #[test]
    fn private_symbols_dropped_when_not_included() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("go.mod"), "module example.com/widget\n\ngo 1.21\n").unwrap();
        fs::write(
            dir.path().join("widget.go"),
            "package widget\n\nfunc helper() {}\n\nfunc Exported() {}\n",
        )
        .unwrap();

        let parser = GoTreeSitterParser::new();
        let report = load(dir.path(), &parser, &RealFilesystem, &LoadOptions::default()).unwrap();
        let pkg = report.module.packages.get("example.com/widget").unwrap();
        let names: Vec<&str> = pkg.symbols.values().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"Exported"));
        assert!(!names.contains(&"helper"));
    }

    #[test]
    fn resolves_call_references_within_a_package() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("go.mod"), "module example.com/widget\n\ngo 1.21\n").unwrap();
        fs::write(
            dir.path().join("widget.go"),
            "package widget\n\nfunc helper() int {\n\treturn 1\n}\n\nfunc Exported() int {\n\treturn helper()\n}\n",
        )
        .unwrap();

        let parser = GoTreeSitterParser::new();
        let report = load(dir.path(), &parser, &RealFilesystem, &LoadOptions { include_private: true, ..LoadOptions::default() }).unwrap();
        let pkg = report.module.packages.get("example.com/widget").unwrap();
        let helper = pkg.symbols.values().find(|s| s.name == "helper").unwrap();
        assert_eq!(helper.references.len(), 1);
        assert_eq!(helper.references[0].kind, crate::ir::ReferenceKind::Call);
    }

    #[test]
    fn resolves_cross_package_references_via_import_alias() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("go.mod"), "module example.com/app\n\ngo 1.21\n").unwrap();
        fs::create_dir(dir.path().join("io")).unwrap();
        fs::write(
            dir.path().join("io").join("io.go"),
            "package io\n\nfunc Open() int {\n\treturn 0\n}\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("main.go"),
            "package main\n\nimport \"example.com/app/io\"\n\nfunc Main() int {\n\treturn io.Open()\n}\n",
        )
        .unwrap();

        let parser = GoTreeSitterParser::new();
        let report = load(dir.path(), &parser, &RealFilesystem, &LoadOptions::default()).unwrap();
        let io_pkg = report.module.packages.get("example.com/app/io").unwrap();
        let open = io_pkg.symbols.values().find(|s| s.name == "Open").unwrap();
        assert_eq!(open.references.len(), 1);
        assert_eq!(open.references[0].kind, crate::ir::ReferenceKind::Call);
    }
}
