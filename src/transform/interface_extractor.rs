//! Interface extractor transformer (spec §4.9 "Interface extractor").

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use super::{Change, Context, Transformer};
use crate::error::Result;
use crate::graph::Graph;
use crate::index::Index;
use crate::ir::{Symbol, SymbolId, SymbolKind};
use crate::transform::TransformResult;

/// Options governing pattern discovery and synthesis (spec §4.9).
#[derive(Clone)]
pub struct InterfaceExtractorOptions {
    /// Minimum number of implementing types for a pattern to qualify.
    pub minimum_types: usize,
    /// Minimum number of shared methods for a pattern to qualify.
    pub minimum_methods: usize,
    /// Fraction (0,1] of a pattern's methods a near-match type must cover
    /// to be counted as an implementer alongside the exact-match group.
    pub method_threshold: f64,
    /// Caller-supplied naming function, tried before the built-in
    /// heuristics.
    pub naming_strategy: Option<Arc<dyn Fn(&MethodPattern) -> String + Send + Sync>>,
    /// Preferred import path for the synthesized interface.
    pub target_package: Option<String>,
    /// Synthesize a new file for the interface rather than reusing one.
    pub create_new_files: bool,
    /// Package import paths never considered as extraction candidates.
    pub exclude_packages: Vec<String>,
    /// Struct type names never considered as extraction candidates.
    pub exclude_types: Vec<String>,
    /// Method names ignored when building a type's signature set.
    pub exclude_methods: Vec<String>,
}

impl Default for InterfaceExtractorOptions {
    fn default() -> Self {
        Self {
            minimum_types: 2,
            minimum_methods: 1,
            method_threshold: 1.0,
            naming_strategy: None,
            target_package: None,
            create_new_files: false,
            exclude_packages: Vec::new(),
            exclude_types: Vec::new(),
            exclude_methods: Vec::new(),
        }
    }
}

/// A group of structurally-identical (or near-identical) methods shared by
/// two or more struct types.
#[derive(Debug, Clone)]
pub struct MethodPattern {
    /// Chosen interface name.
    pub name: String,
    /// `"MethodName-canonical_signature"` keys, sorted.
    pub method_keys: Vec<String>,
    /// Struct Symbols that satisfy this pattern.
    pub implementing_types: Vec<SymbolId>,
}

impl MethodPattern {
    /// The bare method names in this pattern, in the same order as
    /// `method_keys`.
    pub fn method_names(&self) -> Vec<&str> {
        self.method_keys.iter().map(|k| split_key(k).0).collect()
    }
}

fn split_key(key: &str) -> (&str, &str) {
    key.split_once('-').unwrap_or((key, ""))
}

/// Discovers structurally-common method sets across struct types and
/// synthesizes an interface declaration for each one found (spec §4.9).
pub struct InterfaceExtractor {
    options: InterfaceExtractorOptions,
}

impl InterfaceExtractor {
    /// Build an extractor with the given options.
    pub fn new(options: InterfaceExtractorOptions) -> Self {
        Self { options }
    }

    fn eligible_types<'a>(&self, index: &'a Index) -> Vec<&'a Symbol> {
        index
            .find_symbols_by_kind(SymbolKind::Struct)
            .into_iter()
            .filter(|s| !self.options.exclude_types.contains(&s.name))
            .filter(|s| !self.options.exclude_packages.contains(&s.package))
            .collect()
    }

    /// Step 1-3: build the types↔method-signature-key bipartite graph,
    /// group types by shared signature-key multiset, and return every
    /// group meeting `minimum_types`/`minimum_methods` as an (unnamed)
    /// [`MethodPattern`].
    pub fn find_patterns(&self, index: &Index) -> Vec<MethodPattern> {
        let types = self.eligible_types(index);
        let bipartite: Graph<String, (), ()> = Graph::new();
        let mut type_nodes: Vec<(SymbolId, String)> = Vec::new();

        for type_symbol in &types {
            let methods = index.find_methods(&type_symbol.name);
            if methods.is_empty() {
                continue;
            }
            let type_node = format!("type:{}", type_symbol.id);
            bipartite.add_node(type_node.clone(), ());
            for method in methods {
                if self.options.exclude_methods.contains(&method.name) {
                    continue;
                }
                let signature = index.signature_of(&method.id).unwrap_or_default();
                let sig_node = format!("sig:{}-{signature}", method.name);
                bipartite.add_node(sig_node.clone(), ());
                let _ = bipartite.add_edge(type_node.clone(), sig_node, ());
            }
            type_nodes.push((type_symbol.id.clone(), type_node));
        }

        let per_type: Vec<(SymbolId, Vec<String>)> = type_nodes
            .into_iter()
            .map(|(id, node)| {
                let mut keys = bipartite.out_neighbors(&node);
                keys.sort();
                (id, keys)
            })
            .filter(|(_, keys)| !keys.is_empty())
            .collect();

        let mut by_keys: HashMap<Vec<String>, Vec<SymbolId>> = HashMap::new();
        for (id, keys) in &per_type {
            by_keys.entry(keys.clone()).or_default().push(id.clone());
        }

        let mut patterns = Vec::new();
        for (method_keys, exact_members) in by_keys {
            if exact_members.len() < self.options.minimum_types || method_keys.len() < self.options.minimum_methods {
                continue;
            }
            let mut implementing_types = exact_members.clone();
            for (id, keys) in &per_type {
                if implementing_types.contains(id) {
                    continue;
                }
                let covered = method_keys.iter().filter(|k| keys.contains(k)).count();
                let ratio = covered as f64 / method_keys.len() as f64;
                if ratio >= self.options.method_threshold {
                    implementing_types.push(id.clone());
                }
            }
            patterns.push(MethodPattern { name: String::new(), method_keys, implementing_types });
        }

        patterns
    }

    fn name_pattern(&self, pattern: &MethodPattern, types: &[&Symbol]) -> String {
        if let Some(strategy) = &self.options.naming_strategy {
            return strategy(pattern);
        }

        let implementer_names: Vec<&str> = pattern
            .implementing_types
            .iter()
            .filter_map(|id| types.iter().find(|t| &t.id == id).map(|t| t.name.as_str()))
            .collect();

        const COMMON_SUFFIXES: &[&str] = &["Reader", "Writer", "Handler", "Closer", "Listener", "Manager", "Provider", "Validator"];
        if !implementer_names.is_empty() {
            for suffix in COMMON_SUFFIXES {
                let matching = implementer_names.iter().filter(|n| n.ends_with(suffix)).count();
                if matching * 2 >= implementer_names.len() {
                    return (*suffix).to_owned();
                }
            }
        }

        if let Some(first_key) = pattern.method_keys.first() {
            return derive_name_from_method(split_key(first_key).0);
        }

        "Interface".to_owned()
    }

    /// Step 5: pick a target package import path — the configured one if
    /// it resolves in `module`, else the package of the first implementing
    /// type.
    fn target_package(&self, module: &crate::ir::Module, pattern: &MethodPattern, index: &Index) -> Option<String> {
        if let Some(configured) = &self.options.target_package {
            if module.packages.contains_key(configured) {
                return Some(configured.clone());
            }
        }
        pattern.implementing_types.first().and_then(|id| index.get_symbol(id)).map(|s| s.package.clone())
    }

    /// Step 6: pick a target file — synthesized in create-new mode, else
    /// an implementing type's own file, else the package's first non-test
    /// file.
    fn target_file(&self, module: &crate::ir::Module, target_package: &str, pattern: &MethodPattern, index: &Index, interface_name: &str) -> Option<PathBuf> {
        let package = module.packages.get(target_package)?;
        if self.options.create_new_files {
            let file_name = format!("{}_interface.go", interface_name.to_lowercase());
            return Some(package.directory.join(file_name));
        }
        if let Some(file) = pattern.implementing_types.first().and_then(|id| index.get_symbol(id)).map(|s| s.file.clone()) {
            return Some(file);
        }
        let mut candidates: Vec<&PathBuf> = package.files.values().filter(|f| !f.is_test_file).map(|f| &f.path).collect();
        candidates.sort();
        candidates.into_iter().next().cloned()
    }

    fn render_declaration(&self, interface_name: &str, pattern: &MethodPattern) -> String {
        let mut body = String::new();
        for key in &pattern.method_keys {
            let (name, signature) = split_key(key);
            body.push_str(&format!("\t{name}{signature}\n"));
        }
        format!(
            "// {interface_name} is implemented by {} type(s) sharing this method set.\ntype {interface_name} interface {{\n{body}}}\n",
            pattern.implementing_types.len()
        )
    }
}

impl Transformer for InterfaceExtractor {
    fn name(&self) -> &str {
        "extract-interface"
    }

    fn description(&self) -> &str {
        "synthesizes an interface declaration for structurally-common method sets"
    }

    fn validate(&self, _ctx: &Context) -> Result<()> {
        if !(0.0..=1.0).contains(&self.options.method_threshold) || self.options.method_threshold <= 0.0 {
            return Err(crate::error::Error::ValidationFailed("method_threshold must be in (0, 1]".to_owned()));
        }
        Ok(())
    }

    fn transform(&self, ctx: &mut Context) -> Result<TransformResult> {
        let types = self.eligible_types(ctx.index);
        let mut patterns = self.find_patterns(ctx.index);

        let mut changes = Vec::new();
        let mut affected_files = Vec::new();
        let mut summaries = Vec::new();

        for pattern in &mut patterns {
            pattern.name = self.name_pattern(pattern, &types);
            let Some(target_package) = self.target_package(ctx.module, pattern, ctx.index) else {
                continue;
            };
            let Some(target_file) = self.target_file(ctx.module, &target_package, pattern, ctx.index, &pattern.name) else {
                continue;
            };

            let declaration = self.render_declaration(&pattern.name, pattern);
            changes.push(Change {
                file: target_file.clone(),
                start_line: 0,
                start_col: 0,
                end_line: 0,
                end_col: 0,
                original_text: String::new(),
                new_text: declaration,
                affected_symbol: None,
            });
            if !affected_files.contains(&target_file) {
                affected_files.push(target_file.clone());
            }
            summaries.push(format!("{} ({} implementer(s))", pattern.name, pattern.implementing_types.len()));

            if !ctx.dry_run {
                if let Some(package) = ctx.module.packages.get_mut(&target_package) {
                    let id = SymbolId::top_level(&target_package, &pattern.name);
                    let symbol = Symbol {
                        id: id.clone(),
                        name: pattern.name.clone(),
                        kind: SymbolKind::Interface,
                        file: target_file.clone(),
                        package: target_package.clone(),
                        parent: None,
                        orphan: false,
                        range: crate::ir::SourceRange::default(),
                        exported: crate::ir::is_exported_name(&pattern.name),
                        references: Vec::new(),
                    };
                    package.add_symbol(symbol);
                }
            }
        }

        Ok(TransformResult {
            summary: if summaries.is_empty() {
                "no interface patterns found".to_owned()
            } else {
                format!("extracted {} interface(s): {}", summaries.len(), summaries.join(", "))
            },
            detail: format!("{} candidate struct type(s) examined", types.len()),
            success: true,
            dry_run: ctx.dry_run,
            error: None,
            affected_files,
            changes,
        })
    }
}

/// Step 4 fallback: transform a single method name into a plausible
/// interface name (spec §4.9: "Read→Reader, Write→Writer, Close→Closer,
/// otherwise append 'er' or 'r'").
fn derive_name_from_method(method_name: &str) -> String {
    match method_name {
        "Read" => "Reader".to_owned(),
        "Write" => "Writer".to_owned(),
        "Close" => "Closer".to_owned(),
        _ if method_name.ends_with('e') => format!("{method_name}r"),
        _ => format!("{method_name}er"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::RealFilesystem;
    use crate::loader::{load, LoadOptions};
    use crate::parser::go_parser::GoTreeSitterParser;
    use std::fs;

    fn sample_module() -> crate::ir::Module {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("go.mod"), "module example.com/io\n\ngo 1.21\n").unwrap();
        fs::write(
            dir.path().join("io.go"),
            r#"package io

type FileReader struct {
	path string
}

func (f *FileReader) Read(p []byte) (int, error) {
	return 0, nil
}

type NetReader struct {
	conn string
}

func (n *NetReader) Read(p []byte) (int, error) {
	return 0, nil
}
"#,
        )
        .unwrap();
        let parser = GoTreeSitterParser::new();
        load(dir.path(), &parser, &RealFilesystem, &LoadOptions::default()).unwrap().module
    }

    #[test]
    fn finds_shared_read_method_pattern() {
        let module = sample_module();
        let index = Index::build(&[&module]);
        let extractor = InterfaceExtractor::new(InterfaceExtractorOptions::default());
        let patterns = extractor.find_patterns(&index);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].implementing_types.len(), 2);
        assert_eq!(patterns[0].method_names(), vec!["Read"]);
    }

    #[test]
    fn pattern_below_minimum_types_is_excluded() {
        let module = sample_module();
        let index = Index::build(&[&module]);
        let opts = InterfaceExtractorOptions { minimum_types: 3, ..InterfaceExtractorOptions::default() };
        let extractor = InterfaceExtractor::new(opts);
        assert!(extractor.find_patterns(&index).is_empty());
    }

    #[test]
    fn transform_synthesizes_reader_interface() {
        let mut module = sample_module();
        let index = Index::build(&[&module]);
        let extractor = InterfaceExtractor::new(InterfaceExtractorOptions::default());
        let mut ctx = Context::new(&mut module, &index);
        let result = extractor.transform(&mut ctx).unwrap();

        assert!(result.success);
        assert_eq!(result.changes.len(), 1);
        assert!(result.changes[0].new_text.contains("type Reader interface"));
        assert!(result.changes[0].new_text.contains("Read([]byte)(int, error)"));

        let pkg = ctx.module.packages.get("example.com/io").unwrap();
        assert!(pkg.symbols.values().any(|s| s.name == "Reader" && s.kind == SymbolKind::Interface));
    }
}
