//! Call graph analyzer (spec §4.7 "Call graph").

use crate::graph::Graph;
use crate::index::Index;
use crate::ir::{ReferenceKind, SourceRange, SymbolId, SymbolKind};

/// Aggregated call relationship between two Function/Method Symbols.
#[derive(Debug, Clone, Default)]
pub struct CallEdge {
    /// Every recorded call site between the two symbols.
    pub call_sites: Vec<SourceRange>,
    /// `true` if any call site resolved through an interface method rather
    /// than a concrete receiver (best-effort: the callee's parent is an
    /// Interface Symbol — there is no real call-site type to inspect).
    pub dynamic: bool,
}

/// Nodes are Function/Method Symbols; edges are [`CallEdge`]s.
pub struct CallGraph {
    graph: Graph<SymbolId, (), CallEdge>,
}

impl CallGraph {
    /// Build a call graph from every `Call` reference recorded in `index`.
    pub fn build(index: &Index) -> Self {
        let graph: Graph<SymbolId, (), CallEdge> = Graph::new();
        for symbol in index.all_symbols() {
            if !matches!(symbol.kind, SymbolKind::Function | SymbolKind::Method) {
                continue;
            }
            graph.add_node(symbol.id.clone(), ());
            for reference in &symbol.references {
                if reference.kind != ReferenceKind::Call {
                    continue;
                }
                let Some(caller) = &reference.containing_symbol else {
                    continue;
                };
                let dynamic = symbol
                    .parent
                    .as_ref()
                    .and_then(|p| index.get_symbol(p))
                    .is_some_and(|p| p.kind == SymbolKind::Interface);
                Self::record_call(&graph, caller.clone(), symbol.id.clone(), reference.range, dynamic);
            }
        }
        Self { graph }
    }

    fn record_call(graph: &Graph<SymbolId, (), CallEdge>, caller: SymbolId, callee: SymbolId, site: SourceRange, dynamic: bool) {
        let mut edge = graph.get_edge(&caller, &callee).unwrap_or_default();
        edge.call_sites.push(site);
        edge.dynamic = edge.dynamic || dynamic;
        graph.add_node(caller.clone(), ());
        graph.add_node(callee.clone(), ());
        let _ = graph.add_edge(caller, callee, edge);
    }

    /// Record a call relationship directly, without going through
    /// `Index`-derived References (e.g. for a caller building a synthetic
    /// or incrementally-updated call graph).
    pub fn add_call(&self, caller: SymbolId, callee: SymbolId, site: SourceRange, dynamic: bool) {
        Self::record_call(&self.graph, caller, callee, site, dynamic);
    }

    /// Every simple call path from `from` to `to`, up to `max_len` hops.
    pub fn find_paths(&self, from: &SymbolId, to: &SymbolId, max_len: usize) -> Vec<Vec<SymbolId>> {
        self.graph.all_paths(from, to, max_len)
    }

    /// Every elementary call cycle (mutual/self recursion).
    pub fn find_cycles(&self) -> Vec<Vec<SymbolId>> {
        self.graph.find_all_cycles()
    }

    /// Functions/methods with no recorded caller, optionally excluding
    /// exported symbols and/or a `main` entry point.
    pub fn dead_functions(&self, index: &Index, exclude_exported: bool, exclude_main: bool) -> Vec<SymbolId> {
        self.graph
            .node_ids()
            .into_iter()
            .filter(|id| self.graph.in_degree(id) == 0)
            .filter(|id| match index.get_symbol(id) {
                Some(sym) => {
                    if exclude_exported && sym.exported {
                        return false;
                    }
                    if exclude_main && sym.kind == SymbolKind::Function && sym.name == "main" {
                        return false;
                    }
                    true
                }
                None => true,
            })
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

    fn sample_module() -> crate::ir::Module {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("go.mod"), "module example.com/app\n\ngo 1.21\n").unwrap();
        fs::write(
            dir.path().join("app.go"),
            "package app\n\nfunc helper() int {\n\treturn 1\n}\n\nfunc main() {\n\thelper()\n}\n",
        )
        .unwrap();
        let parser = GoTreeSitterParser::new();
        load(dir.path(), &parser, &RealFilesystem, &LoadOptions { include_private: true, ..LoadOptions::default() })
            .unwrap()
            .module
    }

    #[test]
    fn finds_call_path_from_main_to_helper() {
        let module = sample_module();
        let index = Index::build(&[&module]);
        let call_graph = CallGraph::build(&index);
        let main_id = SymbolId::top_level("example.com/app", "main");
        let helper_id = SymbolId::top_level("example.com/app", "helper");
        let paths = call_graph.find_paths(&main_id, &helper_id, 0);
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn dead_functions_excludes_main_when_requested() {
        let module = sample_module();
        let index = Index::build(&[&module]);
        let call_graph = CallGraph::build(&index);
        let dead = call_graph.dead_functions(&index, false, true);
        assert!(!dead.iter().any(|id| id.0.ends_with(".main")));
    }
}
