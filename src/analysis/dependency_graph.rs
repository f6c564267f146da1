//! Dependency graph analyzer (spec §4.7 "Dependency graph").

use std::collections::HashMap;

use crate::graph::Graph;
use crate::index::Index;
use crate::ir::{ReferenceKind, SymbolId};

/// Aggregated reference relationship between two Symbols.
#[derive(Debug, Clone, Default)]
pub struct DependencyEdge {
    /// Reference count per kind.
    pub counts: HashMap<ReferenceKind, usize>,
    /// Total reference count across all kinds.
    pub strength: usize,
}

/// Nodes are Symbols; edges aggregate every Reference between them.
pub struct DependencyGraph {
    graph: Graph<SymbolId, (), DependencyEdge>,
}

impl DependencyGraph {
    /// Build a dependency graph from every Reference recorded in `index`
    /// whose use-site has a known containing Symbol.
    pub fn build(index: &Index) -> Self {
        let graph: Graph<SymbolId, (), DependencyEdge> = Graph::new();
        for symbol in index.all_symbols() {
            graph.add_node(symbol.id.clone(), ());
            for reference in &symbol.references {
                let Some(from) = &reference.containing_symbol else {
                    continue;
                };
                graph.add_node(from.clone(), ());
                let mut edge = graph.get_edge(from, &symbol.id).unwrap_or_default();
                *edge.counts.entry(reference.kind).or_default() += 1;
                edge.strength += 1;
                let _ = graph.add_edge(from.clone(), symbol.id.clone(), edge);
            }
        }
        Self { graph }
    }

    /// Every elementary dependency cycle.
    pub fn find_cycles(&self) -> Vec<Vec<SymbolId>> {
        self.graph.find_all_cycles()
    }

    /// The `n` Symbols with the highest in-degree (most depended-upon).
    pub fn most_depended(&self, n: usize) -> Vec<(SymbolId, usize)> {
        self.ranked(n, |id| self.graph.in_degree(id))
    }

    /// The `n` Symbols with the highest out-degree (most dependent on
    /// others).
    pub fn most_dependent(&self, n: usize) -> Vec<(SymbolId, usize)> {
        self.ranked(n, |id| self.graph.out_degree(id))
    }

    fn ranked<F>(&self, n: usize, degree_of: F) -> Vec<(SymbolId, usize)>
    where
        F: Fn(&SymbolId) -> usize,
    {
        let mut ranked: Vec<(SymbolId, usize)> = self.graph.node_ids().into_iter().map(|id| {
            let degree = degree_of(&id);
            (id, degree)
        }).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.0.cmp(&b.0.0)));
        ranked.truncate(n);
        ranked
    }
}
