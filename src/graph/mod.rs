//! Generic directed-graph substrate (spec §4.1, component C1).
//!
//! A thin, reusable wrapper over [`petgraph::stable_graph::StableGraph`]
//! keyed by caller-supplied opaque node IDs rather than petgraph's own
//! `NodeIndex`, so callers never have to track index stability themselves.
//! This is the same storage the teacher's `CodeGraph` uses (a `StableGraph`
//! plus `HashMap` lookup indexes); this version generalizes it to arbitrary
//! `NodeData`/`EdgeData` so the call graph, dependency graph and
//! type/method bipartite graph can all be instantiations of one type
//! instead of three hand-rolled structs.

pub mod path;
pub mod topo;
pub mod traversal;

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::RwLock;

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::Directed;

pub use traversal::{Direction, TraversalOptions};

/// A node, addressable by the caller's own ID type, plus its payload.
#[derive(Debug, Clone)]
pub struct Node<Id, NodeData> {
    /// The caller-supplied stable identifier.
    pub id: Id,
    /// Arbitrary payload attached to the node.
    pub data: NodeData,
}

/// An edge between two caller IDs, plus its payload.
#[derive(Debug, Clone)]
pub struct Edge<Id, EdgeData> {
    /// Source node ID.
    pub from: Id,
    /// Target node ID.
    pub to: Id,
    /// Arbitrary payload attached to the edge.
    pub data: EdgeData,
}

/// A generic, thread-safe directed graph over opaque node IDs and edge
/// payloads (spec §4.1).
///
/// Every public method is one lock acquisition — a single logical operation
/// (e.g. `add_edge` that must create both endpoints) never exposes a
/// half-constructed edge to another thread (spec §5).
pub struct Graph<Id, NodeData, EdgeData> {
    inner: RwLock<Inner<Id, NodeData, EdgeData>>,
}

struct Inner<Id, NodeData, EdgeData> {
    graph: StableGraph<NodeData, EdgeData, Directed>,
    index_of: HashMap<Id, NodeIndex>,
    // Reverse lookup so queries can hand back the caller's ID instead of a
    // raw petgraph index.
    id_of: HashMap<NodeIndex, Id>,
    // Ordered insertion of out-edges per node, for deterministic tie-breaks
    // in shortest_path (spec §4.1: "must be deterministic for reproducibility").
    edge_order: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl<Id, NodeData, EdgeData> Graph<Id, NodeData, EdgeData>
where
    Id: Clone + Eq + Hash + fmt::Debug,
{
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                graph: StableGraph::new(),
                index_of: HashMap::new(),
                id_of: HashMap::new(),
                edge_order: HashMap::new(),
            }),
        }
    }

    /// Insert a node, or update its data if `id` already exists. Existing
    /// edges are preserved either way. Returns the canonical `id`.
    pub fn add_node(&self, id: Id, data: NodeData) -> Id {
        let mut inner = self.inner.write().expect("graph lock poisoned");
        if let Some(&idx) = inner.index_of.get(&id) {
            inner.graph[idx] = data;
        } else {
            let idx = inner.graph.add_node(data);
            inner.index_of.insert(id.clone(), idx);
            inner.id_of.insert(idx, id.clone());
            inner.edge_order.insert(idx, Vec::new());
        }
        id
    }

    /// Insert an edge `from -> to`, creating either endpoint if it does not
    /// already exist (with a caller must have added nodes first if they
    /// need specific data — missing endpoints are created with `default`).
    /// If the edge already exists its data is replaced; identity is keyed
    /// on the ordered pair `(from, to)`.
    pub fn add_edge(&self, from: Id, to: Id, data: EdgeData) -> Result<(), String>
    where
        NodeData: Default,
    {
        let mut inner = self.inner.write().expect("graph lock poisoned");
        let from_idx = Self::get_or_insert_default(&mut inner, from);
        let to_idx = Self::get_or_insert_default(&mut inner, to);

        if let Some(existing) = inner.graph.find_edge(from_idx, to_idx) {
            inner.graph[existing] = data;
        } else {
            inner.graph.add_edge(from_idx, to_idx, data);
            inner.edge_order.entry(from_idx).or_default().push(to_idx);
        }
        Ok(())
    }

    fn get_or_insert_default(inner: &mut Inner<Id, NodeData, EdgeData>, id: Id) -> NodeIndex
    where
        NodeData: Default,
    {
        if let Some(&idx) = inner.index_of.get(&id) {
            idx
        } else {
            let idx = inner.graph.add_node(NodeData::default());
            inner.index_of.insert(id.clone(), idx);
            inner.id_of.insert(idx, id);
            inner.edge_order.insert(idx, Vec::new());
            idx
        }
    }

    /// Remove a node and every edge incident to it (both directions).
    /// Idempotent if `id` is absent.
    pub fn remove_node(&self, id: &Id) {
        let mut inner = self.inner.write().expect("graph lock poisoned");
        if let Some(idx) = inner.index_of.remove(id) {
            inner.id_of.remove(&idx);
            inner.edge_order.remove(&idx);
            for targets in inner.edge_order.values_mut() {
                targets.retain(|t| *t != idx);
            }
            inner.graph.remove_node(idx);
        }
    }

    /// Remove the edge `from -> to`. Idempotent if absent.
    pub fn remove_edge(&self, from: &Id, to: &Id) {
        let mut inner = self.inner.write().expect("graph lock poisoned");
        let (Some(&from_idx), Some(&to_idx)) =
            (inner.index_of.get(from), inner.index_of.get(to))
        else {
            return;
        };
        if let Some(e) = inner.graph.find_edge(from_idx, to_idx) {
            inner.graph.remove_edge(e);
        }
        if let Some(targets) = inner.edge_order.get_mut(&from_idx) {
            targets.retain(|t| *t != to_idx);
        }
    }

    /// Remove every node and edge.
    pub fn clear(&self) {
        let mut inner = self.inner.write().expect("graph lock poisoned");
        inner.graph.clear();
        inner.index_of.clear();
        inner.id_of.clear();
        inner.edge_order.clear();
    }

    /// Fetch a clone of a node's data.
    pub fn get_node(&self, id: &Id) -> Option<NodeData>
    where
        NodeData: Clone,
    {
        let inner = self.inner.read().expect("graph lock poisoned");
        let idx = *inner.index_of.get(id)?;
        Some(inner.graph[idx].clone())
    }

    /// Fetch a clone of an edge's data.
    pub fn get_edge(&self, from: &Id, to: &Id) -> Option<EdgeData>
    where
        EdgeData: Clone,
    {
        let inner = self.inner.read().expect("graph lock poisoned");
        let from_idx = *inner.index_of.get(from)?;
        let to_idx = *inner.index_of.get(to)?;
        let e = inner.graph.find_edge(from_idx, to_idx)?;
        Some(inner.graph[e].clone())
    }

    /// IDs of every node with an edge `id -> neighbor`.
    pub fn out_neighbors(&self, id: &Id) -> Vec<Id> {
        let inner = self.inner.read().expect("graph lock poisoned");
        let Some(&idx) = inner.index_of.get(id) else {
            return Vec::new();
        };
        inner
            .edge_order
            .get(&idx)
            .into_iter()
            .flatten()
            .filter_map(|t| inner.id_of.get(t).cloned())
            .collect()
    }

    /// IDs of every node with an edge `neighbor -> id`.
    pub fn in_neighbors(&self, id: &Id) -> Vec<Id> {
        let inner = self.inner.read().expect("graph lock poisoned");
        let Some(&idx) = inner.index_of.get(id) else {
            return Vec::new();
        };
        inner
            .graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .filter_map(|n| inner.id_of.get(&n).cloned())
            .collect()
    }

    /// Whether `id` is a node in the graph.
    pub fn has_node(&self, id: &Id) -> bool {
        let inner = self.inner.read().expect("graph lock poisoned");
        inner.index_of.contains_key(id)
    }

    /// Whether `from -> to` is an edge in the graph.
    pub fn has_edge(&self, from: &Id, to: &Id) -> bool {
        let inner = self.inner.read().expect("graph lock poisoned");
        let (Some(&f), Some(&t)) = (inner.index_of.get(from), inner.index_of.get(to)) else {
            return false;
        };
        inner.graph.find_edge(f, t).is_some()
    }

    /// Number of incoming edges.
    pub fn in_degree(&self, id: &Id) -> usize {
        let inner = self.inner.read().expect("graph lock poisoned");
        let Some(&idx) = inner.index_of.get(id) else {
            return 0;
        };
        inner
            .graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .count()
    }

    /// Number of outgoing edges.
    pub fn out_degree(&self, id: &Id) -> usize {
        let inner = self.inner.read().expect("graph lock poisoned");
        inner
            .index_of
            .get(id)
            .and_then(|idx| inner.edge_order.get(idx))
            .map(|v| v.len())
            .unwrap_or(0)
    }

    /// `(node_count, edge_count)`.
    pub fn size(&self) -> (usize, usize) {
        let inner = self.inner.read().expect("graph lock poisoned");
        (inner.graph.node_count(), inner.graph.edge_count())
    }

    /// All node IDs currently in the graph.
    pub fn node_ids(&self) -> Vec<Id> {
        let inner = self.inner.read().expect("graph lock poisoned");
        inner.id_of.values().cloned().collect()
    }

    /// All edges currently in the graph, as `(from, to)` pairs.
    pub fn edge_list(&self) -> Vec<(Id, Id)> {
        let inner = self.inner.read().expect("graph lock poisoned");
        inner
            .edge_order
            .iter()
            .flat_map(|(from, targets)| {
                let from = inner.id_of.get(from).cloned();
                targets.iter().filter_map(move |t| {
                    Some((from.clone()?, inner.id_of.get(t).cloned()?))
                })
            })
            .collect()
    }

    /// Remove every node for which `predicate` returns `false`.
    pub fn retain_nodes<F>(&self, mut predicate: F)
    where
        F: FnMut(&Id, &NodeData) -> bool,
    {
        let to_remove: Vec<Id> = {
            let inner = self.inner.read().expect("graph lock poisoned");
            inner
                .id_of
                .iter()
                .filter(|(idx, id)| !predicate(id, &inner.graph[**idx]))
                .map(|(_, id)| id.clone())
                .collect()
        };
        for id in to_remove {
            self.remove_node(&id);
        }
    }

    /// A minimal, non-presentation DOT dump of the graph for debugging.
    pub fn to_dot(&self) -> String
    where
        NodeData: fmt::Debug,
        EdgeData: fmt::Debug,
    {
        let inner = self.inner.read().expect("graph lock poisoned");
        let mut out = String::from("digraph modgraph {\n");
        for id in inner.id_of.values() {
            out.push_str(&format!("  \"{:?}\";\n", id));
        }
        for (from, targets) in &inner.edge_order {
            let from_id = &inner.id_of[from];
            for to in targets {
                let to_id = &inner.id_of[to];
                out.push_str(&format!("  \"{:?}\" -> \"{:?}\";\n", from_id, to_id));
            }
        }
        out.push_str("}\n");
        out
    }
}

impl<Id, NodeData, EdgeData> Default for Graph<Id, NodeData, EdgeData>
where
    Id: Clone + Eq + Hash + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

// Internal accessors shared by the traversal/path/topo submodules. These
// take the read lock once and operate on the petgraph indices directly so
// multi-step algorithms (BFS, Dijkstra, Tarjan) don't pay a HashMap lookup
// per visited node.
pub(crate) struct Snapshot<Id> {
    pub(crate) index_of: HashMap<Id, NodeIndex>,
    pub(crate) id_of: HashMap<NodeIndex, Id>,
    pub(crate) out_edges: HashMap<NodeIndex, Vec<(NodeIndex, EdgeIndex)>>,
    pub(crate) in_edges: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl<Id, NodeData, EdgeData> Graph<Id, NodeData, EdgeData>
where
    Id: Clone + Eq + Hash + fmt::Debug,
{
    pub(crate) fn snapshot(&self) -> Snapshot<Id> {
        let inner = self.inner.read().expect("graph lock poisoned");
        let mut out_edges: HashMap<NodeIndex, Vec<(NodeIndex, EdgeIndex)>> = HashMap::new();
        for (&from, targets) in &inner.edge_order {
            let mut v = Vec::with_capacity(targets.len());
            for &to in targets {
                if let Some(e) = inner.graph.find_edge(from, to) {
                    v.push((to, e));
                }
            }
            out_edges.insert(from, v);
        }
        let mut in_edges: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
        for idx in inner.graph.node_indices() {
            let preds: Vec<NodeIndex> = inner
                .graph
                .neighbors_directed(idx, petgraph::Direction::Incoming)
                .collect();
            in_edges.insert(idx, preds);
        }
        Snapshot {
            index_of: inner.index_of.clone(),
            id_of: inner.id_of.clone(),
            out_edges,
            in_edges,
        }
    }

    pub(crate) fn edge_weight(&self, e: EdgeIndex) -> EdgeData
    where
        EdgeData: Clone,
    {
        let inner = self.inner.read().expect("graph lock poisoned");
        inner.graph[e].clone()
    }
}
