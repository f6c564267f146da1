//! Shortest-path and all-paths queries (spec §4.1 "Paths").

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;

use petgraph::stable_graph::NodeIndex;

use super::Graph;

/// A path found by [`Graph::shortest_weighted_path`]: the ordered node
/// sequence plus its total cost.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedPath<Id> {
    /// Nodes visited, in order, including both endpoints.
    pub nodes: Vec<Id>,
    /// Sum of edge weights along the path.
    pub cost: f64,
}

#[derive(Debug)]
struct HeapEntry {
    cost: f64,
    idx: NodeIndex,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}
impl Eq for HeapEntry {}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for a min-heap via BinaryHeap (which is a max-heap).
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
    }
}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Id, NodeData, EdgeData> Graph<Id, NodeData, EdgeData>
where
    Id: Clone + Eq + Hash + fmt::Debug,
{
    /// Unweighted shortest path from `a` to `b`, following outgoing edges.
    /// Ties among equal-length candidates are broken by the insertion order
    /// of each node's out-edges. Returns `None` if unreachable.
    pub fn shortest_path(&self, a: &Id, b: &Id) -> Option<Vec<Id>> {
        let snap = self.snapshot();
        let &start = snap.index_of.get(a)?;
        let &goal = snap.index_of.get(b)?;

        if start == goal {
            return Some(vec![a.clone()]);
        }

        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut prev: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some(idx) = queue.pop_front() {
            if idx == goal {
                return Some(Self::reconstruct(&snap.id_of, &prev, start, goal));
            }
            for (n, _) in snap.out_edges.get(&idx).into_iter().flatten() {
                if visited.insert(*n) {
                    prev.insert(*n, idx);
                    queue.push_back(*n);
                }
            }
        }
        None
    }

    fn reconstruct(
        id_of: &HashMap<NodeIndex, Id>,
        prev: &HashMap<NodeIndex, NodeIndex>,
        start: NodeIndex,
        goal: NodeIndex,
    ) -> Vec<Id> {
        let mut path = vec![goal];
        let mut cur = goal;
        while cur != start {
            cur = prev[&cur];
            path.push(cur);
        }
        path.reverse();
        path.into_iter().map(|idx| id_of[&idx].clone()).collect()
    }

    /// Dijkstra shortest path by edge weight. `weight_fn(edge_data)` returns
    /// the weight of an edge; pass `None` to default every edge to `1.0`.
    pub fn shortest_weighted_path<W>(
        &self,
        a: &Id,
        b: &Id,
        weight_fn: Option<W>,
    ) -> Option<WeightedPath<Id>>
    where
        W: Fn(&EdgeData) -> f64,
        EdgeData: Clone,
    {
        let snap = self.snapshot();
        let &start = snap.index_of.get(a)?;
        let &goal = snap.index_of.get(b)?;

        let mut dist: HashMap<NodeIndex, f64> = HashMap::new();
        let mut prev: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut heap = BinaryHeap::new();

        dist.insert(start, 0.0);
        heap.push(HeapEntry {
            cost: 0.0,
            idx: start,
        });

        while let Some(HeapEntry { cost, idx }) = heap.pop() {
            if idx == goal {
                let nodes = Self::reconstruct(&snap.id_of, &prev, start, goal);
                return Some(WeightedPath { nodes, cost });
            }
            if cost > *dist.get(&idx).unwrap_or(&f64::INFINITY) {
                continue;
            }
            for (n, e) in snap.out_edges.get(&idx).into_iter().flatten() {
                let w = match &weight_fn {
                    Some(f) => f(&self.edge_weight(*e)),
                    None => 1.0,
                };
                let next_cost = cost + w;
                if next_cost < *dist.get(n).unwrap_or(&f64::INFINITY) {
                    dist.insert(*n, next_cost);
                    prev.insert(*n, idx);
                    heap.push(HeapEntry {
                        cost: next_cost,
                        idx: *n,
                    });
                }
            }
        }
        None
    }

    /// All simple paths from `a` to `b`, up to `max_len` edges (`0` =
    /// unlimited). Each discovery of `b` yields a cloned path; the
    /// visited-set unmarks on backtrack so multiple disjoint paths are
    /// all found.
    pub fn all_paths(&self, a: &Id, b: &Id, max_len: usize) -> Vec<Vec<Id>> {
        let snap = self.snapshot();
        let (Some(&start), Some(&goal)) = (snap.index_of.get(a), snap.index_of.get(b)) else {
            return Vec::new();
        };

        let mut results = Vec::new();
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut path: Vec<NodeIndex> = vec![start];
        visited.insert(start);

        Self::all_paths_dfs(&snap, start, goal, max_len, &mut visited, &mut path, &mut results);

        results
            .into_iter()
            .map(|p| p.into_iter().map(|idx| snap.id_of[&idx].clone()).collect())
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn all_paths_dfs(
        snap: &super::Snapshot<Id>,
        current: NodeIndex,
        goal: NodeIndex,
        max_len: usize,
        visited: &mut HashSet<NodeIndex>,
        path: &mut Vec<NodeIndex>,
        results: &mut Vec<Vec<NodeIndex>>,
    ) {
        if current == goal {
            results.push(path.clone());
            return;
        }
        if max_len != 0 && path.len() - 1 >= max_len {
            return;
        }
        for (next, _) in snap.out_edges.get(&current).into_iter().flatten() {
            if visited.insert(*next) {
                path.push(*next);
                Self::all_paths_dfs(snap, *next, goal, max_len, visited, path, results);
                path.pop();
                visited.remove(next);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weighted_graph() -> Graph<&'static str, (), f64> {
        let g: Graph<&str, (), f64> = Graph::new();
        g.add_edge("A", "B", 4.0).unwrap();
        g.add_edge("A", "C", 2.0).unwrap();
        g.add_edge("B", "E", 3.0).unwrap();
        g.add_edge("C", "B", 1.0).unwrap();
        g.add_edge("C", "D", 2.0).unwrap();
        g.add_edge("C", "E", 4.0).unwrap();
        g.add_edge("D", "E", 1.0).unwrap();
        g
    }

    #[test]
    fn shortest_weighted_path_matches_spec_scenario() {
        let g = weighted_graph();
        let result = g
            .shortest_weighted_path(&"A", &"E", Some(|w: &f64| *w))
            .unwrap();
        assert_eq!(result.nodes, vec!["A", "C", "D", "E"]);
        assert_eq!(result.cost, 5.0);
    }

    #[test]
    fn shortest_path_unweighted_matches_spec_scenario() {
        let g = weighted_graph();
        let result = g.shortest_path(&"A", &"E").unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result, vec!["A", "C", "E"]);
    }

    #[test]
    fn all_paths_unlimited_finds_every_simple_path() {
        let g: Graph<&str, (), ()> = Graph::new();
        g.add_edge("A", "B", ()).unwrap();
        g.add_edge("A", "C", ()).unwrap();
        g.add_edge("B", "D", ()).unwrap();
        g.add_edge("C", "D", ()).unwrap();
        let paths = g.all_paths(&"A", &"D", 0);
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn all_paths_respects_max_len() {
        let g: Graph<&str, (), ()> = Graph::new();
        g.add_edge("A", "B", ()).unwrap();
        g.add_edge("B", "C", ()).unwrap();
        g.add_edge("C", "D", ()).unwrap();
        let paths = g.all_paths(&"A", &"D", 2);
        assert!(paths.is_empty());
        let paths = g.all_paths(&"A", &"D", 3);
        assert_eq!(paths.len(), 1);
    }
}
