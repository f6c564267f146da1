//! Topological sort and elementary-cycle enumeration (spec §4.1).

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use petgraph::stable_graph::NodeIndex;

use super::Graph;
use crate::error::{Error, Result};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

impl<Id, NodeData, EdgeData> Graph<Id, NodeData, EdgeData>
where
    Id: Clone + Eq + Hash + fmt::Debug,
{
    /// Tarjan-style three-color DFS topological sort. Fails with
    /// [`Error::CycleDetected`] if any back-edge is found.
    pub fn topological_sort(&self) -> Result<Vec<Id>> {
        let snap = self.snapshot();
        let mut color: HashMap<NodeIndex, Color> = snap
            .id_of
            .keys()
            .map(|&idx| (idx, Color::White))
            .collect();
        let mut order = Vec::with_capacity(snap.id_of.len());

        // Iterate nodes in a deterministic order (insertion order via id_of
        // is not guaranteed for HashMap, so sort by the stable NodeIndex).
        let mut starts: Vec<NodeIndex> = snap.id_of.keys().copied().collect();
        starts.sort_by_key(|idx| idx.index());

        for start in starts {
            if color[&start] == Color::White {
                Self::topo_visit(&snap, start, &mut color, &mut order)?;
            }
        }

        order.reverse();
        Ok(order.into_iter().map(|idx| snap.id_of[&idx].clone()).collect())
    }

    fn topo_visit(
        snap: &super::Snapshot<Id>,
        node: NodeIndex,
        color: &mut HashMap<NodeIndex, Color>,
        order: &mut Vec<NodeIndex>,
    ) -> Result<()> {
        color.insert(node, Color::Gray);
        for (next, _) in snap.out_edges.get(&node).into_iter().flatten() {
            match color[next] {
                Color::White => Self::topo_visit(snap, *next, color, order)?,
                Color::Gray => return Err(Error::CycleDetected),
                Color::Black => {}
            }
        }
        color.insert(node, Color::Black);
        order.push(node);
        Ok(())
    }

    /// Every elementary cycle in the graph, each as a node list with a
    /// repeating final node (e.g. `[A, B, C, A]`).
    pub fn find_all_cycles(&self) -> Vec<Vec<Id>> {
        let snap = self.snapshot();
        let mut cycles = Vec::new();
        let mut stack: Vec<NodeIndex> = Vec::new();
        let mut on_stack: HashMap<NodeIndex, bool> =
            snap.id_of.keys().map(|&i| (i, false)).collect();

        let mut starts: Vec<NodeIndex> = snap.id_of.keys().copied().collect();
        starts.sort_by_key(|idx| idx.index());

        for start in starts {
            Self::cycle_dfs(&snap, start, &mut stack, &mut on_stack, &mut cycles);
        }

        cycles
            .into_iter()
            .map(|cyc| cyc.into_iter().map(|idx| snap.id_of[&idx].clone()).collect())
            .collect()
    }

    fn cycle_dfs(
        snap: &super::Snapshot<Id>,
        node: NodeIndex,
        stack: &mut Vec<NodeIndex>,
        on_stack: &mut HashMap<NodeIndex, bool>,
        cycles: &mut Vec<Vec<NodeIndex>>,
    ) {
        if on_stack[&node] {
            // Found a cycle: the portion of `stack` from node's first
            // occurrence onward, closed by `node` again.
            if let Some(pos) = stack.iter().position(|&n| n == node) {
                let mut cyc: Vec<NodeIndex> = stack[pos..].to_vec();
                cyc.push(node);
                cycles.push(cyc);
            }
            return;
        }

        stack.push(node);
        on_stack.insert(node, true);

        for (next, _) in snap.out_edges.get(&node).into_iter().flatten() {
            Self::cycle_dfs(snap, *next, stack, on_stack, cycles);
        }

        stack.pop();
        on_stack.insert(node, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topological_sort_on_dag_starts_and_ends_correctly() {
        let g: Graph<i32, (), ()> = Graph::new();
        g.add_edge(1, 2, ()).unwrap();
        g.add_edge(1, 4, ()).unwrap();
        g.add_edge(2, 3, ()).unwrap();
        g.add_edge(4, 3, ()).unwrap();
        let order = g.topological_sort().unwrap();
        assert_eq!(order.first(), Some(&1));
        assert_eq!(order.last(), Some(&3));
    }

    #[test]
    fn topological_sort_fails_on_cycle() {
        let g: Graph<i32, (), ()> = Graph::new();
        g.add_edge(1, 2, ()).unwrap();
        g.add_edge(2, 1, ()).unwrap();
        assert!(matches!(
            g.topological_sort(),
            Err(Error::CycleDetected)
        ));
    }

    #[test]
    fn find_all_cycles_reports_three_node_loop() {
        let g: Graph<&str, (), ()> = Graph::new();
        g.add_edge("A", "B", ()).unwrap();
        g.add_edge("B", "C", ()).unwrap();
        g.add_edge("C", "A", ()).unwrap();
        let cycles = g.find_all_cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 4);
        assert_eq!(cycles[0].first(), cycles[0].last());
    }
}
