//! Analyzers built on the graph substrate and the Index (spec §4.7,
//! component C7): a call graph, a dependency graph, and a dead-code
//! detector backed by a usage collector. Grounded in the teacher's
//! `query/circular.rs` (cycle reporting over a built graph) and
//! `query/dead_code.rs`/`query/impact.rs` (per-symbol usage analysis),
//! generalized from the teacher's single `CodeGraph` to this crate's
//! `Index`-backed `Graph<Id, NodeData, EdgeData>` substrate.

pub mod call_graph;
pub mod dead_code;
pub mod dependency_graph;
pub mod usage;

pub use call_graph::{CallEdge, CallGraph};
pub use dead_code::{DeadCodeDetector, DeadCodeFinding, DeadCodeOptions};
pub use dependency_graph::{DependencyEdge, DependencyGraph};
pub use usage::UsageCollector;
