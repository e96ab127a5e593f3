pub mod dijkstra;
pub mod priority_queue;
pub mod repository;
mod shortest_path;

use shortest_path::shortest_path;

use crate::collections::FxIndexMap;

/// Type alias for the dense export of a shortest path tree
/// N: Node - space on a graph
/// C: Cost of reaching the node from the source
/// The tuple contains (parent_index, cost) where:
/// - parent_index is the index of the parent node in the map
/// - cost is the total cost to reach this node from the source
pub type GraphNodeMap<N, C> = FxIndexMap<N, (usize, C)>;
