//! Single-source Dijkstra over graphs that are never materialized.
//!
//! Neighbors and edge costs come from a caller-supplied [`Expander`], invoked
//! once per settled entry. Entries live in a fixed-capacity open-addressed
//! [`EntryRepository`] that doubles as the resulting parent-pointer tree, and
//! pending entries are ranked by an index-aware [`PriorityQueue`] with
//! O(log n) decrease-key.
//!
//! ```
//! use lazy_dijkstra::shortest_path_tree;
//!
//! // node i links to i + 1 (cost 2) and i + 3 (cost 5), modulo 10
//! let tree = shortest_path_tree(0u32, 10, |&node: &u32| {
//!     [((node + 1) % 10, 2u32), ((node + 3) % 10, 5u32)]
//! }).unwrap();
//!
//! assert_eq!(tree.weight_of(&3), Some(&5));
//! assert_eq!(tree.path_to(&2).unwrap(), vec![0, 1, 2]);
//! ```

pub mod collections;
pub mod errors;
pub mod graph_algos;

pub use errors::SearchError;
pub use graph_algos::GraphNodeMap;
pub use graph_algos::dijkstra::{
    Dijkstra, Expander, Neighbors, Relaxation, RunStats, relax, shortest_path_to, shortest_path_tree,
};
pub use graph_algos::priority_queue::{Maximize, Minimize, Preference, PriorityQueue, QueueStats};
pub use graph_algos::repository::{
    Ancestors, Entry, EntryId, EntryRepository, FxSlotHash, Seat, SlotHash, VacantSeat,
};
