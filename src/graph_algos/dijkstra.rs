use crate::errors::SearchError;
use super::priority_queue::{Minimize, Preference, PriorityQueue};
use super::repository::{EntryId, EntryRepository, FxSlotHash, Seat, SlotHash};

use std::{hash::Hash, ops::Add};
use num_traits::Zero;


/// Neighbor discovery for one settled entry
///
/// Called once per extracted entry with direct access to the queue and the repository.
/// For every neighbor it must go through `find_or_reserve`, then either
/// `populate` + `insert_or_update(.., true)` for a vacant seat, or
/// `improve` + `insert_or_update(.., false)` when the new weight is better.
/// `relax` does exactly this.
pub trait Expander<K, W, H, P> {
    fn expand(&mut self, queue: &mut PriorityQueue<P>, repository: &mut EntryRepository<K, W, H>, settled: EntryId);
}

impl<K, W, H, P, F> Expander<K, W, H, P> for F
where
    F: FnMut(&mut PriorityQueue<P>, &mut EntryRepository<K, W, H>, EntryId),
{
    fn expand(&mut self, queue: &mut PriorityQueue<P>, repository: &mut EntryRepository<K, W, H>, settled: EntryId) {
        self(queue, repository, settled)
    }
}


/// What `relax` did with a neighbor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relaxation {
    Discovered(EntryId), // first sighting, now queued
    Improved(EntryId), // better weight found, key decreased
    Unchanged(EntryId), // existing weight is better or equal
}

/// Offer `neighbor`, reached from `from` over an edge costing `edge_cost`
/// Weight of the candidate path = weight of `from` + `edge_cost`
pub fn relax<K, W, H, P>(
    queue: &mut PriorityQueue<P>,
    repository: &mut EntryRepository<K, W, H>,
    from: EntryId,
    neighbor: K,
    edge_cost: W,
) -> Relaxation
where
    K: Eq,
    W: Add<Output = W> + Copy,
    H: SlotHash<K>,
    P: Preference<W>,
{
    let candidate = *repository.entry(from).weight() + edge_cost;

    match repository.find_or_reserve(neighbor) {
        Seat::Vacant(seat) => {
            // This is the first time we're seeing this neighbor
            let id = repository.populate(seat, candidate, Some(from));
            queue.insert_or_update(repository, id, true);
            Relaxation::Discovered(id)
        }
        Seat::Occupied(id) => {
            if queue.preference().is_better(&candidate, repository.entry(id).weight()) {
                // We've found a better path to this neighbor
                repository.improve(id, candidate, Some(from));
                queue.insert_or_update(repository, id, false);
                Relaxation::Improved(id)
            } else {
                // The existing path is better, do nothing
                Relaxation::Unchanged(id)
            }
        }
    }
}


/// Expander built from a neighbor function
/// `F` returns the neighbors of a node along with the edge cost to each
pub struct Neighbors<F>(pub F);

impl<K, W, H, P, F, IT> Expander<K, W, H, P> for Neighbors<F>
where
    K: Eq,
    W: Add<Output = W> + Copy,
    H: SlotHash<K>,
    P: Preference<W>,
    F: FnMut(&K) -> IT, // returns iterator of neighbors + costs
    IT: IntoIterator<Item = (K, W)>, // Iterator of neighbors + edge cost to neighbor node
{
    fn expand(&mut self, queue: &mut PriorityQueue<P>, repository: &mut EntryRepository<K, W, H>, settled: EntryId) {
        let edges = (self.0)(repository.entry(settled).key());
        for (neighbor, edge_cost) in edges {
            relax(queue, repository, settled, neighbor, edge_cost);
        }
    }
}


/// Counters for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub settled: usize, // entries extracted from the queue
    pub discovered: usize, // occupied repository slots
    pub inserted: u64,
    pub improved: u64,
    pub peak_queue_len: usize,
}


/// Dijkstra's Algorithm over an implicit graph
/// https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm
///
/// Edge costs must be non-negative: extending a path may never make it more
/// favorable under the preference. Settled entries are never revisited, so a
/// violation gives wrong weights rather than an error.
#[derive(Debug, Clone)]
pub struct Dijkstra<H = FxSlotHash, P = Minimize> {
    node_bound: usize, // upper bound on the number of distinct nodes reached
    slack: usize, // repository slots per node
    hasher: H,
    preference: P,
}

impl Dijkstra {

    /// Run configuration for graphs with at most `node_bound` reachable nodes
    pub fn new(node_bound: usize) -> Self {
        Self {
            node_bound,
            slack: 2,
            hasher: FxSlotHash,
            preference: Minimize,
        }
    }
}

impl<H, P> Dijkstra<H, P> {

    /// Replace the slot hashing used by the repository
    pub fn with_hasher<H2>(self, hasher: H2) -> Dijkstra<H2, P> {
        Dijkstra {
            node_bound: self.node_bound,
            slack: self.slack,
            hasher,
            preference: self.preference,
        }
    }

    /// Replace the weight ranking used by the queue
    pub fn with_preference<P2>(self, preference: P2) -> Dijkstra<H, P2> {
        Dijkstra {
            node_bound: self.node_bound,
            slack: self.slack,
            hasher: self.hasher,
            preference,
        }
    }

    /// Repository slots per node, keeps probe sequences short
    /// Capacity becomes `factor * node_bound + 1`, so the table never fills up
    pub fn with_slack(mut self, factor: usize) -> Self {
        self.slack = factor;
        self
    }

    pub fn node_bound(&self) -> usize {
        self.node_bound
    }

    /// Number of repository slots a run allocates
    pub fn repository_capacity(&self) -> Result<usize, SearchError> {
        if self.node_bound == 0 {
            return Err(SearchError::InvalidCapacity("node bound must be at least 1".to_string()));
        }
        if self.slack == 0 {
            return Err(SearchError::InvalidCapacity("slack factor must be at least 1".to_string()));
        }
        self.node_bound
            .checked_mul(self.slack)
            .and_then(|slots| slots.checked_add(1))
            .ok_or_else(|| SearchError::InvalidCapacity(format!(
                "{} nodes with slack {} overflows the repository size",
                self.node_bound, self.slack
            )))
    }

    /// Settle every node reachable from `source`
    /// Returns the repository holding the shortest path tree
    ///
    /// # Panics
    /// When more nodes are reached than `node_bound` allows
    pub fn run<K, W, E>(&self, source: K, source_weight: W, expander: E) -> Result<EntryRepository<K, W, H>, SearchError>
    where
        K: Eq,
        H: SlotHash<K> + Clone,
        P: Preference<W> + Clone,
        E: Expander<K, W, H, P>,
    {
        self.run_with_stats(source, source_weight, expander).map(|(repository, _)| repository)
    }

    /// Same as `run`, also reporting queue activity
    pub fn run_with_stats<K, W, E>(
        &self,
        source: K,
        source_weight: W,
        mut expander: E,
    ) -> Result<(EntryRepository<K, W, H>, RunStats), SearchError>
    where
        K: Eq,
        H: SlotHash<K> + Clone,
        P: Preference<W> + Clone,
        E: Expander<K, W, H, P>,
    {
        let capacity = self.repository_capacity()?;

        let span = tracing::info_span!("dijkstra_run", node_bound = self.node_bound, capacity);
        let _enter = span.enter();
        tracing::debug!("starting run");

        let mut repository = EntryRepository::with_capacity(capacity, self.hasher.clone());
        let mut queue = PriorityQueue::with_capacity(self.node_bound, self.preference.clone());

        // Seat the source - no parent
        let Seat::Vacant(seat) = repository.find_or_reserve(source) else {
            unreachable!("a fresh repository has no occupied slots");
        };
        let root = repository.populate(seat, source_weight, None);
        queue.insert_or_update(&mut repository, root, true);

        // Loop over the queue, always expanding the most favorable entry
        let mut settled = 0;
        while let Some(id) = queue.extract_min(&mut repository) {
            settled += 1;
            tracing::trace!(slot = id.index(), "settled");
            expander.expand(&mut queue, &mut repository, id);
        }

        let queue_stats = queue.stats();
        let stats = RunStats {
            settled,
            discovered: repository.len(),
            inserted: queue_stats.inserts,
            improved: queue_stats.decreases,
            peak_queue_len: queue_stats.peak_len,
        };
        tracing::debug!(settled, peak_queue_len = stats.peak_queue_len, "run finished");

        Ok((repository, stats))
    }
}


/// Shortest path tree from `source` with default hashing and smallest-cost ranking
/// The source weighs `C::zero()`
pub fn shortest_path_tree<N, C, IT, NN>(source: N, node_bound: usize, neighbors: NN) -> Result<EntryRepository<N, C>, SearchError>
where
    N: Eq + Hash,
    NN: FnMut(&N) -> IT, // returns iterator of neighbors + costs
    IT: IntoIterator<Item = (N, C)>, // Iterator of neighbors + edge cost to neighbor node
    C: Zero + PartialOrd + Copy,
{
    Dijkstra::new(node_bound).run(source, C::zero(), Neighbors(neighbors))
}

/// Shortest path from `source` to `target`, both included
/// The whole reachable graph is settled first, there is no early exit
pub fn shortest_path_to<N, C, IT, NN>(source: N, node_bound: usize, neighbors: NN, target: &N) -> Result<Vec<N>, SearchError>
where
    N: Eq + Hash + Clone,
    NN: FnMut(&N) -> IT,
    IT: IntoIterator<Item = (N, C)>,
    C: Zero + PartialOrd + Copy,
{
    shortest_path_tree(source, node_bound, neighbors)?.path_to(target)
}
