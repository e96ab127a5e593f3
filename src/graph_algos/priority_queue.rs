use super::repository::{EntryId, EntryRepository};


/// Ranking of weights - `is_better(a, b)` is true when `a` is strictly more favorable than `b`
/// Must be a strict weak ordering that does not change during a run
pub trait Preference<W> {
    fn is_better(&self, a: &W, b: &W) -> bool;
}

/// Smaller weights win, the usual shortest path ranking
#[derive(Debug, Clone, Copy, Default)]
pub struct Minimize;

impl<W: PartialOrd> Preference<W> for Minimize {
    fn is_better(&self, a: &W, b: &W) -> bool {
        a < b
    }
}

/// Larger weights win
#[derive(Debug, Clone, Copy, Default)]
pub struct Maximize;

impl<W: PartialOrd> Preference<W> for Maximize {
    fn is_better(&self, a: &W, b: &W) -> bool {
        a > b
    }
}

impl<W, F> Preference<W> for F
where
    F: Fn(&W, &W) -> bool,
{
    fn is_better(&self, a: &W, b: &W) -> bool {
        self(a, b)
    }
}


/// Operation counters, reset only by creating a new queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub inserts: u64,
    pub decreases: u64,
    pub extracts: u64,
    pub peak_len: usize,
}


/// Binary min-heap of entry ids with O(log n) decrease-key
/// Every queued entry records its own heap position in the repository,
/// so any relocation here writes the new position back
#[derive(Debug, Clone)]
pub struct PriorityQueue<P = Minimize> {
    heap: Vec<EntryId>,
    capacity: usize,
    preference: P,
    stats: QueueStats,
}

impl<P> PriorityQueue<P> {

    pub fn with_capacity(capacity: usize, preference: P) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            capacity,
            preference,
            stats: QueueStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn preference(&self) -> &P {
        &self.preference
    }

    pub fn stats(&self) -> QueueStats {
        self.stats
    }

    /// Most favorable queued entry, without removing it
    pub fn peek(&self) -> Option<EntryId> {
        self.heap.first().copied()
    }

    /// Queue a freshly populated entry (`is_new`) or restore order after its weight improved
    /// Only improvements are supported, so the entry can only move towards the root
    ///
    /// # Panics
    /// - `is_new` and the queue already holds `capacity` entries
    /// - not `is_new` and the entry is not currently queued
    pub fn insert_or_update<K, W, H>(&mut self, repository: &mut EntryRepository<K, W, H>, id: EntryId, is_new: bool)
    where
        P: Preference<W>,
    {
        let position = if is_new {
            if self.heap.len() == self.capacity {
                tracing::error!(capacity = self.capacity, "priority queue is full");
                panic!("priority queue is full ({} entries), node bound was exceeded", self.capacity);
            }
            self.heap.push(id);
            self.stats.inserts += 1;
            self.stats.peak_len = self.stats.peak_len.max(self.heap.len());
            self.heap.len() - 1
        } else {
            let position = repository.heap_index(id);
            if self.heap.get(position) != Some(&id) {
                tracing::error!(slot = id.index(), "decrease-key on an entry that is not queued");
                panic!("entry {} is not queued", id.index());
            }
            self.stats.decreases += 1;
            position
        };
        self.sift_up(repository, position);
    }

    /// Remove the most favorable entry, which is settled from then on
    /// Returns None on an empty queue and leaves it untouched
    pub fn extract_min<K, W, H>(&mut self, repository: &mut EntryRepository<K, W, H>) -> Option<EntryId>
    where
        P: Preference<W>,
    {
        let last = self.heap.pop()?;
        self.stats.extracts += 1;
        if self.heap.is_empty() {
            return Some(last);
        }

        // move last into root, then let it sink
        let min = std::mem::replace(&mut self.heap[0], last);
        self.sift_down(repository, 0);
        Some(min)
    }

    fn better<K, W, H>(&self, repository: &EntryRepository<K, W, H>, a: EntryId, b: EntryId) -> bool
    where
        P: Preference<W>,
    {
        self.preference.is_better(repository.entry(a).weight(), repository.entry(b).weight())
    }

    /// Move parents down while the entry at `position` beats them, then drop it in the hole
    fn sift_up<K, W, H>(&mut self, repository: &mut EntryRepository<K, W, H>, mut position: usize)
    where
        P: Preference<W>,
    {
        let id = self.heap[position];
        while position > 0 {
            let parent = (position - 1) / 2;
            let parent_id = self.heap[parent];
            if !self.better(repository, id, parent_id) {
                break;
            }
            self.heap[position] = parent_id;
            repository.set_heap_index(parent_id, position);
            position = parent;
        }
        self.heap[position] = id;
        repository.set_heap_index(id, position);
    }

    /// Pull the better child up while it beats the entry at `position`
    fn sift_down<K, W, H>(&mut self, repository: &mut EntryRepository<K, W, H>, mut position: usize)
    where
        P: Preference<W>,
    {
        let id = self.heap[position];
        let len = self.heap.len();
        loop {
            let left = 2 * position + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len && self.better(repository, self.heap[right], self.heap[left]) {
                right
            } else {
                left
            };
            let child_id = self.heap[child];
            if !self.better(repository, child_id, id) {
                break;
            }
            self.heap[position] = child_id;
            repository.set_heap_index(child_id, position);
            position = child;
        }
        self.heap[position] = id;
        repository.set_heap_index(id, position);
    }
}


#[cfg(test)]
impl<P> PriorityQueue<P> {

    /// Check the position mirror and the heap property
    pub(crate) fn assert_invariants<K, W, H>(&self, repository: &EntryRepository<K, W, H>)
    where
        P: Preference<W>,
    {
        for (position, &id) in self.heap.iter().enumerate() {
            assert_eq!(repository.heap_index(id), position, "entry {} has a stale heap index", id.index());
            if position > 0 {
                let parent = (position - 1) / 2;
                assert!(
                    !self.better(repository, id, self.heap[parent]),
                    "entry at {position} beats its parent at {parent}"
                );
            }
        }
    }

    pub(crate) fn contains(&self, id: EntryId) -> bool {
        self.heap.contains(&id)
    }
}
