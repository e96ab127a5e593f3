use crate::errors::SearchError;
use super::{GraphNodeMap, shortest_path};

use std::hash::{BuildHasher, Hash};
use rustc_hash::FxBuildHasher;


/// Maps a key onto a starting slot of a table with `capacity` slots
/// The returned index must be below `capacity`, collisions are fine
pub trait SlotHash<K> {
    fn slot(&self, capacity: usize, key: &K) -> usize;
}

/// Default slot hashing - rustc_hash over any `Hash` key, reduced modulo capacity
#[derive(Debug, Clone, Copy, Default)]
pub struct FxSlotHash;

impl<K: Hash> SlotHash<K> for FxSlotHash {
    fn slot(&self, capacity: usize, key: &K) -> usize {
        (FxBuildHasher.hash_one(key) % capacity as u64) as usize
    }
}

impl<K, F> SlotHash<K> for F
where
    F: Fn(usize, &K) -> usize,
{
    fn slot(&self, capacity: usize, key: &K) -> usize {
        self(capacity, key)
    }
}


/// Stable handle to an occupied slot of an `EntryRepository`
/// Only the repository hands these out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(usize);

impl EntryId {
    /// Slot index inside the repository table
    pub fn index(self) -> usize {
        self.0
    }
}


/// Node record: identity, best known weight, parent in the shortest path tree
#[derive(Debug, Clone)]
pub struct Entry<K, W> {
    key: K,
    weight: W,
    parent: Option<EntryId>, // None only for the source
    heap_index: usize, // position in the priority queue, stale once settled
}

impl<K, W> Entry<K, W> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn weight(&self) -> &W {
        &self.weight
    }

    pub fn parent(&self) -> Option<EntryId> {
        self.parent
    }
}


/// A free slot claimed for `key` by `find_or_reserve`
#[derive(Debug)]
pub struct VacantSeat<K> {
    index: usize,
    key: K,
}

impl<K> VacantSeat<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Give the key back without populating the slot
    pub fn into_key(self) -> K {
        self.key
    }
}

/// Outcome of a probe walk for reservation
#[derive(Debug)]
pub enum Seat<K> {
    Vacant(VacantSeat<K>), // first time this key is seen
    Occupied(EntryId), // key already has an entry
}


/// Fixed capacity open-addressed store of entries
/// Slots are never emptied during a run, so after the run the table
/// holds the parent-pointer tree rooted at the source
#[derive(Debug, Clone)]
pub struct EntryRepository<K, W, H = FxSlotHash> {
    slots: Box<[Option<Entry<K, W>>]>,
    used: usize,
    hasher: H,
}

impl<K, W, H> EntryRepository<K, W, H> {

    /// Create an empty repository with a fixed number of slots
    ///
    /// # Panics
    /// If `capacity` is zero
    pub fn with_capacity(capacity: usize, hasher: H) -> Self {
        assert!(capacity > 0, "entry repository needs at least one slot");
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            used: 0,
            hasher,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.used
    }

    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Entry behind an id handed out by this repository
    pub fn entry(&self, id: EntryId) -> &Entry<K, W> {
        match self.slots.get(id.0) {
            Some(Some(entry)) => entry,
            _ => panic!("entry id {} does not refer to an occupied slot", id.0),
        }
    }

    fn entry_mut(&mut self, id: EntryId) -> &mut Entry<K, W> {
        match self.slots.get_mut(id.0) {
            Some(Some(entry)) => entry,
            _ => panic!("entry id {} does not refer to an occupied slot", id.0),
        }
    }

    /// Fill a slot claimed by `find_or_reserve`
    ///
    /// # Panics
    /// If the slot was populated after the seat was handed out
    pub fn populate(&mut self, seat: VacantSeat<K>, weight: W, parent: Option<EntryId>) -> EntryId {
        let VacantSeat { index, key } = seat;
        let slot = &mut self.slots[index];
        if slot.is_some() {
            tracing::error!(slot = index, "populate on an occupied slot");
            panic!("slot {index} was populated twice");
        }
        *slot = Some(Entry {
            key,
            weight,
            parent,
            heap_index: 0,
        });
        self.used += 1;
        EntryId(index)
    }

    /// Overwrite the weight and parent of an existing entry
    /// Callers only ever improve a queued entry, see `PriorityQueue::insert_or_update`
    pub fn improve(&mut self, id: EntryId, weight: W, parent: Option<EntryId>) {
        let entry = self.entry_mut(id);
        entry.weight = weight;
        entry.parent = parent;
    }

    pub(crate) fn heap_index(&self, id: EntryId) -> usize {
        self.entry(id).heap_index
    }

    pub(crate) fn set_heap_index(&mut self, id: EntryId, heap_index: usize) {
        self.entry_mut(id).heap_index = heap_index;
    }

    /// Occupied entries in slot order
    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &Entry<K, W>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|entry| (EntryId(index), entry)))
    }

    /// Walk from `id` up the parent references, `id` itself first and the source last
    pub fn ancestors(&self, id: EntryId) -> Ancestors<'_, K, W, H> {
        Ancestors {
            repository: self,
            next: Some(id),
        }
    }

    /// Hand every occupied slot's key and weight to `release`, exactly once each
    /// Empty slots are skipped; the table itself is dropped afterwards
    pub fn release<F>(self, mut release: F)
    where
        F: FnMut(K, W),
    {
        for entry in self.slots.into_vec().into_iter().flatten() {
            release(entry.key, entry.weight);
        }
    }
}

impl<K, W, H> EntryRepository<K, W, H>
where
    K: Eq,
    H: SlotHash<K>,
{

    /// Linear probe sequence starting at the hashed slot, wrapping once around the table
    fn probe(&self, key: &K) -> impl Iterator<Item = usize> + use<K, W, H> {
        let capacity = self.slots.len();
        let start = self.hasher.slot(capacity, key);
        debug_assert!(start < capacity, "slot hash returned {start} for capacity {capacity}");
        (start..capacity).chain(0..start)
    }

    /// Find the entry for `key`, or the first free slot where it belongs
    ///
    /// # Panics
    /// If every slot is occupied by other keys - the node bound given for the run was too small
    pub fn find_or_reserve(&self, key: K) -> Seat<K> {
        for index in self.probe(&key) {
            match &self.slots[index] {
                None => return Seat::Vacant(VacantSeat { index, key }),
                Some(entry) if entry.key == key => return Seat::Occupied(EntryId(index)),
                Some(_) => {}
            }
        }
        tracing::error!(capacity = self.capacity(), "entry repository is full");
        panic!("entry repository is full ({} slots), node bound was exceeded", self.capacity());
    }

    /// Find an existing entry for `key`
    /// Stops at the first free slot, the key would have been seated there
    pub fn lookup(&self, key: &K) -> Option<EntryId> {
        for index in self.probe(key) {
            match &self.slots[index] {
                None => return None,
                Some(entry) if entry.key == *key => return Some(EntryId(index)),
                Some(_) => {}
            }
        }
        None
    }

    pub fn get(&self, key: &K) -> Option<&Entry<K, W>> {
        self.lookup(key).map(|id| self.entry(id))
    }

    pub fn weight_of(&self, key: &K) -> Option<&W> {
        self.get(key).map(Entry::weight)
    }

    /// Path from the source to `key`, both ends included
    pub fn path_to(&self, key: &K) -> Result<Vec<K>, SearchError>
    where
        K: Clone,
    {
        let id = self.lookup(key).ok_or(SearchError::NoPathFound)?;
        shortest_path(self, id)
    }
}

impl<K, W, H> EntryRepository<K, W, H>
where
    K: Eq + Hash,
{

    /// Dense export of the tree: key -> (parent index, weight)
    /// Entries keep slot order and the source's parent index is `usize::MAX`
    pub fn into_node_map(self) -> GraphNodeMap<K, W> {
        let mut dense = vec![usize::MAX; self.slots.len()];
        for (position, (id, _)) in self.iter().enumerate() {
            dense[id.0] = position;
        }

        let mut node_map = GraphNodeMap::default();
        node_map.reserve(self.used);
        for entry in self.slots.into_vec().into_iter().flatten() {
            let parent_index = entry.parent.map_or(usize::MAX, |parent| dense[parent.0]);
            node_map.insert(entry.key, (parent_index, entry.weight));
        }
        node_map
    }
}


/// Iterator over an entry and its parents up to the source
pub struct Ancestors<'a, K, W, H> {
    repository: &'a EntryRepository<K, W, H>,
    next: Option<EntryId>,
}

impl<K, W, H> Iterator for Ancestors<'_, K, W, H> {
    type Item = EntryId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.repository.entry(current).parent;
        Some(current)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn identity_hash(capacity: usize, key: &usize) -> usize {
        key % capacity
    }

    fn seat<K, W, H>(repository: &mut EntryRepository<K, W, H>, key: K, weight: W, parent: Option<EntryId>) -> EntryId
    where
        K: Eq,
        H: SlotHash<K>,
    {
        match repository.find_or_reserve(key) {
            Seat::Vacant(seat) => repository.populate(seat, weight, parent),
            Seat::Occupied(_) => panic!("key already seated"),
        }
    }

    #[test]
    fn test_find_or_reserve_vacant_then_occupied() {
        let mut repository = EntryRepository::<usize, u32, _>::with_capacity(7, identity_hash);

        let Seat::Vacant(vacant) = repository.find_or_reserve(3) else {
            panic!("fresh repository should have a vacant seat");
        };
        assert_eq!(vacant.key(), &3);
        let id = repository.populate(vacant, 10u32, None);
        assert_eq!(id.index(), 3);
        assert_eq!(repository.len(), 1);

        match repository.find_or_reserve(3) {
            Seat::Occupied(found) => assert_eq!(found, id),
            Seat::Vacant(_) => panic!("key 3 should already be seated"),
        }
    }

    #[test]
    fn test_collisions_probe_linearly_and_wrap() {
        // Every key lands on the last slot
        let mut repository = EntryRepository::with_capacity(4, |capacity: usize, _: &&str| capacity - 1);

        let a = seat(&mut repository, "a", 1, None);
        let b = seat(&mut repository, "b", 2, Some(a));
        let c = seat(&mut repository, "c", 3, Some(b));

        assert_eq!(a.index(), 3);
        assert_eq!(b.index(), 0);
        assert_eq!(c.index(), 1);

        assert_eq!(repository.lookup(&"c"), Some(c));
        assert_eq!(repository.weight_of(&"b"), Some(&2));
        assert_eq!(repository.lookup(&"d"), None);
    }

    #[test]
    fn test_lookup_stops_at_first_free_slot() {
        let mut repository = EntryRepository::<usize, u32, _>::with_capacity(5, identity_hash);
        seat(&mut repository, 0, 0u32, None);

        // Key 5 hashes to slot 0, probes into slot 1 which is free
        assert_eq!(repository.lookup(&5), None);
        assert!(repository.get(&5).is_none());
        assert_eq!(repository.len(), 1);
    }

    #[test]
    fn test_lookup_on_full_table_without_match() {
        let mut repository = EntryRepository::<usize, u32, _>::with_capacity(2, identity_hash);
        seat(&mut repository, 0, 0u32, None);
        seat(&mut repository, 1, 0u32, None);

        assert_eq!(repository.lookup(&4), None);
    }

    #[test]
    #[should_panic(expected = "entry repository is full")]
    fn test_reserve_on_full_table_panics() {
        let mut repository = EntryRepository::<usize, u32, _>::with_capacity(2, identity_hash);
        seat(&mut repository, 0, 0u32, None);
        seat(&mut repository, 1, 0u32, None);

        let _ = repository.find_or_reserve(2);
    }

    #[test]
    #[should_panic(expected = "populated twice")]
    fn test_populating_a_stale_seat_panics() {
        let mut repository = EntryRepository::<usize, u32, _>::with_capacity(3, identity_hash);

        let Seat::Vacant(first) = repository.find_or_reserve(1) else { unreachable!() };
        let Seat::Vacant(second) = repository.find_or_reserve(1) else { unreachable!() };
        repository.populate(first, 1u32, None);
        repository.populate(second, 1u32, None);
    }

    #[test]
    fn test_improve_updates_weight_and_parent() {
        let mut repository = EntryRepository::with_capacity(8, FxSlotHash);
        let source = seat(&mut repository, "s", 0u32, None);
        let a = seat(&mut repository, "a", 5, Some(source));
        let b = seat(&mut repository, "b", 9, Some(source));

        repository.improve(b, 6, Some(a));

        let entry = repository.entry(b);
        assert_eq!(entry.weight(), &6);
        assert_eq!(entry.parent(), Some(a));
        assert_eq!(entry.key(), &"b");
    }

    #[test]
    fn test_ancestors_and_path_to() {
        let mut repository = EntryRepository::with_capacity(16, FxSlotHash);
        let a = seat(&mut repository, "A".to_string(), 0u32, None);
        let c = seat(&mut repository, "C".to_string(), 3, Some(a));
        let d = seat(&mut repository, "D".to_string(), 4, Some(c));
        seat(&mut repository, "B".to_string(), 1, Some(a));

        let chain: Vec<EntryId> = repository.ancestors(d).collect();
        assert_eq!(chain, vec![d, c, a]);

        let path = repository.path_to(&"D".to_string()).unwrap();
        assert_eq!(path, vec!["A", "C", "D"].into_iter().map(String::from).collect::<Vec<_>>());

        let result = repository.path_to(&"Z".to_string());
        assert!(matches!(result, Err(SearchError::NoPathFound)));
    }

    #[test]
    fn test_release_visits_each_occupied_slot_once() {
        let mut repository = EntryRepository::<usize, u32, _>::with_capacity(11, identity_hash);
        let root = seat(&mut repository, 0, 0u32, None);
        seat(&mut repository, 4, 4, Some(root));
        seat(&mut repository, 15, 8, Some(root)); // collides with 4

        let mut released = Vec::new();
        repository.release(|key, weight| released.push((key, weight)));
        released.sort();

        assert_eq!(released, vec![(0, 0), (4, 4), (15, 8)]);
    }

    #[test]
    fn test_into_node_map_reindexes_parents() {
        let mut repository = EntryRepository::<usize, u32, _>::with_capacity(10, identity_hash);
        let root = seat(&mut repository, 7, 0u32, None);
        let mid = seat(&mut repository, 2, 1, Some(root));
        seat(&mut repository, 5, 3, Some(mid));

        let node_map = repository.into_node_map();

        // slot order: 2, 5, 7
        assert_eq!(node_map.get_index(0), Some((&2, &(2, 1))));
        assert_eq!(node_map.get_index(1), Some((&5, &(0, 3))));
        assert_eq!(node_map.get_index(2), Some((&7, &(usize::MAX, 0))));
    }

    #[test]
    fn test_fx_slot_hash_stays_in_range() {
        for capacity in [1usize, 2, 3, 17, 1000] {
            for key in 0u64..500 {
                assert!(FxSlotHash.slot(capacity, &key) < capacity);
            }
        }
    }
}
