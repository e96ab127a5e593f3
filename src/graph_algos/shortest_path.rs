use crate::errors::SearchError;
use super::repository::{EntryId, EntryRepository};

/// Construct the shortest path from the source to the entry at `target`
/// Returns the ordered path as a vector of keys from source to target
/// repository: EntryRepository<K, W, H> - settled parent-pointer tree
/// target: EntryId - entry to trace back from
pub(crate) fn shortest_path<K, W, H>(repository: &EntryRepository<K, W, H>, target: EntryId) -> Result<Vec<K>, SearchError>
where
    K: Clone,
{

    let mut path = Vec::new();

    // Trace back from target to source
    for id in repository.ancestors(target) {
        // A tree over n entries has no chain longer than n
        if path.len() == repository.len() {
            return Err(SearchError::NoPathFound);
        }
        path.push(repository.entry(id).key().clone());
    }

    // The path is in reverse order, so reverse it
    path.reverse();

    if path.is_empty() {
        return Err(SearchError::NoPathFound);
    }

    Ok(path)
}
