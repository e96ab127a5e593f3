use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("no path found")]
    NoPathFound, // Key was never discovered from the source
    #[error("invalid capacity: {0}")]
    InvalidCapacity(String), // Node bound or slack factor cannot size the run
}
