//! Optional observation hook for store activity
//!
//! The store works identically with or without an observer; observers only
//! record what happened. Most events are delivered while the store holds its
//! exclusive section, so implementations must be quick and must not call back
//! into the store.

use std::path::Path;

use super::document::{Story, StoryId};

/// Something the store did
#[derive(Debug)]
pub enum StoreEvent<'a> {
    /// The store was opened; `created` is true when an empty document was written
    Opened {
        /// Backing file
        path: &'a Path,
        /// Whether the file had to be created
        created: bool,
    },
    /// The document was read
    Loaded {
        /// Number of stories read
        stories: usize,
    },
    /// The document was written
    Persisted {
        /// Number of stories written
        stories: usize,
    },
    /// A malformed document was replaced by an empty collection
    Recovered {
        /// Backing file
        path: &'a Path,
    },
    /// A story was appended
    Created(&'a Story),
    /// A story received a like
    Liked(&'a Story),
    /// A lookup found no story with this id
    Missing {
        /// Operation that looked the id up
        operation: &'static str,
        /// The id that was asked for
        id: StoryId,
    },
    /// An operation failed
    Failed {
        /// Operation that failed
        operation: &'static str,
    },
}

/// Receives store events
pub trait StoreObserver: Send + Sync {
    /// Record one event
    fn observe(&self, event: &StoreEvent<'_>);
}
