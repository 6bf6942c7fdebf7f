//! Storage layer for impact stories
//!
//! All stories live in one JSON document on disk. The [`StoryStore`] trait is
//! the seam the HTTP layer talks to; [`FileStore`] is the file-backed
//! implementation that serializes every operation through a single exclusive
//! section so concurrent requests never lose updates.

use std::future::Future;
use std::path::Path;

use crate::core::Result;

/// Story records and the on-disk document
pub mod document;

/// File-backed store
pub mod file_store;

/// Observation hook
pub mod observer;

pub use document::{NewStory, Story, StoryDocument, StoryId};
pub use file_store::{FileStore, StoreOptions};
pub use observer::{StoreEvent, StoreObserver};

/// Operations the gateway can perform on the story collection
///
/// A missing story is reported as `Ok(None)`, never as an error. Errors mean
/// the storage itself failed and nothing was changed.
pub trait StoryStore: Send + Sync + 'static {
    /// All stories in creation order
    fn list_all(&self) -> impl Future<Output = Result<Vec<Story>>> + Send;

    /// The story with `id`, if any
    fn get_by_id(&self, id: StoryId) -> impl Future<Output = Result<Option<Story>>> + Send;

    /// Add one like to the story with `id` and return its updated state
    ///
    /// # Returns
    ///
    /// * `Ok(Some(story))` - The like was persisted
    /// * `Ok(None)` - No such story; nothing was written
    /// * `Err(_)` - Storage failed; the like was not recorded
    fn increment_likes(&self, id: StoryId) -> impl Future<Output = Result<Option<Story>>> + Send;

    /// Append a new story with the next id and zero likes
    fn create(&self, new: NewStory) -> impl Future<Output = Result<Story>> + Send;

    /// Where the collection is kept
    fn location(&self) -> &Path;
}
