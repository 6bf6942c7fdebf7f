//! Story records and the collection document persisted on disk

use serde::{Deserialize, Serialize};

use crate::core::error::StorageError;

/// Story identifier. Positive, unique within the collection, never reassigned.
pub type StoryId = u64;

/// One persisted impact story
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// Identifier assigned at creation
    pub id: StoryId,
    /// Headline
    pub title: String,
    /// Free-form grouping label
    pub category: String,
    /// Short teaser text
    pub summary: String,
    /// Full story body
    pub description: String,
    /// Cover image location
    pub image_url: String,
    /// Set at creation, never changed by the store
    #[serde(default)]
    pub is_featured: bool,
    /// Like counter, only ever incremented
    #[serde(default)]
    pub likes: u64,
}

/// Fields supplied when creating a story. The store assigns `id` and `likes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStory {
    /// Headline
    pub title: String,
    /// Free-form grouping label
    pub category: String,
    /// Short teaser text
    pub summary: String,
    /// Full story body
    pub description: String,
    /// Cover image location
    pub image_url: String,
    /// Featured flag
    pub is_featured: bool,
}

/// Root structure of the backing file: `{"stories": [...]}` in creation order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryDocument {
    /// All stories, oldest first
    pub stories: Vec<Story>,
}

impl StoryDocument {
    /// Parse a document from the raw file contents
    pub fn decode(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Serialize the document for writing
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    /// Next id to hand out: one past the highest id present, or 1 when empty.
    /// `None` once the highest id is `u64::MAX`.
    ///
    /// This is max+1, not a counter. It only stays collision free because
    /// stories are never removed; a delete operation would let the highest
    /// id be handed out again.
    pub fn next_id(&self) -> Option<StoryId> {
        match self.stories.iter().map(|story| story.id).max() {
            Some(max) => max.checked_add(1),
            None => Some(1),
        }
    }

    /// First story with the given id
    pub fn find(&self, id: StoryId) -> Option<&Story> {
        self.stories.iter().find(|story| story.id == id)
    }

    /// Build a story from `new`, append it and return a copy
    ///
    /// Fails without touching the document when no id is left.
    pub fn append(&mut self, new: NewStory) -> Result<Story, StorageError> {
        let id = self.next_id().ok_or(StorageError::IdSpaceExhausted {
            highest: StoryId::MAX,
        })?;
        let story = Story {
            id,
            title: new.title,
            category: new.category,
            summary: new.summary,
            description: new.description,
            image_url: new.image_url,
            is_featured: new.is_featured,
            likes: 0,
        };
        self.stories.push(story.clone());
        Ok(story)
    }

    /// Add one like to the story with the given id and return its new state
    ///
    /// `Ok(None)` when there is no such story. A counter already at its
    /// maximum is an error and stays unchanged.
    pub fn like(&mut self, id: StoryId) -> Result<Option<Story>, StorageError> {
        let Some(story) = self.stories.iter_mut().find(|story| story.id == id) else {
            return Ok(None);
        };
        story.likes = story
            .likes
            .checked_add(1)
            .ok_or(StorageError::LikeLimitReached { id })?;
        Ok(Some(story.clone()))
    }

    /// Number of stories in the document
    pub fn len(&self) -> usize {
        self.stories.len()
    }

    /// Whether the document holds no stories
    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }
}
