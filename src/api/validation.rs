//! Request validation for the story endpoints
//!
//! The store accepts any text; the limits here are the gateway's contract
//! with the frontend.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::core::{Error, Result};
use crate::storage::{NewStory, StoryId};

/// Maximum title length in characters
pub const TITLE_MAX: usize = 120;
/// Maximum category length in characters
pub const CATEGORY_MAX: usize = 60;
/// Maximum summary length in characters
pub const SUMMARY_MAX: usize = 300;
/// Maximum description length in characters
pub const DESCRIPTION_MAX: usize = 5000;
/// Maximum image URL length in characters
pub const IMAGE_URL_MAX: usize = 2048;

/// Per-field validation messages keyed by the JSON field name
pub type FieldErrors = BTreeMap<&'static str, String>;

/// Body of `POST /stories`
///
/// Every field is optional at the serde level so that missing fields are
/// reported alongside the other validation failures instead of as a JSON error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoryRequest {
    /// Headline
    pub title: Option<String>,
    /// Grouping label
    pub category: Option<String>,
    /// Teaser text
    pub summary: Option<String>,
    /// Full body
    pub description: Option<String>,
    /// Cover image URL
    pub image_url: Option<String>,
    /// Featured flag, false when absent
    pub is_featured: Option<bool>,
}

impl CreateStoryRequest {
    /// Check every field and produce trimmed story fields, or all problems found
    pub fn validate(self) -> std::result::Result<NewStory, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = required_text(&mut errors, "title", self.title, TITLE_MAX);
        let category = required_text(&mut errors, "category", self.category, CATEGORY_MAX);
        let summary = required_text(&mut errors, "summary", self.summary, SUMMARY_MAX);
        let description =
            required_text(&mut errors, "description", self.description, DESCRIPTION_MAX);
        let image_url = required_text(&mut errors, "imageUrl", self.image_url, IMAGE_URL_MAX)
            .filter(|url| {
                let valid = is_http_url(url);
                if !valid {
                    errors.insert("imageUrl", "must be an http or https URL".to_string());
                }
                valid
            });

        match (title, category, summary, description, image_url) {
            (Some(title), Some(category), Some(summary), Some(description), Some(image_url))
                if errors.is_empty() =>
            {
                Ok(NewStory {
                    title,
                    category,
                    summary,
                    description,
                    image_url,
                    is_featured: self.is_featured.unwrap_or(false),
                })
            }
            _ => Err(errors),
        }
    }
}

/// Parse a path segment into a story id. Ids start at 1.
pub fn parse_story_id(raw: &str) -> Result<StoryId> {
    raw.trim()
        .parse::<StoryId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| Error::invalid_input(format!("story id must be a positive integer, got '{}'", raw)))
}

fn required_text(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<String>,
    max: usize,
) -> Option<String> {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        None => {
            errors.insert(field, "is required".to_string());
            None
        }
        Some(v) if v.chars().count() > max => {
            errors.insert(field, format!("must be at most {} characters", max));
            None
        }
        Some(v) => Some(v),
    }
}

fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.contains(char::is_whitespace))
}
