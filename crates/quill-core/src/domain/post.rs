use std::cmp::Reverse;
use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Display layout for `date_created` / `date_edited`, e.g. `Jan 2, 2006`.
pub const DATE_FORMAT: &str = "%b %-d, %Y";

/// Post entity - a single blog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Creation time in seconds; primary key in storage and in the cache.
    pub id: i64,
    pub title: String,
    pub text: String,
    pub mood: String,
    pub tags: Vec<String>,
    pub date_created: String,
    pub date_edited: String,
}

/// The owner-editable part of a post.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub title: String,
    pub text: String,
    pub mood: String,
    pub tags: Vec<String>,
}

impl Post {
    /// Create a new post stamped with `now` for both dates.
    pub fn new(id: i64, draft: PostDraft, now: DateTime<Utc>) -> Self {
        let today = format_date(now);
        Self {
            id,
            title: draft.title,
            text: draft.text,
            mood: draft.mood,
            tags: draft.tags,
            date_created: today.clone(),
            date_edited: today,
        }
    }

    /// Replace the editable fields, keeping `id` and `date_created`.
    pub fn revised(&self, draft: PostDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: self.id,
            title: draft.title,
            text: draft.text,
            mood: draft.mood,
            tags: draft.tags,
            date_created: self.date_created.clone(),
            date_edited: format_date(now),
        }
    }

    /// Parse a post id taken from a path or form field.
    pub fn parse_id(raw: &str) -> Result<i64, DomainError> {
        raw.trim()
            .parse::<i64>()
            .map_err(|_| DomainError::Validation(format!("invalid post id: {raw:?}")))
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    fn created_on(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date_created, DATE_FORMAT).ok()
    }
}

pub fn format_date(at: DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

/// Split a comma-separated tag field, trimming entries and dropping empties.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Copy of `posts` ordered by `date_created`, newest first.
///
/// The sort is stable: posts created on the same day keep their relative
/// order. Unparseable dates sort last.
pub fn sort_newest_first(posts: &[Post]) -> Vec<Post> {
    let mut sorted = posts.to_vec();
    sorted.sort_by_key(|p| Reverse(p.created_on()));
    sorted
}

/// Distinct tags across `posts`.
pub fn aggregate_tags(posts: &[Post]) -> BTreeSet<String> {
    posts.iter().flat_map(|p| p.tags.iter().cloned()).collect()
}

/// Posts carrying `tag`, in their original order.
pub fn filter_by_tag(posts: &[Post], tag: &str) -> Vec<Post> {
    posts.iter().filter(|p| p.has_tag(tag)).cloned().collect()
}
