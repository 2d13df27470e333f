//! Article domain model.
//!
//! # Responsibility
//! - Define the article record with its tag sequence and relation sets.
//! - Validate create payloads and partial updates.
//!
//! # Invariants
//! - `title` is never blank.
//! - `tags` keep caller order; a tag is never blank.
//! - `liked_by` and `favorited_by` are sets: one entry per user, and the two
//!   sets are independent of each other.

use crate::identity::{Actor, UserId};
use crate::model::validation::{
    require_max_chars, require_non_blank, ValidationError, TAGS_MAX_COUNT, TAG_MAX_CHARS,
    TITLE_MAX_CHARS,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Server-assigned, monotonic article identifier.
pub type ArticleId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub content: String,
    /// Immutable after creation.
    pub author: Actor,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds, bumped by field updates (not by toggles).
    pub updated_at: i64,
    pub tags: Vec<String>,
    pub liked_by: BTreeSet<UserId>,
    pub favorited_by: BTreeSet<UserId>,
}

impl Article {
    pub fn total_likes(&self) -> usize {
        self.liked_by.len()
    }

    pub fn total_favorites(&self) -> usize {
        self.favorited_by.len()
    }

    pub fn is_liked_by(&self, user_id: UserId) -> bool {
        self.liked_by.contains(&user_id)
    }

    pub fn is_favorited_by(&self, user_id: UserId) -> bool {
        self.favorited_by.contains(&user_id)
    }
}

/// Create payload. The author comes from the request identity, never from
/// the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl NewArticle {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_tags(&self.tags)
    }

    /// Trimmed tag sequence as persisted.
    pub fn normalized_tags(&self) -> Vec<String> {
        normalize_tags(&self.tags)
    }
}

/// Partial update. `None` keeps the stored value; `Some(tags)` replaces the
/// full tag sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl ArticlePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.tags.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = self.title.as_deref() {
            validate_title(title)?;
        }
        if let Some(tags) = self.tags.as_deref() {
            validate_tags(tags)?;
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    require_non_blank("title", title)?;
    require_max_chars("title", title.trim(), TITLE_MAX_CHARS)
}

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > TAGS_MAX_COUNT {
        return Err(ValidationError::new(
            "tags",
            format!("Ensure this field has no more than {TAGS_MAX_COUNT} elements."),
        ));
    }
    for tag in tags {
        require_non_blank("tags", tag)?;
        require_max_chars("tags", tag.trim(), TAG_MAX_CHARS)?;
    }
    Ok(())
}

pub(crate) fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter().map(|tag| tag.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::{ArticlePatch, NewArticle};

    #[test]
    fn new_article_rejects_blank_title() {
        let err = NewArticle::new("   ", "body").validate().unwrap_err();
        assert_eq!(err.field, "title");
    }

    #[test]
    fn new_article_rejects_blank_tag_and_keeps_order_when_valid() {
        let err = NewArticle::new("t", "b")
            .with_tags(["rust", " "])
            .validate()
            .unwrap_err();
        assert_eq!(err.field, "tags");

        let article = NewArticle::new("t", "b").with_tags([" Rust", "async ", "Rust"]);
        article.validate().unwrap();
        assert_eq!(article.normalized_tags(), vec!["Rust", "async", "Rust"]);
    }

    #[test]
    fn overlong_title_is_rejected() {
        let err = NewArticle::new("x".repeat(256), "")
            .validate()
            .unwrap_err();
        assert_eq!(err.field, "title");
        NewArticle::new("x".repeat(255), "").validate().unwrap();
    }

    #[test]
    fn patch_validates_only_supplied_fields() {
        assert!(ArticlePatch::default().is_empty());
        ArticlePatch::default().validate().unwrap();

        let patch = ArticlePatch {
            content: Some(String::new()),
            ..ArticlePatch::default()
        };
        patch.validate().unwrap();

        let patch = ArticlePatch {
            title: Some(String::new()),
            ..ArticlePatch::default()
        };
        assert_eq!(patch.validate().unwrap_err().field, "title");
    }
}
