//! Comment domain model.
//!
//! # Invariants
//! - A comment belongs to exactly one article for its whole lifetime and is
//!   removed together with it.
//! - Comments are create/read/delete only; there is no edit path.

use crate::identity::Actor;
use crate::model::article::ArticleId;
use crate::model::validation::{require_non_blank, ValidationError};
use serde::{Deserialize, Serialize};

/// Server-assigned, monotonic comment identifier.
pub type CommentId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub article_id: ArticleId,
    pub author: Actor,
    pub content: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewComment {
    pub content: String,
}

impl NewComment {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("content", &self.content)
    }
}
