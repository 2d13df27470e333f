//! Wire shapes for the HTTP-facing surface.
//!
//! # Responsibility
//! - Declare per-endpoint response fields as nested structs.
//! - Declare request payloads accepted by create/update endpoints.
//!
//! # Invariants
//! - Response DTOs are derived from core models only; they never carry
//!   fields the core did not authorize the caller to see.
//! - The author of an article or comment is never read from a payload.

use blog_core::{Actor, Article, ArticlePage, Comment, UserId};
use serde::{Deserialize, Serialize};

/// Embedded author reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorDto {
    pub id: UserId,
    pub username: String,
}

impl From<&Actor> for AuthorDto {
    fn from(value: &Actor) -> Self {
        Self {
            id: value.id,
            username: value.username.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleDto {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: AuthorDto,
    pub tags: Vec<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub updated_at: i64,
    pub total_likes: usize,
    pub total_favorites: usize,
    pub liked_by: Vec<UserId>,
    pub favorited_by: Vec<UserId>,
}

impl From<&Article> for ArticleDto {
    fn from(value: &Article) -> Self {
        Self {
            id: value.id,
            title: value.title.clone(),
            content: value.content.clone(),
            author: AuthorDto::from(&value.author),
            tags: value.tags.clone(),
            created_at: value.created_at,
            updated_at: value.updated_at,
            total_likes: value.total_likes(),
            total_favorites: value.total_favorites(),
            liked_by: value.liked_by.iter().copied().collect(),
            favorited_by: value.favorited_by.iter().copied().collect(),
        }
    }
}

/// Paginated article listing envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleListDto {
    pub count: usize,
    pub limit: u32,
    pub offset: u32,
    pub results: Vec<ArticleDto>,
}

impl From<&ArticlePage> for ArticleListDto {
    fn from(value: &ArticlePage) -> Self {
        Self {
            count: value.total,
            limit: value.applied_limit,
            offset: value.offset,
            results: value.items.iter().map(ArticleDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentDto {
    pub id: i64,
    pub article: i64,
    pub user: AuthorDto,
    pub content: String,
    pub created_at: i64,
}

impl From<&Comment> for CommentDto {
    fn from(value: &Comment) -> Self {
        Self {
            id: value.id,
            article: value.article_id,
            user: AuthorDto::from(&value.author),
            content: value.content.clone(),
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDto {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

/// `POST /register` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterBody {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: String,
}

/// Article create/replace/merge payload. Which fields are required depends
/// on the method.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentBody {
    #[serde(default)]
    pub content: Option<String>,
}
