//! Text and tag matching over articles.
//!
//! # Matching policy
//! - `text`: case-insensitive substring of the title, the content, or any
//!   single tag.
//! - `tag`: case-insensitive equality with at least one tag.
//! - Tags are always matched one at a time, never against a joined string,
//!   so a query cannot straddle a tag boundary.
//! - Every supplied filter must hold (logical AND). Blank strings count as
//!   "not supplied".

use crate::identity::UserId;
use crate::model::article::Article;
use crate::repo::article_repo::{ArticleFilter, ArticleRepository, RepoResult};

/// Caller-facing search request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleQuery {
    /// Free text matched against title, content and tags.
    pub text: Option<String>,
    /// Single tag, matched by case-insensitive equality.
    pub tag: Option<String>,
    /// Exact title equality.
    pub title: Option<String>,
    /// Exact content equality.
    pub content: Option<String>,
    pub author_id: Option<UserId>,
    pub favorited_by: Option<UserId>,
    pub liked_by: Option<UserId>,
}

impl ArticleQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn author(mut self, author_id: UserId) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn favorited_by(mut self, user_id: UserId) -> Self {
        self.favorited_by = Some(user_id);
        self
    }

    pub fn liked_by(mut self, user_id: UserId) -> Self {
        self.liked_by = Some(user_id);
        self
    }

    /// Part of the query the store evaluates in SQL.
    pub fn store_filter(&self) -> ArticleFilter {
        ArticleFilter {
            author_id: self.author_id,
            title: self.title.clone(),
            content: self.content.clone(),
            liked_by: self.liked_by,
            favorited_by: self.favorited_by,
        }
    }

    /// `true` when no text or tag predicate is set, so the store alone can
    /// answer the query (including pagination).
    pub fn is_store_only(&self) -> bool {
        normalized(self.text.as_deref()).is_none() && normalized(self.tag.as_deref()).is_none()
    }

    /// Applies the text and tag predicates to one article.
    pub fn matches(&self, article: &Article) -> bool {
        if let Some(text) = normalized(self.text.as_deref()) {
            if !matches_text(article, &text) {
                return false;
            }
        }
        if let Some(tag) = normalized(self.tag.as_deref()) {
            if !matches_tag(article, &tag) {
                return false;
            }
        }
        true
    }
}

/// Runs `query` against the store and returns matches in creation order.
pub fn search_articles<R: ArticleRepository + ?Sized>(
    repo: &R,
    query: &ArticleQuery,
) -> RepoResult<Vec<Article>> {
    let candidates = repo.list_articles(&query.store_filter())?;
    Ok(candidates
        .into_iter()
        .filter(|article| query.matches(article))
        .collect())
}

fn normalized(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase)
}

fn contains_folded(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn matches_text(article: &Article, text_lower: &str) -> bool {
    contains_folded(&article.title, text_lower)
        || contains_folded(&article.content, text_lower)
        || article
            .tags
            .iter()
            .any(|tag| contains_folded(tag, text_lower))
}

fn matches_tag(article: &Article, tag_lower: &str) -> bool {
    article
        .tags
        .iter()
        .any(|tag| tag.to_lowercase() == tag_lower)
}
