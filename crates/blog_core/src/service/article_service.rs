//! Article use-case service.
//!
//! # Responsibility
//! - Expose the article contract: create, get, merge-update, delete.
//! - Expose like/favorite toggles and search/favorites listing.
//!
//! # Invariants
//! - Every mutation resolves the target, then authorizes, then writes,
//!   all inside the repository transaction.
//! - `update_article` with `tags` replaces the whole tag sequence.
//! - Toggle results are reported from the committed membership flip.

use crate::authz::{ensure_allowed, Action, Resource, ResourceKind};
use crate::config::ListLimits;
use crate::identity::Identity;
use crate::model::article::{Article, ArticleId, ArticlePatch, NewArticle};
use crate::repo::article_repo::ArticleRepository;
use crate::repo::RecordKind;
use crate::search::filter::{search_articles, ArticleQuery};
use crate::service::error::ContentError;
use crate::service::log_outcome;
use crate::toggle::{Relation, ToggleState};

/// One page of a filtered article listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticlePage {
    /// Page items in creation order.
    pub items: Vec<Article>,
    /// Number of matches before pagination.
    pub total: usize,
    /// Effective limit after default/clamp.
    pub applied_limit: u32,
    pub offset: u32,
}

/// Article service facade over repository implementations.
pub struct ArticleService<R: ArticleRepository> {
    repo: R,
    limits: ListLimits,
}

impl<R: ArticleRepository> ArticleService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            limits: ListLimits::default(),
        }
    }

    pub fn with_list_limits(mut self, limits: ListLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Creates an article authored by `actor`.
    ///
    /// Anonymous callers are rejected before the payload is validated.
    pub fn create_article(
        &mut self,
        actor: &Identity,
        article: &NewArticle,
    ) -> Result<Article, ContentError> {
        let result = self
            .repo
            .create_article(actor, article)
            .map_err(ContentError::from)
            .and_then(|id| {
                self.read_back(id, "created article not found in read-back")
            });
        log_outcome(
            "article_create",
            actor,
            result.as_ref().ok().map(|article| article.id),
            &result,
        );
        result
    }

    pub fn get_article(&self, id: ArticleId) -> Result<Article, ContentError> {
        self.repo
            .get_article(id)?
            .ok_or(ContentError::NotFound {
                kind: RecordKind::Article,
                id,
            })
    }

    /// Merges the supplied fields into the article. Author only.
    pub fn update_article(
        &mut self,
        actor: &Identity,
        id: ArticleId,
        patch: &ArticlePatch,
    ) -> Result<Article, ContentError> {
        let result = self
            .repo
            .update_article(actor, id, patch)
            .map_err(ContentError::from)
            .and_then(|()| self.read_back(id, "updated article not found in read-back"));
        log_outcome("article_update", actor, Some(id), &result);
        result
    }

    /// Deletes the article with its comments, likes and favorites. Author
    /// only.
    pub fn delete_article(&mut self, actor: &Identity, id: ArticleId) -> Result<(), ContentError> {
        let result = self
            .repo
            .delete_article(actor, id)
            .map_err(ContentError::from);
        log_outcome("article_delete", actor, Some(id), &result);
        result
    }

    /// Flips `actor` in the article's like set.
    pub fn toggle_like(
        &mut self,
        id: ArticleId,
        actor: &Identity,
    ) -> Result<ToggleState, ContentError> {
        self.toggle(id, actor, Relation::Like)
    }

    /// Flips `actor` in the article's favorite set.
    pub fn toggle_favorite(
        &mut self,
        id: ArticleId,
        actor: &Identity,
    ) -> Result<ToggleState, ContentError> {
        self.toggle(id, actor, Relation::Favorite)
    }

    /// Returns every article matching `query`, in creation order.
    pub fn search_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>, ContentError> {
        Ok(search_articles(&self.repo, query)?)
    }

    /// Same as [`Self::search_articles`], paginated with the configured
    /// limits.
    ///
    /// Structured-only queries are counted and paginated in SQL. Text or tag
    /// queries are matched in memory, so every candidate row (with its tags
    /// and relation sets) is loaded before the page is cut.
    pub fn list_articles(
        &self,
        query: &ArticleQuery,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<ArticlePage, ContentError> {
        let applied_limit = self.limits.normalize(limit);

        if query.is_store_only() {
            let filter = query.store_filter();
            let total = self.repo.count_matching(&filter)?;
            let items = self
                .repo
                .list_articles_page(&filter, applied_limit, offset)?;
            return Ok(ArticlePage {
                items,
                total: usize::try_from(total).unwrap_or(usize::MAX),
                applied_limit,
                offset,
            });
        }

        let matches = self.search_articles(query)?;
        let total = matches.len();
        let items = matches
            .into_iter()
            .skip(offset as usize)
            .take(applied_limit as usize)
            .collect();
        Ok(ArticlePage {
            items,
            total,
            applied_limit,
            offset,
        })
    }

    /// Articles the authenticated `actor` has favorited.
    pub fn favorites_of(&self, actor: &Identity) -> Result<Vec<Article>, ContentError> {
        ensure_allowed(
            actor,
            Resource::collection(ResourceKind::Article),
            Action::ListFavorites,
        )?;
        let Some(user_id) = actor.user_id() else {
            return Ok(Vec::new());
        };
        self.search_articles(&ArticleQuery::new().favorited_by(user_id))
    }

    pub fn count_articles(&self) -> Result<u64, ContentError> {
        Ok(self.repo.count_articles()?)
    }

    fn toggle(
        &mut self,
        id: ArticleId,
        actor: &Identity,
        relation: Relation,
    ) -> Result<ToggleState, ContentError> {
        let result = self
            .repo
            .toggle_relation(actor, id, relation)
            .map_err(ContentError::from);
        let event = match relation {
            Relation::Like => "article_toggle_like",
            Relation::Favorite => "article_toggle_favorite",
        };
        log_outcome(event, actor, Some(id), &result);
        result
    }

    fn read_back(&self, id: ArticleId, details: &'static str) -> Result<Article, ContentError> {
        self.repo
            .get_article(id)?
            .ok_or(ContentError::InconsistentState(details))
    }
}
