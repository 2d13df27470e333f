//! Core domain logic for the blog backend.
//! This crate is the single source of truth for ownership, toggle and search
//! invariants; transport layers only translate requests into these calls.

pub mod authz;
pub mod config;
pub mod db;
pub mod identity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod toggle;

pub use authz::{
    authorize, ensure_allowed, AccessDenied, Action, Decision, DenyReason, Resource, ResourceKind,
};
pub use config::{ConfigError, CoreConfig, ListLimits};
pub use identity::{Actor, Identity, IdentityResolver, StaticTokenResolver, UserId};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::article::{Article, ArticleId, ArticlePatch, NewArticle};
pub use model::comment::{Comment, CommentId, NewComment};
pub use model::validation::ValidationError;
pub use repo::article_repo::{
    ArticleFilter, ArticleRepository, RepoError, RepoResult, SqliteArticleRepository,
};
pub use repo::comment_repo::{CommentRepository, SqliteCommentRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::RecordKind;
pub use search::filter::{search_articles, ArticleQuery};
pub use service::article_service::{ArticlePage, ArticleService};
pub use service::comment_service::CommentService;
pub use service::error::ContentError;
pub use service::user_service::{NewUser, UserService};
pub use toggle::{Relation, ToggleState};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
