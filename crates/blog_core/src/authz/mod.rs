//! Authorization engine for content mutations.
//!
//! # Responsibility
//! - Decide allow/deny for `(actor, resource, action)` from one policy table.
//! - Give every entry point (store, services, HTTP surface) the same answer.
//!
//! # Invariants
//! - The engine is pure: no state, no I/O.
//! - Pairs missing from the policy table are denied.
//! - Ownership is decided by `UserId` equality with the resource author.

use crate::identity::{Identity, UserId};
use crate::model::article::Article;
use crate::model::comment::Comment;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Operation requested on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    View,
    List,
    Create,
    Update,
    Delete,
    Like,
    Favorite,
    /// Listing the caller's own favorites.
    ListFavorites,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::List => "list",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Like => "like",
            Self::Favorite => "favorite",
            Self::ListFavorites => "list_favorites",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Article,
    Comment,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Comment => "comment",
        }
    }
}

/// Authorization view of a resource: its kind and, for existing records,
/// its author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    pub kind: ResourceKind,
    pub owner: Option<UserId>,
}

impl Resource {
    /// Collection-level target (create, list) with no owner yet.
    pub fn collection(kind: ResourceKind) -> Self {
        Self { kind, owner: None }
    }

    pub fn owned(kind: ResourceKind, owner: UserId) -> Self {
        Self {
            kind,
            owner: Some(owner),
        }
    }

    pub fn article(article: &Article) -> Self {
        Self::owned(ResourceKind::Article, article.author.id)
    }

    pub fn comment(comment: &Comment) -> Self {
        Self::owned(ResourceKind::Comment, comment.author.id)
    }
}

/// Predicate attached to a policy entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Anyone,
    Authenticated,
    Owner,
}

const POLICY: &[(ResourceKind, Action, Rule)] = &[
    (ResourceKind::Article, Action::View, Rule::Anyone),
    (ResourceKind::Article, Action::List, Rule::Anyone),
    (ResourceKind::Article, Action::Create, Rule::Authenticated),
    (ResourceKind::Article, Action::Update, Rule::Owner),
    (ResourceKind::Article, Action::Delete, Rule::Owner),
    (ResourceKind::Article, Action::Like, Rule::Authenticated),
    (ResourceKind::Article, Action::Favorite, Rule::Authenticated),
    (ResourceKind::Article, Action::ListFavorites, Rule::Authenticated),
    (ResourceKind::Comment, Action::View, Rule::Anyone),
    (ResourceKind::Comment, Action::List, Rule::Anyone),
    (ResourceKind::Comment, Action::Create, Rule::Authenticated),
    (ResourceKind::Comment, Action::Delete, Rule::Owner),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Action needs an authenticated identity.
    Unauthenticated,
    /// Action is reserved for the resource author.
    NotOwner,
    /// Action is not defined for this resource kind.
    Unsupported,
}

impl DenyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::NotOwner => "not_owner",
            Self::Unsupported => "unsupported",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Evaluates the policy table for one request.
pub fn authorize(actor: &Identity, resource: Resource, action: Action) -> Decision {
    let Some(rule) = lookup_rule(resource.kind, action) else {
        return Decision::Deny(DenyReason::Unsupported);
    };

    match rule {
        Rule::Anyone => Decision::Allow,
        Rule::Authenticated => match actor.user_id() {
            Some(_) => Decision::Allow,
            None => Decision::Deny(DenyReason::Unauthenticated),
        },
        Rule::Owner => match (actor.user_id(), resource.owner) {
            (None, _) => Decision::Deny(DenyReason::Unauthenticated),
            (Some(actor_id), Some(owner_id)) if actor_id == owner_id => Decision::Allow,
            (Some(_), _) => Decision::Deny(DenyReason::NotOwner),
        },
    }
}

/// Same as [`authorize`], as a `Result` for `?` propagation.
pub fn ensure_allowed(
    actor: &Identity,
    resource: Resource,
    action: Action,
) -> Result<(), AccessDenied> {
    match authorize(actor, resource, action) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(AccessDenied {
            kind: resource.kind,
            action,
            reason,
        }),
    }
}

fn lookup_rule(kind: ResourceKind, action: Action) -> Option<Rule> {
    POLICY
        .iter()
        .find(|(entry_kind, entry_action, _)| *entry_kind == kind && *entry_action == action)
        .map(|(_, _, rule)| *rule)
}

/// Denied authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDenied {
    pub kind: ResourceKind,
    pub action: Action,
    pub reason: DenyReason,
}

impl Display for AccessDenied {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.reason {
            DenyReason::Unauthenticated => write!(
                f,
                "authentication required to {} {}",
                self.action.as_str(),
                self.kind.as_str()
            ),
            DenyReason::NotOwner => write!(
                f,
                "only the author may {} this {}",
                self.action.as_str(),
                self.kind.as_str()
            ),
            DenyReason::Unsupported => write!(
                f,
                "action `{}` is not supported on {}",
                self.action.as_str(),
                self.kind.as_str()
            ),
        }
    }
}

impl Error for AccessDenied {}
