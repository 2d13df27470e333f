//! Actor identity as seen by the content core.
//!
//! # Responsibility
//! - Represent the authenticated (or anonymous) actor behind one request.
//! - Define the resolver seam through which an external auth collaborator
//!   maps a credential to an identity.
//!
//! # Invariants
//! - Ownership comparisons use `UserId` only; display names are informational.
//! - A missing or unknown credential resolves to `Identity::Anonymous`, never
//!   to an error. Denial happens later in the authorization engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Server-assigned user identifier.
pub type UserId = i64;

/// Authenticated actor reference (id + display name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub username: String,
}

impl Actor {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

/// Identity attached to one inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    User(Actor),
}

impl Identity {
    pub fn user(actor: Actor) -> Self {
        Self::User(actor)
    }

    pub fn actor(&self) -> Option<&Actor> {
        match self {
            Self::Anonymous => None,
            Self::User(actor) => Some(actor),
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.actor().map(|actor| actor.id)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }

    /// Metadata-only label for log lines.
    pub fn log_label(&self) -> String {
        match self {
            Self::Anonymous => "anonymous".to_string(),
            Self::User(actor) => format!("user:{}", actor.id),
        }
    }
}

impl From<Actor> for Identity {
    fn from(value: Actor) -> Self {
        Self::User(value)
    }
}

/// Maps a request credential (bearer token) to an identity.
///
/// Token issuance and verification live outside the core; implementations
/// only have to answer "who is this".
pub trait IdentityResolver {
    fn resolve(&self, credential: Option<&str>) -> Identity;
}

/// In-memory token table, for embedding, tests and local tooling.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenResolver {
    tokens: HashMap<String, Actor>,
}

impl StaticTokenResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` for `actor`, replacing any previous holder.
    pub fn insert(&mut self, token: impl Into<String>, actor: Actor) {
        self.tokens.insert(token.into(), actor);
    }

    pub fn with_token(mut self, token: impl Into<String>, actor: Actor) -> Self {
        self.insert(token, actor);
        self
    }
}

impl IdentityResolver for StaticTokenResolver {
    fn resolve(&self, credential: Option<&str>) -> Identity {
        credential
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .and_then(|token| self.tokens.get(token))
            .cloned()
            .map_or(Identity::Anonymous, Identity::User)
    }
}
