//! Repository layer: the content store.
//!
//! # Responsibility
//! - Own article, comment and user records in SQLite.
//! - Run every read-authorize-write sequence inside one immediate
//!   transaction, so concurrent writers on the same article serialize.
//!
//! # Invariants
//! - Mutating methods take the request identity and consult
//!   [`crate::authz`] after resolving the target and before writing.
//! - Validation runs before any SQL mutation; a rejected write changes
//!   nothing.
//! - Repository APIs return semantic errors (`NotFound`, `Denied`,
//!   `Conflict`) in addition to DB transport errors.

pub mod article_repo;
pub mod comment_repo;
pub mod user_repo;

use crate::authz::{ensure_allowed, AccessDenied, Action, DenyReason, Resource};
use crate::identity::{Actor, Identity, UserId};
use article_repo::{RepoError, RepoResult};
use rusqlite::Connection;

/// Record family referenced by `RepoError::NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    User,
    Article,
    Comment,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Article => "article",
            Self::Comment => "comment",
        }
    }
}

/// Authorizes `action` and returns the acting user.
///
/// Only used for actions whose rule requires an authenticated identity.
pub(crate) fn require_actor(
    actor: &Identity,
    resource: Resource,
    action: Action,
) -> RepoResult<&Actor> {
    ensure_allowed(actor, resource, action)?;
    actor.actor().ok_or(RepoError::Denied(AccessDenied {
        kind: resource.kind,
        action,
        reason: DenyReason::Unauthenticated,
    }))
}

pub(crate) fn ensure_user_exists(conn: &Connection, user_id: UserId) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
        [user_id],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepoError::NotFound {
            kind: RecordKind::User,
            id: user_id,
        })
    }
}

pub(crate) fn ensure_tables(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    for table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}
