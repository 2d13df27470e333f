//! User directory: the local mirror of identities that own content.
//!
//! Credentials never reach this table; the external auth collaborator owns
//! them. Only the id, a unique username and an optional email are stored.

use crate::db::now_epoch_ms;
use crate::identity::{Actor, UserId};
use crate::repo::article_repo::{RepoError, RepoResult};
use crate::repo::ensure_tables;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

pub trait UserRepository {
    /// Inserts a user; `Conflict` when the username is taken.
    fn register_user(&self, username: &str, email: &str) -> RepoResult<Actor>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<Actor>>;
    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<Actor>>;
}

pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["users"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn register_user(&self, username: &str, email: &str) -> RepoResult<Actor> {
        let inserted = self.conn.execute(
            "INSERT INTO users (username, email, created_at) VALUES (?1, ?2, ?3);",
            params![username, email, now_epoch_ms()],
        );

        match inserted {
            Ok(_) => Ok(Actor::new(self.conn.last_insert_rowid(), username)),
            Err(rusqlite::Error::SqliteFailure(failure, _))
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                Err(RepoError::Conflict(format!(
                    "a user with username `{username}` already exists"
                )))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<Actor>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, username FROM users WHERE id = ?1;",
                [id],
                |row| Ok(Actor::new(row.get(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?)
    }

    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<Actor>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, username FROM users WHERE username = ?1;",
                [username],
                |row| Ok(Actor::new(row.get(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?)
    }
}
