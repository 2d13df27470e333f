//! Comment repository contracts and SQLite implementation.
//!
//! # Invariants
//! - A comment can only be inserted while its article exists (checked in the
//!   same immediate transaction as the insert).
//! - Comment lists are scoped to one article and ordered by `id ASC`.

use crate::authz::{ensure_allowed, Action, Resource, ResourceKind};
use crate::db::now_epoch_ms;
use crate::identity::{Actor, Identity, UserId};
use crate::model::article::ArticleId;
use crate::model::comment::{Comment, CommentId, NewComment};
use crate::repo::article_repo::{article_author, RepoError, RepoResult};
use crate::repo::{ensure_tables, ensure_user_exists, require_actor, RecordKind};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

const COMMENT_SELECT_SQL: &str = "SELECT
    c.id AS id,
    c.article_id AS article_id,
    c.author_id AS author_id,
    u.username AS author_username,
    c.content AS content,
    c.created_at AS created_at
FROM comments c
INNER JOIN users u ON u.id = c.author_id";

/// Repository interface for comment records.
pub trait CommentRepository {
    fn create_comment(
        &mut self,
        actor: &Identity,
        article_id: ArticleId,
        comment: &NewComment,
    ) -> RepoResult<CommentId>;
    fn get_comment(&self, id: CommentId) -> RepoResult<Option<Comment>>;
    /// Returns `NotFound` when the article itself does not exist.
    fn list_comments_for(&self, article_id: ArticleId) -> RepoResult<Vec<Comment>>;
    fn delete_comment(&mut self, actor: &Identity, id: CommentId) -> RepoResult<()>;
}

/// SQLite-backed comment repository.
pub struct SqliteCommentRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["users", "articles", "comments"])?;
        Ok(Self { conn })
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn create_comment(
        &mut self,
        actor: &Identity,
        article_id: ArticleId,
        comment: &NewComment,
    ) -> RepoResult<CommentId> {
        let author_id = require_actor(
            actor,
            Resource::collection(ResourceKind::Comment),
            Action::Create,
        )?
        .id;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        article_author(&tx, article_id)?;
        comment.validate()?;
        ensure_user_exists(&tx, author_id)?;

        tx.execute(
            "INSERT INTO comments (article_id, author_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![article_id, author_id, comment.content, now_epoch_ms()],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(id)
    }

    fn get_comment(&self, id: CommentId) -> RepoResult<Option<Comment>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COMMENT_SELECT_SQL} WHERE c.id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_comment_row(row)?));
        }
        Ok(None)
    }

    fn list_comments_for(&self, article_id: ArticleId) -> RepoResult<Vec<Comment>> {
        article_author(self.conn, article_id)?;

        let mut stmt = self.conn.prepare(&format!(
            "{COMMENT_SELECT_SQL} WHERE c.article_id = ?1 ORDER BY c.id ASC;"
        ))?;
        let mut rows = stmt.query([article_id])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }
        Ok(comments)
    }

    fn delete_comment(&mut self, actor: &Identity, id: CommentId) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let author_id: UserId = tx
            .query_row(
                "SELECT author_id FROM comments WHERE id = ?1;",
                [id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(RepoError::NotFound {
                kind: RecordKind::Comment,
                id,
            })?;
        ensure_allowed(
            actor,
            Resource::owned(ResourceKind::Comment, author_id),
            Action::Delete,
        )?;

        tx.execute("DELETE FROM comments WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(())
    }
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<Comment> {
    let id: CommentId = row.get("id")?;
    let content: String = row.get("content")?;
    if content.trim().is_empty() {
        return Err(RepoError::InvalidData(format!(
            "blank content in comments.content for id {id}"
        )));
    }

    Ok(Comment {
        id,
        article_id: row.get("article_id")?,
        author: Actor::new(row.get("author_id")?, row.get::<_, String>("author_username")?),
        content,
        created_at: row.get("created_at")?,
    })
}
