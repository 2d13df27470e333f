//! Article repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist articles with their ordered tags and relation sets.
//! - Provide the atomic membership toggle used for likes and favorites.
//!
//! # Invariants
//! - Tags are stored with an explicit `position`, so reads return them in
//!   caller order.
//! - `article_likes` / `article_favorites` have `(article_id, user_id)` as
//!   primary key: a user is a member at most once per set.
//! - List reads are ordered by `id ASC`, which is creation order.

use crate::authz::{ensure_allowed, AccessDenied, Action, Resource, ResourceKind};
use crate::db::{now_epoch_ms, DbError};
use crate::identity::{Actor, Identity, UserId};
use crate::model::article::{normalize_tags, Article, ArticleId, ArticlePatch, NewArticle};
use crate::model::validation::ValidationError;
use crate::repo::{ensure_tables, ensure_user_exists, require_actor, RecordKind};
use crate::toggle::{Relation, ToggleState};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const ARTICLE_SELECT_SQL: &str = "SELECT
    a.id AS id,
    a.title AS title,
    a.content AS content,
    a.author_id AS author_id,
    u.username AS author_username,
    a.created_at AS created_at,
    a.updated_at AS updated_at
FROM articles a
INNER JOIN users u ON u.id = a.author_id";

const REQUIRED_TABLES: &[&str] = &[
    "users",
    "articles",
    "article_tags",
    "article_likes",
    "article_favorites",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by the content store.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Denied(AccessDenied),
    Db(DbError),
    NotFound { kind: RecordKind, id: i64 },
    Conflict(String),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Denied(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{} not found: {id}", kind.as_str()),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Denied(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<AccessDenied> for RepoError {
    fn from(value: AccessDenied) -> Self {
        Self::Denied(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Structured, SQL-evaluated filters. Text and tag matching happen in
/// [`crate::search`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    pub author_id: Option<UserId>,
    /// Exact title equality.
    pub title: Option<String>,
    /// Exact content equality.
    pub content: Option<String>,
    pub liked_by: Option<UserId>,
    pub favorited_by: Option<UserId>,
}

/// Repository interface for article records.
pub trait ArticleRepository {
    /// Creates an article authored by `actor`.
    fn create_article(&mut self, actor: &Identity, article: &NewArticle) -> RepoResult<ArticleId>;
    fn get_article(&self, id: ArticleId) -> RepoResult<Option<Article>>;
    /// Merges the supplied fields; author only.
    fn update_article(
        &mut self,
        actor: &Identity,
        id: ArticleId,
        patch: &ArticlePatch,
    ) -> RepoResult<()>;
    /// Deletes the article and, by cascade, its comments and relations.
    fn delete_article(&mut self, actor: &Identity, id: ArticleId) -> RepoResult<()>;
    /// Flips `actor` membership in one relation set of the article.
    fn toggle_relation(
        &mut self,
        actor: &Identity,
        id: ArticleId,
        relation: Relation,
    ) -> RepoResult<ToggleState>;
    /// Lists articles in creation order.
    fn list_articles(&self, filter: &ArticleFilter) -> RepoResult<Vec<Article>>;
    /// One page of [`Self::list_articles`], paginated in SQL.
    fn list_articles_page(
        &self,
        filter: &ArticleFilter,
        limit: u32,
        offset: u32,
    ) -> RepoResult<Vec<Article>>;
    /// Number of articles matching `filter`.
    fn count_matching(&self, filter: &ArticleFilter) -> RepoResult<u64>;
    fn count_articles(&self) -> RepoResult<u64>;
}

/// SQLite-backed article repository.
pub struct SqliteArticleRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteArticleRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_tables(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    fn begin(&mut self) -> RepoResult<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}

impl ArticleRepository for SqliteArticleRepository<'_> {
    fn create_article(&mut self, actor: &Identity, article: &NewArticle) -> RepoResult<ArticleId> {
        let author_id = require_actor(
            actor,
            Resource::collection(ResourceKind::Article),
            Action::Create,
        )?
        .id;
        article.validate()?;

        let tx = self.begin()?;
        ensure_user_exists(&tx, author_id)?;
        let now = now_epoch_ms();
        tx.execute(
            "INSERT INTO articles (title, content, author_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4);",
            params![article.title.trim(), article.content, author_id, now],
        )?;
        let id = tx.last_insert_rowid();
        replace_tags(&tx, id, &article.normalized_tags())?;
        tx.commit()?;

        Ok(id)
    }

    fn get_article(&self, id: ArticleId) -> RepoResult<Option<Article>> {
        load_article(self.conn, id)
    }

    fn update_article(
        &mut self,
        actor: &Identity,
        id: ArticleId,
        patch: &ArticlePatch,
    ) -> RepoResult<()> {
        let tx = self.begin()?;
        let author_id = article_author(&tx, id)?;
        ensure_allowed(
            actor,
            Resource::owned(ResourceKind::Article, author_id),
            Action::Update,
        )?;
        patch.validate()?;

        tx.execute(
            "UPDATE articles
             SET
                title = COALESCE(?2, title),
                content = COALESCE(?3, content),
                updated_at = ?4
             WHERE id = ?1;",
            params![
                id,
                patch.title.as_deref().map(str::trim),
                patch.content.as_deref(),
                now_epoch_ms(),
            ],
        )?;
        if let Some(tags) = patch.tags.as_deref() {
            replace_tags(&tx, id, &normalize_tags(tags))?;
        }
        tx.commit()?;

        Ok(())
    }

    fn delete_article(&mut self, actor: &Identity, id: ArticleId) -> RepoResult<()> {
        let tx = self.begin()?;
        let author_id = article_author(&tx, id)?;
        ensure_allowed(
            actor,
            Resource::owned(ResourceKind::Article, author_id),
            Action::Delete,
        )?;

        tx.execute("DELETE FROM articles WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(())
    }

    fn toggle_relation(
        &mut self,
        actor: &Identity,
        id: ArticleId,
        relation: Relation,
    ) -> RepoResult<ToggleState> {
        // Anonymous toggles are denied even when the article does not exist.
        let user_id = require_actor(
            actor,
            Resource::collection(ResourceKind::Article),
            relation.action(),
        )?
        .id;

        let tx = self.begin()?;
        let author_id = article_author(&tx, id)?;
        ensure_allowed(
            actor,
            Resource::owned(ResourceKind::Article, author_id),
            relation.action(),
        )?;
        ensure_user_exists(&tx, user_id)?;

        let removed = tx.execute(
            &format!(
                "DELETE FROM {} WHERE article_id = ?1 AND user_id = ?2;",
                relation.table()
            ),
            params![id, user_id],
        )?;
        if removed == 0 {
            tx.execute(
                &format!(
                    "INSERT INTO {} (article_id, user_id, created_at) VALUES (?1, ?2, ?3);",
                    relation.table()
                ),
                params![id, user_id, now_epoch_ms()],
            )?;
        }
        tx.commit()?;

        Ok(relation.toggled_from(removed > 0))
    }

    fn list_articles(&self, filter: &ArticleFilter) -> RepoResult<Vec<Article>> {
        let (clause, bind_values) = filter_clause(filter);
        query_articles(
            self.conn,
            &format!("{ARTICLE_SELECT_SQL}{clause} ORDER BY a.id ASC"),
            bind_values,
        )
    }

    fn list_articles_page(
        &self,
        filter: &ArticleFilter,
        limit: u32,
        offset: u32,
    ) -> RepoResult<Vec<Article>> {
        let (clause, mut bind_values) = filter_clause(filter);
        bind_values.push(Value::Integer(i64::from(limit)));
        bind_values.push(Value::Integer(i64::from(offset)));
        query_articles(
            self.conn,
            &format!("{ARTICLE_SELECT_SQL}{clause} ORDER BY a.id ASC LIMIT ? OFFSET ?"),
            bind_values,
        )
    }

    fn count_matching(&self, filter: &ArticleFilter) -> RepoResult<u64> {
        let (clause, bind_values) = filter_clause(filter);
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM articles a{clause}"),
            params_from_iter(bind_values),
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative article count `{count}`")))
    }

    fn count_articles(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM articles;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative article count `{count}`")))
    }
}

/// Builds the `WHERE` clause for `filter` over the `articles a` alias.
fn filter_clause(filter: &ArticleFilter) -> (String, Vec<Value>) {
    let mut sql = String::from(" WHERE 1 = 1");
    let mut bind_values: Vec<Value> = Vec::new();

    if let Some(author_id) = filter.author_id {
        sql.push_str(" AND a.author_id = ?");
        bind_values.push(Value::Integer(author_id));
    }
    if let Some(title) = filter.title.as_ref() {
        sql.push_str(" AND a.title = ?");
        bind_values.push(Value::Text(title.clone()));
    }
    if let Some(content) = filter.content.as_ref() {
        sql.push_str(" AND a.content = ?");
        bind_values.push(Value::Text(content.clone()));
    }
    if let Some(user_id) = filter.liked_by {
        sql.push_str(
            " AND EXISTS (
                SELECT 1 FROM article_likes l
                WHERE l.article_id = a.id AND l.user_id = ?
            )",
        );
        bind_values.push(Value::Integer(user_id));
    }
    if let Some(user_id) = filter.favorited_by {
        sql.push_str(
            " AND EXISTS (
                SELECT 1 FROM article_favorites f
                WHERE f.article_id = a.id AND f.user_id = ?
            )",
        );
        bind_values.push(Value::Integer(user_id));
    }

    (sql, bind_values)
}

fn query_articles(
    conn: &Connection,
    sql: &str,
    bind_values: Vec<Value>,
) -> RepoResult<Vec<Article>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut articles = Vec::new();
    while let Some(row) = rows.next()? {
        articles.push(hydrate_article(conn, row)?);
    }
    Ok(articles)
}

/// Returns the author of `id`, or `NotFound`.
pub(crate) fn article_author(conn: &Connection, id: ArticleId) -> RepoResult<UserId> {
    conn.query_row(
        "SELECT author_id FROM articles WHERE id = ?1;",
        [id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or(RepoError::NotFound {
        kind: RecordKind::Article,
        id,
    })
}

fn load_article(conn: &Connection, id: ArticleId) -> RepoResult<Option<Article>> {
    let mut stmt = conn.prepare(&format!("{ARTICLE_SELECT_SQL} WHERE a.id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(hydrate_article(conn, row)?));
    }
    Ok(None)
}

fn hydrate_article(conn: &Connection, row: &Row<'_>) -> RepoResult<Article> {
    let id: ArticleId = row.get("id")?;
    let title: String = row.get("title")?;
    if title.trim().is_empty() {
        return Err(RepoError::InvalidData(format!(
            "blank title in articles.title for id {id}"
        )));
    }

    Ok(Article {
        id,
        title,
        content: row.get("content")?,
        author: Actor::new(row.get("author_id")?, row.get::<_, String>("author_username")?),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        tags: load_tags(conn, id)?,
        liked_by: load_members(conn, Relation::Like, id)?,
        favorited_by: load_members(conn, Relation::Favorite, id)?,
    })
}

fn load_tags(conn: &Connection, id: ArticleId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name
         FROM article_tags
         WHERE article_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get(0)?);
    }
    Ok(tags)
}

fn load_members(
    conn: &Connection,
    relation: Relation,
    id: ArticleId,
) -> RepoResult<BTreeSet<UserId>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT user_id FROM {} WHERE article_id = ?1;",
        relation.table()
    ))?;
    let mut rows = stmt.query([id])?;
    let mut members = BTreeSet::new();
    while let Some(row) = rows.next()? {
        members.insert(row.get(0)?);
    }
    Ok(members)
}

fn replace_tags(tx: &Transaction<'_>, id: ArticleId, tags: &[String]) -> RepoResult<()> {
    tx.execute("DELETE FROM article_tags WHERE article_id = ?1;", [id])?;
    for (position, tag) in tags.iter().enumerate() {
        let position = i64::try_from(position)
            .map_err(|_| RepoError::InvalidData(format!("tag position overflow at {position}")))?;
        tx.execute(
            "INSERT INTO article_tags (article_id, position, name) VALUES (?1, ?2, ?3);",
            params![id, position, tag.as_str()],
        )?;
    }
    Ok(())
}
