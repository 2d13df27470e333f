//! HTTP-shaped request router over the blog core.
//!
//! # Responsibility
//! - Translate `ApiRequest` values into core service calls.
//! - Map core outcomes to status codes and JSON bodies.
//!
//! # Invariants
//! - Every request opens its own connection, so one `BlogApi` can be shared
//!   by many worker threads.
//! - Identity comes only from the resolver; payload author fields are
//!   ignored.
//! - `handle` never panics and always returns a response.

use crate::dto::{
    ArticleBody, ArticleDto, ArticleListDto, CommentBody, CommentDto, RegisterBody, UserDto,
};
use blog_core::db::open_db;
use blog_core::{
    core_version, ensure_allowed, init_logging_from_config, ping, AccessDenied, Action,
    ArticleId, ArticlePatch, ArticleQuery, ArticleService, CommentId, CommentService,
    ContentError, CoreConfig, Identity, IdentityResolver, ListLimits, NewArticle, NewComment,
    NewUser, RepoError, Resource, ResourceKind, SqliteArticleRepository,
    SqliteCommentRepository, SqliteUserRepository, ToggleState, UserService, ValidationError,
};
use log::{error, info, warn};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Parses an HTTP method name, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inbound request, already de-framed by the outer HTTP server.
///
/// Query values are expected to be percent-decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: BTreeMap<String, String>,
    /// Bearer token from the `Authorization` header, if any.
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            bearer: None,
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Patch, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// `Value::Null` for bodiless responses (204).
    pub body: Value,
}

impl ApiResponse {
    fn json(status: u16, body: impl Serialize) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self { status, body },
            Err(err) => {
                error!("event=api_encode module=api status=error error={err}");
                Self::detail(500, "Internal server error.")
            }
        }
    }

    fn detail(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "detail": detail.into() }),
        }
    }

    fn message(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "message": message }),
        }
    }

    fn no_content() -> Self {
        Self {
            status: 204,
            body: Value::Null,
        }
    }
}

/// Request-level failure before or around a core call.
#[derive(Debug)]
enum ApiError {
    Content(ContentError),
    /// Body or query could not be decoded.
    BadRequest(String),
    RouteNotFound,
    MethodNotAllowed(Method),
}

impl From<ContentError> for ApiError {
    fn from(value: ContentError) -> Self {
        Self::Content(value)
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        Self::Content(ContentError::Validation(value))
    }
}

impl From<AccessDenied> for ApiError {
    fn from(value: AccessDenied) -> Self {
        Self::Content(ContentError::Forbidden(value))
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::Content(ContentError::from(value))
    }
}

impl ApiError {
    fn into_response(self) -> ApiResponse {
        match self {
            Self::Content(err) => content_error_response(err),
            Self::BadRequest(detail) => ApiResponse::detail(400, detail),
            Self::RouteNotFound => ApiResponse::detail(404, "Not found."),
            Self::MethodNotAllowed(method) => {
                ApiResponse::detail(405, format!("Method \"{method}\" not allowed."))
            }
        }
    }
}

fn content_error_response(err: ContentError) -> ApiResponse {
    match err {
        ContentError::NotFound { .. } => ApiResponse::detail(404, "Not found."),
        ContentError::Forbidden(denied) => ApiResponse::detail(403, denied.to_string()),
        ContentError::Validation(detail) => {
            let mut fields = serde_json::Map::new();
            fields.insert(detail.field.to_string(), json!([detail.message]));
            ApiResponse {
                status: 400,
                body: Value::Object(fields),
            }
        }
        ContentError::Conflict(message) => ApiResponse::detail(400, message),
        other => {
            error!(
                "event=api_internal module=api status=error error_code={} error={}",
                other.code(),
                other
            );
            ApiResponse::detail(500, "Internal server error.")
        }
    }
}

type ApiResult = Result<ApiResponse, ApiError>;

/// Blog HTTP surface bound to one database file.
pub struct BlogApi<Res: IdentityResolver> {
    db_path: PathBuf,
    resolver: Res,
    limits: ListLimits,
}

impl<Res: IdentityResolver> BlogApi<Res> {
    pub fn new(db_path: impl Into<PathBuf>, resolver: Res) -> Self {
        Self {
            db_path: db_path.into(),
            resolver,
            limits: ListLimits::default(),
        }
    }

    /// Builds the surface from configuration and starts file logging when
    /// the config names a log directory.
    pub fn from_config(config: &CoreConfig, resolver: Res) -> Result<Self, String> {
        init_logging_from_config(config)?;
        Ok(Self::new(config.db_path.clone(), resolver).with_list_limits(config.list_limits))
    }

    /// Same as [`Self::from_config`] with `BLOG_*` environment overrides.
    pub fn from_env(resolver: Res) -> Result<Self, String> {
        let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
        Self::from_config(&config, resolver)
    }

    pub fn with_list_limits(mut self, limits: ListLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Dispatches one request.
    ///
    /// # Side effects
    /// - Emits one `api_request` log line with method, path, actor and
    ///   status.
    pub fn handle(&self, request: &ApiRequest) -> ApiResponse {
        let started_at = Instant::now();
        let identity = self.resolver.resolve(request.bearer.as_deref());
        let response = self
            .dispatch(request, &identity)
            .unwrap_or_else(ApiError::into_response);

        let line = format!(
            "event=api_request module=api method={} path={} actor={} http_status={} duration_ms={}",
            request.method,
            request.path,
            identity.log_label(),
            response.status,
            started_at.elapsed().as_millis()
        );
        if response.status >= 500 {
            error!("{line} status=error");
        } else if response.status >= 400 {
            warn!("{line} status=rejected");
        } else {
            info!("{line} status=ok");
        }
        response
    }

    fn dispatch(&self, request: &ApiRequest, identity: &Identity) -> ApiResult {
        let segments = route_segments(&request.path);
        let method = request.method;

        match segments.as_slice() {
            ["health"] => match method {
                Method::Get => Ok(ApiResponse::json(
                    200,
                    json!({ "status": ping(), "version": core_version() }),
                )),
                _ => Err(ApiError::MethodNotAllowed(method)),
            },
            ["register"] => match method {
                Method::Post => self.register(request),
                _ => Err(ApiError::MethodNotAllowed(method)),
            },
            ["articles"] => match method {
                Method::Get => self.list_articles(request),
                Method::Post => self.create_article(request, identity),
                _ => Err(ApiError::MethodNotAllowed(method)),
            },
            ["articles", "favorites"] => match method {
                Method::Get => self.favorites(identity),
                _ => Err(ApiError::MethodNotAllowed(method)),
            },
            ["articles", id] => {
                let id = parse_id(id)?;
                match method {
                    Method::Get => self.get_article(id),
                    Method::Put => self.replace_article(request, identity, id),
                    Method::Patch => self.patch_article(request, identity, id),
                    Method::Delete => self.delete_article(identity, id),
                    Method::Post => Err(ApiError::MethodNotAllowed(method)),
                }
            }
            ["articles", id, "like"] => {
                let id = parse_id(id)?;
                match method {
                    Method::Post => self.toggle(identity, id, ToggleKind::Like),
                    _ => Err(ApiError::MethodNotAllowed(method)),
                }
            }
            ["articles", id, "favorite"] => {
                let id = parse_id(id)?;
                match method {
                    Method::Post => self.toggle(identity, id, ToggleKind::Favorite),
                    _ => Err(ApiError::MethodNotAllowed(method)),
                }
            }
            ["articles", id, "comments"] => {
                let id = parse_id(id)?;
                match method {
                    Method::Get => self.list_comments(id),
                    Method::Post => self.create_comment(request, identity, id),
                    _ => Err(ApiError::MethodNotAllowed(method)),
                }
            }
            ["comments", id] => {
                let id = parse_id(id)?;
                match method {
                    Method::Get => self.get_comment(id),
                    Method::Delete => self.delete_comment(identity, id),
                    _ => Err(ApiError::MethodNotAllowed(method)),
                }
            }
            _ => Err(ApiError::RouteNotFound),
        }
    }

    fn connect(&self) -> Result<Connection, ApiError> {
        open_db(&self.db_path).map_err(|err| ApiError::from(RepoError::from(err)))
    }

    fn register(&self, request: &ApiRequest) -> ApiResult {
        let body: RegisterBody = decode_body(request)?;
        let username = body
            .username
            .ok_or_else(|| ValidationError::required("username"))?;
        let conn = self.connect()?;
        let users = UserService::new(SqliteUserRepository::try_new(&conn)?);
        let actor = users.register_user(&NewUser::new(username, body.email.clone()))?;
        Ok(ApiResponse::json(
            201,
            UserDto {
                id: actor.id,
                username: actor.username,
                email: body.email.trim().to_string(),
            },
        ))
    }

    fn list_articles(&self, request: &ApiRequest) -> ApiResult {
        let query = article_query(request)?;
        let limit = query_number::<u32>(request, "limit")?;
        let offset = query_number::<u32>(request, "offset")?.unwrap_or(0);

        let mut conn = self.connect()?;
        let service = self.article_service(&mut conn)?;
        let page = service.list_articles(&query, limit, offset)?;
        Ok(ApiResponse::json(200, ArticleListDto::from(&page)))
    }

    fn create_article(&self, request: &ApiRequest, identity: &Identity) -> ApiResult {
        // Anonymous callers get 403 even when the payload is malformed.
        ensure_allowed(
            identity,
            Resource::collection(ResourceKind::Article),
            Action::Create,
        )?;
        let body: ArticleBody = decode_body(request)?;
        let mut conn = self.connect()?;
        let mut service = self.article_service(&mut conn)?;

        let title = body.title.ok_or_else(|| ValidationError::required("title"))?;
        let content = body
            .content
            .ok_or_else(|| ValidationError::required("content"))?;
        let article = NewArticle::new(title, content).with_tags(body.tags.unwrap_or_default());

        let created = service.create_article(identity, &article)?;
        Ok(ApiResponse::json(201, ArticleDto::from(&created)))
    }

    fn get_article(&self, id: ArticleId) -> ApiResult {
        let mut conn = self.connect()?;
        let service = self.article_service(&mut conn)?;
        let article = service.get_article(id)?;
        Ok(ApiResponse::json(200, ArticleDto::from(&article)))
    }

    /// `PUT`: title and content are required, tags stay when omitted.
    fn replace_article(
        &self,
        request: &ApiRequest,
        identity: &Identity,
        id: ArticleId,
    ) -> ApiResult {
        let mut conn = self.connect()?;
        let mut service = self.article_service(&mut conn)?;

        let current = service.get_article(id)?;
        ensure_allowed(identity, Resource::article(&current), Action::Update)?;
        let body: ArticleBody = decode_body(request)?;
        let patch = ArticlePatch {
            title: Some(body.title.ok_or_else(|| ValidationError::required("title"))?),
            content: Some(
                body.content
                    .ok_or_else(|| ValidationError::required("content"))?,
            ),
            tags: body.tags,
        };

        let updated = service.update_article(identity, id, &patch)?;
        Ok(ApiResponse::json(200, ArticleDto::from(&updated)))
    }

    /// `PATCH`: merges whichever fields are present.
    fn patch_article(
        &self,
        request: &ApiRequest,
        identity: &Identity,
        id: ArticleId,
    ) -> ApiResult {
        let mut conn = self.connect()?;
        let mut service = self.article_service(&mut conn)?;

        let current = service.get_article(id)?;
        ensure_allowed(identity, Resource::article(&current), Action::Update)?;
        let body: ArticleBody = decode_body(request)?;
        let patch = ArticlePatch {
            title: body.title,
            content: body.content,
            tags: body.tags,
        };

        let updated = service.update_article(identity, id, &patch)?;
        Ok(ApiResponse::json(200, ArticleDto::from(&updated)))
    }

    fn delete_article(&self, identity: &Identity, id: ArticleId) -> ApiResult {
        let mut conn = self.connect()?;
        let mut service = self.article_service(&mut conn)?;
        service.delete_article(identity, id)?;
        Ok(ApiResponse::no_content())
    }

    fn toggle(&self, identity: &Identity, id: ArticleId, kind: ToggleKind) -> ApiResult {
        let mut conn = self.connect()?;
        let mut service = self.article_service(&mut conn)?;
        let state = match kind {
            ToggleKind::Like => service.toggle_like(id, identity)?,
            ToggleKind::Favorite => service.toggle_favorite(id, identity)?,
        };
        Ok(ApiResponse::message(toggle_status(state), state.message()))
    }

    fn favorites(&self, identity: &Identity) -> ApiResult {
        let mut conn = self.connect()?;
        let service = self.article_service(&mut conn)?;
        let articles = service.favorites_of(identity)?;
        Ok(ApiResponse::json(
            200,
            articles.iter().map(ArticleDto::from).collect::<Vec<_>>(),
        ))
    }

    fn list_comments(&self, article_id: ArticleId) -> ApiResult {
        let mut conn = self.connect()?;
        let service = CommentService::new(SqliteCommentRepository::try_new(&mut conn)?);
        let comments = service.comments_for(article_id)?;
        Ok(ApiResponse::json(
            200,
            comments.iter().map(CommentDto::from).collect::<Vec<_>>(),
        ))
    }

    fn create_comment(
        &self,
        request: &ApiRequest,
        identity: &Identity,
        article_id: ArticleId,
    ) -> ApiResult {
        ensure_allowed(
            identity,
            Resource::collection(ResourceKind::Comment),
            Action::Create,
        )?;
        let body: CommentBody = decode_body(request)?;
        let mut conn = self.connect()?;
        let mut service = CommentService::new(SqliteCommentRepository::try_new(&mut conn)?);

        let content = body
            .content
            .ok_or_else(|| ValidationError::required("content"))?;
        let comment = service.create_comment(identity, article_id, &NewComment::new(content))?;
        Ok(ApiResponse::json(201, CommentDto::from(&comment)))
    }

    fn get_comment(&self, id: CommentId) -> ApiResult {
        let mut conn = self.connect()?;
        let service = CommentService::new(SqliteCommentRepository::try_new(&mut conn)?);
        let comment = service.get_comment(id)?;
        Ok(ApiResponse::json(200, CommentDto::from(&comment)))
    }

    fn delete_comment(&self, identity: &Identity, id: CommentId) -> ApiResult {
        let mut conn = self.connect()?;
        let mut service = CommentService::new(SqliteCommentRepository::try_new(&mut conn)?);
        service.delete_comment(identity, id)?;
        Ok(ApiResponse::no_content())
    }

    fn article_service<'conn>(
        &self,
        conn: &'conn mut Connection,
    ) -> Result<ArticleService<SqliteArticleRepository<'conn>>, ApiError> {
        Ok(ArticleService::new(SqliteArticleRepository::try_new(conn)?)
            .with_list_limits(self.limits))
    }
}

#[derive(Debug, Clone, Copy)]
enum ToggleKind {
    Like,
    Favorite,
}

/// 201 when membership was added, 200 when removed.
fn toggle_status(state: ToggleState) -> u16 {
    if state.is_added() {
        201
    } else {
        200
    }
}

/// Splits a path into segments, dropping an optional `api` prefix and
/// trailing slashes.
fn route_segments(path: &str) -> Vec<&str> {
    let path = path.split('?').next().unwrap_or_default();
    let mut segments = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>();
    if segments.first() == Some(&"api") {
        segments.remove(0);
    }
    segments
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    // Non-numeric ids never match a route.
    raw.parse::<i64>().map_err(|_| ApiError::RouteNotFound)
}

fn decode_body<T: DeserializeOwned + Default>(request: &ApiRequest) -> Result<T, ApiError> {
    match request.body.as_ref() {
        None | Some(Value::Null) => Ok(T::default()),
        Some(body) => serde_json::from_value(body.clone())
            .map_err(|err| ApiError::BadRequest(format!("JSON parse error - {err}"))),
    }
}

fn query_value<'a>(request: &'a ApiRequest, key: &str) -> Option<&'a str> {
    request
        .query
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn query_number<T: std::str::FromStr>(
    request: &ApiRequest,
    key: &'static str,
) -> Result<Option<T>, ApiError> {
    match query_value(request, key) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
            ApiError::from(ValidationError::new(key, "A valid integer is required."))
        }),
    }
}

fn article_query(request: &ApiRequest) -> Result<ArticleQuery, ApiError> {
    let mut query = ArticleQuery::new();
    if let Some(text) = query_value(request, "search") {
        query = query.text(text);
    }
    if let Some(tag) = query_value(request, "tag") {
        query = query.tag(tag);
    }
    if let Some(title) = query_value(request, "title") {
        query = query.title(title);
    }
    if let Some(content) = query_value(request, "content") {
        query = query.content(content);
    }
    if let Some(author) = query_number(request, "author")? {
        query = query.author(author);
    }
    if let Some(user) = query_number(request, "favorited_by")? {
        query = query.favorited_by(user);
    }
    Ok(query)
}
