use blog_core::db::open_db_in_memory;
use blog_core::{
    Actor, ArticlePatch, ArticleService, ContentError, Identity, NewArticle, NewUser, RecordKind,
    SqliteArticleRepository, SqliteUserRepository, UserService,
};
use rusqlite::Connection;

fn register(conn: &Connection, username: &str) -> Actor {
    let users = UserService::new(SqliteUserRepository::try_new(conn).unwrap());
    users.register_user(&NewUser::new(username, "")).unwrap()
}

#[test]
fn create_and_get_roundtrip_keeps_tag_order() {
    let mut conn = open_db_in_memory().unwrap();
    let author = register(&conn, "author");
    let mut service = ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());

    let created = service
        .create_article(
            &Identity::user(author.clone()),
            &NewArticle::new("  Hello  ", "first body").with_tags(["Tech", "Python", "Async"]),
        )
        .unwrap();
    assert_eq!(created.title, "Hello");
    assert_eq!(created.author, author);
    assert_eq!(created.tags, vec!["Tech", "Python", "Async"]);
    assert!(created.liked_by.is_empty());
    assert!(created.favorited_by.is_empty());
    assert_eq!(created.created_at, created.updated_at);

    let loaded = service.get_article(created.id).unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn ids_are_monotonic_and_not_reused_after_delete() {
    let mut conn = open_db_in_memory().unwrap();
    let author = Identity::user(register(&conn, "author"));
    let mut service = ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());

    let first = service
        .create_article(&author, &NewArticle::new("one", ""))
        .unwrap();
    let second = service
        .create_article(&author, &NewArticle::new("two", ""))
        .unwrap();
    assert!(second.id > first.id);

    service.delete_article(&author, second.id).unwrap();
    let third = service
        .create_article(&author, &NewArticle::new("three", ""))
        .unwrap();
    assert!(third.id > second.id);
}

#[test]
fn update_merges_only_supplied_fields() {
    let mut conn = open_db_in_memory().unwrap();
    let author = Identity::user(register(&conn, "author"));
    let mut service = ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());
    let created = service
        .create_article(
            &author,
            &NewArticle::new("Title", "Body").with_tags(["a", "b"]),
        )
        .unwrap();

    let updated = service
        .update_article(
            &author,
            created.id,
            &ArticlePatch {
                title: Some("New title".to_string()),
                ..ArticlePatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.title, "New title");
    assert_eq!(updated.content, "Body");
    assert_eq!(updated.tags, vec!["a", "b"]);
    assert_eq!(updated.author, created.author);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
}

#[test]
fn update_with_tags_replaces_the_full_sequence() {
    let mut conn = open_db_in_memory().unwrap();
    let author = Identity::user(register(&conn, "author"));
    let mut service = ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());
    let created = service
        .create_article(
            &author,
            &NewArticle::new("Title", "Body").with_tags(["a", "b"]),
        )
        .unwrap();

    let replaced = service
        .update_article(
            &author,
            created.id,
            &ArticlePatch {
                tags: Some(vec!["UpdatedTag".to_string()]),
                ..ArticlePatch::default()
            },
        )
        .unwrap();
    assert_eq!(replaced.tags, vec!["UpdatedTag"]);

    let cleared = service
        .update_article(
            &author,
            created.id,
            &ArticlePatch {
                tags: Some(Vec::new()),
                ..ArticlePatch::default()
            },
        )
        .unwrap();
    assert!(cleared.tags.is_empty());
    assert_eq!(cleared.title, "Title");
}

#[test]
fn failed_validation_leaves_article_untouched() {
    let mut conn = open_db_in_memory().unwrap();
    let author = Identity::user(register(&conn, "author"));
    let mut service = ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());
    let created = service
        .create_article(&author, &NewArticle::new("Title", "Body").with_tags(["keep"]))
        .unwrap();

    let err = service
        .update_article(
            &author,
            created.id,
            &ArticlePatch {
                title: Some("   ".to_string()),
                content: Some("would be lost".to_string()),
                tags: Some(vec!["gone".to_string()]),
            },
        )
        .unwrap_err();
    assert!(matches!(err, ContentError::Validation(ref detail) if detail.field == "title"));

    let reloaded = service.get_article(created.id).unwrap();
    assert_eq!(reloaded, created);
}

#[test]
fn create_rejects_blank_title_for_authenticated_user() {
    let mut conn = open_db_in_memory().unwrap();
    let author = Identity::user(register(&conn, "author"));
    let mut service = ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());

    let err = service
        .create_article(&author, &NewArticle::new("", "body"))
        .unwrap_err();
    assert!(matches!(err, ContentError::Validation(_)));
    assert_eq!(service.count_articles().unwrap(), 0);
}

#[test]
fn missing_article_reports_not_found_for_every_operation() {
    let mut conn = open_db_in_memory().unwrap();
    let author = Identity::user(register(&conn, "author"));
    let mut service = ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());

    let assert_not_found = |err: ContentError| {
        assert!(
            matches!(
                err,
                ContentError::NotFound {
                    kind: RecordKind::Article,
                    id: 404
                }
            ),
            "unexpected error: {err}"
        );
    };

    assert_not_found(service.get_article(404).unwrap_err());
    assert_not_found(
        service
            .update_article(&author, 404, &ArticlePatch::default())
            .unwrap_err(),
    );
    assert_not_found(service.delete_article(&author, 404).unwrap_err());
    assert_not_found(service.toggle_like(404, &author).unwrap_err());
    assert_not_found(service.toggle_favorite(404, &author).unwrap_err());
}

#[test]
fn delete_removes_article() {
    let mut conn = open_db_in_memory().unwrap();
    let author = Identity::user(register(&conn, "author"));
    let mut service = ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());
    let created = service
        .create_article(&author, &NewArticle::new("doomed", ""))
        .unwrap();

    service.delete_article(&author, created.id).unwrap();
    assert!(matches!(
        service.get_article(created.id),
        Err(ContentError::NotFound { .. })
    ));
    assert_eq!(service.count_articles().unwrap(), 0);
}

#[test]
fn author_unknown_to_the_directory_cannot_create() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());
    let ghost = Identity::user(Actor::new(99, "ghost"));

    let err = service
        .create_article(&ghost, &NewArticle::new("t", "c"))
        .unwrap_err();
    assert!(matches!(
        err,
        ContentError::NotFound {
            kind: RecordKind::User,
            id: 99
        }
    ));
}
