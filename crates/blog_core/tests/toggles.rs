use blog_core::db::{open_db, open_db_in_memory};
use blog_core::{
    Action, ArticleQuery, ArticleService, ContentError, DenyReason, Identity, NewArticle, NewUser,
    RecordKind, SqliteArticleRepository, SqliteUserRepository, ToggleState, UserService,
};
use rusqlite::Connection;

fn register(conn: &Connection, username: &str) -> Identity {
    let users = UserService::new(SqliteUserRepository::try_new(conn).unwrap());
    Identity::user(users.register_user(&NewUser::new(username, "")).unwrap())
}

#[test]
fn like_toggle_alternates_and_reports_state() {
    let mut conn = open_db_in_memory().unwrap();
    let author = register(&conn, "author");
    let reader = register(&conn, "reader");
    let mut service = ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());
    let article = service
        .create_article(&author, &NewArticle::new("Toggle me", "body"))
        .unwrap();

    assert_eq!(
        service.toggle_like(article.id, &reader).unwrap(),
        ToggleState::Liked
    );
    let liked = service.get_article(article.id).unwrap();
    assert!(liked.is_liked_by(reader.user_id().unwrap()));
    assert_eq!(liked.total_likes(), 1);

    assert_eq!(
        service.toggle_like(article.id, &reader).unwrap(),
        ToggleState::Unliked
    );
    let unliked = service.get_article(article.id).unwrap();
    assert_eq!(unliked.total_likes(), 0);
    assert_eq!(unliked.updated_at, article.updated_at);
}

#[test]
fn like_and_favorite_sets_are_independent() {
    let mut conn = open_db_in_memory().unwrap();
    let author = register(&conn, "author");
    let reader = register(&conn, "reader");
    let mut service = ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());
    let article = service
        .create_article(&author, &NewArticle::new("Both", "body"))
        .unwrap();

    assert_eq!(
        service.toggle_favorite(article.id, &reader).unwrap(),
        ToggleState::Favorited
    );
    let current = service.get_article(article.id).unwrap();
    assert!(current.is_favorited_by(reader.user_id().unwrap()));
    assert!(!current.is_liked_by(reader.user_id().unwrap()));

    assert_eq!(
        service.toggle_like(article.id, &reader).unwrap(),
        ToggleState::Liked
    );
    assert_eq!(
        service.toggle_favorite(article.id, &reader).unwrap(),
        ToggleState::Unfavorited
    );
    let current = service.get_article(article.id).unwrap();
    assert!(current.is_liked_by(reader.user_id().unwrap()));
    assert_eq!(current.total_favorites(), 0);
}

#[test]
fn author_may_like_own_article() {
    let mut conn = open_db_in_memory().unwrap();
    let author = register(&conn, "author");
    let mut service = ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());
    let article = service
        .create_article(&author, &NewArticle::new("Self", "body"))
        .unwrap();

    assert_eq!(
        service.toggle_like(article.id, &author).unwrap(),
        ToggleState::Liked
    );
    assert_eq!(
        service.toggle_favorite(article.id, &author).unwrap(),
        ToggleState::Favorited
    );
}

#[test]
fn anonymous_toggles_are_forbidden_and_missing_articles_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let author = register(&conn, "author");
    let mut service = ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());
    let article = service
        .create_article(&author, &NewArticle::new("Guarded", "body"))
        .unwrap();

    match service.toggle_like(article.id, &Identity::Anonymous) {
        Err(ContentError::Forbidden(denied)) => {
            assert_eq!(denied.action, Action::Like);
            assert_eq!(denied.reason, DenyReason::Unauthenticated);
        }
        other => panic!("expected forbidden, got {other:?}"),
    }
    assert!(matches!(
        service.toggle_favorite(article.id, &Identity::Anonymous),
        Err(ContentError::Forbidden(_))
    ));
    assert!(matches!(
        service.toggle_like(404, &author),
        Err(ContentError::NotFound {
            kind: RecordKind::Article,
            id: 404
        })
    ));
    assert_eq!(service.get_article(article.id).unwrap().total_likes(), 0);
}

#[test]
fn anonymous_toggle_on_missing_article_is_forbidden() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());

    for result in [
        service.toggle_like(404, &Identity::Anonymous),
        service.toggle_favorite(404, &Identity::Anonymous),
    ] {
        match result {
            Err(ContentError::Forbidden(denied)) => {
                assert_eq!(denied.reason, DenyReason::Unauthenticated);
            }
            other => panic!("expected forbidden, got {other:?}"),
        }
    }
}

#[test]
fn favorites_listing_follows_toggle_history() {
    let mut conn = open_db_in_memory().unwrap();
    let u1 = register(&conn, "u1");
    let u2 = register(&conn, "u2");
    let mut service = ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());
    let a1 = service
        .create_article(&u1, &NewArticle::new("A1", "first"))
        .unwrap();
    let a2 = service
        .create_article(&u1, &NewArticle::new("A2", "second"))
        .unwrap();

    assert_eq!(service.toggle_like(a1.id, &u2).unwrap(), ToggleState::Liked);
    assert_eq!(service.toggle_like(a1.id, &u2).unwrap(), ToggleState::Unliked);
    assert_eq!(
        service.toggle_favorite(a1.id, &u2).unwrap(),
        ToggleState::Favorited
    );

    let favorites = service.favorites_of(&u2).unwrap();
    assert_eq!(
        favorites.iter().map(|article| article.id).collect::<Vec<_>>(),
        vec![a1.id]
    );
    assert!(service.favorites_of(&u1).unwrap().is_empty());
    assert!(matches!(
        service.favorites_of(&Identity::Anonymous),
        Err(ContentError::Forbidden(_))
    ));

    let liked_by_u2 = service
        .search_articles(&ArticleQuery::new().liked_by(u2.user_id().unwrap()))
        .unwrap();
    assert!(liked_by_u2.is_empty());
    assert!(!service.get_article(a2.id).unwrap().is_favorited_by(u2.user_id().unwrap()));
}

#[test]
fn deleted_article_releases_memberships() {
    let mut conn = open_db_in_memory().unwrap();
    let author = register(&conn, "author");
    let reader = register(&conn, "reader");
    let mut service = ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());
    let article = service
        .create_article(&author, &NewArticle::new("Gone soon", "body"))
        .unwrap();
    service.toggle_favorite(article.id, &reader).unwrap();

    service.delete_article(&author, article.id).unwrap();

    assert!(service.favorites_of(&reader).unwrap().is_empty());
}

#[test]
fn concurrent_toggles_by_one_user_keep_parity() {
    const THREADS: usize = 4;
    const TOGGLES_PER_THREAD: usize = 5;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("toggles.sqlite3");
    let (reader, article_id) = {
        let mut conn = open_db(&db_path).unwrap();
        let author = register(&conn, "author");
        let reader = register(&conn, "reader");
        let mut service =
            ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());
        let article = service
            .create_article(&author, &NewArticle::new("Contended", "body"))
            .unwrap();
        (reader, article.id)
    };

    std::thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                let mut conn = open_db(&db_path).unwrap();
                let mut service =
                    ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());
                for _ in 0..TOGGLES_PER_THREAD {
                    service.toggle_like(article_id, &reader).unwrap();
                }
            });
        }
    });

    let mut conn = open_db(&db_path).unwrap();
    let service = ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());
    let article = service.get_article(article_id).unwrap();
    let expected_liked = (THREADS * TOGGLES_PER_THREAD) % 2 == 1;
    assert_eq!(
        article.is_liked_by(reader.user_id().unwrap()),
        expected_liked
    );
    assert!(article.total_likes() <= 1);
}

#[test]
fn concurrent_likes_from_distinct_users_all_land() {
    const USERS: usize = 6;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("likes.sqlite3");
    let (readers, article_id) = {
        let mut conn = open_db(&db_path).unwrap();
        let author = register(&conn, "author");
        let readers = (0..USERS)
            .map(|index| register(&conn, &format!("reader{index}")))
            .collect::<Vec<_>>();
        let mut service =
            ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());
        let article = service
            .create_article(&author, &NewArticle::new("Popular", "body"))
            .unwrap();
        (readers, article.id)
    };

    std::thread::scope(|scope| {
        for reader in &readers {
            let db_path = &db_path;
            scope.spawn(move || {
                let mut conn = open_db(db_path).unwrap();
                let mut service =
                    ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());
                assert_eq!(
                    service.toggle_like(article_id, reader).unwrap(),
                    ToggleState::Liked
                );
            });
        }
    });

    let mut conn = open_db(&db_path).unwrap();
    let service = ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());
    let article = service.get_article(article_id).unwrap();
    assert_eq!(article.total_likes(), USERS);
    for reader in &readers {
        assert!(article.is_liked_by(reader.user_id().unwrap()));
    }
}
