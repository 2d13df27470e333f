use blog_core::db::open_db_in_memory;
use blog_core::{
    Action, ArticleService, CommentService, ContentError, DenyReason, Identity, NewArticle,
    NewComment, NewUser, RecordKind, SqliteArticleRepository, SqliteCommentRepository,
    SqliteUserRepository, UserService,
};
use rusqlite::Connection;

fn register(conn: &Connection, username: &str) -> Identity {
    let users = UserService::new(SqliteUserRepository::try_new(conn).unwrap());
    Identity::user(users.register_user(&NewUser::new(username, "")).unwrap())
}

fn create_article(conn: &mut Connection, author: &Identity, title: &str) -> i64 {
    let mut service = ArticleService::new(SqliteArticleRepository::try_new(conn).unwrap());
    service
        .create_article(author, &NewArticle::new(title, "body"))
        .unwrap()
        .id
}

#[test]
fn comments_are_scoped_to_article_in_creation_order() {
    let mut conn = open_db_in_memory().unwrap();
    let alice = register(&conn, "alice");
    let bob = register(&conn, "bob");
    let first_article = create_article(&mut conn, &alice, "first");
    let second_article = create_article(&mut conn, &alice, "second");

    let mut comments = CommentService::new(SqliteCommentRepository::try_new(&mut conn).unwrap());
    let c1 = comments
        .create_comment(&bob, first_article, &NewComment::new("Great article!"))
        .unwrap();
    let c2 = comments
        .create_comment(&alice, first_article, &NewComment::new("Thanks"))
        .unwrap();
    comments
        .create_comment(&bob, second_article, &NewComment::new("Elsewhere"))
        .unwrap();

    assert_eq!(c1.article_id, first_article);
    assert_eq!(c1.author, bob.actor().unwrap().clone());
    let listed = comments.comments_for(first_article).unwrap();
    assert_eq!(
        listed.iter().map(|comment| comment.id).collect::<Vec<_>>(),
        vec![c1.id, c2.id]
    );
    assert_eq!(comments.get_comment(c2.id).unwrap(), c2);
}

#[test]
fn comment_requires_existing_article_and_non_blank_content() {
    let mut conn = open_db_in_memory().unwrap();
    let alice = register(&conn, "alice");
    let article = create_article(&mut conn, &alice, "first");
    let mut comments = CommentService::new(SqliteCommentRepository::try_new(&mut conn).unwrap());

    let err = comments
        .create_comment(&alice, 9_999, &NewComment::new("orphan"))
        .unwrap_err();
    assert!(matches!(
        err,
        ContentError::NotFound {
            kind: RecordKind::Article,
            id: 9_999
        }
    ));

    let err = comments
        .create_comment(&alice, article, &NewComment::new("  "))
        .unwrap_err();
    assert!(matches!(err, ContentError::Validation(ref detail) if detail.field == "content"));

    assert!(matches!(
        comments.comments_for(9_999),
        Err(ContentError::NotFound { .. })
    ));
    assert!(comments.comments_for(article).unwrap().is_empty());
}

#[test]
fn anonymous_cannot_comment() {
    let mut conn = open_db_in_memory().unwrap();
    let alice = register(&conn, "alice");
    let article = create_article(&mut conn, &alice, "first");
    let mut comments = CommentService::new(SqliteCommentRepository::try_new(&mut conn).unwrap());

    let err = comments
        .create_comment(&Identity::Anonymous, article, &NewComment::new("hi"))
        .unwrap_err();
    match err {
        ContentError::Forbidden(denied) => {
            assert_eq!(denied.action, Action::Create);
            assert_eq!(denied.reason, DenyReason::Unauthenticated);
        }
        other => panic!("expected forbidden, got {other}"),
    }
}

#[test]
fn only_comment_author_may_delete_it() {
    let mut conn = open_db_in_memory().unwrap();
    let x = register(&conn, "x");
    let y = register(&conn, "y");
    let article = create_article(&mut conn, &y, "y's article");
    let mut comments = CommentService::new(SqliteCommentRepository::try_new(&mut conn).unwrap());
    let comment = comments
        .create_comment(&x, article, &NewComment::new("by x"))
        .unwrap();

    // Owning the article does not grant comment deletion.
    let err = comments.delete_comment(&y, comment.id).unwrap_err();
    match err {
        ContentError::Forbidden(denied) => assert_eq!(denied.reason, DenyReason::NotOwner),
        other => panic!("expected forbidden, got {other}"),
    }
    assert_eq!(comments.comments_for(article).unwrap().len(), 1);

    comments.delete_comment(&x, comment.id).unwrap();
    assert!(comments.comments_for(article).unwrap().is_empty());
    assert!(matches!(
        comments.get_comment(comment.id),
        Err(ContentError::NotFound {
            kind: RecordKind::Comment,
            ..
        })
    ));
    assert!(matches!(
        comments.delete_comment(&x, comment.id),
        Err(ContentError::NotFound { .. })
    ));
}

#[test]
fn deleting_article_cascades_to_its_comments() {
    let mut conn = open_db_in_memory().unwrap();
    let author = register(&conn, "author");
    let reader = register(&conn, "reader");
    let doomed = create_article(&mut conn, &author, "doomed");
    let survivor = create_article(&mut conn, &author, "survivor");

    let (doomed_ids, survivor_id) = {
        let mut comments =
            CommentService::new(SqliteCommentRepository::try_new(&mut conn).unwrap());
        let a = comments
            .create_comment(&reader, doomed, &NewComment::new("one"))
            .unwrap();
        let b = comments
            .create_comment(&author, doomed, &NewComment::new("two"))
            .unwrap();
        let c = comments
            .create_comment(&reader, survivor, &NewComment::new("kept"))
            .unwrap();
        (vec![a.id, b.id], c.id)
    };

    {
        let mut articles =
            ArticleService::new(SqliteArticleRepository::try_new(&mut conn).unwrap());
        articles.delete_article(&author, doomed).unwrap();
    }

    let comments = CommentService::new(SqliteCommentRepository::try_new(&mut conn).unwrap());
    for id in doomed_ids {
        assert!(matches!(
            comments.get_comment(id),
            Err(ContentError::NotFound { .. })
        ));
    }
    assert!(comments.get_comment(survivor_id).is_ok());
}
