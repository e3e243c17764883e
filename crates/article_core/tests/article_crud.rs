use article_core::db::migrations::latest_version;
use article_core::db::{open_db, open_db_in_memory};
use article_core::{
    ArticlePatch, ArticleRepository, NewArticle, RepoError, SqliteArticleRepository,
    UpsertOutcome,
};
use rusqlite::Connection;

#[test]
fn create_and_get_roundtrip() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteArticleRepository::try_new(&mut conn).unwrap();

    let input = NewArticle::new("Ownership", "moves and copies")
        .with_description("the basics")
        .with_published(true);
    let created = repo.create_article(&input).unwrap();

    let loaded = repo.get_article(created.id).unwrap().unwrap();
    assert_eq!(loaded.title, "Ownership");
    assert_eq!(loaded.description.as_deref(), Some("the basics"));
    assert!(loaded.published);
    assert_eq!(loaded, created);
}

#[test]
fn ids_are_not_reused_after_delete() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteArticleRepository::try_new(&mut conn).unwrap();

    let first = repo.create_article(&NewArticle::new("a", "a")).unwrap();
    repo.delete_article(first.id).unwrap();
    let second = repo.create_article(&NewArticle::new("b", "b")).unwrap();

    assert!(second.id > first.id);
}

#[test]
fn deleted_title_can_be_reused() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteArticleRepository::try_new(&mut conn).unwrap();

    let first = repo.create_article(&NewArticle::new("reused", "x")).unwrap();
    repo.delete_article(first.id).unwrap();

    let again = repo.create_article(&NewArticle::new("reused", "y")).unwrap();
    assert_eq!(repo.find_by_title("reused").unwrap(), Some(again));
}

#[test]
fn list_filters_on_published_flag_in_id_order() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteArticleRepository::try_new(&mut conn).unwrap();

    let d1 = repo.create_article(&NewArticle::new("d1", "x")).unwrap();
    let p1 = repo
        .create_article(&NewArticle::new("p1", "x").with_published(true))
        .unwrap();
    let d2 = repo.create_article(&NewArticle::new("d2", "x")).unwrap();

    let drafts: Vec<_> = repo
        .list_articles(false)
        .unwrap()
        .into_iter()
        .map(|article| article.id)
        .collect();
    assert_eq!(drafts, vec![d1.id, d2.id]);

    let published = repo.list_articles(true).unwrap();
    assert_eq!(published, vec![p1]);
}

#[test]
fn update_not_found_returns_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteArticleRepository::try_new(&mut conn).unwrap();

    let err = repo
        .update_article(77, &ArticlePatch::default())
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(77)));
}

#[test]
fn update_title_conflict_is_reported_by_repository() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteArticleRepository::try_new(&mut conn).unwrap();

    repo.create_article(&NewArticle::new("taken", "x")).unwrap();
    let other = repo.create_article(&NewArticle::new("free", "x")).unwrap();

    let patch = ArticlePatch {
        title: Some("taken".to_string()),
        ..ArticlePatch::default()
    };
    let err = repo.update_article(other.id, &patch).unwrap_err();
    assert!(matches!(err, RepoError::Conflict { ref title } if title == "taken"));
}

#[test]
fn upsert_by_title_inserts_once_then_leaves_row_untouched() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteArticleRepository::try_new(&mut conn).unwrap();

    let input = NewArticle::new("seeded", "original body");
    let (inserted, outcome) = repo.upsert_by_title(&input).unwrap();
    assert_eq!(outcome, UpsertOutcome::Inserted);

    let changed = NewArticle::new("seeded", "different body").with_published(true);
    let (existing, outcome) = repo.upsert_by_title(&changed).unwrap();
    assert_eq!(outcome, UpsertOutcome::Unchanged);
    assert_eq!(existing, inserted);
    assert_eq!(existing.body, "original body");
}

#[test]
fn validation_failure_blocks_create_and_update() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteArticleRepository::try_new(&mut conn).unwrap();

    let err = repo.create_article(&NewArticle::new("", "body")).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let created = repo.create_article(&NewArticle::new("ok", "body")).unwrap();
    let patch = ArticlePatch {
        title: Some("   ".to_string()),
        ..ArticlePatch::default()
    };
    let err = repo.update_article(created.id, &patch).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn unique_index_rejects_direct_duplicate_insert() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut repo = SqliteArticleRepository::try_new(&mut conn).unwrap();
        repo.create_article(&NewArticle::new("indexed", "x")).unwrap();
    }

    let result = conn.execute(
        "INSERT INTO articles (title, body, published, created_at, updated_at)
         VALUES ('indexed', 'y', 0, 1, 1);",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn invalid_published_value_is_rejected_on_read() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "PRAGMA ignore_check_constraints = ON;
         INSERT INTO articles (title, body, published, created_at, updated_at)
         VALUES ('corrupt', 'x', 7, 1, 1);",
    )
    .unwrap();

    let repo = SqliteArticleRepository::try_new(&mut conn).unwrap();
    let err = repo.find_by_title("corrupt").unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn writes_from_one_connection_are_visible_to_another() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.db");

    let mut writer = open_db(&path).unwrap();
    let mut reader = open_db(&path).unwrap();

    let created = {
        let mut repo = SqliteArticleRepository::try_new(&mut writer).unwrap();
        repo.create_article(&NewArticle::new("shared", "file")).unwrap()
    };

    let repo = SqliteArticleRepository::try_new(&mut reader).unwrap();
    assert_eq!(repo.get_article(created.id).unwrap(), Some(created));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let mut conn = Connection::open_in_memory().unwrap();

    let result = SqliteArticleRepository::try_new(&mut conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_articles_table() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteArticleRepository::try_new(&mut conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("articles"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE articles (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL UNIQUE,
            body TEXT NOT NULL,
            published INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteArticleRepository::try_new(&mut conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "articles",
            column: "description"
        })
    ));
}
