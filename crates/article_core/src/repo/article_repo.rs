//! Article repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the CRUD contract over canonical `articles` storage.
//! - Enforce title uniqueness and field defaults at the persistence boundary.
//!
//! # Invariants
//! - Every write runs in one `IMMEDIATE` transaction: the uniqueness check
//!   and the mutation are never interleaved with another writer.
//! - `updated_at` strictly increases on every successful update.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::article::{
    Article, ArticleId, ArticlePatch, ArticleValidationError, NewArticle,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ARTICLE_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    body,
    published,
    created_at,
    updated_at
FROM articles";

const REQUIRED_COLUMNS: &[&str] = &[
    "id",
    "title",
    "description",
    "body",
    "published",
    "created_at",
    "updated_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for article persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ArticleValidationError),
    Db(DbError),
    NotFound(ArticleId),
    /// Another article already owns this title.
    Conflict {
        title: String,
    },
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "article not found: {id}"),
            Self::Conflict { title } => write!(f, "article title already exists: `{title}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted article data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ArticleValidationError> for RepoError {
    fn from(value: ArticleValidationError) -> Self {
        Self::Validation(value)
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

/// Result of an upsert keyed by title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// A row with the same title already existed and was left untouched.
    Unchanged,
}

/// Repository interface for article CRUD operations.
pub trait ArticleRepository {
    /// Inserts one article. Fails with `Conflict` on a duplicate title.
    fn create_article(&mut self, input: &NewArticle) -> RepoResult<Article>;
    /// Lists articles whose `published` flag equals `published`, by id.
    fn list_articles(&self, published: bool) -> RepoResult<Vec<Article>>;
    fn get_article(&self, id: ArticleId) -> RepoResult<Option<Article>>;
    fn find_by_title(&self, title: &str) -> RepoResult<Option<Article>>;
    /// Applies only the supplied patch fields and refreshes `updated_at`.
    fn update_article(&mut self, id: ArticleId, patch: &ArticlePatch) -> RepoResult<Article>;
    /// Hard-deletes one article and returns the removed row.
    fn delete_article(&mut self, id: ArticleId) -> RepoResult<Article>;
    /// Inserts `input` unless its title already exists.
    fn upsert_by_title(&mut self, input: &NewArticle) -> RepoResult<(Article, UpsertOutcome)>;
}

/// SQLite-backed article repository.
pub struct SqliteArticleRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteArticleRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema
    ///   was tampered with.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn begin(&mut self) -> RepoResult<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}

impl ArticleRepository for SqliteArticleRepository<'_> {
    fn create_article(&mut self, input: &NewArticle) -> RepoResult<Article> {
        input.validate()?;

        let tx = self.begin()?;
        if title_owner_in_tx(&tx, &input.title)?.is_some() {
            return Err(RepoError::Conflict {
                title: input.title.clone(),
            });
        }
        let article = insert_in_tx(&tx, input)?;
        tx.commit()?;

        Ok(article)
    }

    fn list_articles(&self, published: bool) -> RepoResult<Vec<Article>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ARTICLE_SELECT_SQL}
             WHERE published = ?1
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([bool_to_int(published)])?;
        let mut articles = Vec::new();

        while let Some(row) = rows.next()? {
            articles.push(parse_article_row(row)?);
        }

        Ok(articles)
    }

    fn get_article(&self, id: ArticleId) -> RepoResult<Option<Article>> {
        load_article(self.conn, id)
    }

    fn find_by_title(&self, title: &str) -> RepoResult<Option<Article>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ARTICLE_SELECT_SQL} WHERE title = ?1;"))?;
        let mut rows = stmt.query([title])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_article_row(row)?));
        }

        Ok(None)
    }

    fn update_article(&mut self, id: ArticleId, patch: &ArticlePatch) -> RepoResult<Article> {
        patch.validate()?;

        let tx = self.begin()?;
        let mut article = load_article(&tx, id)?.ok_or(RepoError::NotFound(id))?;

        if let Some(title) = patch.title.as_deref() {
            if matches!(title_owner_in_tx(&tx, title)?, Some(owner) if owner != id) {
                return Err(RepoError::Conflict {
                    title: title.to_string(),
                });
            }
        }

        patch.apply_to(&mut article);
        article.updated_at = next_updated_at(article.updated_at, now_ms());

        tx.execute(
            "UPDATE articles
             SET
                title = ?1,
                description = ?2,
                body = ?3,
                published = ?4,
                updated_at = ?5
             WHERE id = ?6;",
            params![
                article.title.as_str(),
                article.description.as_deref(),
                article.body.as_str(),
                bool_to_int(article.published),
                article.updated_at,
                id,
            ],
        )
        .map_err(|err| map_unique_violation(err, &article.title))?;
        tx.commit()?;

        Ok(article)
    }

    fn delete_article(&mut self, id: ArticleId) -> RepoResult<Article> {
        let tx = self.begin()?;
        let article = load_article(&tx, id)?.ok_or(RepoError::NotFound(id))?;
        tx.execute("DELETE FROM articles WHERE id = ?1;", [id])?;
        tx.commit()?;

        Ok(article)
    }

    fn upsert_by_title(&mut self, input: &NewArticle) -> RepoResult<(Article, UpsertOutcome)> {
        input.validate()?;

        let tx = self.begin()?;
        if let Some(owner) = title_owner_in_tx(&tx, &input.title)? {
            let existing = load_article(&tx, owner)?.ok_or(RepoError::NotFound(owner))?;
            tx.commit()?;
            return Ok((existing, UpsertOutcome::Unchanged));
        }
        let article = insert_in_tx(&tx, input)?;
        tx.commit()?;

        Ok((article, UpsertOutcome::Inserted))
    }
}

fn insert_in_tx(tx: &Transaction<'_>, input: &NewArticle) -> RepoResult<Article> {
    let now = now_ms();
    let published = input.published.unwrap_or(false);

    tx.execute(
        "INSERT INTO articles (
            title,
            description,
            body,
            published,
            created_at,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?5);",
        params![
            input.title.as_str(),
            input.description.as_deref(),
            input.body.as_str(),
            bool_to_int(published),
            now,
        ],
    )
    .map_err(|err| map_unique_violation(err, &input.title))?;

    Ok(Article {
        id: tx.last_insert_rowid(),
        title: input.title.clone(),
        description: input.description.clone(),
        body: input.body.clone(),
        published,
        created_at: now,
        updated_at: now,
    })
}

fn load_article(conn: &Connection, id: ArticleId) -> RepoResult<Option<Article>> {
    let mut stmt = conn.prepare(&format!("{ARTICLE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_article_row(row)?));
    }

    Ok(None)
}

fn title_owner_in_tx(tx: &Transaction<'_>, title: &str) -> RepoResult<Option<ArticleId>> {
    let owner = tx
        .query_row(
            "SELECT id FROM articles WHERE title = ?1;",
            [title],
            |row| row.get::<_, ArticleId>(0),
        )
        .optional()?;
    Ok(owner)
}

fn parse_article_row(row: &Row<'_>) -> RepoResult<Article> {
    let id: ArticleId = row.get("id")?;
    let published = match row.get::<_, i64>("published")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid published value `{other}` in articles.published for id {id}"
            )));
        }
    };

    let created_at: i64 = row.get("created_at")?;
    let updated_at: i64 = row.get("updated_at")?;
    if updated_at < created_at {
        return Err(RepoError::InvalidData(format!(
            "articles.updated_at precedes created_at for id {id}"
        )));
    }

    Ok(Article {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        body: row.get("body")?,
        published,
        created_at,
        updated_at,
    })
}

// The UNIQUE index backs up the in-transaction title check.
fn map_unique_violation(err: rusqlite::Error, title: &str) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepoError::Conflict {
                title: title.to_string(),
            }
        }
        _ => err.into(),
    }
}

/// Returns the timestamp to store on update: wall clock, but always past
/// the previous `updated_at`.
fn next_updated_at(previous: i64, now: i64) -> i64 {
    now.max(previous.saturating_add(1))
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "articles")? {
        return Err(RepoError::MissingRequiredTable("articles"));
    }

    for &column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "articles", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "articles",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
