use anyhow::{Context, Result};
use article_core::db::migrations::{current_user_version, latest_version};
use article_core::db::open_configured;
use article_core::{
    core_version, seed_articles, ArticleId, ArticlePatch, ArticleService, NewArticle,
    SqliteArticleRepository, StoreConfig,
};
use clap::Args;
use rusqlite::Connection;
use serde_json::{json, Value};

/// Flags for `articles update`.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub id: ArticleId,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub body: Option<String>,
    #[arg(long, conflicts_with = "clear_description")]
    pub description: Option<String>,
    /// Sets `description` to null.
    #[arg(long)]
    pub clear_description: bool,
    #[arg(long, value_name = "BOOL")]
    pub published: Option<bool>,
    /// Raw JSON patch body, e.g. `{"description": null}`. Absent keys are
    /// left unchanged.
    #[arg(
        long,
        value_name = "JSON",
        conflicts_with_all = ["title", "body", "description", "clear_description", "published"]
    )]
    pub json: Option<String>,
}

impl UpdateArgs {
    fn into_patch(self) -> Result<ArticlePatch> {
        if let Some(raw) = self.json {
            return serde_json::from_str(&raw).context("invalid --json patch");
        }

        let description = if self.clear_description {
            Some(None)
        } else {
            self.description.map(Some)
        };
        Ok(ArticlePatch {
            title: self.title,
            description,
            body: self.body,
            published: self.published,
        })
    }
}

/// An opened, migrated database for one CLI invocation.
pub struct Workspace {
    conn: Connection,
}

impl Workspace {
    pub fn open(database_url: Option<&str>) -> Result<Self> {
        let config = match database_url {
            Some(url) => StoreConfig::parse(url)?,
            None => StoreConfig::from_env()
                .context("no database configured; pass --database-url or set DATABASE_URL")?,
        };
        let conn = open_configured(&config)
            .with_context(|| format!("failed to open database `{}`", config.database_url()))?;
        Ok(Self { conn })
    }

    fn service(&mut self) -> Result<ArticleService<SqliteArticleRepository<'_>>> {
        let repo = SqliteArticleRepository::try_new(&mut self.conn)?;
        Ok(ArticleService::new(repo))
    }

    pub fn create(
        &mut self,
        title: String,
        body: String,
        description: Option<String>,
        published: bool,
    ) -> Result<Value> {
        let input = NewArticle {
            title,
            body,
            description,
            published: Some(published),
        };
        let article = self.service()?.create(&input)?;
        Ok(serde_json::to_value(article)?)
    }

    pub fn list(&mut self, drafts: bool) -> Result<Value> {
        let service = self.service()?;
        let articles = if drafts {
            service.list_drafts()?
        } else {
            service.list_published()?
        };
        Ok(serde_json::to_value(articles)?)
    }

    pub fn get(&mut self, id: ArticleId) -> Result<Value> {
        let article = self.service()?.get_by_id(id)?;
        Ok(serde_json::to_value(article)?)
    }

    pub fn update(&mut self, args: UpdateArgs) -> Result<Value> {
        let id = args.id;
        let patch = args.into_patch()?;
        let article = self.service()?.update(id, &patch)?;
        Ok(serde_json::to_value(article)?)
    }

    pub fn delete(&mut self, id: ArticleId) -> Result<Value> {
        let article = self.service()?.delete(id)?;
        Ok(serde_json::to_value(article)?)
    }

    pub fn seed(&mut self) -> Result<Value> {
        let mut repo = SqliteArticleRepository::try_new(&mut self.conn)?;
        let report = seed_articles(&mut repo)?;
        Ok(serde_json::to_value(report)?)
    }

    pub fn migrate(&mut self) -> Result<Value> {
        Ok(json!({
            "schemaVersion": current_user_version(&self.conn)?,
            "latestVersion": latest_version(),
            "coreVersion": core_version(),
        }))
    }
}
