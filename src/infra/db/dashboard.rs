use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{ActivityRecord, ContentCounts, DashboardRepo, RepoError};
use crate::domain::types::ActivityResource;

use super::{
    PostgresRepositories, map_sqlx_error,
    util::{convert_count, localized_text},
};

#[derive(sqlx::FromRow)]
struct CountsRow {
    products: i64,
    published_products: i64,
    articles: i64,
    published_articles: i64,
    faqs: i64,
    quick_links: i64,
}

#[derive(sqlx::FromRow)]
struct ActivityRow {
    resource: String,
    id: Uuid,
    title_lo: String,
    title_th: Option<String>,
    title_zh: Option<String>,
    title_en: Option<String>,
    is_published: bool,
    updated_at: OffsetDateTime,
}

impl TryFrom<ActivityRow> for ActivityRecord {
    type Error = RepoError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        let resource = match row.resource.as_str() {
            "product" => ActivityResource::Product,
            "article" => ActivityResource::Article,
            other => {
                return Err(RepoError::Integrity {
                    message: format!("unknown activity resource `{other}`"),
                });
            }
        };
        Ok(Self {
            resource,
            id: row.id,
            title: localized_text(row.title_lo, row.title_th, row.title_zh, row.title_en),
            is_published: row.is_published,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl DashboardRepo for PostgresRepositories {
    async fn content_counts(&self) -> Result<ContentCounts, RepoError> {
        let row = sqlx::query_as::<_, CountsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products) AS products,
                (SELECT COUNT(*) FROM products WHERE is_published) AS published_products,
                (SELECT COUNT(*) FROM articles) AS articles,
                (SELECT COUNT(*) FROM articles WHERE is_published) AS published_articles,
                (SELECT COUNT(*) FROM faqs) AS faqs,
                (SELECT COUNT(*) FROM quick_links) AS quick_links
            "#,
        )
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ContentCounts {
            products: convert_count(row.products)?,
            published_products: convert_count(row.published_products)?,
            articles: convert_count(row.articles)?,
            published_articles: convert_count(row.published_articles)?,
            faqs: convert_count(row.faqs)?,
            quick_links: convert_count(row.quick_links)?,
        })
    }

    async fn recent_activity(&self, limit: u32) -> Result<Vec<ActivityRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            (SELECT 'product'::text AS resource, id, name_lo AS title_lo, name_th AS title_th,
                    name_zh AS title_zh, name_en AS title_en, is_published, updated_at
             FROM products
             ORDER BY updated_at DESC
             LIMIT $1)
            UNION ALL
            (SELECT 'article'::text AS resource, id, title_lo, title_th, title_zh, title_en,
                    is_published, updated_at
             FROM articles
             ORDER BY updated_at DESC
             LIMIT $1)
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(ActivityRecord::try_from).collect()
    }
}
