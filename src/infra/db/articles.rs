use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::repos::{ArticlesRepo, CreateArticleParams, ListFilter, RepoError};
use crate::domain::entities::ArticleRecord;

use super::{
    PostgresRepositories, map_sqlx_error,
    util::{convert_count, localized_text, nullable},
};

const ARTICLE_COLUMNS: &str = "id, slug, \
    title_lo, title_th, title_zh, title_en, \
    content_lo, content_th, content_zh, content_en, \
    excerpt_lo, excerpt_th, excerpt_zh, excerpt_en, \
    meta_title_lo, meta_title_th, meta_title_zh, meta_title_en, \
    meta_desc_lo, meta_desc_th, meta_desc_zh, meta_desc_en, \
    featured_image, is_published, is_featured, published_at, created_by, \
    created_at, updated_at";

const FILTER_CLAUSE: &str = "($1 = FALSE OR is_published) AND ($2 = FALSE OR is_featured)";

#[derive(sqlx::FromRow)]
struct ArticleRow {
    id: Uuid,
    slug: String,
    title_lo: String,
    title_th: Option<String>,
    title_zh: Option<String>,
    title_en: Option<String>,
    content_lo: String,
    content_th: Option<String>,
    content_zh: Option<String>,
    content_en: Option<String>,
    excerpt_lo: String,
    excerpt_th: Option<String>,
    excerpt_zh: Option<String>,
    excerpt_en: Option<String>,
    meta_title_lo: String,
    meta_title_th: Option<String>,
    meta_title_zh: Option<String>,
    meta_title_en: Option<String>,
    meta_desc_lo: String,
    meta_desc_th: Option<String>,
    meta_desc_zh: Option<String>,
    meta_desc_en: Option<String>,
    featured_image: Option<String>,
    is_published: bool,
    is_featured: bool,
    published_at: Option<OffsetDateTime>,
    created_by: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<ArticleRow> for ArticleRecord {
    fn from(row: ArticleRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            title: localized_text(row.title_lo, row.title_th, row.title_zh, row.title_en),
            content: localized_text(row.content_lo, row.content_th, row.content_zh, row.content_en),
            excerpt: localized_text(row.excerpt_lo, row.excerpt_th, row.excerpt_zh, row.excerpt_en),
            meta_title: localized_text(
                row.meta_title_lo,
                row.meta_title_th,
                row.meta_title_zh,
                row.meta_title_en,
            ),
            meta_desc: localized_text(
                row.meta_desc_lo,
                row.meta_desc_th,
                row.meta_desc_zh,
                row.meta_desc_en,
            ),
            featured_image: row.featured_image,
            is_published: row.is_published,
            is_featured: row.is_featured,
            published_at: row.published_at,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ArticlesRepo for PostgresRepositories {
    async fn list_articles(
        &self,
        filter: ListFilter,
        page: PageRequest,
    ) -> Result<Vec<ArticleRecord>, RepoError> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles
             WHERE {FILTER_CLAUSE}
             ORDER BY published_at DESC NULLS LAST, created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(filter.published_only)
            .bind(filter.featured_only)
            .bind(i64::from(page.limit()))
            .bind(page.offset() as i64)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ArticleRecord::from).collect())
    }

    async fn count_articles(&self, filter: ListFilter) -> Result<u64, RepoError> {
        let sql = format!("SELECT COUNT(*) FROM articles WHERE {FILTER_CLAUSE}");
        let total: i64 = sqlx::query_scalar(&sql)
            .bind(filter.published_only)
            .bind(filter.featured_only)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(total)
    }

    async fn find_article_by_slug(&self, slug: &str) -> Result<Option<ArticleRecord>, RepoError> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE slug = $1");
        let row = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(ArticleRecord::from))
    }

    async fn create_article(
        &self,
        params: CreateArticleParams,
    ) -> Result<ArticleRecord, RepoError> {
        let sql = format!(
            "INSERT INTO articles (
                id, slug,
                title_lo, title_th, title_zh, title_en,
                content_lo, content_th, content_zh, content_en,
                excerpt_lo, excerpt_th, excerpt_zh, excerpt_en,
                meta_title_lo, meta_title_th, meta_title_zh, meta_title_en,
                meta_desc_lo, meta_desc_th, meta_desc_zh, meta_desc_en,
                featured_image, is_published, is_featured, published_at, created_by,
                created_at, updated_at
             )
             VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $28
             )
             RETURNING {ARTICLE_COLUMNS}"
        );

        let mut query = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&params.slug);
        for text in [
            &params.title,
            &params.content,
            &params.excerpt,
            &params.meta_title,
            &params.meta_desc,
        ] {
            query = query
                .bind(&text.lo)
                .bind(nullable(&text.th))
                .bind(nullable(&text.zh))
                .bind(nullable(&text.en));
        }

        let row = query
            .bind(&params.featured_image)
            .bind(params.is_published)
            .bind(params.is_featured)
            .bind(params.published_at)
            .bind(&params.created_by)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}
