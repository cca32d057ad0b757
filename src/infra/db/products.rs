use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::repos::{
    ListFilter, ProductsRepo, RepoError, UpdateProductPublicationParams,
};
use crate::domain::entities::ProductRecord;

use super::{
    PostgresRepositories, map_sqlx_error,
    util::{convert_count, localized_list, localized_text},
};

const PRODUCT_COLUMNS: &str = "id, slug, \
    name_lo, name_th, name_zh, name_en, \
    description_lo, description_th, description_zh, description_en, \
    meta_title_lo, meta_title_th, meta_title_zh, meta_title_en, \
    meta_desc_lo, meta_desc_th, meta_desc_zh, meta_desc_en, \
    benefits_lo, benefits_th, benefits_zh, benefits_en, \
    how_to_use_lo, how_to_use_th, how_to_use_zh, how_to_use_en, \
    price, currency, sku, category_id, is_published, is_featured, sort_order, \
    created_at, updated_at";

const FILTER_CLAUSE: &str = "($1 = FALSE OR is_published) AND ($2 = FALSE OR is_featured)";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    slug: String,
    name_lo: String,
    name_th: Option<String>,
    name_zh: Option<String>,
    name_en: Option<String>,
    description_lo: String,
    description_th: Option<String>,
    description_zh: Option<String>,
    description_en: Option<String>,
    meta_title_lo: String,
    meta_title_th: Option<String>,
    meta_title_zh: Option<String>,
    meta_title_en: Option<String>,
    meta_desc_lo: String,
    meta_desc_th: Option<String>,
    meta_desc_zh: Option<String>,
    meta_desc_en: Option<String>,
    benefits_lo: Vec<String>,
    benefits_th: Option<Vec<String>>,
    benefits_zh: Option<Vec<String>>,
    benefits_en: Option<Vec<String>>,
    how_to_use_lo: Vec<String>,
    how_to_use_th: Option<Vec<String>>,
    how_to_use_zh: Option<Vec<String>>,
    how_to_use_en: Option<Vec<String>>,
    price: i64,
    currency: String,
    sku: Option<String>,
    category_id: Option<Uuid>,
    is_published: bool,
    is_featured: bool,
    sort_order: i32,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<ProductRow> for ProductRecord {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            name: localized_text(row.name_lo, row.name_th, row.name_zh, row.name_en),
            description: localized_text(
                row.description_lo,
                row.description_th,
                row.description_zh,
                row.description_en,
            ),
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
            benefits: localized_list(
                row.benefits_lo,
                row.benefits_th,
                row.benefits_zh,
                row.benefits_en,
            ),
            how_to_use: localized_list(
                row.how_to_use_lo,
                row.how_to_use_th,
                row.how_to_use_zh,
                row.how_to_use_en,
            ),
            price: row.price,
            currency: row.currency,
            sku: row.sku,
            category_id: row.category_id,
            is_published: row.is_published,
            is_featured: row.is_featured,
            order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ProductsRepo for PostgresRepositories {
    async fn list_products(
        &self,
        filter: ListFilter,
        page: PageRequest,
    ) -> Result<Vec<ProductRecord>, RepoError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE {FILTER_CLAUSE}
             ORDER BY sort_order ASC, created_at DESC, id ASC
             LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(filter.published_only)
            .bind(filter.featured_only)
            .bind(i64::from(page.limit()))
            .bind(page.offset() as i64)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ProductRecord::from).collect())
    }

    async fn count_products(&self, filter: ListFilter) -> Result<u64, RepoError> {
        let sql = format!("SELECT COUNT(*) FROM products WHERE {FILTER_CLAUSE}");
        let total: i64 = sqlx::query_scalar(&sql)
            .bind(filter.published_only)
            .bind(filter.featured_only)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(total)
    }

    async fn find_product_by_slug(&self, slug: &str) -> Result<Option<ProductRecord>, RepoError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(ProductRecord::from))
    }

    async fn update_publication(
        &self,
        params: UpdateProductPublicationParams,
    ) -> Result<ProductRecord, RepoError> {
        let sql = format!(
            "UPDATE products SET
                is_published = COALESCE($2, is_published),
                is_featured = COALESCE($3, is_featured),
                updated_at = $4
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(params.id)
            .bind(params.is_published)
            .bind(params.is_featured)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        Ok(row.into())
    }
}
