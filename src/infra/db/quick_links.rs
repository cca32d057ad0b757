use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreateQuickLinkParams, QuickLinksRepo, RepoError, UpdateQuickLinkParams,
};
use crate::domain::{entities::QuickLinkRecord, types::QuickLinkType};

use super::{
    PostgresRepositories, map_sqlx_error,
    util::{localized_text, nullable},
};

const LINK_COLUMNS: &str = "id, link_type, label_lo, label_th, label_zh, label_en, url, icon, \
                            color, sort_order, is_active, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct QuickLinkRow {
    id: Uuid,
    link_type: QuickLinkType,
    label_lo: String,
    label_th: Option<String>,
    label_zh: Option<String>,
    label_en: Option<String>,
    url: String,
    icon: Option<String>,
    color: Option<String>,
    sort_order: i32,
    is_active: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<QuickLinkRow> for QuickLinkRecord {
    fn from(row: QuickLinkRow) -> Self {
        Self {
            id: row.id,
            link_type: row.link_type,
            label: localized_text(row.label_lo, row.label_th, row.label_zh, row.label_en),
            url: row.url,
            icon: row.icon,
            color: row.color,
            order: row.sort_order,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl PostgresRepositories {
    async fn select_links(&self, active_only: bool) -> Result<Vec<QuickLinkRecord>, RepoError> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM quick_links
             WHERE ($1 = FALSE OR is_active)
             ORDER BY sort_order ASC, created_at ASC"
        );
        let rows = sqlx::query_as::<_, QuickLinkRow>(&sql)
            .bind(active_only)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(QuickLinkRecord::from).collect())
    }
}

#[async_trait]
impl QuickLinksRepo for PostgresRepositories {
    async fn list_active_links(&self) -> Result<Vec<QuickLinkRecord>, RepoError> {
        self.select_links(true).await
    }

    async fn list_all_links(&self) -> Result<Vec<QuickLinkRecord>, RepoError> {
        self.select_links(false).await
    }

    async fn create_link(
        &self,
        params: CreateQuickLinkParams,
    ) -> Result<QuickLinkRecord, RepoError> {
        let sql = format!(
            "INSERT INTO quick_links (
                id, link_type, label_lo, label_th, label_zh, label_en,
                url, icon, color, sort_order, is_active, created_at, updated_at
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
             RETURNING {LINK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, QuickLinkRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(params.link_type)
            .bind(&params.label.lo)
            .bind(nullable(&params.label.th))
            .bind(nullable(&params.label.zh))
            .bind(nullable(&params.label.en))
            .bind(&params.url)
            .bind(&params.icon)
            .bind(&params.color)
            .bind(params.order)
            .bind(params.is_active)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_link(
        &self,
        params: UpdateQuickLinkParams,
    ) -> Result<QuickLinkRecord, RepoError> {
        let sql = format!(
            "UPDATE quick_links SET
                link_type = $2, label_lo = $3, label_th = $4, label_zh = $5, label_en = $6,
                url = $7, icon = $8, color = $9, sort_order = $10, is_active = $11,
                updated_at = $12
             WHERE id = $1
             RETURNING {LINK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, QuickLinkRow>(&sql)
            .bind(params.id)
            .bind(params.link_type)
            .bind(&params.label.lo)
            .bind(nullable(&params.label.th))
            .bind(nullable(&params.label.zh))
            .bind(nullable(&params.label.en))
            .bind(&params.url)
            .bind(&params.icon)
            .bind(&params.color)
            .bind(params.order)
            .bind(params.is_active)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        Ok(row.into())
    }

    async fn delete_link(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM quick_links WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}
