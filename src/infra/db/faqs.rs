use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{FaqsRepo, RepoError, UpdateFaqParams};
use crate::domain::entities::FaqRecord;

use super::{
    PostgresRepositories, map_sqlx_error,
    util::{localized_text, nullable},
};

const FAQ_COLUMNS: &str = "id, question_lo, question_th, question_zh, question_en, \
    answer_lo, answer_th, answer_zh, answer_en, category_id, sort_order, is_active, updated_at";

#[derive(sqlx::FromRow)]
struct FaqRow {
    id: Uuid,
    question_lo: String,
    question_th: Option<String>,
    question_zh: Option<String>,
    question_en: Option<String>,
    answer_lo: String,
    answer_th: Option<String>,
    answer_zh: Option<String>,
    answer_en: Option<String>,
    category_id: Option<Uuid>,
    sort_order: i32,
    is_active: bool,
    updated_at: OffsetDateTime,
}

impl From<FaqRow> for FaqRecord {
    fn from(row: FaqRow) -> Self {
        Self {
            id: row.id,
            question: localized_text(
                row.question_lo,
                row.question_th,
                row.question_zh,
                row.question_en,
            ),
            answer: localized_text(row.answer_lo, row.answer_th, row.answer_zh, row.answer_en),
            category_id: row.category_id,
            order: row.sort_order,
            is_active: row.is_active,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl FaqsRepo for PostgresRepositories {
    async fn list_active_faqs(&self) -> Result<Vec<FaqRecord>, RepoError> {
        let sql = format!(
            "SELECT {FAQ_COLUMNS} FROM faqs WHERE is_active ORDER BY sort_order ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, FaqRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(FaqRecord::from).collect())
    }

    async fn update_faq(&self, params: UpdateFaqParams) -> Result<FaqRecord, RepoError> {
        let sql = format!(
            "UPDATE faqs SET
                question_lo = $2, question_th = $3, question_zh = $4, question_en = $5,
                answer_lo = $6, answer_th = $7, answer_zh = $8, answer_en = $9,
                category_id = $10, sort_order = $11, is_active = $12, updated_at = $13
             WHERE id = $1
             RETURNING {FAQ_COLUMNS}"
        );
        let row = sqlx::query_as::<_, FaqRow>(&sql)
            .bind(params.id)
            .bind(&params.question.lo)
            .bind(nullable(&params.question.th))
            .bind(nullable(&params.question.zh))
            .bind(nullable(&params.question.en))
            .bind(&params.answer.lo)
            .bind(nullable(&params.answer.th))
            .bind(nullable(&params.answer.zh))
            .bind(nullable(&params.answer.en))
            .bind(params.category_id)
            .bind(params.order)
            .bind(params.is_active)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        Ok(row.into())
    }

    async fn delete_faq(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM faqs WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}
