use async_trait::async_trait;
use sqlx::{Postgres, Transaction, types::Json};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{AboutRepo, RepoError, SaveAboutPageParams, SaveAboutValueParams},
    domain::{
        entities::{AboutPageRecord, AboutValueRecord},
        locale::LocalizedText,
    },
};

use super::{
    PostgresRepositories, map_sqlx_error,
    util::{localized_text, nullable},
};

const PAGE_COLUMNS: &str = "title, story_title, story_paragraph1, story_paragraph2, \
    founder_name, founder_quote, background_image, founder_image, updated_at";

const VALUE_COLUMNS: &str = "id, icon, title_lo, title_th, title_zh, title_en, \
    description_lo, description_th, description_zh, description_en, sort_order";

#[derive(sqlx::FromRow)]
struct AboutPageRow {
    title: Json<LocalizedText>,
    story_title: Json<LocalizedText>,
    story_paragraph1: Json<LocalizedText>,
    story_paragraph2: Json<LocalizedText>,
    founder_name: Json<LocalizedText>,
    founder_quote: Json<LocalizedText>,
    background_image: String,
    founder_image: String,
    updated_at: OffsetDateTime,
}

impl AboutPageRow {
    fn into_record(self, values: Vec<AboutValueRecord>) -> AboutPageRecord {
        AboutPageRecord {
            title: self.title.0,
            story_title: self.story_title.0,
            story_paragraph1: self.story_paragraph1.0,
            story_paragraph2: self.story_paragraph2.0,
            founder_name: self.founder_name.0,
            founder_quote: self.founder_quote.0,
            background_image: self.background_image,
            founder_image: self.founder_image,
            values,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AboutValueRow {
    id: Uuid,
    icon: String,
    title_lo: String,
    title_th: Option<String>,
    title_zh: Option<String>,
    title_en: Option<String>,
    description_lo: String,
    description_th: Option<String>,
    description_zh: Option<String>,
    description_en: Option<String>,
    sort_order: i32,
}

impl From<AboutValueRow> for AboutValueRecord {
    fn from(row: AboutValueRow) -> Self {
        Self {
            id: row.id,
            icon: row.icon,
            title: localized_text(row.title_lo, row.title_th, row.title_zh, row.title_en),
            description: localized_text(
                row.description_lo,
                row.description_th,
                row.description_zh,
                row.description_en,
            ),
            order: row.sort_order,
        }
    }
}

async fn upsert_value(
    tx: &mut Transaction<'_, Postgres>,
    value: &SaveAboutValueParams,
) -> Result<(), RepoError> {
    sqlx::query(
        r#"
        INSERT INTO about_values (
            id, about_page_id, icon,
            title_lo, title_th, title_zh, title_en,
            description_lo, description_th, description_zh, description_en,
            sort_order
        )
        VALUES ($1, 'about_page', $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (id) DO UPDATE SET
            icon = EXCLUDED.icon,
            title_lo = EXCLUDED.title_lo,
            title_th = EXCLUDED.title_th,
            title_zh = EXCLUDED.title_zh,
            title_en = EXCLUDED.title_en,
            description_lo = EXCLUDED.description_lo,
            description_th = EXCLUDED.description_th,
            description_zh = EXCLUDED.description_zh,
            description_en = EXCLUDED.description_en,
            sort_order = EXCLUDED.sort_order
        "#,
    )
    .bind(value.id)
    .bind(&value.icon)
    .bind(&value.title.lo)
    .bind(nullable(&value.title.th))
    .bind(nullable(&value.title.zh))
    .bind(nullable(&value.title.en))
    .bind(&value.description.lo)
    .bind(nullable(&value.description.th))
    .bind(nullable(&value.description.zh))
    .bind(nullable(&value.description.en))
    .bind(value.order)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx_error)?;
    Ok(())
}

#[async_trait]
impl AboutRepo for PostgresRepositories {
    async fn load_about_page(&self) -> Result<Option<AboutPageRecord>, RepoError> {
        let sql = format!("SELECT {PAGE_COLUMNS} FROM about_page WHERE id = 'about_page'");
        let Some(page) = sqlx::query_as::<_, AboutPageRow>(&sql)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
        else {
            return Ok(None);
        };

        let sql = format!(
            "SELECT {VALUE_COLUMNS} FROM about_values \
             WHERE about_page_id = 'about_page' ORDER BY sort_order ASC, id ASC"
        );
        let values = sqlx::query_as::<_, AboutValueRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(Some(page.into_record(
            values.into_iter().map(AboutValueRecord::from).collect(),
        )))
    }

    async fn save_about_page(
        &self,
        params: SaveAboutPageParams,
    ) -> Result<AboutPageRecord, RepoError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let sql = format!(
            "INSERT INTO about_page (
                id, title, story_title, story_paragraph1, story_paragraph2,
                founder_name, founder_quote, background_image, founder_image, updated_at
             )
             VALUES ('about_page', $1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                story_title = EXCLUDED.story_title,
                story_paragraph1 = EXCLUDED.story_paragraph1,
                story_paragraph2 = EXCLUDED.story_paragraph2,
                founder_name = EXCLUDED.founder_name,
                founder_quote = EXCLUDED.founder_quote,
                background_image = EXCLUDED.background_image,
                founder_image = EXCLUDED.founder_image,
                updated_at = EXCLUDED.updated_at
             RETURNING {PAGE_COLUMNS}"
        );
        let page = sqlx::query_as::<_, AboutPageRow>(&sql)
            .bind(Json(&params.title))
            .bind(Json(&params.story_title))
            .bind(Json(&params.story_paragraph1))
            .bind(Json(&params.story_paragraph2))
            .bind(Json(&params.founder_name))
            .bind(Json(&params.founder_quote))
            .bind(&params.background_image)
            .bind(&params.founder_image)
            .bind(params.updated_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if let Some(values) = params.values.as_deref() {
            let keep: Vec<Uuid> = values.iter().map(|value| value.id).collect();
            sqlx::query(
                "DELETE FROM about_values WHERE about_page_id = 'about_page' AND NOT (id = ANY($1))",
            )
            .bind(&keep)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

            for value in values {
                upsert_value(&mut tx, value).await?;
            }
        }

        let sql = format!(
            "SELECT {VALUE_COLUMNS} FROM about_values \
             WHERE about_page_id = 'about_page' ORDER BY sort_order ASC, id ASC"
        );
        let stored = sqlx::query_as::<_, AboutValueRow>(&sql)
            .fetch_all(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(page.into_record(stored.into_iter().map(AboutValueRecord::from).collect()))
    }
}
