use async_trait::async_trait;
use sqlx::types::Json;
use time::OffsetDateTime;

use crate::{
    application::repos::{RepoError, SettingsRepo},
    domain::{entities::SiteSettingsRecord, locale::LocalizedText},
};

use super::{PostgresRepositories, map_sqlx_error};

const SELECT_SETTINGS: &str = r#"
    SELECT site_name, hero_welcome, hero_title, hero_subtitle, address,
           whatsapp_message, default_meta_desc, maintenance_message,
           home_bg, products_bg, articles_bg, hero_design_image,
           email, phone, whatsapp, facebook_page, line_id,
           is_under_maintenance, updated_at
    FROM site_settings
    WHERE id = 'site_settings'
"#;

const UPSERT_SETTINGS: &str = r#"
    INSERT INTO site_settings (
        id, site_name, hero_welcome, hero_title, hero_subtitle, address,
        whatsapp_message, default_meta_desc, maintenance_message,
        home_bg, products_bg, articles_bg, hero_design_image,
        email, phone, whatsapp, facebook_page, line_id,
        is_under_maintenance, updated_at
    )
    VALUES (
        'site_settings', $1, $2, $3, $4, $5, $6, $7, $8,
        $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19
    )
    ON CONFLICT (id) DO UPDATE SET
        site_name = EXCLUDED.site_name,
        hero_welcome = EXCLUDED.hero_welcome,
        hero_title = EXCLUDED.hero_title,
        hero_subtitle = EXCLUDED.hero_subtitle,
        address = EXCLUDED.address,
        whatsapp_message = EXCLUDED.whatsapp_message,
        default_meta_desc = EXCLUDED.default_meta_desc,
        maintenance_message = EXCLUDED.maintenance_message,
        home_bg = EXCLUDED.home_bg,
        products_bg = EXCLUDED.products_bg,
        articles_bg = EXCLUDED.articles_bg,
        hero_design_image = EXCLUDED.hero_design_image,
        email = EXCLUDED.email,
        phone = EXCLUDED.phone,
        whatsapp = EXCLUDED.whatsapp,
        facebook_page = EXCLUDED.facebook_page,
        line_id = EXCLUDED.line_id,
        is_under_maintenance = EXCLUDED.is_under_maintenance,
        updated_at = EXCLUDED.updated_at
    RETURNING site_name, hero_welcome, hero_title, hero_subtitle, address,
              whatsapp_message, default_meta_desc, maintenance_message,
              home_bg, products_bg, articles_bg, hero_design_image,
              email, phone, whatsapp, facebook_page, line_id,
              is_under_maintenance, updated_at
"#;

/// Localized settings fields live in JSONB columns keyed by locale code.
#[derive(sqlx::FromRow)]
struct SiteSettingsRow {
    site_name: Json<LocalizedText>,
    hero_welcome: Json<LocalizedText>,
    hero_title: Json<LocalizedText>,
    hero_subtitle: Json<LocalizedText>,
    address: Json<LocalizedText>,
    whatsapp_message: Json<LocalizedText>,
    default_meta_desc: Json<LocalizedText>,
    maintenance_message: Json<LocalizedText>,
    home_bg: String,
    products_bg: String,
    articles_bg: String,
    hero_design_image: String,
    email: String,
    phone: String,
    whatsapp: String,
    facebook_page: String,
    line_id: String,
    is_under_maintenance: bool,
    updated_at: OffsetDateTime,
}

impl From<SiteSettingsRow> for SiteSettingsRecord {
    fn from(row: SiteSettingsRow) -> Self {
        Self {
            site_name: row.site_name.0,
            hero_welcome: row.hero_welcome.0,
            hero_title: row.hero_title.0,
            hero_subtitle: row.hero_subtitle.0,
            address: row.address.0,
            whatsapp_message: row.whatsapp_message.0,
            default_meta_desc: row.default_meta_desc.0,
            maintenance_message: row.maintenance_message.0,
            home_bg: row.home_bg,
            products_bg: row.products_bg,
            articles_bg: row.articles_bg,
            hero_design_image: row.hero_design_image,
            email: row.email,
            phone: row.phone,
            whatsapp: row.whatsapp,
            facebook_page: row.facebook_page,
            line_id: row.line_id,
            is_under_maintenance: row.is_under_maintenance,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl SettingsRepo for PostgresRepositories {
    async fn load_site_settings(&self) -> Result<Option<SiteSettingsRecord>, RepoError> {
        let row = sqlx::query_as::<_, SiteSettingsRow>(SELECT_SETTINGS)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(SiteSettingsRecord::from))
    }

    async fn upsert_site_settings(
        &self,
        settings: SiteSettingsRecord,
    ) -> Result<SiteSettingsRecord, RepoError> {
        let row = sqlx::query_as::<_, SiteSettingsRow>(UPSERT_SETTINGS)
            .bind(Json(&settings.site_name))
            .bind(Json(&settings.hero_welcome))
            .bind(Json(&settings.hero_title))
            .bind(Json(&settings.hero_subtitle))
            .bind(Json(&settings.address))
            .bind(Json(&settings.whatsapp_message))
            .bind(Json(&settings.default_meta_desc))
            .bind(Json(&settings.maintenance_message))
            .bind(&settings.home_bg)
            .bind(&settings.products_bg)
            .bind(&settings.articles_bg)
            .bind(&settings.hero_design_image)
            .bind(&settings.email)
            .bind(&settings.phone)
            .bind(&settings.whatsapp)
            .bind(&settings.facebook_page)
            .bind(&settings.line_id)
            .bind(settings.is_under_maintenance)
            .bind(settings.updated_at)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}
