//! Singleton site settings.

use std::sync::Arc;

use serde::Deserialize;
use time::OffsetDateTime;
use tracing::info;
use url::Url;

use crate::application::caches::ContentCaches;
use crate::application::error::ContentError;
use crate::application::repos::SettingsRepo;
use crate::cache::keys;
use crate::domain::entities::SiteSettingsRecord;
use crate::domain::error::{DomainError, require_base_locale};
use crate::domain::locale::LocalizedText;

/// Full replacement of the editable settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateSettingsCommand {
    pub site_name: LocalizedText,
    pub hero_welcome: LocalizedText,
    pub hero_title: LocalizedText,
    pub hero_subtitle: LocalizedText,
    pub address: LocalizedText,
    pub whatsapp_message: LocalizedText,
    pub default_meta_desc: LocalizedText,
    pub maintenance_message: LocalizedText,
    pub home_bg: String,
    pub products_bg: String,
    pub articles_bg: String,
    pub hero_design_image: String,
    pub email: String,
    pub phone: String,
    pub whatsapp: String,
    pub facebook_page: String,
    pub line_id: String,
    pub is_under_maintenance: bool,
}

#[derive(Clone)]
pub struct SiteService {
    repo: Arc<dyn SettingsRepo>,
    caches: Arc<ContentCaches>,
}

impl SiteService {
    pub fn new(repo: Arc<dyn SettingsRepo>, caches: Arc<ContentCaches>) -> Self {
        Self { repo, caches }
    }

    /// Settings as served to the storefront; all-empty until first saved.
    pub async fn public_settings(&self) -> Result<Arc<SiteSettingsRecord>, ContentError> {
        self.caches
            .settings
            .get_or_compute(keys::PUBLIC_SITE_SETTINGS, self.caches.ttl(), || async {
                let record = self
                    .repo
                    .load_site_settings()
                    .await?
                    .unwrap_or_else(|| SiteSettingsRecord::empty(OffsetDateTime::now_utc()));
                Ok::<_, ContentError>(Arc::new(record))
            })
            .await
    }

    /// Current settings for the back office, bypassing the cache.
    pub async fn load(&self) -> Result<SiteSettingsRecord, ContentError> {
        Ok(self
            .repo
            .load_site_settings()
            .await?
            .unwrap_or_else(|| SiteSettingsRecord::empty(OffsetDateTime::now_utc())))
    }

    pub async fn update_settings(
        &self,
        command: UpdateSettingsCommand,
    ) -> Result<SiteSettingsRecord, ContentError> {
        let record = build_record(command)?;
        let saved = self.repo.upsert_site_settings(record).await?;

        // Virtual quick links derive from the contact fields.
        self.caches.settings.delete(keys::PUBLIC_SITE_SETTINGS);
        self.caches.quick_links.delete(keys::PUBLIC_QUICK_LINKS);
        info!(
            target = "namngam::application::site",
            maintenance = saved.is_under_maintenance,
            "site settings updated"
        );
        Ok(saved)
    }
}

fn build_record(command: UpdateSettingsCommand) -> Result<SiteSettingsRecord, DomainError> {
    let site_name = command.site_name.trimmed();
    require_base_locale("site_name", &site_name)?;

    let email = command.email.trim().to_string();
    if !email.is_empty() && !email.contains('@') {
        return Err(DomainError::invalid("email", "must be an email address"));
    }

    let facebook_page = command.facebook_page.trim().to_string();
    if !facebook_page.is_empty() {
        let parsed = Url::parse(&facebook_page)
            .map_err(|err| DomainError::invalid("facebook_page", err.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DomainError::invalid(
                "facebook_page",
                "must be an http(s) URL",
            ));
        }
    }

    Ok(SiteSettingsRecord {
        site_name,
        hero_welcome: command.hero_welcome.trimmed(),
        hero_title: command.hero_title.trimmed(),
        hero_subtitle: command.hero_subtitle.trimmed(),
        address: command.address.trimmed(),
        whatsapp_message: command.whatsapp_message.trimmed(),
        default_meta_desc: command.default_meta_desc.trimmed(),
        maintenance_message: command.maintenance_message.trimmed(),
        home_bg: command.home_bg.trim().to_string(),
        products_bg: command.products_bg.trim().to_string(),
        articles_bg: command.articles_bg.trim().to_string(),
        hero_design_image: command.hero_design_image.trim().to_string(),
        email,
        phone: command.phone.trim().to_string(),
        whatsapp: command.whatsapp.trim().to_string(),
        facebook_page,
        line_id: command.line_id.trim().to_string(),
        is_under_maintenance: command.is_under_maintenance,
        updated_at: OffsetDateTime::now_utc(),
    })
}
