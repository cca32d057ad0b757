//! Quick-contact links shown in the storefront header and footer.
//!
//! When no link rows exist the storefront still needs a way to reach the
//! shop, so links are derived from the contact fields in site settings.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::application::caches::ContentCaches;
use crate::application::error::ContentError;
use crate::application::repos::{
    CreateQuickLinkParams, QuickLinksRepo, SettingsRepo, UpdateQuickLinkParams,
};
use crate::cache::keys;
use crate::domain::entities::{QuickLinkRecord, SiteSettingsRecord};
use crate::domain::error::{DomainError, require_base_locale};
use crate::domain::locale::{Locale, Localized, LocalizedText, LocalizedValue};
use crate::domain::types::QuickLinkType;

const VIRTUAL_ID_PREFIX: &str = "virtual-";
const PHONE_LABEL_LO: &str = "ໂທຫາພວກເຮົາ";
const PHONE_LABEL_EN: &str = "Call Us";

/// A link as served publicly: either a stored row or one derived from settings.
#[derive(Debug, Clone, PartialEq)]
pub struct QuickLinkEntry {
    pub id: String,
    pub link_type: QuickLinkType,
    pub label: LocalizedText,
    pub url: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub order: i32,
}

impl QuickLinkEntry {
    pub fn is_virtual(&self) -> bool {
        self.id.starts_with(VIRTUAL_ID_PREFIX)
    }
}

impl From<QuickLinkRecord> for QuickLinkEntry {
    fn from(record: QuickLinkRecord) -> Self {
        Self {
            id: record.id.to_string(),
            link_type: record.link_type,
            label: record.label,
            url: record.url,
            icon: record.icon,
            color: record.color,
            order: record.order,
        }
    }
}

impl Localized for QuickLinkEntry {
    fn localized_field(&self, field: &str, locale: Locale) -> Option<LocalizedValue<'_>> {
        match field {
            "label" => Some(self.label.value(locale)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuickLinkCommand {
    pub link_type: QuickLinkType,
    pub label: LocalizedText,
    pub url: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Clone)]
pub struct QuickLinkService {
    links: Arc<dyn QuickLinksRepo>,
    settings: Arc<dyn SettingsRepo>,
    caches: Arc<ContentCaches>,
}

impl QuickLinkService {
    pub fn new(
        links: Arc<dyn QuickLinksRepo>,
        settings: Arc<dyn SettingsRepo>,
        caches: Arc<ContentCaches>,
    ) -> Self {
        Self {
            links,
            settings,
            caches,
        }
    }

    /// Active links in display order, falling back to settings-derived links.
    pub async fn public_links(&self) -> Result<Arc<Vec<QuickLinkEntry>>, ContentError> {
        self.caches
            .quick_links
            .get_or_compute(keys::PUBLIC_QUICK_LINKS, self.caches.ttl(), || async {
                let stored = self.links.list_active_links().await?;
                if !stored.is_empty() {
                    let entries = stored.into_iter().map(QuickLinkEntry::from).collect();
                    return Ok::<_, ContentError>(Arc::new(entries));
                }

                let derived = self
                    .settings
                    .load_site_settings()
                    .await?
                    .map(|settings| virtual_links(&settings))
                    .unwrap_or_default();
                Ok(Arc::new(derived))
            })
            .await
    }

    pub async fn list_all(&self) -> Result<Vec<QuickLinkRecord>, ContentError> {
        Ok(self.links.list_all_links().await?)
    }

    pub async fn create(&self, command: QuickLinkCommand) -> Result<QuickLinkRecord, ContentError> {
        let validated = validate(command)?;
        let record = self
            .links
            .create_link(CreateQuickLinkParams {
                link_type: validated.link_type,
                label: validated.label,
                url: validated.url,
                icon: validated.icon,
                color: validated.color,
                order: validated.order,
                is_active: validated.is_active,
            })
            .await?;
        self.invalidate();
        info!(
            target = "namngam::application::quick_links",
            link_id = %record.id,
            link_type = %record.link_type,
            "quick link created"
        );
        Ok(record)
    }

    pub async fn update(
        &self,
        id: Uuid,
        command: QuickLinkCommand,
    ) -> Result<QuickLinkRecord, ContentError> {
        let validated = validate(command)?;
        let record = self
            .links
            .update_link(UpdateQuickLinkParams {
                id,
                link_type: validated.link_type,
                label: validated.label,
                url: validated.url,
                icon: validated.icon,
                color: validated.color,
                order: validated.order,
                is_active: validated.is_active,
            })
            .await
            .map_err(|err| ContentError::from_repo("quick link", err))?;
        self.invalidate();
        Ok(record)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ContentError> {
        if !self.links.delete_link(id).await? {
            return Err(ContentError::not_found("quick link"));
        }
        self.invalidate();
        Ok(())
    }

    fn invalidate(&self) {
        self.caches.quick_links.delete(keys::PUBLIC_QUICK_LINKS);
    }
}

/// Links derived from contact settings, in WhatsApp, Facebook, LINE, Phone order.
pub fn virtual_links(settings: &SiteSettingsRecord) -> Vec<QuickLinkEntry> {
    let whatsapp_digits: String = settings
        .whatsapp
        .chars()
        .filter(char::is_ascii_digit)
        .collect();

    let candidates = [
        (
            QuickLinkType::Whatsapp,
            settings.whatsapp.trim(),
            LocalizedText::new("WhatsApp").with(Locale::En, "WhatsApp"),
            format!("https://wa.me/{whatsapp_digits}"),
        ),
        (
            QuickLinkType::Facebook,
            settings.facebook_page.trim(),
            LocalizedText::new("Facebook").with(Locale::En, "Facebook"),
            settings.facebook_page.trim().to_string(),
        ),
        (
            QuickLinkType::Line,
            settings.line_id.trim(),
            LocalizedText::new("LINE").with(Locale::En, "LINE"),
            format!("https://line.me/ti/p/~{}", settings.line_id.trim()),
        ),
        (
            QuickLinkType::Phone,
            settings.phone.trim(),
            LocalizedText::new(PHONE_LABEL_LO).with(Locale::En, PHONE_LABEL_EN),
            format!("tel:{}", settings.phone.trim()),
        ),
    ];

    candidates
        .into_iter()
        .filter(|(_, source, _, _)| !source.is_empty())
        .enumerate()
        .map(|(order, (link_type, _, label, url))| QuickLinkEntry {
            id: format!("{VIRTUAL_ID_PREFIX}{}", link_type.slug()),
            link_type,
            label,
            url,
            icon: None,
            color: None,
            order: order as i32,
        })
        .collect()
}

fn validate(command: QuickLinkCommand) -> Result<QuickLinkCommand, DomainError> {
    let label = command.label.trimmed();
    require_base_locale("label", &label)?;

    let url = command.url.trim().to_string();
    validate_link_url(&url)?;

    let clean = |value: Option<String>| {
        value
            .map(|inner| inner.trim().to_string())
            .filter(|inner| !inner.is_empty())
    };

    Ok(QuickLinkCommand {
        link_type: command.link_type,
        label,
        url,
        icon: clean(command.icon),
        color: clean(command.color),
        order: command.order,
        is_active: command.is_active,
    })
}

/// Absolute http(s), mailto or tel URLs, or site-relative paths.
fn validate_link_url(url: &str) -> Result<(), DomainError> {
    if url.is_empty() {
        return Err(DomainError::invalid("url", "must not be empty"));
    }
    if url.starts_with('/') && !url.starts_with("//") {
        return Ok(());
    }

    let parsed = Url::parse(url).map_err(|err| DomainError::invalid("url", err.to_string()))?;
    match parsed.scheme() {
        "http" | "https" | "mailto" | "tel" => Ok(()),
        other => Err(DomainError::invalid(
            "url",
            format!("unsupported scheme `{other}`"),
        )),
    }
}
