//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::{
    locale::{Locale, Localized, LocalizedList, LocalizedText, LocalizedValue},
    types::QuickLinkType,
};

/// Singleton site configuration edited from the back office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSettingsRecord {
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
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl SiteSettingsRecord {
    /// All-empty settings served before the back office saves anything.
    pub fn empty(now: OffsetDateTime) -> Self {
        Self {
            site_name: LocalizedText::default(),
            hero_welcome: LocalizedText::default(),
            hero_title: LocalizedText::default(),
            hero_subtitle: LocalizedText::default(),
            address: LocalizedText::default(),
            whatsapp_message: LocalizedText::default(),
            default_meta_desc: LocalizedText::default(),
            maintenance_message: LocalizedText::default(),
            home_bg: String::new(),
            products_bg: String::new(),
            articles_bg: String::new(),
            hero_design_image: String::new(),
            email: String::new(),
            phone: String::new(),
            whatsapp: String::new(),
            facebook_page: String::new(),
            line_id: String::new(),
            is_under_maintenance: false,
            updated_at: now,
        }
    }
}

impl Localized for SiteSettingsRecord {
    fn localized_field(&self, field: &str, locale: Locale) -> Option<LocalizedValue<'_>> {
        let text = match field {
            "siteName" | "site_name" => &self.site_name,
            "heroWelcome" | "hero_welcome" => &self.hero_welcome,
            "heroTitle" | "hero_title" => &self.hero_title,
            "heroSubtitle" | "hero_subtitle" => &self.hero_subtitle,
            "address" => &self.address,
            "whatsappMessage" | "whatsapp_message" => &self.whatsapp_message,
            "defaultMetaDesc" | "default_meta_desc" => &self.default_meta_desc,
            "maintenanceMessage" | "maintenance_message" => &self.maintenance_message,
            _ => return None,
        };
        Some(text.value(locale))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickLinkRecord {
    pub id: Uuid,
    pub link_type: QuickLinkType,
    pub label: LocalizedText,
    pub url: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub order: i32,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Localized for QuickLinkRecord {
    fn localized_field(&self, field: &str, locale: Locale) -> Option<LocalizedValue<'_>> {
        match field {
            "label" => Some(self.label.value(locale)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub id: Uuid,
    pub slug: String,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub meta_title: LocalizedText,
    pub meta_desc: LocalizedText,
    pub benefits: LocalizedList,
    pub how_to_use: LocalizedList,
    pub price: i64,
    pub currency: String,
    pub sku: Option<String>,
    pub category_id: Option<Uuid>,
    pub is_published: bool,
    pub is_featured: bool,
    pub order: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Localized for ProductRecord {
    fn localized_field(&self, field: &str, locale: Locale) -> Option<LocalizedValue<'_>> {
        match field {
            "name" => Some(self.name.value(locale)),
            "description" => Some(self.description.value(locale)),
            "metaTitle" | "meta_title" => Some(self.meta_title.value(locale)),
            "metaDesc" | "meta_desc" => Some(self.meta_desc.value(locale)),
            "benefits" => Some(self.benefits.value(locale)),
            "howToUse" | "how_to_use" => Some(self.how_to_use.value(locale)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleRecord {
    pub id: Uuid,
    pub slug: String,
    pub title: LocalizedText,
    pub content: LocalizedText,
    pub excerpt: LocalizedText,
    pub meta_title: LocalizedText,
    pub meta_desc: LocalizedText,
    pub featured_image: Option<String>,
    pub is_published: bool,
    pub is_featured: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    pub created_by: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Localized for ArticleRecord {
    fn localized_field(&self, field: &str, locale: Locale) -> Option<LocalizedValue<'_>> {
        let text = match field {
            "title" => &self.title,
            "content" => &self.content,
            "excerpt" => &self.excerpt,
            "metaTitle" | "meta_title" => &self.meta_title,
            "metaDesc" | "meta_desc" => &self.meta_desc,
            _ => return None,
        };
        Some(text.value(locale))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaqRecord {
    pub id: Uuid,
    pub question: LocalizedText,
    pub answer: LocalizedText,
    pub category_id: Option<Uuid>,
    pub order: i32,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Localized for FaqRecord {
    fn localized_field(&self, field: &str, locale: Locale) -> Option<LocalizedValue<'_>> {
        match field {
            "question" => Some(self.question.value(locale)),
            "answer" => Some(self.answer.value(locale)),
            _ => None,
        }
    }
}

/// One brand value card on the About page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AboutValueRecord {
    pub id: Uuid,
    pub icon: String,
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub order: i32,
}

impl Localized for AboutValueRecord {
    fn localized_field(&self, field: &str, locale: Locale) -> Option<LocalizedValue<'_>> {
        match field {
            "title" => Some(self.title.value(locale)),
            "description" => Some(self.description.value(locale)),
            _ => None,
        }
    }
}

/// Singleton About page: brand story, founder block and ordered values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AboutPageRecord {
    pub title: LocalizedText,
    pub story_title: LocalizedText,
    pub story_paragraph1: LocalizedText,
    pub story_paragraph2: LocalizedText,
    pub founder_name: LocalizedText,
    pub founder_quote: LocalizedText,
    pub background_image: String,
    pub founder_image: String,
    pub values: Vec<AboutValueRecord>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Localized for AboutPageRecord {
    fn localized_field(&self, field: &str, locale: Locale) -> Option<LocalizedValue<'_>> {
        let text = match field {
            "title" => &self.title,
            "storyTitle" | "story_title" => &self.story_title,
            "storyParagraph1" | "story_paragraph1" => &self.story_paragraph1,
            "storyParagraph2" | "story_paragraph2" => &self.story_paragraph2,
            "founderName" | "founder_name" => &self.founder_name,
            "founderQuote" | "founder_quote" => &self.founder_quote,
            _ => return None,
        };
        Some(text.value(locale))
    }
}
