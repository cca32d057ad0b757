//! Locale-resolved response shapes for the storefront.
//!
//! Records carry every locale; views carry exactly one string (or list) per
//! field, picked with [`resolve_field`].

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::quick_links::QuickLinkEntry;
use crate::domain::entities::{
    AboutPageRecord, AboutValueRecord, ArticleRecord, FaqRecord, ProductRecord,
};
use crate::domain::locale::{Locale, Localized, resolve_field};
use crate::domain::types::QuickLinkType;

fn text<E: Localized>(entity: &E, field: &str, locale: Locale) -> String {
    resolve_field(entity, field, locale).as_text().to_string()
}

fn list<E: Localized>(entity: &E, field: &str, locale: Locale) -> Vec<String> {
    resolve_field(entity, field, locale).as_list().to_vec()
}

fn optional_text<E: Localized>(entity: &E, field: &str, locale: Locale) -> Option<String> {
    let value = text(entity, field, locale);
    (!value.trim().is_empty()).then_some(value)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuickLinkView {
    pub id: String,
    #[serde(rename = "type")]
    pub link_type: QuickLinkType,
    pub label: String,
    pub url: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub order: i32,
}

impl QuickLinkView {
    pub fn from_entry(entry: &QuickLinkEntry, locale: Locale) -> Self {
        Self {
            id: entry.id.clone(),
            link_type: entry.link_type,
            label: text(entry, "label", locale),
            url: entry.url.clone(),
            icon: entry.icon.clone(),
            color: entry.color.clone(),
            order: entry.order,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductSummaryView {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub currency: String,
    pub sku: Option<String>,
    pub is_featured: bool,
    pub order: i32,
}

impl ProductSummaryView {
    pub fn from_record(record: &ProductRecord, locale: Locale) -> Self {
        Self {
            id: record.id,
            slug: record.slug.clone(),
            name: text(record, "name", locale),
            description: text(record, "description", locale),
            price: record.price,
            currency: record.currency.clone(),
            sku: record.sku.clone(),
            is_featured: record.is_featured,
            order: record.order,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductDetailView {
    #[serde(flatten)]
    pub summary: ProductSummaryView,
    pub meta_title: Option<String>,
    pub meta_desc: Option<String>,
    pub benefits: Vec<String>,
    pub how_to_use: Vec<String>,
    pub category_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ProductDetailView {
    pub fn from_record(record: &ProductRecord, locale: Locale) -> Self {
        Self {
            summary: ProductSummaryView::from_record(record, locale),
            meta_title: optional_text(record, "meta_title", locale),
            meta_desc: optional_text(record, "meta_desc", locale),
            benefits: list(record, "benefits", locale),
            how_to_use: list(record, "how_to_use", locale),
            category_id: record.category_id,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleSummaryView {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub featured_image: Option<String>,
    pub is_published: bool,
    pub is_featured: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
}

impl ArticleSummaryView {
    pub fn from_record(record: &ArticleRecord, locale: Locale) -> Self {
        Self {
            id: record.id,
            slug: record.slug.clone(),
            title: text(record, "title", locale),
            excerpt: text(record, "excerpt", locale),
            featured_image: record.featured_image.clone(),
            is_published: record.is_published,
            is_featured: record.is_featured,
            published_at: record.published_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleDetailView {
    #[serde(flatten)]
    pub summary: ArticleSummaryView,
    pub content: String,
    pub meta_title: Option<String>,
    pub meta_desc: Option<String>,
    pub created_by: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ArticleDetailView {
    pub fn from_record(record: &ArticleRecord, locale: Locale) -> Self {
        Self {
            summary: ArticleSummaryView::from_record(record, locale),
            content: text(record, "content", locale),
            meta_title: optional_text(record, "meta_title", locale),
            meta_desc: optional_text(record, "meta_desc", locale),
            created_by: record.created_by.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FaqView {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub category_id: Option<Uuid>,
    pub order: i32,
}

impl FaqView {
    pub fn from_record(record: &FaqRecord, locale: Locale) -> Self {
        Self {
            id: record.id,
            question: text(record, "question", locale),
            answer: text(record, "answer", locale),
            category_id: record.category_id,
            order: record.order,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AboutValueView {
    pub id: Uuid,
    pub icon: String,
    pub title: String,
    pub description: String,
    pub order: i32,
}

impl AboutValueView {
    pub fn from_record(record: &AboutValueRecord, locale: Locale) -> Self {
        Self {
            id: record.id,
            icon: record.icon.clone(),
            title: text(record, "title", locale),
            description: text(record, "description", locale),
            order: record.order,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AboutPageView {
    pub title: String,
    pub story_title: String,
    pub story_paragraph1: String,
    pub story_paragraph2: String,
    pub founder_name: String,
    pub founder_quote: String,
    pub background_image: Option<String>,
    pub founder_image: Option<String>,
    pub values: Vec<AboutValueView>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl AboutPageView {
    pub fn from_record(record: &AboutPageRecord, locale: Locale) -> Self {
        let image = |value: &str| (!value.is_empty()).then(|| value.to_string());
        Self {
            title: text(record, "title", locale),
            story_title: text(record, "story_title", locale),
            story_paragraph1: text(record, "story_paragraph1", locale),
            story_paragraph2: text(record, "story_paragraph2", locale),
            founder_name: text(record, "founder_name", locale),
            founder_quote: text(record, "founder_quote", locale),
            background_image: image(&record.background_image),
            founder_image: image(&record.founder_image),
            values: record
                .values
                .iter()
                .map(|value| AboutValueView::from_record(value, locale))
                .collect(),
            updated_at: record.updated_at,
        }
    }
}
