//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::domain::api_keys::{ApiKeyRecord, ApiScope};
use crate::domain::entities::{
    AboutPageRecord, ArticleRecord, FaqRecord, ProductRecord, QuickLinkRecord,
    SiteSettingsRecord,
};
use crate::domain::locale::LocalizedText;
use crate::domain::types::{ActivityResource, QuickLinkType};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Visibility filter shared by product and article listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListFilter {
    /// Restrict to published records when true; no restriction otherwise.
    pub published_only: bool,
    /// Restrict to featured records when true; no restriction otherwise.
    pub featured_only: bool,
}

#[derive(Debug, Clone)]
pub struct CreateArticleParams {
    pub slug: String,
    pub title: LocalizedText,
    pub content: LocalizedText,
    pub excerpt: LocalizedText,
    pub meta_title: LocalizedText,
    pub meta_desc: LocalizedText,
    pub featured_image: Option<String>,
    pub is_published: bool,
    pub is_featured: bool,
    pub published_at: Option<OffsetDateTime>,
    pub created_by: String,
}

#[derive(Debug, Clone, Copy)]
pub struct UpdateProductPublicationParams {
    pub id: Uuid,
    pub is_published: Option<bool>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct CreateQuickLinkParams {
    pub link_type: QuickLinkType,
    pub label: LocalizedText,
    pub url: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub order: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct UpdateQuickLinkParams {
    pub id: Uuid,
    pub link_type: QuickLinkType,
    pub label: LocalizedText,
    pub url: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub order: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct UpdateFaqParams {
    pub id: Uuid,
    pub question: LocalizedText,
    pub answer: LocalizedText,
    pub category_id: Option<Uuid>,
    pub order: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct CreateApiKeyParams {
    pub name: String,
    pub prefix: String,
    pub hashed_secret: Vec<u8>,
    pub scopes: Vec<ApiScope>,
    pub expires_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentCounts {
    pub products: u64,
    pub published_products: u64,
    pub articles: u64,
    pub published_articles: u64,
    pub faqs: u64,
    pub quick_links: u64,
}

/// One row of the dashboard activity feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRecord {
    pub resource: ActivityResource,
    pub id: Uuid,
    pub title: LocalizedText,
    pub is_published: bool,
    pub updated_at: OffsetDateTime,
}

#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn load_site_settings(&self) -> Result<Option<SiteSettingsRecord>, RepoError>;
    async fn upsert_site_settings(
        &self,
        settings: SiteSettingsRecord,
    ) -> Result<SiteSettingsRecord, RepoError>;
}

#[async_trait]
pub trait QuickLinksRepo: Send + Sync {
    /// Active links ordered by `order` ascending.
    async fn list_active_links(&self) -> Result<Vec<QuickLinkRecord>, RepoError>;
    async fn list_all_links(&self) -> Result<Vec<QuickLinkRecord>, RepoError>;
    async fn create_link(&self, params: CreateQuickLinkParams)
    -> Result<QuickLinkRecord, RepoError>;
    async fn update_link(&self, params: UpdateQuickLinkParams)
    -> Result<QuickLinkRecord, RepoError>;
    async fn delete_link(&self, id: Uuid) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait ProductsRepo: Send + Sync {
    async fn list_products(
        &self,
        filter: ListFilter,
        page: PageRequest,
    ) -> Result<Vec<ProductRecord>, RepoError>;
    async fn count_products(&self, filter: ListFilter) -> Result<u64, RepoError>;
    async fn find_product_by_slug(&self, slug: &str) -> Result<Option<ProductRecord>, RepoError>;
    async fn update_publication(
        &self,
        params: UpdateProductPublicationParams,
    ) -> Result<ProductRecord, RepoError>;
}

#[async_trait]
pub trait ArticlesRepo: Send + Sync {
    /// Listing ordered by `published_at` then `created_at`, newest first.
    async fn list_articles(
        &self,
        filter: ListFilter,
        page: PageRequest,
    ) -> Result<Vec<ArticleRecord>, RepoError>;
    async fn count_articles(&self, filter: ListFilter) -> Result<u64, RepoError>;
    async fn find_article_by_slug(&self, slug: &str) -> Result<Option<ArticleRecord>, RepoError>;
    async fn create_article(&self, params: CreateArticleParams)
    -> Result<ArticleRecord, RepoError>;
}

#[async_trait]
pub trait FaqsRepo: Send + Sync {
    async fn list_active_faqs(&self) -> Result<Vec<FaqRecord>, RepoError>;
    async fn update_faq(&self, params: UpdateFaqParams) -> Result<FaqRecord, RepoError>;
    async fn delete_faq(&self, id: Uuid) -> Result<bool, RepoError>;
}

/// Value card to persist; `order` is its position in the submitted list.
#[derive(Debug, Clone)]
pub struct SaveAboutValueParams {
    pub id: Uuid,
    pub icon: String,
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub order: i32,
}

#[derive(Debug, Clone)]
pub struct SaveAboutPageParams {
    pub title: LocalizedText,
    pub story_title: LocalizedText,
    pub story_paragraph1: LocalizedText,
    pub story_paragraph2: LocalizedText,
    pub founder_name: LocalizedText,
    pub founder_quote: LocalizedText,
    pub background_image: String,
    pub founder_image: String,
    /// `None` leaves the stored values untouched.
    pub values: Option<Vec<SaveAboutValueParams>>,
    pub updated_at: OffsetDateTime,
}

#[async_trait]
pub trait AboutRepo: Send + Sync {
    /// The page with its values ordered by `order` ascending.
    async fn load_about_page(&self) -> Result<Option<AboutPageRecord>, RepoError>;
    /// Upsert the page; when values are given, rows missing from the list are
    /// deleted and the rest inserted or updated by id.
    async fn save_about_page(
        &self,
        params: SaveAboutPageParams,
    ) -> Result<AboutPageRecord, RepoError>;
}

#[async_trait]
pub trait DashboardRepo: Send + Sync {
    async fn content_counts(&self) -> Result<ContentCounts, RepoError>;
    /// Most recently updated products and articles, each list newest first.
    async fn recent_activity(&self, limit: u32) -> Result<Vec<ActivityRecord>, RepoError>;
}

#[async_trait]
pub trait ApiKeysRepo: Send + Sync {
    async fn create_key(&self, params: CreateApiKeyParams) -> Result<ApiKeyRecord, RepoError>;
    async fn list_keys(&self) -> Result<Vec<ApiKeyRecord>, RepoError>;
    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<ApiKeyRecord>, RepoError>;
    async fn revoke_key(&self, id: Uuid, revoked_at: OffsetDateTime) -> Result<(), RepoError>;
    async fn update_last_used(&self, id: Uuid, used_at: OffsetDateTime) -> Result<(), RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn health_check(&self) -> Result<(), RepoError>;
}
