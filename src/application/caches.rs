//! The set of read-through caches shared by application services.

use std::sync::Arc;
use std::time::Duration;

use crate::application::pagination::Page;
use crate::cache::{CacheConfig, TtlCache};
use crate::domain::entities::{
    AboutPageRecord, ArticleRecord, FaqRecord, ProductRecord, SiteSettingsRecord,
};

use super::quick_links::QuickLinkEntry;

/// Typed caches built once at startup and shared through `Arc`.
///
/// Values are stored unresolved (all locales) so one entry serves every
/// requested locale.
pub struct ContentCaches {
    pub settings: TtlCache<Arc<SiteSettingsRecord>>,
    pub quick_links: TtlCache<Arc<Vec<QuickLinkEntry>>>,
    pub articles: TtlCache<Arc<Page<ArticleRecord>>>,
    pub article_details: TtlCache<Arc<ArticleRecord>>,
    pub products: TtlCache<Arc<Page<ProductRecord>>>,
    pub product_details: TtlCache<Arc<ProductRecord>>,
    pub faqs: TtlCache<Arc<Vec<FaqRecord>>>,
    pub about: TtlCache<Arc<AboutPageRecord>>,
    ttl: Duration,
}

impl ContentCaches {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            settings: TtlCache::new("settings", config),
            quick_links: TtlCache::new("quick_links", config),
            articles: TtlCache::new("articles", config),
            article_details: TtlCache::new("article_details", config),
            products: TtlCache::new("products", config),
            product_details: TtlCache::new("product_details", config),
            faqs: TtlCache::new("faqs", config),
            about: TtlCache::new("about", config),
            ttl: config.default_ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop dead entries from every cache. Returns the total removed.
    pub fn sweep_expired(&self) -> usize {
        self.settings.sweep_expired()
            + self.quick_links.sweep_expired()
            + self.articles.sweep_expired()
            + self.article_details.sweep_expired()
            + self.products.sweep_expired()
            + self.product_details.sweep_expired()
            + self.faqs.sweep_expired()
            + self.about.sweep_expired()
    }
}

impl Default for ContentCaches {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}
