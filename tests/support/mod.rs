//! In-memory repositories and request helpers shared by the HTTP tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

use namngam::application::api_keys::{ApiKeyService, IssueApiKeyCommand};
use namngam::application::caches::ContentCaches;
use namngam::application::pagination::PageRequest;
use namngam::application::repos::{
    AboutRepo, ActivityRecord, ApiKeysRepo, ArticlesRepo, ContentCounts, CreateApiKeyParams,
    CreateArticleParams, CreateQuickLinkParams, DashboardRepo, FaqsRepo, HealthRepo, ListFilter,
    ProductsRepo, QuickLinksRepo, RepoError, SaveAboutPageParams, SettingsRepo, UpdateFaqParams,
    UpdateProductPublicationParams, UpdateQuickLinkParams,
};
use namngam::cache::CacheConfig;
use namngam::config::{RateLimitSettings, TrustedProxies};
use namngam::domain::api_keys::{ApiKeyRecord, ApiScope};
use namngam::domain::entities::{
    AboutPageRecord, AboutValueRecord, ArticleRecord, FaqRecord, ProductRecord, QuickLinkRecord,
    SiteSettingsRecord,
};
use namngam::domain::locale::{Locale, LocalizedList, LocalizedText};
use namngam::domain::types::{ActivityResource, QuickLinkType};
use namngam::infra::http::{RouterState, build_router};
use namngam::rate_limit::{FailurePolicy, RateLimiter};

#[derive(Default)]
pub struct InMemoryStore {
    pub settings: Mutex<Option<SiteSettingsRecord>>,
    pub links: Mutex<Vec<QuickLinkRecord>>,
    pub products: Mutex<Vec<ProductRecord>>,
    pub articles: Mutex<Vec<ArticleRecord>>,
    pub faqs: Mutex<Vec<FaqRecord>>,
    pub keys: Mutex<Vec<ApiKeyRecord>>,
    pub about: Mutex<Option<AboutPageRecord>>,
    pub unhealthy: AtomicBool,
    pub article_list_calls: AtomicUsize,
    pub product_list_calls: AtomicUsize,
    pub about_load_calls: AtomicUsize,
}

fn filter_matches(filter: ListFilter, published: bool, featured: bool) -> bool {
    (!filter.published_only || published) && (!filter.featured_only || featured)
}

fn page_of<T: Clone>(items: Vec<T>, page: PageRequest) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect()
}

#[async_trait]
impl SettingsRepo for InMemoryStore {
    async fn load_site_settings(&self) -> Result<Option<SiteSettingsRecord>, RepoError> {
        Ok(self.settings.lock().await.clone())
    }

    async fn upsert_site_settings(
        &self,
        settings: SiteSettingsRecord,
    ) -> Result<SiteSettingsRecord, RepoError> {
        *self.settings.lock().await = Some(settings.clone());
        Ok(settings)
    }
}

#[async_trait]
impl QuickLinksRepo for InMemoryStore {
    async fn list_active_links(&self) -> Result<Vec<QuickLinkRecord>, RepoError> {
        let mut links: Vec<_> = self
            .links
            .lock()
            .await
            .iter()
            .filter(|link| link.is_active)
            .cloned()
            .collect();
        links.sort_by_key(|link| link.order);
        Ok(links)
    }

    async fn list_all_links(&self) -> Result<Vec<QuickLinkRecord>, RepoError> {
        let mut links = self.links.lock().await.clone();
        links.sort_by_key(|link| link.order);
        Ok(links)
    }

    async fn create_link(
        &self,
        params: CreateQuickLinkParams,
    ) -> Result<QuickLinkRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let record = QuickLinkRecord {
            id: Uuid::new_v4(),
            link_type: params.link_type,
            label: params.label,
            url: params.url,
            icon: params.icon,
            color: params.color,
            order: params.order,
            is_active: params.is_active,
            created_at: now,
            updated_at: now,
        };
        self.links.lock().await.push(record.clone());
        Ok(record)
    }

    async fn update_link(
        &self,
        params: UpdateQuickLinkParams,
    ) -> Result<QuickLinkRecord, RepoError> {
        let mut links = self.links.lock().await;
        let link = links
            .iter_mut()
            .find(|link| link.id == params.id)
            .ok_or(RepoError::NotFound)?;
        link.link_type = params.link_type;
        link.label = params.label;
        link.url = params.url;
        link.icon = params.icon;
        link.color = params.color;
        link.order = params.order;
        link.is_active = params.is_active;
        link.updated_at = OffsetDateTime::now_utc();
        Ok(link.clone())
    }

    async fn delete_link(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut links = self.links.lock().await;
        let before = links.len();
        links.retain(|link| link.id != id);
        Ok(links.len() != before)
    }
}

#[async_trait]
impl ProductsRepo for InMemoryStore {
    async fn list_products(
        &self,
        filter: ListFilter,
        page: PageRequest,
    ) -> Result<Vec<ProductRecord>, RepoError> {
        self.product_list_calls.fetch_add(1, Ordering::SeqCst);
        let mut products: Vec<_> = self
            .products
            .lock()
            .await
            .iter()
            .filter(|p| filter_matches(filter, p.is_published, p.is_featured))
            .cloned()
            .collect();
        products.sort_by_key(|p| p.order);
        Ok(page_of(products, page))
    }

    async fn count_products(&self, filter: ListFilter) -> Result<u64, RepoError> {
        let products = self.products.lock().await;
        Ok(products
            .iter()
            .filter(|p| filter_matches(filter, p.is_published, p.is_featured))
            .count() as u64)
    }

    async fn find_product_by_slug(&self, slug: &str) -> Result<Option<ProductRecord>, RepoError> {
        Ok(self
            .products
            .lock()
            .await
            .iter()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn update_publication(
        &self,
        params: UpdateProductPublicationParams,
    ) -> Result<ProductRecord, RepoError> {
        let mut products = self.products.lock().await;
        let product = products
            .iter_mut()
            .find(|p| p.id == params.id)
            .ok_or(RepoError::NotFound)?;
        if let Some(published) = params.is_published {
            product.is_published = published;
        }
        if let Some(featured) = params.is_featured {
            product.is_featured = featured;
        }
        product.updated_at = OffsetDateTime::now_utc();
        Ok(product.clone())
    }
}

#[async_trait]
impl ArticlesRepo for InMemoryStore {
    async fn list_articles(
        &self,
        filter: ListFilter,
        page: PageRequest,
    ) -> Result<Vec<ArticleRecord>, RepoError> {
        self.article_list_calls.fetch_add(1, Ordering::SeqCst);
        let mut articles: Vec<_> = self
            .articles
            .lock()
            .await
            .iter()
            .filter(|a| filter_matches(filter, a.is_published, a.is_featured))
            .cloned()
            .collect();
        // Newest publication first, unpublished last.
        articles.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(page_of(articles, page))
    }

    async fn count_articles(&self, filter: ListFilter) -> Result<u64, RepoError> {
        let articles = self.articles.lock().await;
        Ok(articles
            .iter()
            .filter(|a| filter_matches(filter, a.is_published, a.is_featured))
            .count() as u64)
    }

    async fn find_article_by_slug(&self, slug: &str) -> Result<Option<ArticleRecord>, RepoError> {
        Ok(self
            .articles
            .lock()
            .await
            .iter()
            .find(|a| a.slug == slug)
            .cloned())
    }

    async fn create_article(
        &self,
        params: CreateArticleParams,
    ) -> Result<ArticleRecord, RepoError> {
        let mut articles = self.articles.lock().await;
        if articles.iter().any(|a| a.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "articles_slug_key".to_string(),
            });
        }
        let now = OffsetDateTime::now_utc();
        let record = ArticleRecord {
            id: Uuid::new_v4(),
            slug: params.slug,
            title: params.title,
            content: params.content,
            excerpt: params.excerpt,
            meta_title: params.meta_title,
            meta_desc: params.meta_desc,
            featured_image: params.featured_image,
            is_published: params.is_published,
            is_featured: params.is_featured,
            published_at: params.published_at,
            created_by: params.created_by,
            created_at: now,
            updated_at: now,
        };
        articles.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl FaqsRepo for InMemoryStore {
    async fn list_active_faqs(&self) -> Result<Vec<FaqRecord>, RepoError> {
        let mut faqs: Vec<_> = self
            .faqs
            .lock()
            .await
            .iter()
            .filter(|faq| faq.is_active)
            .cloned()
            .collect();
        faqs.sort_by_key(|faq| faq.order);
        Ok(faqs)
    }

    async fn update_faq(&self, params: UpdateFaqParams) -> Result<FaqRecord, RepoError> {
        let mut faqs = self.faqs.lock().await;
        let faq = faqs
            .iter_mut()
            .find(|faq| faq.id == params.id)
            .ok_or(RepoError::NotFound)?;
        faq.question = params.question;
        faq.answer = params.answer;
        faq.category_id = params.category_id;
        faq.order = params.order;
        faq.is_active = params.is_active;
        faq.updated_at = OffsetDateTime::now_utc();
        Ok(faq.clone())
    }

    async fn delete_faq(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut faqs = self.faqs.lock().await;
        let before = faqs.len();
        faqs.retain(|faq| faq.id != id);
        Ok(faqs.len() != before)
    }
}

#[async_trait]
impl AboutRepo for InMemoryStore {
    async fn load_about_page(&self) -> Result<Option<AboutPageRecord>, RepoError> {
        self.about_load_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.about.lock().await.clone())
    }

    async fn save_about_page(
        &self,
        params: SaveAboutPageParams,
    ) -> Result<AboutPageRecord, RepoError> {
        let mut about = self.about.lock().await;
        let mut values = about
            .as_ref()
            .map(|page| page.values.clone())
            .unwrap_or_default();
        if let Some(incoming) = params.values {
            values = incoming
                .into_iter()
                .map(|value| AboutValueRecord {
                    id: value.id,
                    icon: value.icon,
                    title: value.title,
                    description: value.description,
                    order: value.order,
                })
                .collect();
        }
        values.sort_by_key(|value| value.order);

        let page = AboutPageRecord {
            title: params.title,
            story_title: params.story_title,
            story_paragraph1: params.story_paragraph1,
            story_paragraph2: params.story_paragraph2,
            founder_name: params.founder_name,
            founder_quote: params.founder_quote,
            background_image: params.background_image,
            founder_image: params.founder_image,
            values,
            updated_at: params.updated_at,
        };
        *about = Some(page.clone());
        Ok(page)
    }
}

#[async_trait]
impl DashboardRepo for InMemoryStore {
    async fn content_counts(&self) -> Result<ContentCounts, RepoError> {
        let products = self.products.lock().await;
        let articles = self.articles.lock().await;
        Ok(ContentCounts {
            products: products.len() as u64,
            published_products: products.iter().filter(|p| p.is_published).count() as u64,
            articles: articles.len() as u64,
            published_articles: articles.iter().filter(|a| a.is_published).count() as u64,
            faqs: self.faqs.lock().await.len() as u64,
            quick_links: self.links.lock().await.len() as u64,
        })
    }

    async fn recent_activity(&self, limit: u32) -> Result<Vec<ActivityRecord>, RepoError> {
        let mut products: Vec<_> = self
            .products
            .lock()
            .await
            .iter()
            .map(|p| ActivityRecord {
                resource: ActivityResource::Product,
                id: p.id,
                title: p.name.clone(),
                is_published: p.is_published,
                updated_at: p.updated_at,
            })
            .collect();
        products.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        products.truncate(limit as usize);

        let mut articles: Vec<_> = self
            .articles
            .lock()
            .await
            .iter()
            .map(|a| ActivityRecord {
                resource: ActivityResource::Article,
                id: a.id,
                title: a.title.clone(),
                is_published: a.is_published,
                updated_at: a.updated_at,
            })
            .collect();
        articles.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        articles.truncate(limit as usize);

        products.extend(articles);
        Ok(products)
    }
}

#[async_trait]
impl ApiKeysRepo for InMemoryStore {
    async fn create_key(&self, params: CreateApiKeyParams) -> Result<ApiKeyRecord, RepoError> {
        let record = ApiKeyRecord {
            id: Uuid::new_v4(),
            name: params.name,
            prefix: params.prefix,
            hashed_secret: params.hashed_secret,
            scopes: params.scopes,
            expires_at: params.expires_at,
            revoked_at: None,
            last_used_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        self.keys.lock().await.push(record.clone());
        Ok(record)
    }

    async fn list_keys(&self) -> Result<Vec<ApiKeyRecord>, RepoError> {
        Ok(self.keys.lock().await.clone())
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<ApiKeyRecord>, RepoError> {
        Ok(self
            .keys
            .lock()
            .await
            .iter()
            .find(|key| key.prefix == prefix)
            .cloned())
    }

    async fn revoke_key(&self, id: Uuid, revoked_at: OffsetDateTime) -> Result<(), RepoError> {
        let mut keys = self.keys.lock().await;
        let key = keys
            .iter_mut()
            .find(|key| key.id == id)
            .ok_or(RepoError::NotFound)?;
        key.revoked_at.get_or_insert(revoked_at);
        Ok(())
    }

    async fn update_last_used(&self, id: Uuid, used_at: OffsetDateTime) -> Result<(), RepoError> {
        if let Some(key) = self.keys.lock().await.iter_mut().find(|key| key.id == id) {
            key.last_used_at = Some(used_at);
        }
        Ok(())
    }
}

#[async_trait]
impl HealthRepo for InMemoryStore {
    async fn health_check(&self) -> Result<(), RepoError> {
        if self.unhealthy.load(Ordering::SeqCst) {
            Err(RepoError::from_persistence("connection refused"))
        } else {
            Ok(())
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub caches: Arc<ContentCaches>,
    pub limiter: Arc<RateLimiter>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_budgets(RateLimitSettings::default())
    }

    pub fn with_budgets(budgets: RateLimitSettings) -> Self {
        Self::with_store(Arc::new(InMemoryStore::default()), budgets)
    }

    pub fn with_store(store: Arc<InMemoryStore>, budgets: RateLimitSettings) -> Self {
        Self::build(store, budgets, TrustedProxies::None)
    }

    /// App whose forwarding headers are believed from any peer.
    pub fn trusting_forwarded_headers() -> Self {
        Self::build(
            Arc::new(InMemoryStore::default()),
            RateLimitSettings::default(),
            TrustedProxies::Any,
        )
    }

    fn build(
        store: Arc<InMemoryStore>,
        budgets: RateLimitSettings,
        trusted_proxies: TrustedProxies,
    ) -> Self {
        let caches = Arc::new(ContentCaches::new(&CacheConfig {
            enabled: true,
            capacity: 64,
            default_ttl: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(60),
        }));
        let limiter = Arc::new(RateLimiter::new(
            budgets.max_tracked_keys.get(),
            FailurePolicy::Open,
        ));
        let state = RouterState::new(store.clone(), caches.clone(), limiter.clone(), budgets)
            .with_trusted_proxies(trusted_proxies);
        Self {
            router: build_router(state),
            store,
            caches,
            limiter,
        }
    }

    /// Issue a key straight through the service and return its token.
    pub async fn issue_token(&self, scopes: &[ApiScope]) -> String {
        let service = ApiKeyService::new(self.store.clone());
        service
            .issue(IssueApiKeyCommand {
                name: "editor".to_string(),
                scopes: scopes.to_vec(),
                expires_at: None,
            })
            .await
            .expect("issue key")
            .token
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).expect("request"))
            .await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn error_code(&self) -> &str {
        self.body["error"]["code"].as_str().unwrap_or_default()
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.9");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::get(uri)
        .header("x-api-key", token)
        .body(Body::empty())
        .expect("request")
}

pub fn product(slug: &str, name_lo: &str, name_en: &str, order: i32) -> ProductRecord {
    let now = OffsetDateTime::now_utc();
    ProductRecord {
        id: Uuid::new_v4(),
        slug: slug.to_string(),
        name: LocalizedText::new(name_lo).with(Locale::En, name_en),
        description: LocalizedText::new("ລາຍລະອຽດ"),
        meta_title: LocalizedText::default(),
        meta_desc: LocalizedText::default(),
        benefits: LocalizedList::new(vec!["ຄວາມສະຫງົບ".to_string()])
            .with(Locale::En, vec!["Calm".to_string()]),
        how_to_use: LocalizedList::default(),
        price: 150_000,
        currency: "LAK".to_string(),
        sku: None,
        category_id: None,
        is_published: true,
        is_featured: false,
        order,
        created_at: now,
        updated_at: now,
    }
}

pub fn article(slug: &str, title_lo: &str, title_en: &str, published: bool) -> ArticleRecord {
    let now = OffsetDateTime::now_utc();
    ArticleRecord {
        id: Uuid::new_v4(),
        slug: slug.to_string(),
        title: LocalizedText::new(title_lo).with(Locale::En, title_en),
        content: LocalizedText::new("<p>ເນື້ອຫາ</p>"),
        excerpt: LocalizedText::default(),
        meta_title: LocalizedText::default(),
        meta_desc: LocalizedText::default(),
        featured_image: None,
        is_published: published,
        is_featured: false,
        published_at: published.then_some(now),
        created_by: "seed".to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn faq(question_lo: &str, question_th: &str, order: i32) -> FaqRecord {
    FaqRecord {
        id: Uuid::new_v4(),
        question: LocalizedText::new(question_lo).with(Locale::Th, question_th),
        answer: LocalizedText::new("ຄຳຕອບ"),
        category_id: None,
        order,
        is_active: true,
        updated_at: OffsetDateTime::now_utc(),
    }
}

pub fn quick_link(link_type: QuickLinkType, label: LocalizedText, url: &str, order: i32) -> QuickLinkRecord {
    let now = OffsetDateTime::now_utc();
    QuickLinkRecord {
        id: Uuid::new_v4(),
        link_type,
        label,
        url: url.to_string(),
        icon: None,
        color: None,
        order,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn contact_settings() -> SiteSettingsRecord {
    let mut settings = SiteSettingsRecord::empty(OffsetDateTime::now_utc());
    settings.site_name = LocalizedText::new("ນ້ຳງາມ").with(Locale::En, "NAMNGAM");
    settings.whatsapp = "+856 20 5555 1234".to_string();
    settings.facebook_page = "https://facebook.com/namngam".to_string();
    settings.line_id = "namngam".to_string();
    settings.phone = "+856 21 123 456".to_string();
    settings
}
