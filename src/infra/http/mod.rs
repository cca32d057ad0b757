//! HTTP surface: public storefront reads under `/api/public`, the
//! authenticated back office under `/api/admin`, and `/health`.

mod admin;
mod client_ip;
mod error;
mod middleware;
mod public;
mod response;

pub use admin::AdminState;
pub use client_ip::ClientIp;
pub use error::{ApiError, codes};
pub use public::PublicState;
pub use response::ApiSuccess;

use std::sync::Arc;

use axum::{Router, extract::FromRef, middleware::from_fn, routing::get};

use crate::application::{
    about::AboutService,
    api_keys::ApiKeyService,
    articles::ArticleService,
    caches::ContentCaches,
    dashboard::DashboardService,
    faqs::FaqService,
    login::LoginService,
    products::ProductService,
    quick_links::QuickLinkService,
    repos::{
        AboutRepo, ApiKeysRepo, ArticlesRepo, DashboardRepo, FaqsRepo, HealthRepo, ProductsRepo,
        QuickLinksRepo, SettingsRepo,
    },
    site::SiteService,
};
use crate::config::{RateLimitSettings, TrustedProxies};
use crate::rate_limit::RateLimiter;

/// Everything the router needs from persistence, implemented by the
/// Postgres adapter and by in-memory fakes alike.
pub trait ContentStore:
    SettingsRepo
    + QuickLinksRepo
    + ProductsRepo
    + ArticlesRepo
    + FaqsRepo
    + AboutRepo
    + DashboardRepo
    + ApiKeysRepo
    + HealthRepo
    + 'static
{
}

impl<T> ContentStore for T where
    T: SettingsRepo
        + QuickLinksRepo
        + ProductsRepo
        + ArticlesRepo
        + FaqsRepo
        + AboutRepo
        + DashboardRepo
        + ApiKeysRepo
        + HealthRepo
        + 'static
{
}

#[derive(Clone)]
pub struct RouterState {
    pub public: PublicState,
    pub admin: AdminState,
    pub trusted_proxies: Arc<TrustedProxies>,
}

impl RouterState {
    /// Wire every service over one store, sharing the caches and the limiter.
    pub fn new<S: ContentStore>(
        store: Arc<S>,
        caches: Arc<ContentCaches>,
        limiter: Arc<RateLimiter>,
        budgets: RateLimitSettings,
    ) -> Self {
        let settings_repo: Arc<dyn SettingsRepo> = store.clone();
        let site = SiteService::new(settings_repo.clone(), caches.clone());
        let quick_links = QuickLinkService::new(store.clone(), settings_repo, caches.clone());
        let products = ProductService::new(store.clone(), caches.clone());
        let articles = ArticleService::new(store.clone(), caches.clone());
        let faqs = FaqService::new(store.clone(), caches.clone());
        let about = AboutService::new(store.clone(), caches);
        let api_keys = ApiKeyService::new(store.clone());
        let login = LoginService::new(api_keys.clone(), limiter.clone(), budgets.login);

        Self {
            public: PublicState {
                site: site.clone(),
                quick_links: quick_links.clone(),
                products: products.clone(),
                articles: articles.clone(),
                faqs: faqs.clone(),
                about: about.clone(),
                health: store.clone(),
            },
            admin: AdminState {
                api_keys,
                login,
                dashboard: DashboardService::new(store),
                articles,
                products,
                site,
                quick_links,
                faqs,
                about,
                limiter,
                budgets,
            },
            trusted_proxies: Arc::new(TrustedProxies::default()),
        }
    }

    /// Peers whose forwarding headers name the client for rate limiting.
    pub fn with_trusted_proxies(mut self, trusted_proxies: TrustedProxies) -> Self {
        self.trusted_proxies = Arc::new(trusted_proxies);
        self
    }
}

impl FromRef<RouterState> for PublicState {
    fn from_ref(state: &RouterState) -> Self {
        state.public.clone()
    }
}

impl FromRef<RouterState> for AdminState {
    fn from_ref(state: &RouterState) -> Self {
        state.admin.clone()
    }
}

impl FromRef<RouterState> for Arc<TrustedProxies> {
    fn from_ref(state: &RouterState) -> Self {
        state.trusted_proxies.clone()
    }
}

pub fn build_router(state: RouterState) -> Router {
    Router::new()
        .route("/health", get(public::health))
        .nest("/api/public", public::router())
        .nest("/api/admin", admin::router(state.admin.clone()))
        .with_state(state)
        .layer(from_fn(middleware::log_responses))
        .layer(from_fn(middleware::set_request_context))
}
