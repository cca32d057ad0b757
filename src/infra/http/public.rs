use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::application::{
    about::AboutService,
    articles::{ArticleQuery, ArticleService},
    error::ErrorReport,
    faqs::FaqService,
    pagination::PageRequest,
    products::{ProductQuery, ProductService},
    quick_links::QuickLinkService,
    repos::HealthRepo,
    site::SiteService,
    views::{
        AboutPageView, ArticleDetailView, ArticleSummaryView, FaqView, ProductDetailView,
        ProductSummaryView, QuickLinkView,
    },
};
use crate::domain::{entities::SiteSettingsRecord, locale::Locale};

use super::{RouterState, error::ApiError, response::ApiSuccess};

const SOURCE: &str = "infra::http::public";

#[derive(Clone)]
pub struct PublicState {
    pub site: SiteService,
    pub quick_links: QuickLinkService,
    pub products: ProductService,
    pub articles: ArticleService,
    pub faqs: FaqService,
    pub about: AboutService,
    pub health: Arc<dyn HealthRepo>,
}

pub fn router() -> Router<RouterState> {
    Router::new()
        .route("/settings", get(settings))
        .route("/quick-links", get(quick_links))
        .route("/products", get(list_products))
        .route("/products/{slug}", get(product_detail))
        .route("/articles", get(list_articles))
        .route("/articles/{slug}", get(article_detail))
        .route("/faqs", get(faqs))
        .route("/about", get(about))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LocaleQuery {
    locale: Option<String>,
}

impl LocaleQuery {
    fn locale(&self) -> Locale {
        Locale::from_request(self.locale.as_deref())
    }
}

/// Query string values stay strings so junk input falls back to defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListQuery {
    page: Option<String>,
    limit: Option<String>,
    featured: Option<String>,
    locale: Option<String>,
}

impl ListQuery {
    fn locale(&self) -> Locale {
        Locale::from_request(self.locale.as_deref())
    }

    fn page(&self) -> PageRequest {
        let parse = |value: &Option<String>| value.as_deref().and_then(|v| v.trim().parse().ok());
        PageRequest::new(parse(&self.page), parse(&self.limit))
    }

    fn featured_only(&self) -> bool {
        self.featured.as_deref() == Some("true")
    }
}

async fn settings(
    State(state): State<PublicState>,
) -> Result<ApiSuccess<SiteSettingsRecord>, ApiError> {
    let settings = state
        .site
        .public_settings()
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(ApiSuccess::ok(Arc::unwrap_or_clone(settings)))
}

async fn quick_links(
    State(state): State<PublicState>,
    Query(query): Query<LocaleQuery>,
) -> Result<ApiSuccess<Vec<QuickLinkView>>, ApiError> {
    let locale = query.locale();
    let links = state
        .quick_links
        .public_links()
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    let views = links
        .iter()
        .map(|entry| QuickLinkView::from_entry(entry, locale))
        .collect();
    Ok(ApiSuccess::ok(views))
}

async fn list_products(
    State(state): State<PublicState>,
    Query(query): Query<ListQuery>,
) -> Result<ApiSuccess<Vec<ProductSummaryView>>, ApiError> {
    let locale = query.locale();
    let page = state
        .products
        .list(ProductQuery {
            published_only: true,
            featured_only: query.featured_only(),
            page: query.page(),
        })
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    let views = page.map(|product| ProductSummaryView::from_record(product, locale));
    Ok(ApiSuccess::paginated(views.items, views.meta))
}

async fn product_detail(
    State(state): State<PublicState>,
    Path(slug): Path<String>,
    Query(query): Query<LocaleQuery>,
) -> Result<ApiSuccess<ProductDetailView>, ApiError> {
    let product = state
        .products
        .get_by_slug(&slug)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(ApiSuccess::ok(ProductDetailView::from_record(
        &product,
        query.locale(),
    )))
}

async fn list_articles(
    State(state): State<PublicState>,
    Query(query): Query<ListQuery>,
) -> Result<ApiSuccess<Vec<ArticleSummaryView>>, ApiError> {
    let locale = query.locale();
    let page = state
        .articles
        .list(ArticleQuery {
            published_only: true,
            featured_only: query.featured_only(),
            page: query.page(),
        })
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    let views = page.map(|article| ArticleSummaryView::from_record(article, locale));
    Ok(ApiSuccess::paginated(views.items, views.meta))
}

async fn article_detail(
    State(state): State<PublicState>,
    Path(slug): Path<String>,
    Query(query): Query<LocaleQuery>,
) -> Result<ApiSuccess<ArticleDetailView>, ApiError> {
    let article = state
        .articles
        .get_by_slug(&slug)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(ApiSuccess::ok(ArticleDetailView::from_record(
        &article,
        query.locale(),
    )))
}

async fn faqs(
    State(state): State<PublicState>,
    Query(query): Query<LocaleQuery>,
) -> Result<ApiSuccess<Vec<FaqView>>, ApiError> {
    let locale = query.locale();
    let faqs = state
        .faqs
        .public_faqs()
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    let views = faqs
        .iter()
        .map(|faq| FaqView::from_record(faq, locale))
        .collect();
    Ok(ApiSuccess::ok(views))
}

async fn about(
    State(state): State<PublicState>,
    Query(query): Query<LocaleQuery>,
) -> Result<ApiSuccess<AboutPageView>, ApiError> {
    let page = state
        .about
        .public_about()
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(ApiSuccess::ok(AboutPageView::from_record(
        &page,
        query.locale(),
    )))
}

pub(super) async fn health(State(state): State<PublicState>) -> Response {
    match state.health.health_check().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
