use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::application::{
    about::{AboutService, UpdateAboutCommand},
    api_keys::{ApiKeyService, ApiPrincipal},
    articles::{ArticleService, CreateArticleCommand},
    dashboard::{DashboardService, DashboardSnapshot},
    faqs::{FaqService, UpdateFaqCommand},
    login::LoginService,
    products::{ProductService, UpdatePublicationCommand},
    quick_links::{QuickLinkCommand, QuickLinkService},
    site::{SiteService, UpdateSettingsCommand},
};
use crate::config::RateLimitSettings;
use crate::domain::{
    api_keys::ApiScope,
    entities::{
        AboutPageRecord, ArticleRecord, FaqRecord, ProductRecord, QuickLinkRecord,
        SiteSettingsRecord,
    },
};
use crate::rate_limit::RateLimiter;

use super::{
    RouterState,
    client_ip::ClientIp,
    error::ApiError,
    middleware::{admin_rate_limit, api_auth},
    response::ApiSuccess,
};

const SOURCE: &str = "infra::http::admin";

#[derive(Clone)]
pub struct AdminState {
    pub api_keys: ApiKeyService,
    pub login: LoginService,
    pub dashboard: DashboardService,
    pub articles: ArticleService,
    pub products: ProductService,
    pub site: SiteService,
    pub quick_links: QuickLinkService,
    pub faqs: FaqService,
    pub about: AboutService,
    pub limiter: Arc<RateLimiter>,
    pub budgets: RateLimitSettings,
}

pub fn router(state: AdminState) -> Router<RouterState> {
    let protected = Router::new()
        .route("/dashboard", get(dashboard))
        .route("/articles", post(create_article))
        .route("/products/{id}/publication", patch(update_publication))
        .route("/settings", get(load_settings).put(update_settings))
        .route("/quick-links", get(list_quick_links).post(create_quick_link))
        .route(
            "/quick-links/{id}",
            put(update_quick_link).delete(delete_quick_link),
        )
        .route("/faqs/{id}", put(update_faq).delete(delete_faq))
        .route("/about", get(load_about).put(update_about))
        .route_layer(from_fn_with_state(state.clone(), admin_rate_limit))
        .route_layer(from_fn_with_state(state, api_auth));

    Router::new().route("/login", post(login)).merge(protected)
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::from_json_rejection(SOURCE, rejection))
}

fn require(principal: &ApiPrincipal, scope: ApiScope) -> Result<(), ApiError> {
    principal
        .requires(scope)
        .map_err(|err| ApiError::from_auth(SOURCE, err))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    api_key: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    key_id: Uuid,
    name: String,
    scopes: Vec<ApiScope>,
}

async fn login(
    State(state): State<AdminState>,
    ClientIp(client_ip): ClientIp,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ApiSuccess<LoginResponse>, ApiError> {
    let request = json_body(payload)?;
    let principal = state
        .login
        .login(&client_ip, request.api_key.trim())
        .await
        .map_err(|err| ApiError::from_login(SOURCE, err))?;

    Ok(ApiSuccess::ok(LoginResponse {
        key_id: principal.key_id,
        name: principal.name,
        scopes: principal.scopes,
    }))
}

async fn dashboard(
    State(state): State<AdminState>,
    Extension(principal): Extension<ApiPrincipal>,
) -> Result<ApiSuccess<DashboardSnapshot>, ApiError> {
    require(&principal, ApiScope::DashboardRead)?;
    let snapshot = state
        .dashboard
        .snapshot()
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(ApiSuccess::ok(snapshot))
}

async fn create_article(
    State(state): State<AdminState>,
    Extension(principal): Extension<ApiPrincipal>,
    ClientIp(client_ip): ClientIp,
    payload: Result<Json<CreateArticleCommand>, JsonRejection>,
) -> Result<ApiSuccess<ArticleRecord>, ApiError> {
    let budget = state.budgets.article_create;
    let decision = state
        .limiter
        .check(&format!("article-create:{client_ip}"), budget);
    if !decision.success {
        return Err(ApiError::rate_limited(SOURCE, budget.retry_after_secs()));
    }

    require(&principal, ApiScope::ContentWrite)?;
    let command = json_body(payload)?;
    let article = state
        .articles
        .create(&principal.actor(), command)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;

    info!(
        target = "namngam::http::admin",
        slug = %article.slug,
        actor = %principal.actor(),
        remaining = decision.remaining,
        "article created"
    );
    Ok(ApiSuccess::created(article))
}

async fn update_publication(
    State(state): State<AdminState>,
    Extension(principal): Extension<ApiPrincipal>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdatePublicationCommand>, JsonRejection>,
) -> Result<ApiSuccess<ProductRecord>, ApiError> {
    require(&principal, ApiScope::ContentWrite)?;
    let command = json_body(payload)?;
    let product = state
        .products
        .update_publication(id, command)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(ApiSuccess::ok(product))
}

async fn load_settings(
    State(state): State<AdminState>,
    Extension(principal): Extension<ApiPrincipal>,
) -> Result<ApiSuccess<SiteSettingsRecord>, ApiError> {
    require(&principal, ApiScope::SettingsWrite)?;
    let settings = state
        .site
        .load()
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(ApiSuccess::ok(settings))
}

async fn update_settings(
    State(state): State<AdminState>,
    Extension(principal): Extension<ApiPrincipal>,
    payload: Result<Json<UpdateSettingsCommand>, JsonRejection>,
) -> Result<ApiSuccess<SiteSettingsRecord>, ApiError> {
    require(&principal, ApiScope::SettingsWrite)?;
    let command = json_body(payload)?;
    let settings = state
        .site
        .update_settings(command)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(ApiSuccess::ok(settings))
}

async fn list_quick_links(
    State(state): State<AdminState>,
    Extension(principal): Extension<ApiPrincipal>,
) -> Result<ApiSuccess<Vec<QuickLinkRecord>>, ApiError> {
    require(&principal, ApiScope::SettingsWrite)?;
    let links = state
        .quick_links
        .list_all()
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(ApiSuccess::ok(links))
}

async fn create_quick_link(
    State(state): State<AdminState>,
    Extension(principal): Extension<ApiPrincipal>,
    payload: Result<Json<QuickLinkCommand>, JsonRejection>,
) -> Result<ApiSuccess<QuickLinkRecord>, ApiError> {
    require(&principal, ApiScope::SettingsWrite)?;
    let command = json_body(payload)?;
    let link = state
        .quick_links
        .create(command)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(ApiSuccess::created(link))
}

async fn update_quick_link(
    State(state): State<AdminState>,
    Extension(principal): Extension<ApiPrincipal>,
    Path(id): Path<Uuid>,
    payload: Result<Json<QuickLinkCommand>, JsonRejection>,
) -> Result<ApiSuccess<QuickLinkRecord>, ApiError> {
    require(&principal, ApiScope::SettingsWrite)?;
    let command = json_body(payload)?;
    let link = state
        .quick_links
        .update(id, command)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(ApiSuccess::ok(link))
}

async fn delete_quick_link(
    State(state): State<AdminState>,
    Extension(principal): Extension<ApiPrincipal>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    require(&principal, ApiScope::SettingsWrite)?;
    state
        .quick_links
        .delete(id)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn update_faq(
    State(state): State<AdminState>,
    Extension(principal): Extension<ApiPrincipal>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateFaqCommand>, JsonRejection>,
) -> Result<ApiSuccess<FaqRecord>, ApiError> {
    require(&principal, ApiScope::ContentWrite)?;
    let command = json_body(payload)?;
    let faq = state
        .faqs
        .update(id, command)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(ApiSuccess::ok(faq))
}

async fn delete_faq(
    State(state): State<AdminState>,
    Extension(principal): Extension<ApiPrincipal>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    require(&principal, ApiScope::ContentWrite)?;
    state
        .faqs
        .delete(id)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn load_about(
    State(state): State<AdminState>,
    Extension(principal): Extension<ApiPrincipal>,
) -> Result<ApiSuccess<AboutPageRecord>, ApiError> {
    require(&principal, ApiScope::ContentWrite)?;
    let page = state
        .about
        .public_about()
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(ApiSuccess::ok(Arc::unwrap_or_clone(page)))
}

/// Replaces the page; a `values` list is reconciled by id.
async fn update_about(
    State(state): State<AdminState>,
    Extension(principal): Extension<ApiPrincipal>,
    payload: Result<Json<UpdateAboutCommand>, JsonRejection>,
) -> Result<ApiSuccess<AboutPageRecord>, ApiError> {
    require(&principal, ApiScope::ContentWrite)?;
    let command = json_body(payload)?;
    let page = state
        .about
        .update(command)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(ApiSuccess::ok(page))
}
