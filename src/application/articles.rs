//! Articles: cached public listings and back-office creation.

use std::sync::Arc;

use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::application::caches::ContentCaches;
use crate::application::error::ContentError;
use crate::application::pagination::{Page, PageRequest, PaginationMeta};
use crate::application::repos::{ArticlesRepo, CreateArticleParams, ListFilter};
use crate::cache::keys;
use crate::domain::entities::ArticleRecord;
use crate::domain::error::{DomainError, require_base_locale};
use crate::domain::locale::LocalizedText;
use crate::domain::slug::{SlugAsyncError, derive_title_slug, unique_slug_async};

pub const EXCERPT_MAX_CHARS: usize = 500;
pub const META_TITLE_MAX_CHARS: usize = 60;
pub const META_DESC_MAX_CHARS: usize = 160;

/// Listing parameters as received from the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleQuery {
    pub published_only: bool,
    pub featured_only: bool,
    pub page: PageRequest,
}

impl Default for ArticleQuery {
    fn default() -> Self {
        Self {
            published_only: true,
            featured_only: false,
            page: PageRequest::default(),
        }
    }
}

impl ArticleQuery {
    fn filter(&self) -> ListFilter {
        ListFilter {
            published_only: self.published_only,
            featured_only: self.featured_only,
        }
    }

    fn cache_key(&self) -> String {
        keys::article_list(
            self.published_only,
            self.featured_only,
            self.page.page(),
            self.page.limit(),
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateArticleCommand {
    pub title: LocalizedText,
    pub content: LocalizedText,
    pub excerpt: LocalizedText,
    pub meta_title: LocalizedText,
    pub meta_desc: LocalizedText,
    pub featured_image: Option<String>,
    pub is_published: bool,
    pub is_featured: bool,
}

#[derive(Clone)]
pub struct ArticleService {
    repo: Arc<dyn ArticlesRepo>,
    caches: Arc<ContentCaches>,
}

impl ArticleService {
    pub fn new(repo: Arc<dyn ArticlesRepo>, caches: Arc<ContentCaches>) -> Self {
        Self { repo, caches }
    }

    pub async fn list(&self, query: ArticleQuery) -> Result<Arc<Page<ArticleRecord>>, ContentError> {
        let key = query.cache_key();
        self.caches
            .articles
            .get_or_compute(&key, self.caches.ttl(), || async {
                let filter = query.filter();
                let items = self.repo.list_articles(filter, query.page).await?;
                let total = self.repo.count_articles(filter).await?;
                Ok::<_, ContentError>(Arc::new(Page {
                    items,
                    meta: PaginationMeta::new(query.page, total),
                }))
            })
            .await
    }

    /// A published article by slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Arc<ArticleRecord>, ContentError> {
        let key = keys::article_detail(slug);
        self.caches
            .article_details
            .get_or_compute(&key, self.caches.ttl(), || async {
                let found = self
                    .repo
                    .find_article_by_slug(slug)
                    .await
                    .map_err(ContentError::from)?;
                found
                    .filter(|article| article.is_published)
                    .map(Arc::new)
                    .ok_or_else(|| ContentError::not_found("article"))
            })
            .await
    }

    pub async fn create(
        &self,
        actor: &str,
        command: CreateArticleCommand,
    ) -> Result<ArticleRecord, ContentError> {
        let prepared = prepare(command)?;

        let base = derive_title_slug(&prepared.title)?;
        let repo = self.repo.clone();
        let slug = unique_slug_async(base, move |candidate| {
            let repo = repo.clone();
            async move {
                repo.find_article_by_slug(&candidate)
                    .await
                    .map(|existing| existing.is_none())
            }
        })
        .await
        .map_err(|err| match err {
            SlugAsyncError::Slug(inner) => ContentError::Slug(inner),
            SlugAsyncError::Predicate(inner) => ContentError::Repo(inner),
        })?;

        let published_at = prepared.is_published.then(OffsetDateTime::now_utc);
        let article = self
            .repo
            .create_article(CreateArticleParams {
                slug,
                title: prepared.title,
                content: prepared.content,
                excerpt: prepared.excerpt,
                meta_title: prepared.meta_title,
                meta_desc: prepared.meta_desc,
                featured_image: prepared.featured_image,
                is_published: prepared.is_published,
                is_featured: prepared.is_featured,
                published_at,
                created_by: actor.to_string(),
            })
            .await?;

        let dropped = self.caches.articles.delete_prefix(keys::ARTICLE_LIST_PREFIX);
        debug!(
            target = "namngam::application::articles",
            dropped, "article listing cache invalidated"
        );
        info!(
            target = "namngam::application::articles",
            article_id = %article.id,
            slug = %article.slug,
            published = article.is_published,
            actor,
            "article created"
        );

        Ok(article)
    }
}

/// Validate and normalise a create command.
fn prepare(command: CreateArticleCommand) -> Result<CreateArticleCommand, DomainError> {
    let title = command.title.trimmed();
    require_base_locale("title", &title)?;
    if title.en.is_empty() {
        return Err(DomainError::MissingEnglish { field: "title" });
    }

    let featured_image = command
        .featured_image
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    Ok(CreateArticleCommand {
        title,
        content: command.content.map(ammonia::clean),
        excerpt: command.excerpt.truncated(EXCERPT_MAX_CHARS),
        meta_title: command.meta_title.truncated(META_TITLE_MAX_CHARS),
        meta_desc: command.meta_desc.truncated(META_DESC_MAX_CHARS),
        featured_image,
        is_published: command.is_published,
        is_featured: command.is_featured,
    })
}
