use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::application::caches::ContentCaches;
use crate::application::error::ContentError;
use crate::application::pagination::{Page, PageRequest, PaginationMeta};
use crate::application::repos::{ListFilter, ProductsRepo, UpdateProductPublicationParams};
use crate::cache::keys;
use crate::domain::entities::ProductRecord;
use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductQuery {
    pub published_only: bool,
    pub featured_only: bool,
    pub page: PageRequest,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            published_only: true,
            featured_only: false,
            page: PageRequest::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct UpdatePublicationCommand {
    #[serde(default)]
    pub is_published: Option<bool>,
    #[serde(default)]
    pub is_featured: Option<bool>,
}

#[derive(Clone)]
pub struct ProductService {
    repo: Arc<dyn ProductsRepo>,
    caches: Arc<ContentCaches>,
}

impl ProductService {
    pub fn new(repo: Arc<dyn ProductsRepo>, caches: Arc<ContentCaches>) -> Self {
        Self { repo, caches }
    }

    pub async fn list(&self, query: ProductQuery) -> Result<Arc<Page<ProductRecord>>, ContentError> {
        let key = keys::product_list(
            query.published_only,
            query.featured_only,
            query.page.page(),
            query.page.limit(),
        );
        let filter = ListFilter {
            published_only: query.published_only,
            featured_only: query.featured_only,
        };

        self.caches
            .products
            .get_or_compute(&key, self.caches.ttl(), || async {
                let items = self.repo.list_products(filter, query.page).await?;
                let total = self.repo.count_products(filter).await?;
                Ok::<_, ContentError>(Arc::new(Page {
                    items,
                    meta: PaginationMeta::new(query.page, total),
                }))
            })
            .await
    }

    /// A published product by slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Arc<ProductRecord>, ContentError> {
        let key = keys::product_detail(slug);
        self.caches
            .product_details
            .get_or_compute(&key, self.caches.ttl(), || async {
                let found = self
                    .repo
                    .find_product_by_slug(slug)
                    .await
                    .map_err(ContentError::from)?;
                found
                    .filter(|product| product.is_published)
                    .map(Arc::new)
                    .ok_or_else(|| ContentError::not_found("product"))
            })
            .await
    }

    pub async fn update_publication(
        &self,
        id: Uuid,
        command: UpdatePublicationCommand,
    ) -> Result<ProductRecord, ContentError> {
        if command.is_published.is_none() && command.is_featured.is_none() {
            return Err(DomainError::invalid(
                "publication",
                "set `is_published`, `is_featured`, or both",
            )
            .into());
        }

        let product = self
            .repo
            .update_publication(UpdateProductPublicationParams {
                id,
                is_published: command.is_published,
                is_featured: command.is_featured,
            })
            .await
            .map_err(|err| ContentError::from_repo("product", err))?;

        self.caches.products.delete_prefix(keys::PRODUCT_LIST_PREFIX);
        self.caches
            .product_details
            .delete(&keys::product_detail(&product.slug));
        info!(
            target = "namngam::application::products",
            product_id = %product.id,
            published = product.is_published,
            featured = product.is_featured,
            "product publication updated"
        );
        Ok(product)
    }
}
