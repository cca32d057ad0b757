use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::application::caches::ContentCaches;
use crate::application::error::ContentError;
use crate::application::repos::{FaqsRepo, UpdateFaqParams};
use crate::cache::keys;
use crate::domain::entities::FaqRecord;
use crate::domain::error::require_base_locale;
use crate::domain::locale::LocalizedText;

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateFaqCommand {
    pub question: LocalizedText,
    #[serde(default)]
    pub answer: LocalizedText,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Clone)]
pub struct FaqService {
    repo: Arc<dyn FaqsRepo>,
    caches: Arc<ContentCaches>,
}

impl FaqService {
    pub fn new(repo: Arc<dyn FaqsRepo>, caches: Arc<ContentCaches>) -> Self {
        Self { repo, caches }
    }

    pub async fn public_faqs(&self) -> Result<Arc<Vec<FaqRecord>>, ContentError> {
        self.caches
            .faqs
            .get_or_compute(keys::PUBLIC_FAQS, self.caches.ttl(), || async {
                let faqs = self.repo.list_active_faqs().await?;
                Ok::<_, ContentError>(Arc::new(faqs))
            })
            .await
    }

    pub async fn update(
        &self,
        id: Uuid,
        command: UpdateFaqCommand,
    ) -> Result<FaqRecord, ContentError> {
        let question = command.question.trimmed();
        require_base_locale("question", &question)?;

        let faq = self
            .repo
            .update_faq(UpdateFaqParams {
                id,
                question,
                answer: command.answer.map(ammonia::clean),
                category_id: command.category_id,
                order: command.order,
                is_active: command.is_active,
            })
            .await
            .map_err(|err| ContentError::from_repo("faq", err))?;

        self.caches.faqs.delete(keys::PUBLIC_FAQS);
        Ok(faq)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ContentError> {
        if !self.repo.delete_faq(id).await? {
            return Err(ContentError::not_found("faq"));
        }
        self.caches.faqs.delete(keys::PUBLIC_FAQS);
        Ok(())
    }
}
