//! Back-office dashboard statistics.

use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;

use crate::application::error::ContentError;
use crate::application::repos::{ActivityRecord, ContentCounts, DashboardRepo};
use crate::domain::locale::Locale;
use crate::domain::types::ActivityResource;

/// Rows fetched per resource before merging.
const PER_RESOURCE_ACTIVITY: u32 = 3;
const ACTIVITY_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct ActivityItem {
    pub id: String,
    pub resource: &'static str,
    pub description: String,
    pub is_published: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl ActivityItem {
    fn from_record(record: &ActivityRecord) -> Self {
        let title = record.title.resolve(Locale::En);
        let resource = record.resource.as_str();
        Self {
            id: format!("{}-{}", record.resource.id_prefix(), record.id),
            resource,
            description: format!("{resource} \"{title}\" was updated"),
            is_published: record.is_published,
            timestamp: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub total_products: u64,
    pub published_products: u64,
    pub total_articles: u64,
    pub published_articles: u64,
    pub total_faqs: u64,
    pub total_quick_links: u64,
    pub recent_activity: Vec<ActivityItem>,
}

#[derive(Clone)]
pub struct DashboardService {
    repo: Arc<dyn DashboardRepo>,
}

impl DashboardService {
    pub fn new(repo: Arc<dyn DashboardRepo>) -> Self {
        Self { repo }
    }

    pub async fn snapshot(&self) -> Result<DashboardSnapshot, ContentError> {
        let counts = self.repo.content_counts().await?;
        let activity = self.repo.recent_activity(PER_RESOURCE_ACTIVITY).await?;
        Ok(build_snapshot(counts, activity))
    }
}

fn build_snapshot(counts: ContentCounts, mut activity: Vec<ActivityRecord>) -> DashboardSnapshot {
    activity.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    let recent_activity = activity
        .iter()
        .take(ACTIVITY_LIMIT)
        .map(ActivityItem::from_record)
        .collect();

    DashboardSnapshot {
        total_products: counts.products,
        published_products: counts.published_products,
        total_articles: counts.articles,
        published_articles: counts.published_articles,
        total_faqs: counts.faqs,
        total_quick_links: counts.quick_links,
        recent_activity,
    }
}
