//! The About page: brand story, founder block and value cards.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::application::caches::ContentCaches;
use crate::application::error::ContentError;
use crate::application::repos::{AboutRepo, SaveAboutPageParams, SaveAboutValueParams};
use crate::cache::keys;
use crate::domain::entities::AboutPageRecord;
use crate::domain::error::{DomainError, require_base_locale};
use crate::domain::locale::{Locale, LocalizedText};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateAboutCommand {
    pub title: LocalizedText,
    pub story_title: LocalizedText,
    pub story_paragraph1: LocalizedText,
    pub story_paragraph2: LocalizedText,
    pub founder_name: LocalizedText,
    pub founder_quote: LocalizedText,
    pub background_image: String,
    pub founder_image: String,
    /// Omitted keeps the stored cards; an empty list removes them all.
    pub values: Option<Vec<AboutValueInput>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AboutValueInput {
    /// Absent for a new card.
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub icon: String,
    pub title: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
}

#[derive(Clone)]
pub struct AboutService {
    repo: Arc<dyn AboutRepo>,
    caches: Arc<ContentCaches>,
}

impl AboutService {
    pub fn new(repo: Arc<dyn AboutRepo>, caches: Arc<ContentCaches>) -> Self {
        Self { repo, caches }
    }

    /// The stored page, seeding the default one on first read.
    pub async fn public_about(&self) -> Result<Arc<AboutPageRecord>, ContentError> {
        self.caches
            .about
            .get_or_compute(keys::PUBLIC_ABOUT, self.caches.ttl(), || async {
                if let Some(page) = self.repo.load_about_page().await? {
                    return Ok::<_, ContentError>(Arc::new(page));
                }

                let seeded = self.repo.save_about_page(default_page()).await?;
                info!(
                    target = "namngam::application::about",
                    values = seeded.values.len(),
                    "default about page created"
                );
                Ok(Arc::new(seeded))
            })
            .await
    }

    pub async fn update(
        &self,
        command: UpdateAboutCommand,
    ) -> Result<AboutPageRecord, ContentError> {
        let params = prepare(command, OffsetDateTime::now_utc())?;
        let page = self.repo.save_about_page(params).await?;

        self.caches.about.delete(keys::PUBLIC_ABOUT);
        info!(
            target = "namngam::application::about",
            values = page.values.len(),
            "about page updated"
        );
        Ok(page)
    }
}

fn prepare(
    command: UpdateAboutCommand,
    now: OffsetDateTime,
) -> Result<SaveAboutPageParams, DomainError> {
    let values = match command.values {
        Some(inputs) => Some(prepare_values(inputs)?),
        None => None,
    };

    Ok(SaveAboutPageParams {
        title: command.title.trimmed(),
        story_title: command.story_title.trimmed(),
        story_paragraph1: command.story_paragraph1.trimmed(),
        story_paragraph2: command.story_paragraph2.trimmed(),
        founder_name: command.founder_name.trimmed(),
        founder_quote: command.founder_quote.trimmed(),
        background_image: command.background_image.trim().to_string(),
        founder_image: command.founder_image.trim().to_string(),
        values,
        updated_at: now,
    })
}

/// Cards take their position in the list as `order`; new cards get an id.
fn prepare_values(
    inputs: Vec<AboutValueInput>,
) -> Result<Vec<SaveAboutValueParams>, DomainError> {
    let mut seen = HashSet::new();
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            let title = input.title.trimmed();
            require_base_locale("values.title", &title)?;

            let id = input.id.unwrap_or_else(Uuid::new_v4);
            if !seen.insert(id) {
                return Err(DomainError::invalid("values.id", format!("`{id}` repeats")));
            }

            let order = i32::try_from(index)
                .map_err(|_| DomainError::invalid("values", "too many entries"))?;
            Ok(SaveAboutValueParams {
                id,
                icon: input.icon.trim().to_string(),
                title,
                description: input.description.trimmed(),
                order,
            })
        })
        .collect()
}

fn lo_en(lo: &str, en: &str) -> LocalizedText {
    LocalizedText::new(lo).with(Locale::En, en)
}

fn default_value(
    order: i32,
    icon: &str,
    title: LocalizedText,
    description: LocalizedText,
) -> SaveAboutValueParams {
    SaveAboutValueParams {
        id: Uuid::new_v4(),
        icon: icon.to_string(),
        title,
        description,
        order,
    }
}

/// Content served before anyone edits the page.
fn default_page() -> SaveAboutPageParams {
    SaveAboutPageParams {
        title: LocalizedText::default(),
        story_title: LocalizedText::default(),
        story_paragraph1: lo_en(
            "NAMNGAM ORIGINAL ເປັນແບຣນທີ່ມຸ່ງໝັ້ນໃນການນຳສະເໜີສິນຄ້າທີ່ມີຄຸນນະພາບ ແລະ ການບໍລິການທີ່ດີທີ່ສຸດໃຫ້ກັບລູກຄ້າທຸກທ່ານ.",
            "NAMNGAM ORIGINAL is a brand committed to presenting quality products and the best service to all our customers.",
        ),
        story_paragraph2: lo_en(
            "ພວກເຮົາເຊື່ອວ່າ ຄຸນນະພາບແລະຄວາມງາມທີ່ແທ້ຈິງ ແມ່ນສິ່ງທີ່ທຸກຄົນສົມຄວນໄດ້ຮັບ.",
            "We believe that true quality and beauty are what everyone deserves.",
        ),
        founder_name: LocalizedText::default(),
        founder_quote: LocalizedText::default(),
        background_image: String::new(),
        founder_image: String::new(),
        values: Some(vec![
            default_value(
                0,
                "💎",
                lo_en("ຄຸນນະພາບ", "Quality"),
                lo_en(
                    "ສິນຄ້າທຸກຊິ້ນຜ່ານການຄັດເລືອກຢ່າງພິຖີພິຖັນ",
                    "Every product is carefully selected",
                ),
            ),
            default_value(
                1,
                "✨",
                lo_en("ຄວາມງາມ", "Beauty"),
                lo_en("ອອກແບບສວຍງາມ ທັນສະໄໝ", "Beautiful design, modern style"),
            ),
            default_value(
                2,
                "🤝",
                lo_en("ບໍລິການ", "Service"),
                lo_en(
                    "ພ້ອມໃຫ້ຄຳປຶກສາ ດ້ວຍຄວາມເປັນມິດ",
                    "Ready to provide friendly consultation",
                ),
            ),
        ]),
        updated_at: OffsetDateTime::now_utc(),
    }
}
