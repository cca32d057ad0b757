//! Shared domain enumerations aligned with persisted database enums.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Destination kind of a quick-contact link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "quick_link_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuickLinkType {
    Whatsapp,
    Facebook,
    Line,
    Phone,
    Email,
    Custom,
}

impl QuickLinkType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Whatsapp => "WHATSAPP",
            Self::Facebook => "FACEBOOK",
            Self::Line => "LINE",
            Self::Phone => "PHONE",
            Self::Email => "EMAIL",
            Self::Custom => "CUSTOM",
        }
    }

    /// Lowercase form used for derived identifiers such as `virtual-whatsapp`.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Whatsapp => "whatsapp",
            Self::Facebook => "facebook",
            Self::Line => "line",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Custom => "custom",
        }
    }
}

impl Display for QuickLinkType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of record surfaced in the dashboard activity feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityResource {
    Product,
    Article,
}

impl ActivityResource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Product => "Product",
            Self::Article => "Article",
        }
    }

    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Product => "prod",
            Self::Article => "art",
        }
    }
}
