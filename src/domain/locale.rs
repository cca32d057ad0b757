//! Locale selection with Lao fallback.
//!
//! Every storefront entity stores its human-readable text once per supported
//! language. Lao (`lo`) is the base locale that the data-entry layer always
//! fills; the other variants are optional. Resolution prefers the requested
//! locale and falls back to Lao when the requested variant is blank.
//!
//! Blankness is content-based: a string is blank when it is empty after
//! trimming, and a list is blank when it has no element that is non-empty
//! after trimming. A list of whitespace strings therefore falls back exactly
//! like an absent list.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Languages served by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Lo,
    Th,
    Zh,
    En,
}

impl Locale {
    /// Locale every mandatory field is guaranteed to carry.
    pub const BASE: Locale = Locale::Lo;

    pub const ALL: [Locale; 4] = [Locale::Lo, Locale::Th, Locale::Zh, Locale::En];

    pub fn code(self) -> &'static str {
        match self {
            Self::Lo => "lo",
            Self::Th => "th",
            Self::Zh => "zh",
            Self::En => "en",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|locale| locale.code().eq_ignore_ascii_case(code))
    }

    /// Resolve an optional request parameter, defaulting to the base locale
    /// for missing or unsupported codes.
    pub fn from_request(code: Option<&str>) -> Self {
        code.and_then(Self::from_code).unwrap_or(Self::BASE)
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported locale `{0}`")]
pub struct UnsupportedLocale(pub String);

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| UnsupportedLocale(s.to_string()))
    }
}

pub fn is_blank_text(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn is_blank_list<S: AsRef<str>>(values: &[S]) -> bool {
    values.iter().all(|item| is_blank_text(item.as_ref()))
}

/// One string per locale. Absent variants read as empty; a non-blank `lo`
/// is enforced by validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(default)]
    pub lo: String,
    #[serde(default)]
    pub th: String,
    #[serde(default)]
    pub zh: String,
    #[serde(default)]
    pub en: String,
}

impl LocalizedText {
    pub fn new(lo: impl Into<String>) -> Self {
        Self {
            lo: lo.into(),
            ..Default::default()
        }
    }

    pub fn with(mut self, locale: Locale, value: impl Into<String>) -> Self {
        *self.slot_mut(locale) = value.into();
        self
    }

    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::Lo => &self.lo,
            Locale::Th => &self.th,
            Locale::Zh => &self.zh,
            Locale::En => &self.en,
        }
    }

    fn slot_mut(&mut self, locale: Locale) -> &mut String {
        match locale {
            Locale::Lo => &mut self.lo,
            Locale::Th => &mut self.th,
            Locale::Zh => &mut self.zh,
            Locale::En => &mut self.en,
        }
    }

    pub fn resolve(&self, locale: Locale) -> &str {
        let requested = self.get(locale);
        if is_blank_text(requested) {
            &self.lo
        } else {
            requested
        }
    }

    /// True when every variant is blank, which mandatory fields must never be.
    pub fn is_blank(&self) -> bool {
        Locale::ALL
            .into_iter()
            .all(|locale| is_blank_text(self.get(locale)))
    }

    /// Copy with every variant trimmed.
    pub fn trimmed(&self) -> Self {
        Self {
            lo: self.lo.trim().to_string(),
            th: self.th.trim().to_string(),
            zh: self.zh.trim().to_string(),
            en: self.en.trim().to_string(),
        }
    }

    /// Copy with every variant cut to at most `max_chars` characters.
    pub fn truncated(&self, max_chars: usize) -> Self {
        let cut = |value: &str| value.chars().take(max_chars).collect::<String>();
        Self {
            lo: cut(&self.lo),
            th: cut(&self.th),
            zh: cut(&self.zh),
            en: cut(&self.en),
        }
    }

    pub fn map(&self, mut f: impl FnMut(&str) -> String) -> Self {
        Self {
            lo: f(&self.lo),
            th: f(&self.th),
            zh: f(&self.zh),
            en: f(&self.en),
        }
    }

    pub fn value(&self, locale: Locale) -> LocalizedValue<'_> {
        LocalizedValue::Text(self.get(locale))
    }
}

/// One list of strings per locale, used for benefits and usage steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedList {
    #[serde(default)]
    pub lo: Vec<String>,
    #[serde(default)]
    pub th: Vec<String>,
    #[serde(default)]
    pub zh: Vec<String>,
    #[serde(default)]
    pub en: Vec<String>,
}

impl LocalizedList {
    pub fn new(lo: Vec<String>) -> Self {
        Self {
            lo,
            ..Default::default()
        }
    }

    pub fn with(mut self, locale: Locale, values: Vec<String>) -> Self {
        match locale {
            Locale::Lo => self.lo = values,
            Locale::Th => self.th = values,
            Locale::Zh => self.zh = values,
            Locale::En => self.en = values,
        }
        self
    }

    pub fn get(&self, locale: Locale) -> &[String] {
        match locale {
            Locale::Lo => &self.lo,
            Locale::Th => &self.th,
            Locale::Zh => &self.zh,
            Locale::En => &self.en,
        }
    }

    pub fn resolve(&self, locale: Locale) -> &[String] {
        let requested = self.get(locale);
        if is_blank_list(requested) {
            &self.lo
        } else {
            requested
        }
    }

    pub fn value(&self, locale: Locale) -> LocalizedValue<'_> {
        LocalizedValue::List(self.get(locale))
    }
}

/// A borrowed localized field value as seen by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalizedValue<'a> {
    Text(&'a str),
    List(&'a [String]),
    Absent,
}

impl<'a> LocalizedValue<'a> {
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(value) => is_blank_text(value),
            Self::List(values) => is_blank_list(values),
            Self::Absent => true,
        }
    }

    /// Text content; lists and absent values read as the empty string.
    pub fn as_text(&self) -> &'a str {
        match *self {
            Self::Text(value) => value,
            Self::List(_) | Self::Absent => "",
        }
    }

    /// List content; text and absent values read as the empty list.
    pub fn as_list(&self) -> &'a [String] {
        match *self {
            Self::List(values) => values,
            Self::Text(_) | Self::Absent => &[],
        }
    }
}

/// Entities exposing per-locale variants of named fields.
pub trait Localized {
    /// The `field` variant for `locale`, or `None` when the entity has no such field.
    fn localized_field(&self, field: &str, locale: Locale) -> Option<LocalizedValue<'_>>;
}

/// Pick the best value of `field` for `locale`.
///
/// Returns the requested variant when it is not blank, otherwise the Lao
/// variant (which may itself be blank for optional fields). Unknown fields
/// resolve to [`LocalizedValue::Absent`].
pub fn resolve_field<'a, E>(entity: &'a E, field: &str, locale: Locale) -> LocalizedValue<'a>
where
    E: Localized + ?Sized,
{
    if let Some(value) = entity.localized_field(field, locale)
        && !value.is_blank()
    {
        return value;
    }

    entity
        .localized_field(field, Locale::BASE)
        .unwrap_or(LocalizedValue::Absent)
}
