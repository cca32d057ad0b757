//! Cache key construction.
//!
//! Keys encode every query parameter that shapes the cached value, so two
//! distinct queries can never share an entry.

pub const PUBLIC_SITE_SETTINGS: &str = "public_site_settings";
pub const PUBLIC_QUICK_LINKS: &str = "public_quick_links";
pub const PUBLIC_FAQS: &str = "public_faqs";
pub const PUBLIC_ABOUT: &str = "public_about";

/// Prefix shared by every article listing page.
pub const ARTICLE_LIST_PREFIX: &str = "articles:";
pub const ARTICLE_DETAIL_PREFIX: &str = "article:";
/// Prefix shared by every product listing page.
pub const PRODUCT_LIST_PREFIX: &str = "products:";
pub const PRODUCT_DETAIL_PREFIX: &str = "product:";

pub fn article_list(published: bool, featured: bool, page: u32, limit: u32) -> String {
    format!("{ARTICLE_LIST_PREFIX}{published}:{featured}:{page}:{limit}")
}

pub fn article_detail(slug: &str) -> String {
    format!("{ARTICLE_DETAIL_PREFIX}{slug}")
}

pub fn product_list(published: bool, featured: bool, page: u32, limit: u32) -> String {
    format!("{PRODUCT_LIST_PREFIX}{published}:{featured}:{page}:{limit}")
}

pub fn product_detail(slug: &str) -> String {
    format!("{PRODUCT_DETAIL_PREFIX}{slug}")
}
