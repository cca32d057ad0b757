//! Application services: caching, validation and orchestration over repositories.

pub mod about;
pub mod api_keys;
pub mod articles;
pub mod caches;
pub mod dashboard;
pub mod error;
pub mod faqs;
pub mod login;
pub mod pagination;
pub mod products;
pub mod quick_links;
pub mod repos;
pub mod site;
pub mod views;
