//! NamNgam storefront backend: multilingual content over Postgres with a
//! read-through TTL cache, fixed-window rate limiting and locale fallback.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod rate_limit;
