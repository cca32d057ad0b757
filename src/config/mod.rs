//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::{IpAddr, SocketAddr},
    num::{NonZeroU32, NonZeroUsize},
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::rate_limit::{FailurePolicy, RateLimitBudget};

mod cli;

pub use cli::{
    CliArgs, Command, DatabaseOverride, IssueKeyArgs, MigrateArgs, ServeArgs, ServeOverrides,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "namngam";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_CACHE_CAPACITY: u64 = 1024;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_SWEEP_INTERVAL_SECS: u64 = 60;
const DEFAULT_MAX_TRACKED_KEYS: u64 = 10_000;
const DEFAULT_LOGIN_MAX_REQUESTS: u64 = 5;
const DEFAULT_LOGIN_WINDOW_SECS: u64 = 900;
const DEFAULT_ARTICLE_CREATE_MAX_REQUESTS: u64 = 5;
const DEFAULT_ARTICLE_CREATE_WINDOW_SECS: u64 = 900;
const DEFAULT_ADMIN_API_MAX_REQUESTS: u64 = 120;
const DEFAULT_ADMIN_API_WINDOW_SECS: u64 = 60;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub rate_limit: RateLimitSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
    pub trusted_proxies: TrustedProxies,
}

/// Peers allowed to report the client address through `X-Forwarded-For`
/// or `X-Real-IP`. Rate-limit keys follow whatever address is believed,
/// so a peer trusted here can spread its requests over any number of
/// budgets by rewriting those headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TrustedProxies {
    /// Forwarding headers are ignored and the socket peer is the client.
    /// Behind a proxy this puts every visitor in the proxy's budget.
    #[default]
    None,
    /// Every peer is believed. Only sound when the listener is reachable
    /// solely through a proxy that overwrites the headers.
    Any,
    /// Only these peers are believed.
    List(Vec<IpAddr>),
}

impl TrustedProxies {
    pub fn trusts(&self, peer: Option<IpAddr>) -> bool {
        match self {
            Self::None => false,
            Self::Any => true,
            Self::List(proxies) => peer.is_some_and(|ip| proxies.contains(&ip)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub capacity: NonZeroUsize,
    pub default_ttl: Duration,
    pub sweep_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub max_tracked_keys: NonZeroUsize,
    pub failure_policy: FailurePolicy,
    pub login: RateLimitBudget,
    pub article_create: RateLimitBudget,
    pub admin_api: RateLimitBudget,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_tracked_keys: NonZeroUsize::new(DEFAULT_MAX_TRACKED_KEYS as usize)
                .unwrap_or(NonZeroUsize::MIN),
            failure_policy: FailurePolicy::Open,
            login: RateLimitBudget::new(
                DEFAULT_LOGIN_MAX_REQUESTS as u32,
                Duration::from_secs(DEFAULT_LOGIN_WINDOW_SECS),
            ),
            article_create: RateLimitBudget::new(
                DEFAULT_ARTICLE_CREATE_MAX_REQUESTS as u32,
                Duration::from_secs(DEFAULT_ARTICLE_CREATE_WINDOW_SECS),
            ),
            admin_api: RateLimitBudget::new(
                DEFAULT_ADMIN_API_MAX_REQUESTS as u32,
                Duration::from_secs(DEFAULT_ADMIN_API_WINDOW_SECS),
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("NAMNGAM").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Migrate(args)) => raw.apply_database_override(&args.database),
        Some(Command::IssueKey(args)) => raw.apply_database_override(&args.database),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
    rate_limit: RawRateLimitSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if !overrides.trusted_proxies.is_empty() {
            self.server.trusted_proxies = Some(overrides.trusted_proxies.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        if let Some(capacity) = overrides.cache_capacity {
            self.cache.capacity = Some(capacity);
        }
        if let Some(max) = overrides.rate_limit_login_max_requests {
            self.rate_limit.login.max_requests = Some(max);
        }
        if let Some(max) = overrides.rate_limit_article_create_max_requests {
            self.rate_limit.article_create.max_requests = Some(max);
        }
        if let Some(policy) = overrides.rate_limit_failure_policy.as_ref() {
            self.rate_limit.failure_policy = Some(policy.clone());
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            cache,
            rate_limit,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let database = build_database_settings(database)?;
        let cache = build_cache_settings(cache)?;
        let rate_limit = build_rate_limit_settings(rate_limit)?;

        Ok(Self {
            server,
            logging,
            database,
            cache,
            rate_limit,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
        trusted_proxies: build_trusted_proxies(server.trusted_proxies.unwrap_or_default())?,
    })
}

/// `["*"]` trusts every peer; otherwise each entry must be an IP address.
fn build_trusted_proxies(entries: Vec<String>) -> Result<TrustedProxies, LoadError> {
    let entries: Vec<String> = entries
        .iter()
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect();

    if entries.is_empty() {
        return Ok(TrustedProxies::None);
    }
    if entries.iter().any(|entry| entry == "*") {
        if entries.len() > 1 {
            return Err(LoadError::invalid(
                "server.trusted_proxies",
                "`*` cannot be combined with addresses",
            ));
        }
        return Ok(TrustedProxies::Any);
    }

    entries
        .iter()
        .map(|entry| {
            entry.parse::<IpAddr>().map_err(|err| {
                LoadError::invalid("server.trusted_proxies", format!("`{entry}`: {err}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(TrustedProxies::List)
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = database.url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let max_connections = database
        .max_connections
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);

    Ok(DatabaseSettings {
        url,
        max_connections: non_zero_u32(max_connections.into(), "database.max_connections")?,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let capacity = non_zero_usize(
        cache.capacity.unwrap_or(DEFAULT_CACHE_CAPACITY),
        "cache.capacity",
    )?;
    let default_ttl = non_zero_seconds(
        cache.default_ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS),
        "cache.default_ttl_seconds",
    )?;
    let sweep_interval = non_zero_seconds(
        cache
            .sweep_interval_seconds
            .unwrap_or(DEFAULT_CACHE_SWEEP_INTERVAL_SECS),
        "cache.sweep_interval_seconds",
    )?;

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        capacity,
        default_ttl,
        sweep_interval,
    })
}

fn build_rate_limit_settings(
    rate_limit: RawRateLimitSettings,
) -> Result<RateLimitSettings, LoadError> {
    let max_tracked_keys = non_zero_usize(
        rate_limit
            .max_tracked_keys
            .unwrap_or(DEFAULT_MAX_TRACKED_KEYS),
        "rate_limit.max_tracked_keys",
    )?;

    let failure_policy = match rate_limit.failure_policy.as_deref().map(str::trim) {
        None | Some("open") => FailurePolicy::Open,
        Some("closed") => FailurePolicy::Closed,
        Some(other) => {
            return Err(LoadError::invalid(
                "rate_limit.failure_policy",
                format!("expected `open` or `closed`, got `{other}`"),
            ));
        }
    };

    Ok(RateLimitSettings {
        max_tracked_keys,
        failure_policy,
        login: build_budget(
            rate_limit.login,
            DEFAULT_LOGIN_MAX_REQUESTS,
            DEFAULT_LOGIN_WINDOW_SECS,
            ("rate_limit.login.max_requests", "rate_limit.login.window_seconds"),
        )?,
        article_create: build_budget(
            rate_limit.article_create,
            DEFAULT_ARTICLE_CREATE_MAX_REQUESTS,
            DEFAULT_ARTICLE_CREATE_WINDOW_SECS,
            (
                "rate_limit.article_create.max_requests",
                "rate_limit.article_create.window_seconds",
            ),
        )?,
        admin_api: build_budget(
            rate_limit.admin_api,
            DEFAULT_ADMIN_API_MAX_REQUESTS,
            DEFAULT_ADMIN_API_WINDOW_SECS,
            (
                "rate_limit.admin_api.max_requests",
                "rate_limit.admin_api.window_seconds",
            ),
        )?,
    })
}

fn build_budget(
    raw: RawBudgetSettings,
    default_max: u64,
    default_window: u64,
    keys: (&'static str, &'static str),
) -> Result<RateLimitBudget, LoadError> {
    let max_requests = non_zero_u32(raw.max_requests.unwrap_or(default_max), keys.0)?;
    let window = non_zero_seconds(raw.window_seconds.unwrap_or(default_window), keys.1)?;
    Ok(RateLimitBudget::new(max_requests.get(), window))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
    trusted_proxies: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    capacity: Option<u64>,
    default_ttl_seconds: Option<u64>,
    sweep_interval_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRateLimitSettings {
    max_tracked_keys: Option<u64>,
    failure_policy: Option<String>,
    login: RawBudgetSettings,
    article_create: RawBudgetSettings,
    admin_api: RawBudgetSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBudgetSettings {
    max_requests: Option<u64>,
    window_seconds: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    let value: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))?;
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_zero_seconds(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
