use std::{net::SocketAddr, process, sync::Arc, time::Duration};

use namngam::{
    application::{
        api_keys::{ApiKeyService, IssueApiKeyCommand},
        caches::ContentCaches,
        error::AppError,
    },
    cache::CacheConfig,
    config::{self, IssueKeyArgs, Settings},
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, RouterState},
        telemetry,
    },
    rate_limit::RateLimiter,
};
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::{net::TcpListener, signal, sync::oneshot, task::JoinHandle};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    let command = cli_args
        .command
        .unwrap_or_else(|| config::Command::Serve(Box::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(&settings).await,
        config::Command::IssueKey(args) => run_issue_key(&settings, args).await,
    }
}

async fn connect(settings: &Settings) -> Result<PgPool, AppError> {
    let url = settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool = PostgresRepositories::connect(url, settings.database.max_connections.get())
        .await
        .map_err(InfraError::from)?;
    Ok(pool)
}

async fn run_migrate(settings: &Settings) -> Result<(), AppError> {
    let pool = connect(settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;
    info!(target = "namngam::migrate", "migrations applied");
    Ok(())
}

async fn run_issue_key(settings: &Settings, args: IssueKeyArgs) -> Result<(), AppError> {
    let expires_at = match args.expires_in_days {
        Some(0) => return Err(AppError::validation("--expires-in-days must be positive")),
        Some(days) => Some(OffsetDateTime::now_utc() + time::Duration::days(i64::from(days))),
        None => None,
    };

    let pool = connect(settings).await?;
    let service = ApiKeyService::new(Arc::new(PostgresRepositories::new(pool)));
    let issued = service
        .issue(IssueApiKeyCommand {
            name: args.name,
            scopes: args.scopes,
            expires_at,
        })
        .await?;

    info!(
        target = "namngam::issue_key",
        key_id = %issued.record.id,
        prefix = %issued.record.prefix,
        "api key issued"
    );
    // The token is unrecoverable after this point; only its hash is stored.
    println!("{}", issued.token);
    Ok(())
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    let pool = connect(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    let store = Arc::new(PostgresRepositories::new(pool));
    let caches = Arc::new(ContentCaches::new(&CacheConfig::from(&settings.cache)));
    let limiter = Arc::new(RateLimiter::new(
        settings.rate_limit.max_tracked_keys.get(),
        settings.rate_limit.failure_policy,
    ));
    let sweeper = spawn_sweeper(
        caches.clone(),
        limiter.clone(),
        settings.cache.sweep_interval,
    );

    let state = RouterState::new(store, caches, limiter, settings.rate_limit)
        .with_trusted_proxies(settings.server.trusted_proxies.clone());
    let router = http::build_router(state);

    let listener = TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| InfraError::bind(settings.server.addr, err))?;
    info!(
        target = "namngam::serve",
        addr = %settings.server.addr,
        "listening"
    );

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = stop_rx.await;
        })
        .await
    });

    let result = tokio::select! {
        joined = &mut server => flatten_server(joined),
        () = shutdown_signal() => {
            info!(target = "namngam::serve", "shutdown requested, draining connections");
            let _ = stop_tx.send(());
            match tokio::time::timeout(settings.server.graceful_shutdown, &mut server).await {
                Ok(joined) => flatten_server(joined),
                Err(_) => {
                    warn!(
                        target = "namngam::serve",
                        grace_secs = settings.server.graceful_shutdown.as_secs(),
                        "graceful shutdown timed out"
                    );
                    server.abort();
                    Ok(())
                }
            }
        }
    };

    sweeper.abort();
    result
}

fn flatten_server(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match joined {
        Ok(result) => result.map_err(|err| AppError::from(InfraError::from(err))),
        Err(err) => Err(AppError::from(InfraError::Server(std::io::Error::other(err)))),
    }
}

/// Periodically drop expired cache entries and idle limiter windows.
fn spawn_sweeper(
    caches: Arc<ContentCaches>,
    limiter: Arc<RateLimiter>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            let cache_removed = caches.sweep_expired();
            let windows_removed = limiter.sweep_expired();
            metrics::gauge!("namngam_rate_limit_tracked_keys").set(limiter.tracked_keys() as f64);
            if cache_removed > 0 || windows_removed > 0 {
                info!(
                    target = "namngam::sweeper",
                    cache_removed, windows_removed, "expired entries swept"
                );
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!(
            target = "namngam::serve",
            error = %err,
            "failed to listen for ctrl-c; running until killed"
        );
        std::future::pending::<()>().await;
    }
}
