#![forbid(unsafe_code)]

//! `lesson-admin`: lesson library administration server binary.
//!
//! Bootstraps configuration, the database, the retention task, the
//! platform mailer, and the HTTP API.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use lesson_admin::config::GlobalConfig;
use lesson_admin::http::{self, AppState};
use lesson_admin::persistence::db;
use lesson_admin::persistence::resolution_repo::ResolutionRepo;
use lesson_admin::persistence::retention;
use lesson_admin::platform::{Mailer, PlatformClient, RpcResolver, UnconfiguredResolver};
use lesson_admin::report::ReportGroupSource;
use lesson_admin::review::{DuplicateResolver, GroupSource};
use lesson_admin::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "lesson-admin",
    about = "Lesson library administration server",
    version,
    long_about = None
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("lesson-admin server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    config.load_credentials().await?;
    let config = Arc::new(config);
    info!(data_dir = %config.data_dir.display(), "configuration loaded");

    // ── Initialize database ─────────────────────────────
    let db = Arc::new(db::connect(&config.db_path()).await?);
    info!("database connected");

    // ── Background services ─────────────────────────────
    let ct = CancellationToken::new();
    let retention_handle =
        retention::spawn_retention_task(Arc::clone(&db), config.retention_days, ct.clone());
    info!("retention service started");

    let (mailer, resolver, mailer_handle): (Mailer, Arc<dyn DuplicateResolver>, _) =
        if config.platform.is_configured() {
            let client = PlatformClient::new(&config.platform)?;
            let (mailer, handle) = Mailer::start(client.clone(), ct.clone());
            info!(platform = client.base_url(), "platform client ready");
            (mailer, Arc::new(RpcResolver::new(client)), Some(handle))
        } else {
            warn!("platform not configured; email disabled and duplicate submits will fail");
            (Mailer::disabled(), Arc::new(UnconfiguredResolver), None)
        };

    let source: Arc<dyn GroupSource> = Arc::new(ReportGroupSource::new(
        config.report_path(),
        ResolutionRepo::new(Arc::clone(&db)),
    ));

    let state = Arc::new(AppState::new(
        Arc::clone(&config),
        &db,
        mailer,
        source,
        resolver,
    )?);

    // ── Start HTTP API ──────────────────────────────────
    let http_ct = ct.clone();
    let http_handle = tokio::spawn(async move {
        if let Err(err) = http::serve(state, http_ct).await {
            error!(%err, "http server failed");
        }
    });

    info!(port = config.http_port, "lesson-admin ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    let _ = tokio::join!(http_handle, retention_handle);
    if let Some(handle) = mailer_handle {
        let _ = handle.await;
    }
    info!("lesson-admin shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
