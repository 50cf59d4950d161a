use std::sync::Arc;

use anyhow::{Context, Result};
use gist::{
    acquisition::AcquisitionPipeline,
    challenge::{ChallengeSolver, SolverConfig},
    config::Config,
    fetcher::{BrowserProfile, FetchConfig, FingerprintedFetcher, HostChallengeCache},
    repositories::{EntryRepository, PgEntryRepository},
    scheduler::{BackfillConfig, ReadableBackfill, RefreshScheduler, SchedulerConfig},
};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(config.database_url())
        .await
        .context("connecting to database")?;
    let repo: Arc<dyn EntryRepository> = Arc::new(PgEntryRepository::new(pool.clone()));

    // One outbound session and cookie cache for the whole process
    let cache = Arc::new(HostChallengeCache::new());
    let fetcher = Arc::new(FingerprintedFetcher::new(
        FetchConfig {
            profile: BrowserProfile::chrome().with_user_agent(config.user_agent()),
            request_timeout: config.request_timeout(),
            ..Default::default()
        },
        cache,
    )?);
    let solver = Arc::new(ChallengeSolver::new(fetcher.clone(), SolverConfig::default()));
    let pipeline = AcquisitionPipeline::new(repo.clone(), fetcher, solver);

    let backfill = ReadableBackfill::new(
        repo,
        pipeline,
        BackfillConfig {
            concurrency: config.backfill_concurrency(),
            batch_size: config.backfill_batch_size(),
        },
    );

    let mut scheduler = RefreshScheduler::new(
        Arc::new(backfill),
        SchedulerConfig {
            interval: config.refresh_interval(),
            cycle_deadline: config.refresh_deadline(),
        },
    );
    scheduler.start()?;

    signal::ctrl_c().await.context("listening for shutdown signal")?;
    info!("Received shutdown signal, stopping scheduler...");

    scheduler.stop().await;
    // Last owners of the session and pool
    drop(scheduler);
    pool.close().await;
    info!("Shutdown complete");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}
