//! One-shot bulk sync, meant for cron or a scheduler.
//!
//! Exits non-zero only when the store is unreachable; per-configuration failures are logged
//! and recorded as activities.

use adpulse::config::Config;
use adpulse::providers::google_ads::GoogleAdsConnector;
use adpulse::sync::{ManualSyncSummary, MetricsSyncEngine, SyncOptions};
use adpulse::vault::CredentialVault;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "adpulse-sync")]
#[command(version)]
#[command(about = "Refresh cached Google Ads campaigns and metrics for every configuration", long_about = None)]
struct Cli {
    /// Sync even when the cache is still fresh
    #[arg(long)]
    force: bool,

    /// Backfill this many years of daily metrics (clamped to 1..=5)
    #[arg(long, value_name = "YEARS")]
    historical: Option<u32>,

    /// Skip the campaign list refresh
    #[arg(long)]
    skip_campaigns: bool,

    /// Skip the metrics refresh
    #[arg(long)]
    skip_metrics: bool,

    /// Print a fresh base64 encryption key for `basic.encryption_key` and exit
    #[arg(long)]
    generate_key: bool,
}

impl Cli {
    fn options(&self) -> SyncOptions {
        SyncOptions {
            force_sync: self.force,
            sync_campaigns: !self.skip_campaigns,
            sync_metrics: !self.skip_metrics,
            date_range: None,
            historical_years: self.historical,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.generate_key {
        println!("{}", CredentialVault::generate_key());
        return ExitCode::SUCCESS;
    }

    let cfg = Config::from_toml();
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let vault = match CredentialVault::from_base64_key(&cfg.basic.encryption_key) {
        Ok(vault) => Arc::new(vault),
        Err(e) => {
            error!(error = %e, "Invalid basic.encryption_key");
            return ExitCode::FAILURE;
        }
    };
    let db = adpulse::db::spawn(&cfg.basic.database_url).await;
    let connector = Arc::new(GoogleAdsConnector::new(Arc::new(cfg.google_ads())));
    let engine = MetricsSyncEngine::new(db, vault, connector, Arc::new(cfg.sync.clone()));

    let results = match engine.sync_all_configurations(&cli.options()).await {
        Ok(results) => results,
        Err(e) => {
            error!(error = %e, "Bulk sync aborted: configurations could not be listed");
            return ExitCode::FAILURE;
        }
    };

    let summary = ManualSyncSummary::from_results(results);
    let skipped = summary.configurations.iter().filter(|r| r.skipped).count();
    for failed in summary.configurations.iter().filter(|r| !r.success) {
        warn!(
            config_id = failed.config_id,
            user_id = %failed.user_id,
            errors = ?failed.errors,
            "Configuration sync failed"
        );
    }
    info!(
        configurations = summary.configurations.len(),
        skipped,
        campaigns = summary.total_campaigns,
        metrics = summary.total_metrics,
        success = summary.success,
        "Bulk sync finished"
    );
    ExitCode::SUCCESS
}
