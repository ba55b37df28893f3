use adpulse::config::Config;
use adpulse::providers::google_ads::GoogleAdsConnector;
use adpulse::server::router::{AdpulseState, adpulse_router};
use adpulse::sync::MetricsSyncEngine;
use adpulse::vault::CredentialVault;
use mimalloc::MiMalloc;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
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

    let ads_cfg = Arc::new(cfg.google_ads());
    info!(
        database_url = %cfg.basic.database_url,
        proxy = %ads_cfg.proxy.as_ref().map_or("<none>", |u| u.as_str()),
        loglevel = %cfg.basic.loglevel,
        listen_addr = %cfg.basic.listen_addr,
        listen_port = cfg.basic.listen_port,
        api_version = %ads_cfg.api_version,
        max_age_hours = cfg.sync.max_age_hours,
        "Configuration loaded"
    );

    let vault = Arc::new(CredentialVault::from_base64_key(&cfg.basic.encryption_key)?);
    let db = adpulse::db::spawn(&cfg.basic.database_url).await;
    let connector = Arc::new(GoogleAdsConnector::new(ads_cfg));
    let engine = MetricsSyncEngine::new(db.clone(), vault, connector, Arc::new(cfg.sync.clone()));

    let state = AdpulseState::new(db, engine, Arc::from(cfg.basic.adpulse_key.as_str()));
    let app = adpulse_router(state);

    let addr = SocketAddr::from((cfg.basic.listen_addr, cfg.basic.listen_port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server has shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
