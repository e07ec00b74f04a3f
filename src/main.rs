use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kursverwaltung::api::router;
use kursverwaltung::living_apps::{LivingAppsConfig, LivingAppsHttpClient};
use kursverwaltung::services::DashboardService;
use kursverwaltung::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "kursverwaltung=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = LivingAppsConfig::new_from_env()?;
    let client = Arc::new(LivingAppsHttpClient::new(config.clone())?);
    let dashboard = Arc::new(DashboardService::new(client, config));

    if let Err(err) = dashboard.reload().await {
        warn!("initial load failed, starting with empty state: {}", err);
    }

    let app = router(AppState { dashboard });

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
