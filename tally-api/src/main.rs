use std::net::SocketAddr;
use std::sync::Arc;
use tally_api::{app, AppState};
use tally_engine::ReconciliationEngine;
use tally_store::{SheetsLedgerStore, ShopifyOrderSource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally_api=debug,tally_engine=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = tally_store::Config::load().expect("Failed to load config");
    tracing::info!("Starting Tally API on port {}", config.server.port);

    let source = Arc::new(ShopifyOrderSource::new(&config.source));
    let store = Arc::new(SheetsLedgerStore::new(
        &config.ledger,
        &config.engine.stock_table,
    ));
    let engine = ReconciliationEngine::new(source, store, config.engine.clone());

    let app = app(AppState::new(engine));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
