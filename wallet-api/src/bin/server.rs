//! Wallet HTTP server binary

use std::sync::Arc;
use wallet_api::{create_router, ApiConfig, AppState};
use wallet_ledger::WalletStore;
use wallet_provider::HttpProvider;
use wallet_settlement::{
    DepositService, EscrowCoordinator, LogNotifier, SettlementProcessor, StaticAuthorizer,
    StoreFreezeGuard,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting wallet server");

    // Load configuration
    let config = match std::env::var("WALLET_CONFIG") {
        Ok(path) => ApiConfig::from_file(path)?,
        Err(_) => ApiConfig::from_env()?,
    };
    if config.admins.is_empty() {
        tracing::warn!("No admin users configured; wallet request review is disabled");
    }

    // Open the store
    let store = Arc::new(WalletStore::open(config.ledger.clone()).await?);
    tracing::info!(data_dir = %config.ledger.data_dir.display(), "Wallet store opened");

    // Wire the settlement services
    let provider = Arc::new(HttpProvider::new(config.provider.clone())?);
    let notifier = Arc::new(LogNotifier);
    let guard = Arc::new(StoreFreezeGuard::new(store.clone()));
    let authorizer = Arc::new(StaticAuthorizer::new(config.admins.clone()));

    let state = AppState {
        store: store.clone(),
        deposits: Arc::new(DepositService::new(
            store.clone(),
            provider,
            guard,
            notifier.clone(),
        )),
        processor: Arc::new(SettlementProcessor::new(
            store.clone(),
            authorizer,
            notifier.clone(),
        )),
        escrow: Arc::new(EscrowCoordinator::new(store.clone(), notifier)),
        service_name: config.service_name.clone(),
    };

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!(listen_addr = %config.listen_addr, "Serving");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    // Drain the store actor before exit
    tracing::info!("Shutting down wallet server");
    store.shutdown().await?;

    Ok(())
}
