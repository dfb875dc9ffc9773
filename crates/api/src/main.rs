//! API server entry point.

use api::config::Config;
use balance::{BalanceGateway, HttpBalanceGateway, ResilienceConfig};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{InMemoryOrderStore, OrderStore, PgOrderStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn serve<S, G>(store: S, gateway: G, config: &Config, metrics_handle: PrometheusHandle)
where
    S: OrderStore + 'static,
    G: BalanceGateway + Clone + 'static,
{
    let state = api::create_state(store, gateway);
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Build the balance gateway
    let gateway = HttpBalanceGateway::new(
        config.balance_service_url.clone(),
        ResilienceConfig::default(),
    )
    .expect("failed to build balance gateway");

    // 4. Pick the store: Postgres when DATABASE_URL is set, in-memory otherwise
    match config.database_url.clone() {
        Some(url) => {
            let pool = sqlx::PgPool::connect(&url)
                .await
                .expect("failed to connect to Postgres");
            let store = PgOrderStore::new(pool);
            store
                .init_schema()
                .await
                .expect("failed to initialize schema");
            tracing::info!("using Postgres order store");
            serve(store, gateway, &config, metrics_handle).await;
        }
        None => {
            let store = InMemoryOrderStore::new();
            store
                .seed_products(api::default_catalog())
                .await
                .expect("failed to seed catalog");
            tracing::info!("using in-memory order store");
            serve(store, gateway, &config, metrics_handle).await;
        }
    }
}
