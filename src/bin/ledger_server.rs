// src/bin/ledger_server.rs

use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use document_ledger::infra::config::{self, ServiceConfig, StoreKind};
use document_ledger::infra::telemetry;
use document_ledger::transport;
use document_ledger::{LedgerStore, MemoryLedgerStore, PostgresLedgerStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    telemetry::init_tracing();

    let service_config = ServiceConfig::from_env()?;

    // --- Store Initialization ---
    let store: Arc<dyn LedgerStore> = match service_config.store {
        StoreKind::Postgres => {
            let database_options = config::database_options()?;
            info!(
                pool_size = service_config.pool_size,
                "connecting to Postgres ledger store"
            );
            Arc::new(
                PostgresLedgerStore::connect(
                    database_options,
                    service_config.pool_size,
                    service_config.acquire_timeout,
                )
                .await?,
            )
        }
        StoreKind::Memory => {
            warn!("LEDGER_STORE=memory: records are lost on restart");
            Arc::new(MemoryLedgerStore::new())
        }
    };

    let app_state = transport::http::AppState { store };

    // --- API Server Initialization ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(service_config.listen_addr).await?;
    info!("ledger service listening on http://{}", service_config.listen_addr);
    info!("Swagger UI available at http://{}/swagger-ui", service_config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
