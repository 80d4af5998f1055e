//! Shopfront JSON API Server

use std::{process, sync::Arc};

use salvo::{
    affix_state::inject,
    oapi::{OpenApi, swagger_ui::SwaggerUi},
    prelude::*,
    trailing_slash::remove_slash,
};
use tracing::{error, info};

use shopfront_app::{
    context::AppContext,
    domain::payments::{PaymentGateway, http::HttpPaymentGateway},
};

use crate::{
    config::{ServerConfig, db::StorageBackend},
    state::State,
};

mod carts;
mod checkout;
mod config;
mod extensions;
mod healthcheck;
mod identity;
mod observability;
mod orders;
mod products;
mod router;
mod shutdown;
mod state;
#[cfg(test)]
mod test_helpers;

/// Shopfront JSON API Server entry point
#[tokio::main]
pub async fn main() {
    // Load configuration from .env and CLI arguments
    let config = ServerConfig::load().unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for config errors"
        )]
        {
            eprintln!("Configuration error: {e}");
        }

        process::exit(1);
    });

    if let Err(init_error) = observability::init(&config) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialise, must use eprintln"
        )]
        {
            eprintln!("{init_error}");
        }

        process::exit(1);
    }

    let app = match build_app_context(&config).await {
        Ok(app) => app,
        Err(init_error) => {
            error!("{init_error}");

            process::exit(1);
        }
    };

    let addr = config.socket_addr();

    info!("Starting server on {addr}");

    // Bind server
    let listener = TcpListener::new(addr).bind().await;

    let router = Router::new()
        .hoop(CatchPanic::new())
        .hoop(observability::request_logging)
        .hoop(remove_slash())
        .hoop(inject(State::from_app_context(app)))
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(Router::with_path("metrics").get(observability::metrics_handler))
        .push(router::app_router());

    let doc = OpenApi::new("Shopfront API", env!("CARGO_PKG_VERSION")).merge_router(&router);

    let router = router
        .push(doc.into_router("/api-doc/openapi.json"))
        .push(SwaggerUi::new("/api-doc/openapi.json").into_router("docs"));

    let server = Server::new(listener);

    let handle = server.handle();

    // Listen for shutdown signal
    tokio::spawn(async move {
        if let Err(error) = shutdown::listen(handle).await {
            error!("failed to listen for shutdown signal: {error}");
        }
    });

    // Start serving requests
    server.serve(router).await;
}

async fn build_app_context(config: &ServerConfig) -> Result<AppContext, String> {
    let gateway: Arc<dyn PaymentGateway> =
        Arc::new(HttpPaymentGateway::new(config.payments.service_config()).map_err(|error| {
            format!("failed to build payment service client: {error}")
        })?);

    let currency = config.payments.currency.as_str();

    match (config.database.storage_backend, &config.database.database_url) {
        (StorageBackend::Memory, _) => {
            info!("using in-memory storage; data is lost on restart");

            Ok(AppContext::in_memory(gateway, currency))
        }
        (StorageBackend::Postgres, Some(url)) => {
            AppContext::from_database_url(url, gateway, currency)
                .await
                .map_err(|error| format!("failed to initialize app context: {error}"))
        }
        (StorageBackend::Postgres, None) => {
            Err("DATABASE_URL is required for the postgres storage backend".to_string())
        }
    }
}
