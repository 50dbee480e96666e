//! HTTP(S) server wiring.

use axum::Router;
use axum::routing::{get, post};
use axum_server::tls_rustls::RustlsConfig;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::admission::{mutate_handler, validate_handler};
use crate::config::Config;
use crate::conversion::convert_handler;
use crate::error::WebhookError;

/// Routes of every admission and conversion endpoint.
pub fn router() -> Router {
    Router::new()
        .route("/mutate/{kind}", post(mutate_handler))
        .route("/validate/{kind}", post(validate_handler))
        .route("/convert", post(convert_handler))
        .route("/healthz", get(health_handler))
        .layer(TraceLayer::new_for_http())
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Serves `router()` until the listener fails.
pub async fn serve(config: &Config) -> Result<(), WebhookError> {
    let app = router();

    match &config.tls {
        Some(tls) => {
            // ring and aws-lc-rs can both be compiled in; rustls needs one chosen.
            if rustls::crypto::ring::default_provider().install_default().is_err() {
                debug!("rustls crypto provider already installed");
            }
            let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await?;
            info!("Serving webhooks with TLS on {}", config.bind_addr);
            axum_server::bind_rustls(config.bind_addr, rustls_config)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            warn!("TLS not configured, serving plain HTTP on {}", config.bind_addr);
            let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
