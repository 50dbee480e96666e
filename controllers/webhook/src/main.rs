//! Azure Infrastructure Webhook Server
//!
//! Serves the admission and conversion webhooks for the Cluster API Azure
//! infrastructure kinds:
//! - `/mutate/{kind}`: applies hub defaults, answering with a JSON patch
//! - `/validate/{kind}`: create, update and delete validation
//! - `/convert`: `ConversionReview` between v1alpha3, v1alpha4 and v1beta1
//!
//! Configured through `WEBHOOK_BIND_ADDR`, `WEBHOOK_TLS_CERT`,
//! `WEBHOOK_TLS_KEY` and `RUST_LOG`.

mod admission;
mod config;
mod conversion;
mod error;
mod server;
#[cfg(test)]
mod test_utils;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::WebhookError;

#[tokio::main]
async fn main() -> Result<(), WebhookError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Azure infrastructure webhook server");

    let config = Config::from_env()?;
    info!("Configuration:");
    info!("  Bind address: {}", config.bind_addr);
    info!("  TLS: {}", if config.tls.is_some() { "enabled" } else { "disabled" });

    server::serve(&config).await
}
