//! Server configuration from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::WebhookError;

/// Listen address used when `WEBHOOK_BIND_ADDR` is unset.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9443";

/// Webhook server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Listen address
    pub bind_addr: SocketAddr,
    /// Certificate and key; plain HTTP when absent
    pub tls: Option<TlsConfig>,
}

/// PEM files served by the TLS listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// PEM certificate chain (`WEBHOOK_TLS_CERT`)
    pub cert_path: PathBuf,
    /// PEM private key (`WEBHOOK_TLS_KEY`)
    pub key_path: PathBuf,
}

impl Config {
    /// Reads `WEBHOOK_BIND_ADDR`, `WEBHOOK_TLS_CERT` and `WEBHOOK_TLS_KEY`.
    pub fn from_env() -> Result<Self, WebhookError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WebhookError> {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let addr = var("WEBHOOK_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = addr
            .parse()
            .map_err(|e| WebhookError::InvalidConfig(format!("WEBHOOK_BIND_ADDR {addr:?}: {e}")))?;

        let tls = match (var("WEBHOOK_TLS_CERT"), var("WEBHOOK_TLS_KEY")) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => {
                return Err(WebhookError::InvalidConfig(
                    "WEBHOOK_TLS_CERT and WEBHOOK_TLS_KEY must be set together".to_string(),
                ));
            }
        };

        Ok(Config { bind_addr, tls })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, WebhookError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(config.tls.is_none());
    }

    #[test]
    fn test_tls_paths() {
        let config = config(&[
            ("WEBHOOK_BIND_ADDR", "127.0.0.1:8443"),
            ("WEBHOOK_TLS_CERT", "/certs/tls.crt"),
            ("WEBHOOK_TLS_KEY", "/certs/tls.key"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8443);
        let tls = config.tls.unwrap();
        assert_eq!(tls.cert_path, PathBuf::from("/certs/tls.crt"));
        assert_eq!(tls.key_path, PathBuf::from("/certs/tls.key"));
    }

    #[test]
    fn test_cert_without_key_is_rejected() {
        let err = config(&[("WEBHOOK_TLS_CERT", "/certs/tls.crt")]).unwrap_err();
        assert!(matches!(err, WebhookError::InvalidConfig(_)));
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let config = config(&[("WEBHOOK_TLS_CERT", ""), ("WEBHOOK_TLS_KEY", "")]).unwrap();
        assert!(config.tls.is_none());
    }

    #[test]
    fn test_invalid_bind_addr() {
        let err = config(&[("WEBHOOK_BIND_ADDR", "not-an-address")]).unwrap_err();
        assert!(err.to_string().contains("WEBHOOK_BIND_ADDR"), "{err}");
    }
}
