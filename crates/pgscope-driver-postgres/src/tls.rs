//! PostgreSQL TLS support
//!
//! Builds the native-tls connector handed to tokio-postgres when the
//! configured `sslmode` is anything other than `disable`.

use native_tls::{Certificate, Identity, TlsConnector, TlsConnectorBuilder};
use pgscope_core::{ConnectionConfig, PgscopeError, SslMode};
use postgres_native_tls::MakeTlsConnector;
use std::fs;
use tracing::debug;

/// Error types for TLS setup
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("Failed to load CA certificate from {path}: {source}")]
    CaCertLoadFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid CA certificate format: {0}")]
    InvalidCaCert(String),

    #[error("Failed to load client certificate or key from {path}: {source}")]
    ClientIdentityLoadFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid client identity (cert + key): {0}")]
    InvalidClientIdentity(String),

    #[error("TLS configuration error: {0}")]
    ConfigurationError(String),
}

impl From<TlsError> for PgscopeError {
    fn from(error: TlsError) -> Self {
        PgscopeError::Connection(error.to_string())
    }
}

/// Build a TLS connector for `config`.
///
/// Recognized params: `ssl_ca_cert`, `ssl_client_cert` and `ssl_client_key`
/// (PEM file paths). With `sslmode=require` and no CA certificate the server
/// certificate is not verified, matching libpq's `require` semantics.
pub fn build_tls_connector(config: &ConnectionConfig) -> Result<MakeTlsConnector, TlsError> {
    let mut builder = TlsConnector::builder();

    let ca_cert = config.get_string("ssl_ca_cert").filter(|p| !p.is_empty());
    if let Some(path) = &ca_cert {
        apply_ca_cert(&mut builder, path)?;
    }

    if let (Some(cert), Some(key)) = (
        config.get_string("ssl_client_cert"),
        config.get_string("ssl_client_key"),
    ) {
        if !cert.is_empty() && !key.is_empty() {
            apply_client_identity(&mut builder, &cert, &key)?;
        }
    }

    if config.ssl_mode != SslMode::Disable && ca_cert.is_none() {
        debug!(ssl_mode = %config.ssl_mode, "no CA certificate, skipping server verification");
        builder.danger_accept_invalid_certs(true);
        builder.danger_accept_invalid_hostnames(true);
    }

    let connector = builder
        .build()
        .map_err(|e| TlsError::ConfigurationError(e.to_string()))?;

    Ok(MakeTlsConnector::new(connector))
}

fn apply_ca_cert(builder: &mut TlsConnectorBuilder, path: &str) -> Result<(), TlsError> {
    debug!(path = %path, "loading CA certificate");

    let pem = fs::read(path).map_err(|source| TlsError::CaCertLoadFailed {
        path: path.to_string(),
        source,
    })?;
    let cert = Certificate::from_pem(&pem).map_err(|e| TlsError::InvalidCaCert(e.to_string()))?;
    builder.add_root_certificate(cert);
    Ok(())
}

fn apply_client_identity(
    builder: &mut TlsConnectorBuilder,
    cert_path: &str,
    key_path: &str,
) -> Result<(), TlsError> {
    debug!(cert = %cert_path, key = %key_path, "loading client identity");

    let read = |path: &str| {
        fs::read(path).map_err(|source| TlsError::ClientIdentityLoadFailed {
            path: path.to_string(),
            source,
        })
    };
    let cert = read(cert_path)?;
    let key = read(key_path)?;

    let identity = Identity::from_pkcs8(&cert, &key)
        .map_err(|e| TlsError::InvalidClientIdentity(e.to_string()))?;
    builder.identity(identity);
    Ok(())
}
