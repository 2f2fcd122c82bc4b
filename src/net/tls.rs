//! TLS configuration and certificate loading.

use std::path::Path;
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;

use crate::error::TransportError;

/// Load TLS configuration from certificate and key files.
pub fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TransportError> {
    // Basic validation
    if !cert_path.exists() {
        return Err(TransportError::Tls(format!(
            "Certificate file not found: {:?}",
            cert_path
        )));
    }
    if !key_path.exists() {
        return Err(TransportError::Tls(format!(
            "Private key file not found: {:?}",
            key_path
        )));
    }

    let cert = std::fs::read(cert_path)
        .map_err(|e| TransportError::Tls(format!("reading {:?}: {}", cert_path, e)))?;
    let key = std::fs::read(key_path)
        .map_err(|e| TransportError::Tls(format!("reading {:?}: {}", key_path, e)))?;

    tls_config_from_pem(&cert, &key)
}

/// Build a TLS configuration from in-memory PEM data.
///
/// The server only speaks HTTP/1.1, so that is the only ALPN protocol offered.
pub fn tls_config_from_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<RustlsConfig, TransportError> {
    let certs = rustls_pemfile::certs(&mut &cert_pem[..])
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TransportError::Tls(format!("invalid certificate PEM: {}", e)))?;
    if certs.is_empty() {
        return Err(TransportError::Tls("no certificate found in PEM".into()));
    }

    let key = rustls_pemfile::private_key(&mut &key_pem[..])
        .map_err(|e| TransportError::Tls(format!("invalid private key PEM: {}", e)))?
        .ok_or_else(|| TransportError::Tls("no private key found in PEM".into()))?;

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let mut config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| TransportError::Tls(e.to_string()))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| TransportError::Tls(e.to_string()))?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(RustlsConfig::from_config(Arc::new(config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_certificate_file() {
        let err = load_tls_config(
            Path::new("/nonexistent/cert.pem"),
            Path::new("/nonexistent/key.pem"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Certificate file not found"));
    }

    #[test]
    fn empty_pem_is_rejected() {
        let err = tls_config_from_pem(b"", b"").unwrap_err();
        assert!(matches!(err, TransportError::Tls(_)));
    }
}
