//! rustls client setup for the TCP transport.

use super::transport::TransportError;
use crate::config::TlsOptions;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, ClientConnection, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

pub fn client_config(options: &TlsOptions) -> Result<Arc<ClientConfig>, TransportError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| TransportError::Tls(e.to_string()))?;

    let config = if options.skips_verification() {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate { provider }))
            .with_no_client_auth()
    } else {
        let mut roots = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        if let Some(ca_file) = &options.ca_file {
            for cert in load_certificates(ca_file)? {
                roots
                    .add(cert)
                    .map_err(|e| TransportError::Tls(format!("{}: {e}", ca_file.display())))?;
            }
        }
        builder.with_root_certificates(roots).with_no_client_auth()
    };

    Ok(Arc::new(config))
}

/// Opens a client session for `host`, or for the configured server name.
pub fn client_connection(
    config: Arc<ClientConfig>,
    options: &TlsOptions,
    host: &str,
) -> Result<ClientConnection, TransportError> {
    let name = options.server_name.as_deref().unwrap_or(host);
    let server_name = ServerName::try_from(name.to_string())
        .map_err(|e| TransportError::Tls(format!("invalid server name '{name}': {e}")))?;
    ClientConnection::new(config, server_name).map_err(|e| TransportError::Tls(e.to_string()))
}

fn load_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>, TransportError> {
    let file = File::open(path)
        .map_err(|e| TransportError::Tls(format!("{}: {e}", path.display())))?;
    rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TransportError::Tls(format!("{}: {e}", path.display())))
}

/// Verifier used when peer verification is switched off. Handshake
/// signatures are still checked.
#[derive(Debug)]
struct AcceptAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_verifying_config_uses_web_roots() {
        assert!(client_config(&TlsOptions::default()).is_ok());
    }

    #[test]
    fn test_lenient_config() {
        let options = TlsOptions {
            verify_peer: false,
            ..TlsOptions::default()
        };
        let config = client_config(&options).unwrap();
        assert!(client_connection(config, &options, "graylog.internal").is_ok());
    }

    #[test]
    fn test_missing_ca_file() {
        let options = TlsOptions {
            ca_file: Some("/nonexistent/graylog-ca.pem".into()),
            ..TlsOptions::default()
        };
        let err = client_config(&options).unwrap_err();
        assert!(err.to_string().contains("graylog-ca.pem"));
    }

    #[test]
    fn test_ca_file_without_certificates() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not a certificate").unwrap();
        let options = TlsOptions {
            ca_file: Some(file.path().to_path_buf()),
            ..TlsOptions::default()
        };
        // No PEM sections: only the bundled roots are used.
        assert!(client_config(&options).is_ok());
    }

    #[test]
    fn test_server_name_override() {
        let options = TlsOptions {
            server_name: Some("logs.example.com".to_string()),
            ..TlsOptions::default()
        };
        let config = client_config(&options).unwrap();
        assert!(client_connection(config, &options, "10.0.0.5").is_ok());
    }
}
