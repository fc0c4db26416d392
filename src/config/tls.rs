use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// TLS settings for the TCP transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TlsOptions {
    /// Verify the collector certificate against the trust roots
    pub verify_peer: bool,
    /// Accept self-signed collector certificates
    pub allow_self_signed: bool,
    /// PEM bundle added to the bundled web PKI roots
    pub ca_file: Option<PathBuf>,
    /// Name used for SNI and verification, defaults to the host
    pub server_name: Option<String>,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self {
            verify_peer: true,
            allow_self_signed: false,
            ca_file: None,
            server_name: None,
        }
    }
}

impl TlsOptions {
    pub fn skips_verification(&self) -> bool {
        !self.verify_peer || self.allow_self_signed
    }
}
