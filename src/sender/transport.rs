use super::tcp::TcpTransport;
use super::udp::UdpTransport;
use crate::config::{ConfigError, Settings, TlsOptions};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[cfg(test)]
use mockall::automock;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not resolve collector address {0}")]
    Resolve(String),
    #[error("Message needs {chunks} chunks, the GELF limit is {max}")]
    TooManyChunks { chunks: usize, max: usize },
    #[error("TLS error: {0}")]
    Tls(String),
}

/// Delivers one encoded GELF message to the collector.
#[cfg_attr(test, automock)]
pub trait Transport: Send + Sync {
    fn send(&self, payload: &[u8]) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        (**self).send(payload)
    }
}

/// Transport selected from the configured scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportSpec {
    Udp {
        host: String,
        port: u16,
        chunk_size: usize,
        compress: bool,
    },
    Tcp {
        host: String,
        port: u16,
        tls: Option<TlsOptions>,
        timeout: Duration,
    },
}

impl TransportSpec {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        match settings.scheme.as_str() {
            "udp" => Ok(Self::Udp {
                host: settings.host.clone(),
                port: settings.port,
                chunk_size: settings.chunk_size,
                compress: settings.compress,
            }),
            "tcp" => Ok(Self::Tcp {
                host: settings.host.clone(),
                port: settings.port,
                tls: settings.tls_options.clone(),
                timeout: settings.connection_timeout,
            }),
            other => Err(ConfigError::UnknownScheme(other.to_string())),
        }
    }

    /// Sockets are opened lazily on the first send.
    pub fn into_transport(self) -> Box<dyn Transport> {
        match self {
            Self::Udp {
                host,
                port,
                chunk_size,
                compress,
            } => Box::new(UdpTransport::new(host, port, chunk_size, compress)),
            Self::Tcp {
                host,
                port,
                tls,
                timeout,
            } => Box::new(TcpTransport::new(host, port, tls, timeout)),
        }
    }
}

/// Builds the transport described by `settings`, wrapped in
/// [`IgnoreErrors`] when transport errors are to be swallowed.
pub fn select_transport(settings: &Settings) -> Result<Box<dyn Transport>, ConfigError> {
    let spec = TransportSpec::from_settings(settings)?;
    debug!(?spec, "Selected GELF transport");
    Ok(wrap(spec.into_transport(), settings.ignore_transport_errors))
}

pub(crate) fn wrap(transport: Box<dyn Transport>, ignore_errors: bool) -> Box<dyn Transport> {
    if ignore_errors {
        Box::new(IgnoreErrors::new(transport))
    } else {
        transport
    }
}

/// Swallows delivery failures so a down collector never fails the caller.
pub struct IgnoreErrors<T> {
    inner: T,
}

impl<T: Transport> IgnoreErrors<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Transport> Transport for IgnoreErrors<T> {
    fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        if let Err(e) = self.inner.send(payload) {
            warn!(error = %e, bytes = payload.len(), "Dropping GELF message");
        }
        Ok(())
    }
}
