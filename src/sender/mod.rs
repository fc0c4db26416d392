//! GELF delivery: encoding, transport selection and the transports.

pub mod serialization;
pub mod tcp;
pub mod tls;
pub mod transport;
pub mod udp;

pub use serialization::GelfEncoder;
pub use tcp::TcpTransport;
pub use transport::{IgnoreErrors, Transport, TransportError, TransportSpec, select_transport};
pub use udp::UdpTransport;

use crate::domain::{LogRecord, LoggerError};

/// Encodes records and hands them to the transport chosen for a logger.
pub struct Publisher {
    transport: Box<dyn Transport>,
    encoder: GelfEncoder,
}

impl Publisher {
    pub fn new(transport: Box<dyn Transport>, encoder: GelfEncoder) -> Self {
        Self { transport, encoder }
    }

    pub fn encoder(&self) -> &GelfEncoder {
        &self.encoder
    }

    pub fn publish(&self, record: &LogRecord) -> Result<(), LoggerError> {
        let payload = self.encoder.encode(record)?;
        self.transport.send(&payload)?;
        Ok(())
    }
}
