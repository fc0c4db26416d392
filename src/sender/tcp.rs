use super::tls;
use super::transport::{Transport, TransportError};
use super::udp::resolve;
use crate::config::TlsOptions;
use parking_lot::Mutex;
use rustls::{ClientConnection, StreamOwned};
use std::io::{self, Write};
use std::net::TcpStream;
use std::time::Duration;
use tracing::debug;

/// GELF over TCP. Every message is terminated by a NUL byte.
pub struct TcpTransport {
    host: String,
    port: u16,
    tls: Option<TlsOptions>,
    timeout: Duration,
    stream: Mutex<Option<Stream>>,
}

enum Stream {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.write(buf),
            Self::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(stream) => stream.flush(),
            Self::Tls(stream) => stream.flush(),
        }
    }
}

impl TcpTransport {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        tls: Option<TlsOptions>,
        timeout: Duration,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            tls,
            timeout,
            stream: Mutex::new(None),
        }
    }

    fn connect(&self) -> Result<Stream, TransportError> {
        let addr = resolve(&self.host, self.port)?;
        let socket = TcpStream::connect_timeout(&addr, self.timeout)?;
        socket.set_write_timeout(Some(self.timeout))?;
        socket.set_read_timeout(Some(self.timeout))?;
        socket.set_nodelay(true)?;
        debug!(%addr, tls = self.tls.is_some(), "Connected to GELF collector");

        match &self.tls {
            None => Ok(Stream::Plain(socket)),
            Some(options) => {
                let config = tls::client_config(options)?;
                let session = tls::client_connection(config, options, &self.host)?;
                Ok(Stream::Tls(Box::new(StreamOwned::new(session, socket))))
            }
        }
    }
}

impl Transport for TcpTransport {
    fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        let mut guard = self.stream.lock();
        let mut stream = match guard.take() {
            Some(stream) => stream,
            None => self.connect()?,
        };
        // A failed write drops the connection; the next message reconnects.
        write_message(&mut stream, payload)?;
        *guard = Some(stream);
        Ok(())
    }
}

fn write_message(stream: &mut Stream, payload: &[u8]) -> io::Result<()> {
    stream.write_all(payload)?;
    stream.write_all(&[0])?;
    stream.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;

    #[test]
    fn test_messages_are_nul_terminated() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let transport = TcpTransport::new("127.0.0.1", port, None, Duration::from_secs(5));

        transport.send(b"{\"a\":1}").unwrap();
        transport.send(b"{\"b\":2}").unwrap();
        drop(transport);

        let (mut conn, _) = listener.accept().unwrap();
        let mut received = Vec::new();
        conn.read_to_end(&mut received).unwrap();
        assert_eq!(received, b"{\"a\":1}\0{\"b\":2}\0");
    }

    #[test]
    fn test_connection_refused() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport = TcpTransport::new("127.0.0.1", port, None, Duration::from_secs(1));
        assert!(matches!(transport.send(b"{}"), Err(TransportError::Io(_))));
    }
}
