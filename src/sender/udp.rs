use super::transport::{Transport, TransportError};
use flate2::{Compression, write::GzEncoder};
use parking_lot::Mutex;
use std::io::Write;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};

/// Magic bytes that open every GELF chunk.
pub const CHUNK_MAGIC: [u8; 2] = [0x1e, 0x0f];
/// Magic + 8 byte message id + sequence number + sequence count.
pub const CHUNK_HEADER_LEN: usize = 12;
/// Graylog discards messages split into more chunks than this.
pub const MAX_CHUNKS: usize = 128;

/// GELF over UDP. Payloads larger than `chunk_size` are split into chunks
/// carrying `chunk_size` body bytes each, plus the chunk header.
pub struct UdpTransport {
    host: String,
    port: u16,
    chunk_size: usize,
    compress: bool,
    socket: Mutex<Option<UdpSocket>>,
}

impl UdpTransport {
    pub fn new(host: impl Into<String>, port: u16, chunk_size: usize, compress: bool) -> Self {
        Self {
            host: host.into(),
            port,
            chunk_size,
            compress,
            socket: Mutex::new(None),
        }
    }

    fn connect(&self) -> Result<UdpSocket, TransportError> {
        let target = resolve(&self.host, self.port)?;
        let local = if target.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(local)?;
        socket.connect(target)?;
        Ok(socket)
    }

    fn encode(&self, payload: &[u8]) -> Result<Vec<u8>, TransportError> {
        if !self.compress {
            return Ok(payload.to_vec());
        }
        let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(payload)?;
        Ok(encoder.finish()?)
    }
}

impl Transport for UdpTransport {
    fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        let datagram = self.encode(payload)?;
        let chunks = split_into_chunks(&datagram, self.chunk_size, rand::random())?;

        let mut guard = self.socket.lock();
        let socket = match guard.take() {
            Some(socket) => socket,
            None => self.connect()?,
        };
        // Re-resolve on the next message after a failed send
        for chunk in &chunks {
            socket.send(chunk)?;
        }
        *guard = Some(socket);
        Ok(())
    }
}

pub(crate) fn resolve(host: &str, port: u16) -> Result<SocketAddr, TransportError> {
    (host, port)
        .to_socket_addrs()
        .map_err(|e| TransportError::Resolve(format!("{host}:{port} ({e})")))?
        .next()
        .ok_or_else(|| TransportError::Resolve(format!("{host}:{port}")))
}

/// Splits a datagram into GELF chunks of at most `chunk_size` body bytes
/// after the header. A datagram that fits is returned unchanged as a single
/// element.
pub fn split_into_chunks(
    datagram: &[u8],
    chunk_size: usize,
    message_id: [u8; 8],
) -> Result<Vec<Vec<u8>>, TransportError> {
    if datagram.len() <= chunk_size {
        return Ok(vec![datagram.to_vec()]);
    }

    let body_size = chunk_size.max(1);
    let count = datagram.len().div_ceil(body_size);
    if count > MAX_CHUNKS {
        return Err(TransportError::TooManyChunks {
            chunks: count,
            max: MAX_CHUNKS,
        });
    }

    Ok(datagram
        .chunks(body_size)
        .enumerate()
        .map(|(sequence, body)| {
            let mut chunk = Vec::with_capacity(CHUNK_HEADER_LEN + body.len());
            chunk.extend_from_slice(&CHUNK_MAGIC);
            chunk.extend_from_slice(&message_id);
            chunk.push(sequence as u8);
            chunk.push(count as u8);
            chunk.extend_from_slice(body);
            chunk
        })
        .collect())
}
