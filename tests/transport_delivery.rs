use flate2::read::GzDecoder;
use graylog_logger::sender::udp::{CHUNK_HEADER_LEN, CHUNK_MAGIC};
use graylog_logger::{GraylogConfig, GraylogLogger, LoggerError, Severity};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;
use std::net::{TcpListener, UdpSocket};
use std::time::Duration;

fn collector() -> (UdpSocket, u16) {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let port = socket.local_addr().unwrap().port();
    (socket, port)
}

fn logger(url: String, config: GraylogConfig) -> GraylogLogger {
    GraylogLogger::new(GraylogConfig {
        url: Some(url),
        facility: "billing".to_string(),
        ignore_transport_errors: false,
        ..config
    })
    .unwrap()
}

fn receive(socket: &UdpSocket) -> Vec<u8> {
    let mut buf = vec![0u8; 65_536];
    let len = socket.recv(&mut buf).unwrap();
    buf.truncate(len);
    buf
}

#[test]
fn test_udp_single_datagram() {
    let (socket, port) = collector();
    let logger = logger(format!("udp://127.0.0.1:{port}"), GraylogConfig::default());

    logger.error("invoice INV-7 failed").unwrap();

    let message: Value = serde_json::from_slice(&receive(&socket)).unwrap();
    assert_eq!(message["version"], "1.1");
    assert_eq!(message["short_message"], "invoice INV-7 failed");
    assert_eq!(message["level"], 3);
    assert_eq!(message["_facility"], "billing");
    assert!(message["host"].as_str().is_some_and(|h| !h.is_empty()));
    assert!(message.get("full_message").is_none());
}

#[test]
fn test_udp_chunked_message_reassembles() {
    let (socket, port) = collector();
    let logger = logger(
        format!("udp://127.0.0.1:{port}"),
        GraylogConfig {
            chunk_size: 200,
            ..GraylogConfig::default()
        },
    );

    let body = "x".repeat(1_500);
    logger.log(Severity::Warning, &format!("large\n{body}")).unwrap();

    let first = receive(&socket);
    assert_eq!(&first[..2], &CHUNK_MAGIC);
    let count = first[11] as usize;
    assert!(count > 1);

    let mut parts = BTreeMap::new();
    parts.insert(first[10], first[CHUNK_HEADER_LEN..].to_vec());
    for _ in 1..count {
        let chunk = receive(&socket);
        assert!(chunk.len() <= 200 + CHUNK_HEADER_LEN);
        assert_eq!(&chunk[2..10], &first[2..10]);
        parts.insert(chunk[10], chunk[CHUNK_HEADER_LEN..].to_vec());
    }

    let datagram: Vec<u8> = parts.into_values().flatten().collect();
    let message: Value = serde_json::from_slice(&datagram).unwrap();
    assert_eq!(message["short_message"], "large");
    assert_eq!(message["full_message"], format!("large\n{body}"));
}

#[test]
fn test_udp_compressed_payload() {
    let (socket, port) = collector();
    let logger = logger(
        format!("udp://127.0.0.1:{port}"),
        GraylogConfig {
            compress: true,
            ..GraylogConfig::default()
        },
    );

    logger.info("compressed").unwrap();

    let mut json = String::new();
    GzDecoder::new(receive(&socket).as_slice())
        .read_to_string(&mut json)
        .unwrap();
    let message: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(message["short_message"], "compressed");
}

#[test]
fn test_tcp_messages_are_nul_delimited() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let logger = logger(format!("tcp://127.0.0.1:{port}"), GraylogConfig::default());

    logger.notice("first").unwrap();
    logger.critical("second").unwrap();
    drop(logger);

    let (mut conn, _) = listener.accept().unwrap();
    let mut received = Vec::new();
    conn.read_to_end(&mut received).unwrap();

    let frames: Vec<Value> = received
        .split(|byte| *byte == 0)
        .filter(|frame| !frame.is_empty())
        .map(|frame| serde_json::from_slice(frame).unwrap())
        .collect();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0]["short_message"], "first");
    assert_eq!(frames[0]["level"], 5);
    assert_eq!(frames[1]["level"], 2);
    assert_eq!(received.last(), Some(&0));
}

fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[test]
fn test_unreachable_collector_is_ignored_by_default() {
    let logger = GraylogLogger::new(GraylogConfig {
        url: Some(format!("tcp://127.0.0.1:{}", closed_port())),
        ..GraylogConfig::default()
    })
    .unwrap();
    assert!(logger.error("nobody listens").is_ok());
}

#[test]
fn test_unreachable_collector_fails_when_errors_are_reported() {
    let logger = logger(
        format!("tcp://127.0.0.1:{}", closed_port()),
        GraylogConfig::default(),
    );
    assert!(matches!(
        logger.error("nobody listens"),
        Err(LoggerError::Transport(_))
    ));
}
