use graylog_logger::sender::TransportError;
use graylog_logger::{GraylogConfig, GraylogLayer, GraylogLogger, Transport};
use parking_lot::Mutex;
use serde_json::Value;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing_subscriber::prelude::*;

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Value>>>);

impl Transport for Recorder {
    fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        let value = serde_json::from_slice(payload)
            .map_err(|e| TransportError::Resolve(e.to_string()))?;
        self.0.lock().push(value);
        Ok(())
    }
}

/// Fails every send; the ignore-errors wrapper then warns through tracing.
#[derive(Clone, Default)]
struct Unreachable(Arc<AtomicUsize>);

impl Transport for Unreachable {
    fn send(&self, _payload: &[u8]) -> Result<(), TransportError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Err(TransportError::Io(io::Error::other("connection refused")))
    }
}

#[test]
fn test_layer_forwards_events_with_fields() {
    let recorder = Recorder::default();
    let logger = GraylogLogger::builder(GraylogConfig {
        facility: "billing".to_string(),
        ..GraylogConfig::default()
    })
    .additional("tenant", || Some("acme".to_string()))
    .transport(recorder.clone())
    .build()
    .unwrap();

    let subscriber = tracing_subscriber::registry().with(GraylogLayer::new(Arc::new(logger)));
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(order_id = 42, customer = "jane", "order shipped\nvia express");
        tracing::error!("payment declined");
    });

    let sent = recorder.0.lock().clone();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["short_message"], "order shipped");
    assert_eq!(sent[0]["full_message"], "order shipped\nvia express");
    assert_eq!(sent[0]["level"], 6);
    assert_eq!(sent[0]["_order_id"], "42");
    assert_eq!(sent[0]["_customer"], "jane");
    assert_eq!(sent[0]["_tenant"], "acme");
    assert_eq!(sent[1]["level"], 3);
}

#[test]
fn test_warning_from_ignored_failure_does_not_recurse() {
    let unreachable = Unreachable::default();
    let logger = GraylogLogger::builder(GraylogConfig::default())
        .transport(unreachable.clone())
        .build()
        .unwrap();

    let subscriber = tracing_subscriber::registry().with(GraylogLayer::new(Arc::new(logger)));
    tracing::subscriber::with_default(subscriber, || {
        tracing::error!("collector is down");
    });

    // The wrapper's own warning is emitted while the record is in flight
    // and is dropped instead of being published again.
    assert_eq!(unreachable.0.load(Ordering::SeqCst), 1);
}

#[test]
fn test_events_from_other_threads_are_published() {
    let recorder = Recorder::default();
    let logger = Arc::new(
        GraylogLogger::builder(GraylogConfig::default())
            .transport(recorder.clone())
            .build()
            .unwrap(),
    );
    let subscriber = tracing_subscriber::registry().with(GraylogLayer::new(logger));
    let dispatch = tracing::Dispatch::new(subscriber);

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let dispatch = dispatch.clone();
            std::thread::spawn(move || {
                tracing::dispatcher::with_default(&dispatch, || {
                    tracing::warn!(worker, "worker finished");
                });
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(recorder.0.lock().len(), 4);
}

#[test]
fn test_trace_starts_at_the_event_site() {
    let recorder = Recorder::default();
    let logger = GraylogLogger::builder(GraylogConfig {
        append_backtrace: true,
        ..GraylogConfig::default()
    })
    .transport(recorder.clone())
    .build()
    .unwrap();

    let subscriber = tracing_subscriber::registry().with(GraylogLayer::new(Arc::new(logger)));
    tracing::subscriber::with_default(subscriber, || {
        tracing::error!("boom");
    });

    let sent = recorder.0.lock().clone();
    let full = sent[0]["full_message"].as_str().unwrap();
    let (_, trace) = full.split_once("\n\nTrace:\n").unwrap();
    let first = trace.lines().next().unwrap();
    assert!(first.starts_with("#0 "), "{first}");
    assert!(
        first.contains("tracing_layer::test_trace_starts_at_the_event_site"),
        "{first}"
    );
}
