use async_trait::async_trait;
use herald_events::{
    BasicEvent, DispatchContext, Dispatcher, DispatcherError, Event, EventDispatcher, Handler,
    HandlerResult, SharedEvent, SharedHandler,
};
use herald_telemetry::{try_init_subscriber, TelemetryConfig};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn init_logging() {
    let config = TelemetryConfig {
        level: "debug".to_string(),
        ..Default::default()
    };
    // Another test may already have installed the global subscriber.
    let _ = try_init_subscriber(&config);
}

/// Records every event it receives
struct RecordingHandler {
    seen: Mutex<Vec<(String, Value)>>,
}

impl RecordingHandler {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<(String, Value)> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl Handler for RecordingHandler {
    async fn handle(&self, _ctx: &DispatchContext, event: &SharedEvent) -> HandlerResult {
        let payload = event
            .payload_as::<Value>()
            .cloned()
            .ok_or("unexpected payload type")?;
        self.seen
            .lock()
            .push((event.name().to_string(), payload));
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("handler {index} failed")]
struct IndexedFailure {
    index: usize,
}

/// Counts invocations and fails when `fail` is set
struct FlakyHandler {
    index: usize,
    fail: bool,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Handler for FlakyHandler {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn handle(&self, _ctx: &DispatchContext, _event: &SharedEvent) -> HandlerResult {
        tokio::time::sleep(self.delay).await;
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(IndexedFailure { index: self.index }.into());
        }
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_order_created_scenario() {
    init_logging();

    let dispatcher = EventDispatcher::new();
    let a = RecordingHandler::new();
    let b = RecordingHandler::new();

    dispatcher.register("order.created", a.clone()).unwrap();
    dispatcher.register("order.created", b.clone()).unwrap();

    let event = BasicEvent::new("order.created", json!({ "id": 42 })).into_shared();
    let errors = dispatcher
        .dispatch(&DispatchContext::background(), event)
        .await;

    assert!(errors.is_empty());
    for handler in [&a, &b] {
        let seen = handler.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "order.created");
        assert_eq!(seen[0].1, json!({ "id": 42 }));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_partial_failures_are_all_reported() {
    init_logging();

    let dispatcher = EventDispatcher::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let total = 8;
    let failing = [1usize, 4, 6];

    for index in 0..total {
        let handler: SharedHandler = Arc::new(FlakyHandler {
            index,
            fail: failing.contains(&index),
            delay: Duration::from_millis((total - index) as u64 * 5),
            calls: calls.clone(),
        });
        dispatcher.register("batch.ready", handler).unwrap();
    }

    let event = BasicEvent::new("batch.ready", json!(null)).into_shared();
    let errors = dispatcher
        .dispatch(&DispatchContext::background(), event)
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), total);
    assert_eq!(errors.len(), failing.len());

    let mut failed: Vec<usize> = errors
        .iter()
        .map(|err| {
            err.handler_error()
                .and_then(|e| e.downcast_ref::<IndexedFailure>())
                .map(|f| f.index)
                .expect("handler failure passed through unchanged")
        })
        .collect();
    failed.sort_unstable();
    assert_eq!(failed, failing);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_handlers_run_concurrently() {
    let dispatcher = EventDispatcher::new();
    let calls = Arc::new(AtomicUsize::new(0));

    for index in 0..10 {
        let handler: SharedHandler = Arc::new(FlakyHandler {
            index,
            fail: false,
            delay: Duration::from_millis(100),
            calls: calls.clone(),
        });
        dispatcher.register("tick", handler).unwrap();
    }

    let started = std::time::Instant::now();
    let errors = dispatcher
        .dispatch(
            &DispatchContext::background(),
            BasicEvent::new("tick", ()).into_shared(),
        )
        .await;

    assert!(errors.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 10);
    assert!(started.elapsed() < Duration::from_millis(900));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dropped_dispatch_aborts_handlers() {
    let dispatcher = EventDispatcher::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let slow: SharedHandler = Arc::new(FlakyHandler {
        index: 0,
        fail: false,
        delay: Duration::from_millis(100),
        calls: calls.clone(),
    });
    dispatcher.register("report.build", slow).unwrap();

    let ctx = DispatchContext::background();
    let dispatch = dispatcher.dispatch(&ctx, BasicEvent::new("report.build", ()).into_shared());
    assert!(tokio::time::timeout(Duration::from_millis(10), dispatch)
        .await
        .is_err());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_clear_then_dispatch() {
    let dispatcher = EventDispatcher::new();
    let a: SharedHandler = RecordingHandler::new();

    dispatcher.register("user.deleted", a.clone()).unwrap();
    dispatcher.clear();

    assert!(!dispatcher.has("user.deleted", &a));
    let errors = dispatcher
        .dispatch(
            &DispatchContext::background(),
            BasicEvent::new("user.deleted", json!({})).into_shared(),
        )
        .await;
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], DispatcherError::EventNotRegistered { .. }));
}

#[tokio::test]
async fn test_dispatch_through_trait_object() {
    let dispatcher: Arc<dyn Dispatcher> = Arc::new(EventDispatcher::new());
    let a = RecordingHandler::new();

    dispatcher.register("session.started", a.clone()).unwrap();
    let errors = dispatcher
        .dispatch(
            &DispatchContext::background(),
            BasicEvent::new("session.started", json!("abc")).into_shared(),
        )
        .await;

    assert!(errors.is_empty());
    assert_eq!(a.seen().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_snapshot_isolates_inflight_dispatch() {
    let dispatcher = EventDispatcher::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let slow: SharedHandler = Arc::new(FlakyHandler {
        index: 0,
        fail: false,
        delay: Duration::from_millis(50),
        calls: calls.clone(),
    });
    dispatcher.register("job.run", slow.clone()).unwrap();

    let inflight = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            dispatcher
                .dispatch(
                    &DispatchContext::background(),
                    BasicEvent::new("job.run", ()).into_shared(),
                )
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    let late = RecordingHandler::new();
    dispatcher.register("job.run", late.clone()).unwrap();
    dispatcher.remove("job.run", &slow).unwrap();

    let errors = inflight.await.unwrap();
    assert!(errors.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(late.seen().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_mutation_and_dispatch_stress() {
    let dispatcher = EventDispatcher::new();
    let stable: Vec<SharedHandler> = (0..4)
        .map(|_| RecordingHandler::new() as SharedHandler)
        .collect();
    for handler in &stable {
        dispatcher.register("stress", handler.clone()).unwrap();
    }

    let mut tasks = Vec::new();

    for _ in 0..8 {
        let dispatcher = dispatcher.clone();
        tasks.push(tokio::spawn(async move {
            for round in 0..50 {
                let errors = dispatcher
                    .dispatch(
                        &DispatchContext::background(),
                        BasicEvent::new("stress", json!({ "round": round })).into_shared(),
                    )
                    .await;
                assert!(errors.is_empty(), "unexpected errors: {errors:?}");
            }
        }));
    }

    for worker in 0..8 {
        let dispatcher = dispatcher.clone();
        tasks.push(tokio::spawn(async move {
            let name = if worker % 2 == 0 { "stress" } else { "other" };
            for _ in 0..100 {
                let handler: SharedHandler = RecordingHandler::new();
                dispatcher.register(name, handler.clone()).unwrap();
                assert!(matches!(
                    dispatcher.register(name, handler.clone()),
                    Err(DispatcherError::HandlerAlreadyRegistered { .. })
                ));
                assert!(dispatcher.has(name, &handler));
                dispatcher.remove(name, &handler).unwrap();
                assert!(!dispatcher.has(name, &handler));
                tokio::task::yield_now().await;
            }
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(dispatcher.handler_count("stress"), stable.len());
    assert_eq!(dispatcher.handler_count("other"), 0);
    let remaining = dispatcher.handlers("stress");
    for (kept, expected) in remaining.iter().zip(&stable) {
        assert!(Arc::ptr_eq(kept, expected));
    }
}

#[test]
fn test_event_trait_is_object_safe() {
    let event: SharedEvent = BasicEvent::new("audit", 1u8).into_shared();
    let as_dyn: &dyn Event = event.as_ref();
    assert_eq!(as_dyn.name(), "audit");
    assert_eq!(as_dyn.payload_as::<u8>(), Some(&1));
}
