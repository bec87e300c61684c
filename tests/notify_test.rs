// Integration tests for notification delivery and retry behavior, against
// a local axum endpoint standing in for the hosted hook service.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;

use pixelwatch::notify::Notifier;

const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Start a hook server on an ephemeral port that counts requests and
/// answers with a fixed status. Returns the base URL.
async fn start_hook_server(counter: Arc<AtomicUsize>, status: StatusCode) -> String {
    let app = Router::new()
        .route(
            "/:hook",
            post(move |State(counter): State<Arc<AtomicUsize>>| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                status
            }),
        )
        .with_state(counter);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test hook server");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("hook server died");
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn successful_delivery_sends_exactly_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let base = start_hook_server(counter.clone(), StatusCode::OK).await;

    let notifier = Notifier::with_endpoint(&base, "testkey", RETRY_DELAY);
    notifier.send("watchdog alert", "action control clicked").await;

    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_delivery_makes_exactly_three_attempts_then_returns() {
    let counter = Arc::new(AtomicUsize::new(0));
    let base = start_hook_server(counter.clone(), StatusCode::INTERNAL_SERVER_ERROR).await;

    let notifier = Notifier::with_endpoint(&base, "testkey", RETRY_DELAY);
    let started = Instant::now();
    // Must not panic or propagate an error, only log.
    notifier.send("watchdog alert", "action control clicked").await;
    let elapsed = started.elapsed();

    assert_eq!(counter.load(Ordering::SeqCst), 3);
    // A fixed delay between attempts: two gaps for three attempts.
    assert!(elapsed >= RETRY_DELAY * 2, "elapsed {elapsed:?}");
}

#[tokio::test]
async fn unreachable_endpoint_never_raises() {
    // Nothing listens here; connection errors take the same retry path.
    let notifier = Notifier::with_endpoint("http://127.0.0.1:1", "testkey", RETRY_DELAY);
    notifier.send("watchdog alert", "body").await;
}
