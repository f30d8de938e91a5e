//! The deadline shuts the server down on its own, and not early.

mod common;

use once_core::{CompletionReason, LifecycleState};
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_timeout_shuts_down_after_deadline() {
    let deadline = Duration::from_millis(800);
    let started = Instant::now();
    let fx = common::serve("idle.txt", b"nobody wants me", deadline).await;
    let client = common::client();

    // Still serving well before the deadline
    let response = client.get(fx.info_url()).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(!fx.server.completion().is_fired());

    let mut state = fx.server.state();
    tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| *s == LifecycleState::Stopped),
    )
    .await
    .expect("server should stop after the deadline")
    .unwrap();

    assert!(
        started.elapsed() >= deadline,
        "Stopped after {:?}, before the {:?} deadline",
        started.elapsed(),
        deadline
    );

    let report = fx.server.wait().await.unwrap();
    assert_eq!(report.reason, CompletionReason::TimedOut);
}

#[tokio::test]
async fn test_download_beats_timeout() {
    let fx = common::serve("fast.txt", b"quick", Duration::from_secs(2)).await;
    let client = common::client();

    let body = client
        .get(fx.download_url())
        .send()
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(&body[..], b"quick");

    let report = fx.server.wait().await.unwrap();
    assert_eq!(report.reason, CompletionReason::Downloaded);
}
