//! Correlation listener behavior against a scripted event stream.

use std::time::Duration;

use tokio::sync::broadcast;

use forma_client::events::{ClientEvent, ResolutionStatus};
use forma_client::listener::{CompletionOutcome, CorrelationListener};
use forma_core::types::id::CorrelationId;

fn resolved(id: &str, status: ResolutionStatus) -> ClientEvent {
    ClientEvent::CorrelationResolved {
        correlation_id: CorrelationId::from(id),
        status,
    }
}

#[tokio::test(start_paused = true)]
async fn error_resolution_wins_over_timer() {
    let (tx, rx) = broadcast::channel(16);
    let listener = CorrelationListener::new(CorrelationId::from("c1"), Duration::from_secs(60));
    let wait = tokio::spawn(listener.wait(rx));

    tokio::time::sleep(Duration::from_secs(10)).await;
    tx.send(resolved("c1", ResolutionStatus::Error)).unwrap();

    let outcome = wait.await.unwrap();
    assert_eq!(outcome, CompletionOutcome::Error);
}

#[tokio::test(start_paused = true)]
async fn success_resolution_cancels_the_timer() {
    let (tx, rx) = broadcast::channel(16);
    let listener = CorrelationListener::new(CorrelationId::from("c1"), Duration::from_secs(60));
    let wait = tokio::spawn(listener.wait(rx));

    tx.send(resolved("c1", ResolutionStatus::Success)).unwrap();
    let outcome = wait.await.unwrap();
    assert_eq!(outcome, CompletionOutcome::Success);

    // Advancing past the original deadline produces no second outcome:
    // the listener is gone, there is nothing left to fire.
    tokio::time::sleep(Duration::from_secs(120)).await;
}

#[tokio::test(start_paused = true)]
async fn other_correlations_are_ignored() {
    let (tx, rx) = broadcast::channel(16);
    let listener = CorrelationListener::new(CorrelationId::from("c1"), Duration::from_secs(60));
    let wait = tokio::spawn(listener.wait(rx));

    tx.send(resolved("c2", ResolutionStatus::Success)).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    tx.send(resolved("c1", ResolutionStatus::Success)).unwrap();

    assert_eq!(wait.await.unwrap(), CompletionOutcome::Success);
}

#[tokio::test(start_paused = true)]
async fn silence_times_out_at_the_configured_bound() {
    let (tx, rx) = broadcast::channel(16);
    let listener = CorrelationListener::new(CorrelationId::from("c1"), Duration::from_secs(60));
    let wait = tokio::spawn(listener.wait(rx));

    // Heartbeats keep arriving; they must not reset the bounded wait.
    for _ in 0..5 {
        tokio::time::sleep(Duration::from_secs(10)).await;
        let _ = tx.send(ClientEvent::Heartbeat);
    }
    tokio::time::sleep(Duration::from_secs(15)).await;

    assert_eq!(wait.await.unwrap(), CompletionOutcome::Timeout);
}

#[tokio::test(start_paused = true)]
async fn late_resolution_after_timeout_is_a_no_op() {
    let (tx, rx) = broadcast::channel(16);
    let listener = CorrelationListener::new(CorrelationId::from("c1"), Duration::from_secs(60));
    let wait = tokio::spawn(listener.wait(rx));

    tokio::time::sleep(Duration::from_secs(61)).await;
    let outcome = wait.await.unwrap();
    assert_eq!(outcome, CompletionOutcome::Timeout);

    // The resolution arrives after the local timer fired. No listener is
    // waiting anymore; sending must not panic or deliver anywhere.
    let _ = tx.send(resolved("c1", ResolutionStatus::Success));
}

#[tokio::test(start_paused = true)]
async fn closed_stream_still_honors_the_bound() {
    let (tx, rx) = broadcast::channel(16);
    let listener = CorrelationListener::new(CorrelationId::from("c1"), Duration::from_secs(30));
    let wait = tokio::spawn(listener.wait(rx));

    drop(tx);
    let outcome = wait.await.unwrap();
    assert_eq!(outcome, CompletionOutcome::Timeout);
}
