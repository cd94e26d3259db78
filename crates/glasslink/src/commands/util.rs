//! Shared output helpers.

use std::time::Duration;

use owo_colors::OwoColorize;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::Session;

/// Print session status events to stderr until the task is aborted.
pub fn stream_events(session: &Session, quiet: bool) -> JoinHandle<()> {
    let mut rx = session.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if !quiet {
                        eprintln!("{} {}", format!("[{}]", event.state).dimmed(), event.message);
                    }
                }
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Give the event printer a moment to flush the final event, then stop it.
pub async fn finish_events(handle: JoinHandle<()>) {
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.abort();
}
