//! Timed polling for inclusion and confirmation.

use std::future::Future;
use std::time::Duration;

use client_blockchain_core::TransportError;
use tokio::time::{MissedTickBehavior, interval};

/// Poll `probe` every `every` until it yields a value.
///
/// Errors are logged and polling continues: once an operation has been
/// submitted, a failed status query says nothing about its outcome. Callers
/// bound the loop with a deadline; dropping the future cancels it.
pub(crate) async fn poll_until<T, F, Fut>(every: Duration, stage: &'static str, mut probe: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, TransportError>>,
{
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut attempt = 0u32;
    loop {
        ticker.tick().await;
        attempt += 1;

        match probe().await {
            Ok(Some(value)) => return value,
            Ok(None) => tracing::debug!(stage, attempt, "Still waiting"),
            Err(e) if e.is_transient() => {
                tracing::debug!(stage, attempt, error = %e, "Transient polling failure")
            }
            Err(e) => tracing::warn!(stage, attempt, error = %e, "Polling failed"),
        }
    }
}
