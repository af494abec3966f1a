//! Waiting for services that start alongside the web front end

use anyhow::{bail, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Runs `op` until it succeeds, at most `attempts` times, sleeping `delay` in between
///
/// Every failure is logged as `Waiting for <name>`. Gives up with an error once
/// the attempts are used up. `op` always runs at least once.
pub async fn retry<T, F, Fut>(name: &str, attempts: u32, delay: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                warn!(attempt, error = %err, "Waiting for {}", name);
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    bail!("{} is not reachable after {} attempts", name, attempts)
}
