// ── Bounded retry for status probes ──
//
// A probe attempt either returns a structured `HealthReport` or a
// transport error. `check_with_retry` turns at most `max_retries + 1`
// attempts into one definitive report: the first structurally valid
// result ends the loop, and exhausting every attempt yields an unhealthy
// report carrying the *last* error — never a raised fault. Callers rely
// on always receiving a structured result.

use std::future::Future;
use std::time::Duration;

use glasslink_api::HealthReport;

/// Which transport a status probe should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeTransport {
    /// The short-range (BLE) link; no shared network required.
    ShortRange,
    /// The device-local HTTP interface; requires network membership.
    LocalNetwork,
}

/// Attempt and spacing bounds for a retried check.
///
/// Negative counts and delays are unrepresentable here, which is the
/// whole input-validation story: misuse fails at the type level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries *after* the first attempt; 0 means exactly one attempt.
    pub max_retries: u32,
    /// Fixed pause between attempts. Not applied after the final one.
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
        }
    }

    /// A single attempt, no spacing.
    pub fn once() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Total attempts this policy allows.
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Run `attempt` under `policy`, producing one final report.
pub async fn check_with_retry<F, Fut>(policy: &RetryPolicy, mut attempt: F) -> HealthReport
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<HealthReport, glasslink_api::Error>>,
{
    let attempts = policy.attempts();
    let mut last_error = String::from("no probe attempts were made");

    for n in 1..=attempts {
        match attempt().await {
            Ok(report) => {
                tracing::debug!(attempt = n, healthy = report.is_healthy(), "probe answered");
                return report;
            }
            Err(e) => {
                tracing::debug!(attempt = n, total = attempts, error = %e, "probe failed");
                last_error = e.to_string();
            }
        }
        if n < attempts {
            tokio::time::sleep(policy.retry_delay).await;
        }
    }

    HealthReport::unhealthy(last_error)
}
