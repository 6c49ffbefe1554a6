//! Activity retry wrapper (spec §4.5.8): activities are idempotent and run
//! under `{initial=1s, backoff=2.0x, max=1m, maxAttempts=3}` unless the
//! caller overrides it.

use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::config::RetryPolicyConfig;
use crate::domain::ids::OrderId;
use crate::outbox::{OutboxEvent, OutboxStore};

pub fn backoff(policy: &RetryPolicyConfig) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(policy.initial_secs))
        .with_max_delay(Duration::from_secs(policy.max_secs))
        .with_max_times(policy.max_attempts as usize)
        .with_jitter()
}

/// Run `f` under `policy`'s retry schedule, logging each retry at `warn`
/// with the activity name (spec §4.5.8 "activities must be idempotent").
pub async fn run_activity<T, E, F, Fut>(name: &'static str, policy: &RetryPolicyConfig, f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    f.retry(backoff(policy))
        .notify(|err: &E, dur: Duration| {
            tracing::warn!(activity = name, error = %err, delay = ?dur, "activity retrying");
        })
        .await
}

/// `NotifyCustomer` (spec §4.5.6/§4.5.7): best-effort, published as a
/// domain event rather than called as a separate outbound service (§6.3
/// lists no notification contract). Failure is a warning, never propagated.
pub async fn notify_customer(outbox: &dyn OutboxStore, order_id: OrderId, event_type: &str, data: serde_json::Value) {
    let event = OutboxEvent::new(event_type.to_string(), order_id.0.to_string(), order_id.0.to_string(), data);
    if let Err(e) = outbox.append(event).await {
        tracing::warn!(error = %e, %order_id, "customer notification failed, continuing");
    }
}
