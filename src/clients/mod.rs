//! Outbound HTTP clients to Inventory and Labor (spec §6.3).
//!
//! Each client is a trait + a `reqwest`-backed implementation, the same
//! shape as the teacher's `RestConnector` (`connectors/rest.rs` in the
//! enriching `knhk-workflow-engine` example): build once with a base URL and
//! timeout, retry transient failures with [`crate::config::RetryPolicyConfig`].

pub mod inventory;
pub mod labor;

use std::time::Duration;

use reqwest::Client;

/// Shared HTTP client construction for outbound service clients.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().timeout(timeout).build()
}

/// Build a W3C `traceparent` header value for outbound propagation (spec §9
/// tracing note). `trace_id`/`span_id` come from the caller's current
/// workflow/activity identifiers rather than a process-wide tracer, keeping
/// with spec §9 "config/context as explicit record".
pub fn traceparent_header(trace_id: uuid::Uuid, span_id: u64) -> (&'static str, String) {
    (
        "traceparent",
        format!("00-{:032x}-{:016x}-01", trace_id.as_u128(), span_id),
    )
}
