//! Persistence boundary (spec §6.4): one document per aggregate, in its own
//! collection, keyed by its business ID. The repository traits themselves
//! ([`crate::execution_plan::route::RouteRepository`],
//! [`crate::execution_plan::template_store::TemplateStore`],
//! [`crate::outbox::OutboxStore`], [`crate::idempotency::IdempotencyStore`])
//! live next to the domain concern they serve; this module holds their
//! concrete backends.

#[cfg(feature = "mongodb-storage")]
pub mod mongodb;
