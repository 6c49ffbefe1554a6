//! WES core — order-to-ship execution engine.
//!
//! Three cooperating subsystems, built bottom-up:
//! - [`process_path`]: pure classification of an order into a [`domain::ProcessPath`].
//! - [`execution_plan`]: template selection and the [`domain::TaskRoute`] stage
//!   state machine.
//! - [`workflows`]: durable, signal-driven orchestration that drives a route
//!   through its stages.
//!
//! [`outbox`] and [`idempotency`] are the cross-cutting substrate every
//! mutating operation goes through; [`storage`] and [`clients`] are the
//! boundary to MongoDB and the external domain services; [`http`] is the
//! REST surface described in spec §6.1.

pub mod clients;
pub mod config;
pub mod domain;
pub mod execution_plan;
pub mod http;
pub mod idempotency;
pub mod outbox;
pub mod process_path;
pub mod storage;
pub mod telemetry;
pub mod workflows;
