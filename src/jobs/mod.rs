//! Durable enrichment: an outbox of [`EnrichmentJob`](crate::model::EnrichmentJob)s
//! held by the store, drained by a [`JobWorker`].
//!
//! Delivery is at-least-once. A job whose lease expires before it is
//! completed becomes due again, so every handler must tolerate re-runs.

mod error;
pub mod worker;

#[cfg(test)]
mod tests;

pub use error::JobError;
pub use worker::{JobWorker, WorkerConfig};
