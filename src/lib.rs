// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod privilege;

pub use crate::config::Config;
pub use crate::ingest::{run_once, run_once_at, CycleSummary};
pub use crate::notify::{compose_status, DeliveryOutcome, StatusPayload, StatusPublisher};
