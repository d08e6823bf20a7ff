//! `frameproof-replay` library crate.
//!
//! Replays a scripted review session against the in-memory store or
//! Postgres. The binary entrypoint lives in `main.rs`; the modules are
//! public for integration testing.

pub mod approvals;
pub mod config;
pub mod error;
pub mod runner;
pub mod script;

pub use error::ReplayError;
pub use runner::{replay, ReplayReport, StepOutcome};
pub use script::{ReplayScript, Step};
