//! Frameproof review event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`. Implements the core
//!   [`ReviewObserver`](frameproof_core::notice::ReviewObserver) so a review
//!   session can publish straight onto it.
//! - [`ReviewEvent`]: the envelope carried on the bus.
//! - [`ApprovalRelay`]: background loop forwarding status changes to the
//!   component that tracks deliverable approval.

pub mod bus;
pub mod relay;

pub use bus::{EventBus, ReviewEvent};
pub use relay::{ApprovalRelay, ApprovalSink};
