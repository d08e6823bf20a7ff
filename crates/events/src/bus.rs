//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`ReviewEvent`]s. Share it
//! via `Arc<EventBus>`; the review session only needs `&self` to publish.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use frameproof_core::notice::{ReviewNotice, ReviewObserver};
use frameproof_core::types::ReviewId;

// ---------------------------------------------------------------------------
// Event type names
// ---------------------------------------------------------------------------

pub const EVENT_ANNOTATIONS_SAVED: &str = "review.annotations_saved";
pub const EVENT_STATUS_CHANGED: &str = "review.status_changed";
pub const EVENT_PERSISTENCE_FAILED: &str = "review.persistence_failed";

// ---------------------------------------------------------------------------
// ReviewEvent
// ---------------------------------------------------------------------------

/// A review notice stamped for distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewEvent {
    /// Dot-separated event name, e.g. `"review.status_changed"`.
    pub event_type: String,

    pub review_id: ReviewId,

    pub notice: ReviewNotice,

    /// When the event was published (UTC).
    pub timestamp: DateTime<Utc>,
}

impl ReviewEvent {
    pub fn new(notice: ReviewNotice) -> Self {
        let event_type = match &notice {
            ReviewNotice::AnnotationsSaved { .. } => EVENT_ANNOTATIONS_SAVED,
            ReviewNotice::StatusChanged { .. } => EVENT_STATUS_CHANGED,
            ReviewNotice::PersistenceFailed { .. } => EVENT_PERSISTENCE_FAILED,
        };
        Self {
            event_type: event_type.to_string(),
            review_id: notice.review_id().to_string(),
            notice,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use frameproof_core::notice::ReviewNotice;
/// use frameproof_events::bus::{EventBus, ReviewEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(ReviewEvent::new(ReviewNotice::AnnotationsSaved {
///     review_id: "r1".into(),
///     count: 2,
/// }));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<ReviewEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers. Dropped silently if
    /// nobody is listening.
    pub fn publish(&self, event: ReviewEvent) {
        // SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReviewEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ReviewObserver for EventBus {
    fn notify(&self, notice: ReviewNotice) {
        self.publish(ReviewEvent::new(notice));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
