//! Notifications the review coordinator emits to downstream consumers.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::review::ReviewStatus;
use crate::types::ReviewId;

/// Which outbound call a notice refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOperation {
    Save,
    Submit,
}

impl ReviewOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Save => "save",
            Self::Submit => "submit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReviewNotice {
    /// The annotation set was written to storage.
    AnnotationsSaved { review_id: ReviewId, count: usize },
    /// A decision was recorded. Deliverable approval tracking keys off this.
    StatusChanged {
        review_id: ReviewId,
        deliverable_id: String,
        status: ReviewStatus,
    },
    /// A save or submit failed. In-memory state is intact and the call can
    /// be retried.
    PersistenceFailed {
        review_id: ReviewId,
        operation: ReviewOperation,
        message: String,
    },
}

impl ReviewNotice {
    pub fn review_id(&self) -> &str {
        match self {
            Self::AnnotationsSaved { review_id, .. }
            | Self::StatusChanged { review_id, .. }
            | Self::PersistenceFailed { review_id, .. } => review_id,
        }
    }
}

/// Receives coordinator notices. Implementations must not block.
pub trait ReviewObserver: Send + Sync {
    fn notify(&self, notice: ReviewNotice);
}

impl<T: ReviewObserver + ?Sized> ReviewObserver for Arc<T> {
    fn notify(&self, notice: ReviewNotice) {
        (**self).notify(notice)
    }
}

/// Observer that drops every notice.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ReviewObserver for NoopObserver {
    fn notify(&self, _notice: ReviewNotice) {}
}
