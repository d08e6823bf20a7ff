//! Approval sink for replays: records decisions instead of touching
//! deliverable records.

use std::sync::{Arc, Mutex};

use frameproof_core::error::CoreError;
use frameproof_core::review::ReviewStatus;
use frameproof_events::ApprovalSink;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedApproval {
    pub deliverable_id: String,
    pub review_id: String,
    pub status: ReviewStatus,
}

/// Shared log of relayed decisions. Clones see the same entries.
#[derive(Debug, Clone, Default)]
pub struct RecordedApprovals {
    entries: Arc<Mutex<Vec<RecordedApproval>>>,
}

impl RecordedApprovals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<RecordedApproval> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl ApprovalSink for RecordedApprovals {
    async fn record_status(
        &self,
        deliverable_id: &str,
        review_id: &str,
        status: ReviewStatus,
    ) -> Result<(), CoreError> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedApproval {
                deliverable_id: deliverable_id.to_string(),
                review_id: review_id.to_string(),
                status,
            });
        Ok(())
    }
}
