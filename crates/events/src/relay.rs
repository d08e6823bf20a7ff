//! Forwards review decisions to the deliverable approval tracker.
//!
//! [`ApprovalRelay`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and hands every status change to an [`ApprovalSink`]. The review
//! subsystem never writes deliverable records itself.

use std::future::Future;

use tokio::sync::broadcast;

use frameproof_core::error::CoreError;
use frameproof_core::notice::ReviewNotice;
use frameproof_core::review::ReviewStatus;

use crate::bus::ReviewEvent;

/// Whatever tracks deliverable approval state.
pub trait ApprovalSink: Send + Sync {
    fn record_status(
        &self,
        deliverable_id: &str,
        review_id: &str,
        status: ReviewStatus,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Background loop relaying status changes.
pub struct ApprovalRelay;

impl ApprovalRelay {
    /// Run until the bus is dropped. Returns the number of status changes
    /// forwarded successfully.
    pub async fn run<K: ApprovalSink>(
        sink: K,
        mut receiver: broadcast::Receiver<ReviewEvent>,
    ) -> usize {
        let mut forwarded = 0;
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if Self::forward(&sink, &event).await {
                        forwarded += 1;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Approval relay lagged, some review events were not forwarded"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!(forwarded, "Event bus closed, approval relay shutting down");
                    break;
                }
            }
        }
        forwarded
    }

    async fn forward<K: ApprovalSink>(sink: &K, event: &ReviewEvent) -> bool {
        let ReviewNotice::StatusChanged {
            review_id,
            deliverable_id,
            status,
        } = &event.notice
        else {
            return false;
        };

        match sink.record_status(deliverable_id, review_id, *status).await {
            Ok(()) => {
                tracing::info!(
                    deliverable_id = %deliverable_id,
                    review_id = %review_id,
                    status = %status,
                    "Deliverable approval state updated"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    deliverable_id = %deliverable_id,
                    review_id = %review_id,
                    "Failed to update deliverable approval state"
                );
                false
            }
        }
    }
}
