//! Persistence collaborator interface.
//!
//! The review subsystem only needs read-by-id and partial update-by-id.
//! Each update must be applied atomically and be durable once it returns.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::CoreError;
use crate::review::{Review, ReviewUpdate};
use crate::types::ReviewId;

/// Storage backend for review records.
pub trait ReviewStore: Send + Sync {
    /// Load a review by id. `Ok(None)` if it does not exist.
    fn find_review(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Review>, CoreError>> + Send;

    /// Apply a partial update to an existing review.
    fn update_review(
        &self,
        id: &str,
        update: &ReviewUpdate,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

impl<S: ReviewStore> ReviewStore for Arc<S> {
    fn find_review(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Review>, CoreError>> + Send {
        (**self).find_review(id)
    }

    fn update_review(
        &self,
        id: &str,
        update: &ReviewUpdate,
    ) -> impl Future<Output = Result<(), CoreError>> + Send {
        (**self).update_review(id, update)
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Process-local store for development, scripted replays, and tests.
#[derive(Debug, Default)]
pub struct InMemoryReviewStore {
    reviews: Mutex<HashMap<ReviewId, Review>>,
    update_calls: AtomicUsize,
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, as the upload pipeline would.
    pub fn insert(&self, review: Review) {
        self.lock().insert(review.id.clone(), review);
    }

    /// Number of update calls received, successful or not.
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ReviewId, Review>> {
        // A poisoned map still holds consistent records: every update is a
        // single `apply` on one entry.
        self.reviews.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ReviewStore for InMemoryReviewStore {
    async fn find_review(&self, id: &str) -> Result<Option<Review>, CoreError> {
        Ok(self.lock().get(id).cloned())
    }

    async fn update_review(&self, id: &str, update: &ReviewUpdate) -> Result<(), CoreError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut reviews = self.lock();
        let review = reviews.get_mut(id).ok_or_else(|| CoreError::NotFound {
            entity: "Review",
            id: id.to_string(),
        })?;
        review.apply(update);
        Ok(())
    }
}
