//! Review session coordinator.
//!
//! Owns the in-memory annotation list for one [`Review`], applies the
//! visibility filter, makes the two outbound persistence calls, and runs
//! the approval state machine. It is the only part of the review flow with
//! externally visible side effects.
//!
//! Local mutations are optimistic: they apply immediately and are only
//! written out by [`ReviewSession::persist_annotations`] or
//! [`ReviewSession::submit`]. A failed call leaves both the status and the
//! in-memory annotations as they were, so the reviewer can retry.

use chrono::Utc;

use crate::config::ReviewConfig;
use crate::error::CoreError;
use crate::geometry::{normalize_note, validate_note, Annotation, Point};
use crate::interaction::InteractionController;
use crate::notice::{NoopObserver, ReviewNotice, ReviewObserver, ReviewOperation};
use crate::playback::{PlaybackControl, PlaybackState, PlaybackSync};
use crate::review::{summarize, Review, ReviewDecision, ReviewStatus, ReviewSummary, ReviewUpdate};
use crate::store::ReviewStore;
use crate::types::AnnotationId;
use crate::visibility::visible_at;

pub struct ReviewSession<S, O = NoopObserver> {
    review: Review,
    /// Annotation set as of the last successful write (or mount).
    persisted: Vec<Annotation>,
    store: S,
    observer: O,
    config: ReviewConfig,
}

impl<S: ReviewStore, O: ReviewObserver> ReviewSession<S, O> {
    /// Mount a session over a record supplied by the deliverable pipeline.
    pub fn new(review: Review, store: S, observer: O, config: ReviewConfig) -> Self {
        tracing::info!(
            review_id = %review.id,
            deliverable_id = %review.deliverable_id,
            status = %review.status,
            annotations = review.annotations.len(),
            "Review session mounted"
        );
        Self {
            persisted: review.annotations.clone(),
            review,
            store,
            observer,
            config,
        }
    }

    /// Load the record from `store` and mount a session over it.
    pub async fn load(
        store: S,
        review_id: &str,
        observer: O,
        config: ReviewConfig,
    ) -> Result<Self, CoreError> {
        let review = store
            .find_review(review_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "Review",
                id: review_id.to_string(),
            })?;
        Ok(Self::new(review, store, observer, config))
    }

    // -- read side -----------------------------------------------------------

    pub fn review(&self) -> &Review {
        &self.review
    }

    pub fn status(&self) -> ReviewStatus {
        self.review.status
    }

    pub fn is_pending(&self) -> bool {
        !self.review.status.is_terminal()
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Annotations in insertion order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.review.annotations
    }

    /// Annotations ordered by playback time. Ties keep insertion order.
    pub fn annotations_by_time(&self) -> Vec<&Annotation> {
        let mut list: Vec<&Annotation> = self.review.annotations.iter().collect();
        list.sort_by(|a, b| a.timestamp_seconds.total_cmp(&b.timestamp_seconds));
        list
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.review.annotations.iter().find(|a| a.id == id)
    }

    /// Annotations to draw for the given playback state.
    pub fn visible(&self, playback: &PlaybackState) -> Vec<&Annotation> {
        visible_at(
            &self.review.annotations,
            playback,
            self.config.visibility_tolerance_secs,
        )
    }

    /// Topmost visible annotation under `at`. Later annotations draw on top.
    pub fn annotation_at(&self, at: Point, playback: &PlaybackState) -> Option<&Annotation> {
        self.visible(playback)
            .into_iter()
            .rev()
            .find(|a| a.contains(at))
    }

    pub fn summary(&self) -> ReviewSummary {
        summarize(&self.review)
    }

    /// Whether the in-memory annotations differ from the last write.
    pub fn has_unsaved_changes(&self) -> bool {
        self.review.annotations != self.persisted
    }

    // -- authoring -----------------------------------------------------------

    /// Append an annotation. Applied immediately, not persisted.
    pub fn add_annotation(&mut self, annotation: Annotation) -> Result<(), CoreError> {
        self.ensure_pending("add annotation")?;
        self.check_insertable(&annotation)?;
        tracing::info!(
            review_id = %self.review.id,
            annotation_id = %annotation.id,
            timestamp_seconds = annotation.timestamp_seconds,
            shape = %annotation.shape,
            "Annotation added"
        );
        self.review.annotations.push(annotation);
        Ok(())
    }

    /// Remove an annotation by id, keeping the order of the rest.
    pub fn remove_annotation(&mut self, id: AnnotationId) -> Result<Annotation, CoreError> {
        self.ensure_pending("remove annotation")?;
        let index = self
            .review
            .annotations
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "Annotation",
                id: id.to_string(),
            })?;
        let removed = self.review.annotations.remove(index);
        tracing::info!(
            review_id = %self.review.id,
            annotation_id = %id,
            "Annotation removed"
        );
        Ok(removed)
    }

    /// Commit the controller's pending shape with `note` and append it.
    pub fn commit_pending(
        &mut self,
        controller: &mut InteractionController,
        note: Option<String>,
        created_by: &str,
    ) -> Result<AnnotationId, CoreError> {
        self.ensure_pending("commit annotation")?;
        // Checked before the controller lets go of the shape, so a rejected
        // commit can be retried without redrawing.
        let annotation =
            controller.commit_checked(note, created_by, |a| self.check_insertable(a))?;
        let id = annotation.id;
        self.add_annotation(annotation)?;
        Ok(id)
    }

    /// Enable the controller only while the review accepts annotations.
    pub fn sync_controller(&self, controller: &mut InteractionController) {
        controller.set_enabled(self.is_pending());
    }

    /// Jump playback to an annotation's moment. Pauses so the marker stays
    /// on screen.
    pub fn seek_to<P: PlaybackControl>(
        &self,
        id: AnnotationId,
        playback: &mut PlaybackSync<P>,
    ) -> Result<f64, CoreError> {
        let annotation = self.annotation(id).ok_or_else(|| CoreError::NotFound {
            entity: "Annotation",
            id: id.to_string(),
        })?;
        playback.pause();
        playback.seek(annotation.timestamp_seconds)
    }

    // -- persistence ---------------------------------------------------------

    /// Replace the stored annotation set with the in-memory one.
    ///
    /// Last writer wins; nothing is merged.
    pub async fn persist_annotations(&mut self) -> Result<(), CoreError> {
        self.ensure_pending("save annotations")?;
        let snapshot = self.review.annotations.clone();
        let update = ReviewUpdate::annotations(snapshot.clone());

        match self.store.update_review(&self.review.id, &update).await {
            Ok(()) => {
                let count = snapshot.len();
                self.persisted = snapshot;
                tracing::info!(review_id = %self.review.id, count, "Annotations saved");
                self.observer.notify(ReviewNotice::AnnotationsSaved {
                    review_id: self.review.id.clone(),
                    count,
                });
                Ok(())
            }
            Err(e) => Err(self.report_failure(ReviewOperation::Save, e)),
        }
    }

    /// Record the reviewer's decision together with the current annotations,
    /// the overall note, and `reviewed_at`, in one update.
    ///
    /// Rejected without side effects if the review is already decided.
    pub async fn submit(
        &mut self,
        decision: ReviewDecision,
        reviewer_note: Option<String>,
    ) -> Result<&Review, CoreError> {
        if self.review.status.is_terminal() {
            tracing::warn!(
                review_id = %self.review.id,
                status = %self.review.status,
                decision = decision.as_str(),
                "Submit rejected, review already decided"
            );
            return Err(CoreError::Conflict(format!(
                "review {} is already {}",
                self.review.id, self.review.status
            )));
        }
        let reviewer_note = normalize_note(reviewer_note);
        validate_note(reviewer_note.as_deref(), self.config.max_note_length)?;

        let snapshot = self.review.annotations.clone();
        let update = ReviewUpdate {
            annotations: Some(snapshot.clone()),
            status: Some(decision.status()),
            reviewer_note,
            reviewed_at: Some(Utc::now()),
        };

        if let Err(e) = self.store.update_review(&self.review.id, &update).await {
            return Err(self.report_failure(ReviewOperation::Submit, e));
        }

        self.review.apply(&update);
        self.persisted = snapshot;
        tracing::info!(
            review_id = %self.review.id,
            status = %self.review.status,
            annotations = self.review.annotations.len(),
            "Review decision submitted"
        );
        self.observer.notify(ReviewNotice::StatusChanged {
            review_id: self.review.id.clone(),
            deliverable_id: self.review.deliverable_id.clone(),
            status: self.review.status,
        });
        Ok(&self.review)
    }

    // -- helpers -------------------------------------------------------------

    fn ensure_pending(&self, action: &str) -> Result<(), CoreError> {
        if self.review.status.is_terminal() {
            tracing::warn!(
                review_id = %self.review.id,
                status = %self.review.status,
                action,
                "Rejected on decided review"
            );
            return Err(CoreError::Conflict(format!(
                "cannot {action}: review {} is {}",
                self.review.id, self.review.status
            )));
        }
        Ok(())
    }

    fn check_insertable(&self, annotation: &Annotation) -> Result<(), CoreError> {
        annotation.validate(self.config.min_shape_size_px, self.config.max_note_length)?;
        if self.annotation(annotation.id).is_some() {
            return Err(CoreError::Conflict(format!(
                "annotation {} already exists",
                annotation.id
            )));
        }
        Ok(())
    }

    fn report_failure(&self, operation: ReviewOperation, error: CoreError) -> CoreError {
        tracing::error!(
            review_id = %self.review.id,
            operation = operation.as_str(),
            error = %error,
            "Review persistence failed"
        );
        self.observer.notify(ReviewNotice::PersistenceFailed {
            review_id: self.review.id.clone(),
            operation,
            message: error.to_string(),
        });
        match error {
            CoreError::Persistence(_) => error,
            other => CoreError::Persistence(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
