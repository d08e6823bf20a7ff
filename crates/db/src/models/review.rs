//! Video review row model and DTOs.

use sqlx::FromRow;

use frameproof_core::error::CoreError;
use frameproof_core::geometry::Annotation;
use frameproof_core::review::{Review, ReviewStatus, ReviewUpdate};
use frameproof_core::types::Timestamp;

/// A row from the `video_reviews` table.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewRow {
    pub id: String,
    pub deliverable_id: String,
    pub video_url: String,
    pub status: String,
    pub annotations: serde_json::Value,
    pub reviewer_note: Option<String>,
    pub reviewed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ReviewRow {
    /// Decode into the domain record. Fails if the stored status or
    /// annotation JSON no longer parses.
    pub fn into_review(self) -> Result<Review, CoreError> {
        let status = ReviewStatus::from_str(&self.status)?;
        let annotations: Vec<Annotation> =
            serde_json::from_value(self.annotations).map_err(|e| {
                CoreError::Internal(format!(
                    "review {} has malformed annotations: {e}",
                    self.id
                ))
            })?;
        Ok(Review {
            id: self.id,
            deliverable_id: self.deliverable_id,
            video_url: self.video_url,
            status,
            annotations,
            reviewer_note: self.reviewer_note,
            reviewed_at: self.reviewed_at,
        })
    }
}

/// DTO for creating a review. Used by the upload pipeline and tests.
#[derive(Debug)]
pub struct CreateReview {
    pub id: String,
    pub deliverable_id: String,
    pub video_url: String,
}

/// Column-level form of [`ReviewUpdate`]. `None` leaves the column as is.
#[derive(Debug, Default)]
pub struct UpdateReview {
    pub annotations: Option<serde_json::Value>,
    pub status: Option<&'static str>,
    pub reviewer_note: Option<String>,
    pub reviewed_at: Option<Timestamp>,
}

impl TryFrom<&ReviewUpdate> for UpdateReview {
    type Error = CoreError;

    fn try_from(update: &ReviewUpdate) -> Result<Self, Self::Error> {
        let annotations = update
            .annotations
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| CoreError::Internal(format!("failed to encode annotations: {e}")))?;
        Ok(Self {
            annotations,
            status: update.status.map(|s| s.as_str()),
            reviewer_note: update.reviewer_note.clone(),
            reviewed_at: update.reviewed_at,
        })
    }
}
