//! Repository for the `video_reviews` table.

use sqlx::PgPool;

use crate::models::review::{CreateReview, ReviewRow, UpdateReview};

/// Column list for video_reviews queries.
const COLUMNS: &str = "id, deliverable_id, video_url, status, annotations, \
    reviewer_note, reviewed_at, created_at, updated_at";

/// Provides read and update operations for video reviews.
pub struct ReviewRepo;

impl ReviewRepo {
    /// Insert a new pending review with no annotations.
    pub async fn create(pool: &PgPool, input: &CreateReview) -> Result<ReviewRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO video_reviews (id, deliverable_id, video_url)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReviewRow>(&query)
            .bind(&input.id)
            .bind(&input.deliverable_id)
            .bind(&input.video_url)
            .fetch_one(pool)
            .await
    }

    /// Find a review by its ID.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<ReviewRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM video_reviews WHERE id = $1");
        sqlx::query_as::<_, ReviewRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Most recent review for a deliverable. Newer reviews supersede older
    /// ones for display.
    pub async fn find_latest_for_deliverable(
        pool: &PgPool,
        deliverable_id: &str,
    ) -> Result<Option<ReviewRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM video_reviews
             WHERE deliverable_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, ReviewRow>(&query)
            .bind(deliverable_id)
            .fetch_optional(pool)
            .await
    }

    /// Apply a partial update in a single statement. Absent fields keep
    /// their stored value. Returns `None` if no review has this ID.
    pub async fn update(
        pool: &PgPool,
        id: &str,
        input: &UpdateReview,
    ) -> Result<Option<ReviewRow>, sqlx::Error> {
        let query = format!(
            "UPDATE video_reviews SET
                annotations = COALESCE($2, annotations),
                status = COALESCE($3, status),
                reviewer_note = COALESCE($4, reviewer_note),
                reviewed_at = COALESCE($5, reviewed_at),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReviewRow>(&query)
            .bind(id)
            .bind(&input.annotations)
            .bind(input.status)
            .bind(&input.reviewer_note)
            .bind(input.reviewed_at)
            .fetch_optional(pool)
            .await
    }
}
