//! [`ReviewStore`] backed by the `video_reviews` table.

use frameproof_core::error::CoreError;
use frameproof_core::review::{Review, ReviewUpdate};
use frameproof_core::store::ReviewStore;

use crate::models::review::UpdateReview;
use crate::repositories::ReviewRepo;
use crate::DbPool;

#[derive(Debug, Clone)]
pub struct PgReviewStore {
    pool: DbPool,
}

impl PgReviewStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn persistence_error(e: sqlx::Error) -> CoreError {
    CoreError::Persistence(e.to_string())
}

impl ReviewStore for PgReviewStore {
    async fn find_review(&self, id: &str) -> Result<Option<Review>, CoreError> {
        ReviewRepo::find_by_id(&self.pool, id)
            .await
            .map_err(persistence_error)?
            .map(|row| row.into_review())
            .transpose()
    }

    async fn update_review(&self, id: &str, update: &ReviewUpdate) -> Result<(), CoreError> {
        let columns = UpdateReview::try_from(update)?;
        let updated = ReviewRepo::update(&self.pool, id, &columns)
            .await
            .map_err(persistence_error)?;
        match updated {
            Some(_) => {
                tracing::debug!(review_id = %id, "Review row updated");
                Ok(())
            }
            None => Err(CoreError::NotFound {
                entity: "Review",
                id: id.to_string(),
            }),
        }
    }
}
