//! Drives a review session from a [`ReplayScript`].
//!
//! The runner wires the same pieces the reviewer UI does (a playback
//! synchronizer over a headless surface, the interaction controller, the
//! shared viewport, and the session coordinator) and feeds them the
//! scripted inputs. A step that the session rejects is recorded in the
//! report and the replay carries on, so one bad input does not hide what
//! the rest of the script would have done.

use serde::Serialize;

use frameproof_core::config::ReviewConfig;
use frameproof_core::error::CoreError;
use frameproof_core::geometry::Point;
use frameproof_core::interaction::{InteractionController, PointerUp};
use frameproof_core::notice::ReviewObserver;
use frameproof_core::playback::{HeadlessPlayback, PlaybackEvent, PlaybackSync};
use frameproof_core::review::{Review, ReviewSummary};
use frameproof_core::session::ReviewSession;
use frameproof_core::store::{InMemoryReviewStore, ReviewStore};
use frameproof_core::viewport::ViewportHandle;
use frameproof_db::models::review::CreateReview;
use frameproof_db::repositories::ReviewRepo;
use frameproof_db::DbPool;

use crate::error::ReplayError;
use crate::script::{ReplayScript, ScriptReview, Step, VideoSource};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// What happened to a single step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Applied,
    /// Accepted input that changed nothing (e.g. a move while idle).
    Ignored,
    /// A released shape was below the minimum size.
    Discarded,
    Rejected { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub step: &'static str,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub review: Review,
    pub summary: ReviewSummary,
    pub unsaved_changes: bool,
    pub steps: Vec<StepReport>,
}

impl ReplayReport {
    pub fn rejected(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Rejected { .. }))
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

pub struct Replay<S, O> {
    session: ReviewSession<S, O>,
    controller: InteractionController,
    playback: PlaybackSync<HeadlessPlayback>,
    viewport: ViewportHandle,
    video: VideoSource,
    reviewer: String,
}

impl<S: ReviewStore, O: ReviewObserver> Replay<S, O> {
    /// Load the script's review from `store` and set up the surfaces.
    pub async fn prepare(
        script: &ReplayScript,
        store: S,
        observer: O,
        config: ReviewConfig,
    ) -> Result<Self, ReplayError> {
        let video = script.video;
        let viewport = ViewportHandle::default();
        viewport.resize(video.width, video.height, script.container_width)?;

        let mut playback = PlaybackSync::new(HeadlessPlayback::default());
        if let Some(duration) = video.duration {
            playback.handle_event(PlaybackEvent::LoadedMetadata { duration });
        }

        let session = ReviewSession::load(store, &script.review.id, observer, config).await?;
        let mut controller = InteractionController::new(viewport.clone(), session.config());
        session.sync_controller(&mut controller);

        Ok(Self {
            session,
            controller,
            playback,
            viewport,
            video,
            reviewer: script.reviewer.clone(),
        })
    }

    pub fn session(&self) -> &ReviewSession<S, O> {
        &self.session
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn playback(&self) -> &PlaybackSync<HeadlessPlayback> {
        &self.playback
    }

    /// Apply one step.
    pub async fn apply(&mut self, step: &Step) -> Result<StepOutcome, CoreError> {
        let changed = match step {
            Step::Play => {
                self.playback.play();
                true
            }
            Step::Pause => {
                self.playback.pause();
                true
            }
            Step::Seek { t } => {
                self.playback.seek(*t)?;
                true
            }
            Step::Tick { t } => {
                self.playback
                    .handle_event(PlaybackEvent::TimeUpdate { current_time: *t });
                true
            }
            Step::Ended => {
                self.playback.handle_event(PlaybackEvent::Ended);
                true
            }
            Step::Resize { width } => {
                self.viewport
                    .resize(self.video.width, self.video.height, *width)?;
                true
            }
            Step::Tool { tool } => {
                self.controller.set_tool(*tool)?;
                true
            }
            Step::Color { color } => {
                self.controller.set_color(*color);
                true
            }
            Step::Down { x, y } => self
                .controller
                .pointer_down(Point::new(*x, *y), &mut self.playback),
            Step::Move { x, y } => self.controller.pointer_move(Point::new(*x, *y)),
            Step::Up { x, y } => match self.controller.pointer_up(Point::new(*x, *y)) {
                PointerUp::AwaitingNote => true,
                PointerUp::Ignored => false,
                PointerUp::Discarded => return Ok(StepOutcome::Discarded),
            },
            Step::Commit { note } => {
                self.session
                    .commit_pending(&mut self.controller, note.clone(), &self.reviewer)?;
                true
            }
            Step::Cancel => self.controller.cancel(),
            Step::Remove { index } => {
                let id = self
                    .session
                    .annotations()
                    .get(*index)
                    .map(|a| a.id)
                    .ok_or_else(|| CoreError::NotFound {
                        entity: "Annotation",
                        id: format!("#{index}"),
                    })?;
                self.session.remove_annotation(id)?;
                true
            }
            Step::Save => {
                self.session.persist_annotations().await?;
                true
            }
            Step::Submit { decision, note } => {
                self.session.submit(*decision, note.clone()).await?;
                self.session.sync_controller(&mut self.controller);
                true
            }
        };
        Ok(if changed {
            StepOutcome::Applied
        } else {
            StepOutcome::Ignored
        })
    }

    /// Apply every step in order and report the result.
    pub async fn run(mut self, steps: &[Step]) -> ReplayReport {
        let mut reports = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            let outcome = match self.apply(step).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(
                        index,
                        step = step.name(),
                        error = %e,
                        "Replay step rejected"
                    );
                    StepOutcome::Rejected {
                        reason: e.to_string(),
                    }
                }
            };
            reports.push(StepReport {
                index,
                step: step.name(),
                outcome,
            });
        }

        let report = ReplayReport {
            review: self.session.review().clone(),
            summary: self.session.summary(),
            unsaved_changes: self.session.has_unsaved_changes(),
            steps: reports,
        };
        tracing::info!(
            review_id = %report.review.id,
            status = %report.review.status,
            annotations = report.review.annotations.len(),
            steps = report.steps.len(),
            rejected = report.rejected().count(),
            "Replay finished"
        );
        report
    }
}

/// Load, prepare, and run `script` against `store`.
pub async fn replay<S: ReviewStore, O: ReviewObserver>(
    script: &ReplayScript,
    store: S,
    observer: O,
    config: ReviewConfig,
) -> Result<ReplayReport, ReplayError> {
    let runner = Replay::prepare(script, store, observer, config).await?;
    Ok(runner.run(&script.steps).await)
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Put the script's review into an in-memory store.
pub fn seed_in_memory(store: &InMemoryReviewStore, review: &ScriptReview) {
    store.insert(review.to_review());
}

/// Create the script's review in Postgres unless a row with that id exists.
/// Returns `true` if a row was created.
pub async fn seed_postgres(pool: &DbPool, review: &ScriptReview) -> Result<bool, ReplayError> {
    if ReviewRepo::find_by_id(pool, &review.id).await?.is_some() {
        tracing::info!(review_id = %review.id, "Replaying against existing review");
        return Ok(false);
    }
    ReviewRepo::create(
        pool,
        &CreateReview {
            id: review.id.clone(),
            deliverable_id: review.deliverable_id.clone(),
            video_url: review.video_url.clone(),
        },
    )
    .await?;
    tracing::info!(review_id = %review.id, "Seeded review for replay");
    Ok(true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
