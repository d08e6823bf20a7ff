//! End-to-end review flows: draw, note, save, reload, decide.
//!
//! Drives the playback synchronizer, interaction controller, and session
//! coordinator together against the in-memory store.

use std::sync::Arc;

use assert_matches::assert_matches;

use frameproof_core::config::ReviewConfig;
use frameproof_core::error::CoreError;
use frameproof_core::geometry::{Point, Shape, Tool};
use frameproof_core::interaction::{InteractionController, InteractionState, PointerUp};
use frameproof_core::notice::NoopObserver;
use frameproof_core::playback::{HeadlessPlayback, PlaybackEvent, PlaybackSync};
use frameproof_core::review::{Review, ReviewDecision, ReviewStatus};
use frameproof_core::session::ReviewSession;
use frameproof_core::store::{InMemoryReviewStore, ReviewStore};
use frameproof_core::viewport::ViewportHandle;

struct Harness {
    store: Arc<InMemoryReviewStore>,
    session: ReviewSession<Arc<InMemoryReviewStore>>,
    controller: InteractionController,
    playback: PlaybackSync<HeadlessPlayback>,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryReviewStore::new());
    let review = Review::new("r1", "deliverable-7", "https://cdn.example/v.mp4?sig=x");
    store.insert(review.clone());

    let config = ReviewConfig::default();
    let viewport = ViewportHandle::default();
    viewport.resize(1920.0, 1080.0, 960.0).unwrap();

    let mut playback = PlaybackSync::new(HeadlessPlayback::default());
    playback.handle_event(PlaybackEvent::LoadedMetadata { duration: 60.0 });

    Harness {
        session: ReviewSession::new(review, Arc::clone(&store), NoopObserver, config.clone()),
        controller: InteractionController::new(viewport, &config),
        store,
        playback,
    }
}

impl Harness {
    fn draw(&mut self, tool: Tool, from: (f64, f64), to: (f64, f64)) -> PointerUp {
        self.controller.set_tool(tool).unwrap();
        self.controller
            .pointer_down(Point::new(from.0, from.1), &mut self.playback);
        self.controller.pointer_move(Point::new(to.0, to.1));
        self.controller.pointer_up(Point::new(to.0, to.1))
    }
}

// ---------------------------------------------------------------------------
// Scenario: draw, note, request changes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn draw_rect_with_note_then_request_changes() {
    let mut h = harness();
    h.playback.play();
    h.playback
        .handle_event(PlaybackEvent::TimeUpdate { current_time: 3.0 });

    assert_eq!(h.draw(Tool::Rect, (100.0, 100.0), (150.0, 140.0)), PointerUp::AwaitingNote);
    assert!(!h.playback.is_playing(), "drawing must pause playback");

    h.session
        .commit_pending(&mut h.controller, Some("fix logo".into()), "reviewer")
        .unwrap();
    assert_eq!(h.session.annotations().len(), 1);
    assert_eq!(h.session.annotations()[0].timestamp_seconds, 3.0);
    assert_eq!(h.session.annotations()[0].shape, Shape::Rect);

    let before = h.session.annotations().to_vec();
    let review = h
        .session
        .submit(ReviewDecision::ChangesRequested, Some("see note".into()))
        .await
        .unwrap();

    assert_eq!(review.status, ReviewStatus::ChangesRequested);
    assert_eq!(review.reviewer_note.as_deref(), Some("see note"));
    assert!(review.reviewed_at.is_some());
    assert_eq!(review.annotations, before);
}

// ---------------------------------------------------------------------------
// Scenario: cancel before note
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancel_before_note_adds_nothing_and_saves_nothing() {
    let mut h = harness();
    assert_eq!(h.draw(Tool::Circle, (50.0, 50.0), (120.0, 90.0)), PointerUp::AwaitingNote);

    assert!(h.controller.cancel());
    assert_eq!(h.controller.state(), &InteractionState::Idle);
    assert!(h.session.annotations().is_empty());
    assert_eq!(h.store.update_calls(), 0);
}

// ---------------------------------------------------------------------------
// Property: tiny shapes are never committed
// ---------------------------------------------------------------------------

#[test]
fn shapes_under_minimum_are_no_ops() {
    let mut h = harness();
    for (dx, dy) in [(0.0, 0.0), (9.0, 9.0), (-9.5, 3.0), (4.0, -9.9)] {
        let outcome = h.draw(Tool::Rect, (200.0, 200.0), (200.0 + dx, 200.0 + dy));
        assert_eq!(outcome, PointerUp::Discarded);
        assert_matches!(
            h.session.commit_pending(&mut h.controller, None, "r"),
            Err(CoreError::Conflict(_))
        );
    }
    assert!(h.session.annotations().is_empty());
}

// ---------------------------------------------------------------------------
// Property: timestamp anchored at drag start
// ---------------------------------------------------------------------------

#[test]
fn committed_timestamp_is_time_at_drag_start() {
    let mut h = harness();
    h.playback.play();
    h.playback
        .handle_event(PlaybackEvent::TimeUpdate { current_time: 12.4 });

    h.draw(Tool::Circle, (10.0, 10.0), (80.0, 80.0));

    // A late time update while the reviewer types must not move the anchor.
    h.playback
        .handle_event(PlaybackEvent::TimeUpdate { current_time: 12.9 });
    h.playback.seek(30.0).unwrap();

    let id = h
        .session
        .commit_pending(&mut h.controller, None, "r")
        .unwrap();
    assert_eq!(h.session.annotation(id).unwrap().timestamp_seconds, 12.4);
}

// ---------------------------------------------------------------------------
// Property: visibility window
// ---------------------------------------------------------------------------

#[test]
fn visibility_follows_play_state() {
    let mut h = harness();
    for t in [5.0, 20.0] {
        h.playback.seek(t).unwrap();
        h.draw(Tool::Rect, (10.0, 10.0), (60.0, 60.0));
        h.session
            .commit_pending(&mut h.controller, None, "r")
            .unwrap();
    }

    h.playback.play();
    h.playback
        .handle_event(PlaybackEvent::TimeUpdate { current_time: 5.2 });
    let visible = h.session.visible(&h.playback.state());
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].timestamp_seconds, 5.0);

    h.playback.pause();
    assert_eq!(h.session.visible(&h.playback.state()).len(), 2);
}

// ---------------------------------------------------------------------------
// Property: double submit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_after_approval_changes_nothing() {
    let mut h = harness();
    h.session.submit(ReviewDecision::Approved, None).await.unwrap();
    assert_eq!(h.store.update_calls(), 1);

    for decision in [ReviewDecision::Approved, ReviewDecision::ChangesRequested] {
        assert_matches!(
            h.session.submit(decision, Some("late".into())).await,
            Err(CoreError::Conflict(_))
        );
    }
    assert_eq!(h.session.status(), ReviewStatus::Approved);
    assert_eq!(h.store.update_calls(), 1);

    h.session.sync_controller(&mut h.controller);
    h.controller.set_tool(Tool::Rect).unwrap();
    assert!(!h
        .controller
        .pointer_down(Point::new(10.0, 10.0), &mut h.playback));
}

// ---------------------------------------------------------------------------
// Round trip: save then reload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn saved_annotations_reload_identically() {
    let mut h = harness();
    let shapes = [
        (Tool::Rect, 1.0, Some("crop tighter")),
        (Tool::Circle, 4.5, None),
        (Tool::Rect, 9.25, Some("colour shift")),
    ];
    for (tool, t, note) in shapes {
        h.playback.seek(t).unwrap();
        h.draw(tool, (100.0, 100.0), (180.0, 150.0));
        h.session
            .commit_pending(&mut h.controller, note.map(String::from), "r")
            .unwrap();
    }
    h.session.persist_annotations().await.unwrap();

    let reloaded = ReviewSession::load(
        Arc::clone(&h.store),
        "r1",
        NoopObserver,
        ReviewConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(reloaded.annotations(), h.session.annotations());
    assert!(!reloaded.has_unsaved_changes());

    let stored = h.store.find_review("r1").await.unwrap().unwrap();
    let mut ids: Vec<_> = stored.annotations.iter().map(|a| a.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}
