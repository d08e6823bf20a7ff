//! Drawing interaction controller.
//!
//! A small state machine turning pointer events into annotations:
//!
//! ```text
//! Idle --down--> Drawing --up (big enough)--> PendingNote --commit--> Idle
//!                   |                              |
//!                   +--up (too small)--> Idle      +--cancel--> Idle
//! ```
//!
//! The in-progress shape lives inside the state variant, so a note prompt
//! without a shape cannot be represented.

use chrono::Utc;

use crate::config::ReviewConfig;
use crate::error::CoreError;
use crate::geometry::{
    meets_min_size, normalize_note, validate_note, Annotation, Bounds, Color, Point, Shape, Tool,
};
use crate::playback::{PlaybackControl, PlaybackSync};
use crate::viewport::ViewportHandle;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// A shape that has been started but not committed.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub shape: Shape,
    pub color: Color,
    /// Pointer-down position. Extents are measured from here.
    pub origin: Point,
    pub w: f64,
    pub h: f64,
    /// Playback time when the drag began.
    pub timestamp_seconds: f64,
}

impl Draft {
    pub fn bounds(&self) -> Bounds {
        Bounds::from_signed(self.origin.x, self.origin.y, self.w, self.h)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Drawing(Draft),
    PendingNote(Draft),
}

impl InteractionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Drawing(_) => "drawing",
            Self::PendingNote(_) => "pending_note",
        }
    }
}

/// What a pointer release did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerUp {
    /// Not drawing, or released outside the surface. Nothing changed.
    Ignored,
    /// The shape was below the minimum size and has been dropped.
    Discarded,
    /// The shape is waiting for its note.
    AwaitingNote,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct InteractionController {
    state: InteractionState,
    tool: Tool,
    color: Color,
    viewport: ViewportHandle,
    min_shape_size: f64,
    max_note_length: usize,
    enabled: bool,
}

impl InteractionController {
    pub fn new(viewport: ViewportHandle, config: &ReviewConfig) -> Self {
        Self {
            state: InteractionState::Idle,
            tool: Tool::Select,
            color: config.default_color,
            viewport,
            min_shape_size: config.min_shape_size_px,
            max_note_length: config.max_note_length,
            enabled: true,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The provisional shape to render, if any.
    pub fn draft(&self) -> Option<&Draft> {
        match &self.state {
            InteractionState::Idle => None,
            InteractionState::Drawing(d) | InteractionState::PendingNote(d) => Some(d),
        }
    }

    /// Tool controls must be disabled while this is true.
    pub fn tools_locked(&self) -> bool {
        !matches!(self.state, InteractionState::Idle)
    }

    /// Enable or disable authoring. Disabling drops any unfinished shape.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled && self.cancel() {
            tracing::debug!("Authoring disabled, unfinished shape dropped");
        }
        self.enabled = enabled;
    }

    /// Switch tools.
    ///
    /// Always legal while idle. While a note is pending, switching to
    /// [`Tool::Select`] abandons the shape; any other switch during a
    /// pending note or a drag is rejected.
    pub fn set_tool(&mut self, tool: Tool) -> Result<(), CoreError> {
        let abandons_draft = match (&self.state, tool) {
            (InteractionState::Idle, _) => false,
            (InteractionState::PendingNote(_), Tool::Select) => true,
            (state, _) => {
                return Err(CoreError::Conflict(format!(
                    "cannot switch to {} while {}",
                    tool.as_str(),
                    state.as_str()
                )));
            }
        };
        if abandons_draft {
            self.state = InteractionState::Idle;
            tracing::debug!("Pending shape abandoned by select tool");
        }
        self.tool = tool;
        Ok(())
    }

    /// Change the color used for the next shape.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Begin a shape. Pauses playback and anchors the shape to the paused
    /// time. Returns `false` if no shape was started.
    pub fn pointer_down<P: PlaybackControl>(
        &mut self,
        at: Point,
        playback: &mut PlaybackSync<P>,
    ) -> bool {
        if !self.enabled || !matches!(self.state, InteractionState::Idle) {
            return false;
        }
        let Some(shape) = self.tool.shape() else {
            return false;
        };
        if !self.viewport.get().contains(at) {
            return false;
        }

        playback.pause();
        let draft = Draft {
            shape,
            color: self.color,
            origin: at,
            w: 0.0,
            h: 0.0,
            timestamp_seconds: playback.current_time(),
        };
        tracing::debug!(
            shape = %shape,
            timestamp_seconds = draft.timestamp_seconds,
            "Shape started"
        );
        self.state = InteractionState::Drawing(draft);
        true
    }

    /// Stretch the shape being drawn. Points off the surface are clamped.
    pub fn pointer_move(&mut self, at: Point) -> bool {
        let InteractionState::Drawing(draft) = &mut self.state else {
            return false;
        };
        if !at.is_finite() {
            return false;
        }
        let p = self.viewport.get().clamp(at);
        draft.w = p.x - draft.origin.x;
        draft.h = p.y - draft.origin.y;
        true
    }

    /// Finish the drag.
    pub fn pointer_up(&mut self, at: Point) -> PointerUp {
        if !matches!(self.state, InteractionState::Drawing(_)) {
            return PointerUp::Ignored;
        }
        if !self.viewport.get().contains(at) {
            return PointerUp::Ignored;
        }
        self.pointer_move(at);

        let InteractionState::Drawing(draft) = std::mem::take(&mut self.state) else {
            return PointerUp::Ignored;
        };
        if meets_min_size(draft.w, draft.h, self.min_shape_size) {
            self.state = InteractionState::PendingNote(draft);
            PointerUp::AwaitingNote
        } else {
            tracing::debug!(w = draft.w, h = draft.h, "Shape below minimum size discarded");
            PointerUp::Discarded
        }
    }

    /// Turn the pending shape into an [`Annotation`].
    ///
    /// A note over the length limit leaves the shape pending so the
    /// reviewer can shorten it.
    pub fn commit(
        &mut self,
        note: Option<String>,
        created_by: &str,
    ) -> Result<Annotation, CoreError> {
        self.commit_checked(note, created_by, |_| Ok(()))
    }

    /// Like [`commit`](Self::commit), but `accept` gets the finished
    /// annotation first. If it refuses, the shape stays pending.
    pub fn commit_checked<F>(
        &mut self,
        note: Option<String>,
        created_by: &str,
        accept: F,
    ) -> Result<Annotation, CoreError>
    where
        F: FnOnce(&Annotation) -> Result<(), CoreError>,
    {
        let InteractionState::PendingNote(draft) = &self.state else {
            return Err(CoreError::Conflict(format!(
                "no shape awaiting a note (state is {})",
                self.state.as_str()
            )));
        };
        let note = normalize_note(note);
        validate_note(note.as_deref(), self.max_note_length)?;

        let annotation = Annotation {
            id: uuid::Uuid::new_v4(),
            timestamp_seconds: draft.timestamp_seconds,
            shape: draft.shape,
            x: draft.origin.x,
            y: draft.origin.y,
            w: draft.w,
            h: draft.h,
            color: draft.color,
            note,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };
        accept(&annotation)?;

        self.state = InteractionState::Idle;
        Ok(annotation)
    }

    /// Abandon any unfinished shape. Returns `true` if one was dropped.
    pub fn cancel(&mut self) -> bool {
        let had_draft = self.draft().is_some();
        self.state = InteractionState::Idle;
        had_draft
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{HeadlessPlayback, PlaybackEvent};
    use crate::viewport::Viewport;
    use assert_matches::assert_matches;

    fn setup() -> (InteractionController, PlaybackSync<HeadlessPlayback>) {
        let viewport = ViewportHandle::new(Viewport::new(640.0, 360.0).unwrap());
        let controller = InteractionController::new(viewport, &ReviewConfig::default());
        let mut playback = PlaybackSync::new(HeadlessPlayback::default());
        playback.handle_event(PlaybackEvent::LoadedMetadata { duration: 60.0 });
        (controller, playback)
    }

    fn drag(
        c: &mut InteractionController,
        pb: &mut PlaybackSync<HeadlessPlayback>,
        from: (f64, f64),
        to: (f64, f64),
    ) -> PointerUp {
        assert!(c.pointer_down(Point::new(from.0, from.1), pb));
        c.pointer_move(Point::new(to.0, to.1));
        c.pointer_up(Point::new(to.0, to.1))
    }

    // -- starting a shape ----------------------------------------------------

    #[test]
    fn select_tool_never_draws() {
        let (mut c, mut pb) = setup();
        assert!(!c.pointer_down(Point::new(10.0, 10.0), &mut pb));
        assert_eq!(c.state(), &InteractionState::Idle);
    }

    #[test]
    fn pointer_down_pauses_and_anchors_time() {
        let (mut c, mut pb) = setup();
        c.set_tool(Tool::Rect).unwrap();
        pb.play();
        pb.handle_event(PlaybackEvent::TimeUpdate { current_time: 7.25 });

        assert!(c.pointer_down(Point::new(10.0, 10.0), &mut pb));
        assert!(!pb.is_playing());
        assert_matches!(c.state(), InteractionState::Drawing(d) if d.timestamp_seconds == 7.25);
    }

    #[test]
    fn pointer_down_outside_surface_ignored() {
        let (mut c, mut pb) = setup();
        c.set_tool(Tool::Circle).unwrap();
        pb.play();
        assert!(!c.pointer_down(Point::new(700.0, 10.0), &mut pb));
        assert!(pb.is_playing());
    }

    #[test]
    fn disabled_controller_ignores_pointer() {
        let (mut c, mut pb) = setup();
        c.set_tool(Tool::Rect).unwrap();
        c.set_enabled(false);
        assert!(!c.pointer_down(Point::new(10.0, 10.0), &mut pb));
    }

    // -- dragging ------------------------------------------------------------

    #[test]
    fn drag_in_any_direction_from_anchor() {
        let (mut c, mut pb) = setup();
        c.set_tool(Tool::Rect).unwrap();
        assert_eq!(drag(&mut c, &mut pb, (200.0, 200.0), (150.0, 160.0)), PointerUp::AwaitingNote);

        let d = c.draft().unwrap();
        assert_eq!((d.w, d.h), (-50.0, -40.0));
        assert_eq!(d.bounds().left, 150.0);
    }

    #[test]
    fn move_off_surface_is_clamped() {
        let (mut c, mut pb) = setup();
        c.set_tool(Tool::Rect).unwrap();
        c.pointer_down(Point::new(600.0, 300.0), &mut pb);
        c.pointer_move(Point::new(900.0, 500.0));
        let d = c.draft().unwrap();
        assert_eq!((d.w, d.h), (40.0, 60.0));
    }

    #[test]
    fn move_while_idle_is_ignored() {
        let (mut c, _) = setup();
        assert!(!c.pointer_move(Point::new(5.0, 5.0)));
    }

    // -- releasing -----------------------------------------------------------

    #[test]
    fn tiny_shape_discarded_without_note_prompt() {
        let (mut c, mut pb) = setup();
        c.set_tool(Tool::Circle).unwrap();
        assert_eq!(drag(&mut c, &mut pb, (100.0, 100.0), (105.0, 108.0)), PointerUp::Discarded);
        assert_eq!(c.state(), &InteractionState::Idle);
    }

    #[test]
    fn release_outside_surface_keeps_drawing() {
        let (mut c, mut pb) = setup();
        c.set_tool(Tool::Rect).unwrap();
        c.pointer_down(Point::new(100.0, 100.0), &mut pb);
        assert_eq!(c.pointer_up(Point::new(-20.0, 100.0)), PointerUp::Ignored);
        assert_matches!(c.state(), InteractionState::Drawing(_));

        assert_eq!(c.pointer_up(Point::new(160.0, 150.0)), PointerUp::AwaitingNote);
    }

    #[test]
    fn release_while_idle_is_ignored() {
        let (mut c, _) = setup();
        assert_eq!(c.pointer_up(Point::new(5.0, 5.0)), PointerUp::Ignored);
    }

    // -- commit / cancel -----------------------------------------------------

    #[test]
    fn commit_builds_annotation_from_draft() {
        let (mut c, mut pb) = setup();
        pb.seek(3.0).unwrap();
        c.set_tool(Tool::Rect).unwrap();
        c.set_color(Color::Blue);
        drag(&mut c, &mut pb, (100.0, 100.0), (150.0, 140.0));

        let a = c.commit(Some("  fix logo ".into()), "reviewer@agency").unwrap();
        assert_eq!(a.timestamp_seconds, 3.0);
        assert_eq!(a.shape, Shape::Rect);
        assert_eq!((a.x, a.y, a.w, a.h), (100.0, 100.0, 50.0, 40.0));
        assert_eq!(a.color, Color::Blue);
        assert_eq!(a.note.as_deref(), Some("fix logo"));
        assert_eq!(a.created_by, "reviewer@agency");
        assert_eq!(c.state(), &InteractionState::Idle);
    }

    #[test]
    fn timestamp_is_taken_at_drag_start_not_commit() {
        let (mut c, mut pb) = setup();
        pb.seek(5.0).unwrap();
        c.set_tool(Tool::Circle).unwrap();
        drag(&mut c, &mut pb, (10.0, 10.0), (60.0, 60.0));

        pb.seek(42.0).unwrap();
        let a = c.commit(None, "r").unwrap();
        assert_eq!(a.timestamp_seconds, 5.0);
        assert_eq!(a.note, None);
    }

    #[test]
    fn overlong_note_keeps_shape_pending() {
        let viewport = ViewportHandle::new(Viewport::new(640.0, 360.0).unwrap());
        let config = ReviewConfig {
            max_note_length: 4,
            ..ReviewConfig::default()
        };
        let mut c = InteractionController::new(viewport, &config);
        let mut pb = PlaybackSync::new(HeadlessPlayback::default());
        c.set_tool(Tool::Rect).unwrap();
        drag(&mut c, &mut pb, (10.0, 10.0), (60.0, 60.0));

        assert_matches!(c.commit(Some("too long".into()), "r"), Err(CoreError::Validation(_)));
        assert_matches!(c.state(), InteractionState::PendingNote(_));
        assert!(c.commit(Some("ok".into()), "r").is_ok());
    }

    #[test]
    fn refused_commit_keeps_shape_pending() {
        let (mut c, mut pb) = setup();
        c.set_tool(Tool::Rect).unwrap();
        drag(&mut c, &mut pb, (10.0, 10.0), (60.0, 60.0));

        let refused = c.commit_checked(None, "r", |_| {
            Err(CoreError::Validation("not today".into()))
        });
        assert_matches!(refused, Err(CoreError::Validation(_)));
        assert_matches!(c.state(), InteractionState::PendingNote(_));

        let a = c.commit_checked(None, "r", |_| Ok(())).unwrap();
        assert_eq!((a.w, a.h), (50.0, 50.0));
        assert_eq!(c.state(), &InteractionState::Idle);
    }

    #[test]
    fn commit_without_pending_shape_is_conflict() {
        let (mut c, _) = setup();
        assert_matches!(c.commit(None, "r"), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn cancel_discards_pending_shape() {
        let (mut c, mut pb) = setup();
        c.set_tool(Tool::Rect).unwrap();
        drag(&mut c, &mut pb, (10.0, 10.0), (60.0, 60.0));
        assert!(c.cancel());
        assert_eq!(c.state(), &InteractionState::Idle);
        assert!(!c.cancel());
    }

    // -- tool switching ------------------------------------------------------

    #[test]
    fn tool_switch_mid_drag_rejected() {
        let (mut c, mut pb) = setup();
        c.set_tool(Tool::Rect).unwrap();
        c.pointer_down(Point::new(10.0, 10.0), &mut pb);
        assert!(c.tools_locked());
        assert_matches!(c.set_tool(Tool::Select), Err(CoreError::Conflict(_)));
        assert_matches!(c.set_tool(Tool::Circle), Err(CoreError::Conflict(_)));
        assert_eq!(c.tool(), Tool::Rect);
    }

    #[test]
    fn select_tool_abandons_pending_note() {
        let (mut c, mut pb) = setup();
        c.set_tool(Tool::Rect).unwrap();
        drag(&mut c, &mut pb, (10.0, 10.0), (60.0, 60.0));

        assert_matches!(c.set_tool(Tool::Circle), Err(CoreError::Conflict(_)));
        c.set_tool(Tool::Select).unwrap();
        assert_eq!(c.state(), &InteractionState::Idle);
        assert_eq!(c.tool(), Tool::Select);
    }

    #[test]
    fn disabling_drops_draft() {
        let (mut c, mut pb) = setup();
        c.set_tool(Tool::Rect).unwrap();
        c.pointer_down(Point::new(10.0, 10.0), &mut pb);
        c.set_enabled(false);
        assert_eq!(c.state(), &InteractionState::Idle);
        assert!(!c.is_enabled());
    }
}
