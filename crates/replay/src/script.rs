//! Replay script format.
//!
//! A script seeds one review record and lists the reviewer's inputs in
//! order:
//!
//! ```json
//! {
//!   "review": { "id": "r1", "deliverable_id": "d7", "video_url": "https://cdn/v.mp4" },
//!   "video": { "width": 1920, "height": 1080, "duration": 42.0 },
//!   "container_width": 960,
//!   "reviewer": "qa@frameproof",
//!   "steps": [
//!     { "step": "tick", "t": 3.0 },
//!     { "step": "tool", "tool": "rect" },
//!     { "step": "down", "x": 100, "y": 100 },
//!     { "step": "up", "x": 160, "y": 140 },
//!     { "step": "commit", "note": "fix logo" },
//!     { "step": "submit", "decision": "changes_requested" }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use frameproof_core::geometry::{Color, Tool};
use frameproof_core::review::{Review, ReviewDecision};

use crate::error::ReplayError;

fn default_reviewer() -> String {
    "replay".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayScript {
    pub review: ScriptReview,
    pub video: VideoSource,
    /// Initial width of the layout around the player.
    pub container_width: f64,
    /// Recorded as `created_by` on committed annotations.
    #[serde(default = "default_reviewer")]
    pub reviewer: String,
    pub steps: Vec<Step>,
}

/// The record the pipeline would have created before review starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptReview {
    pub id: String,
    pub deliverable_id: String,
    pub video_url: String,
}

impl ScriptReview {
    pub fn to_review(&self) -> Review {
        Review::new(&self.id, &self.deliverable_id, &self.video_url)
    }
}

/// Native size of the video and, once known, its duration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VideoSource {
    pub width: f64,
    pub height: f64,
    /// Delivered as a metadata event before the first step when present.
    #[serde(default)]
    pub duration: Option<f64>,
}

/// One reviewer input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Play,
    Pause,
    /// Reviewer-initiated seek.
    Seek { t: f64 },
    /// Time update reported by the player.
    Tick { t: f64 },
    /// Container width changed.
    Resize { width: f64 },
    Tool { tool: Tool },
    Color { color: Color },
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    Commit {
        #[serde(default)]
        note: Option<String>,
    },
    Cancel,
    /// Remove the annotation at this position in insertion order.
    Remove { index: usize },
    Save,
    Submit {
        decision: ReviewDecision,
        #[serde(default)]
        note: Option<String>,
    },
    /// Marker the player emits when it reaches the end.
    Ended,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Seek { .. } => "seek",
            Self::Tick { .. } => "tick",
            Self::Resize { .. } => "resize",
            Self::Tool { .. } => "tool",
            Self::Color { .. } => "color",
            Self::Down { .. } => "down",
            Self::Move { .. } => "move",
            Self::Up { .. } => "up",
            Self::Commit { .. } => "commit",
            Self::Cancel => "cancel",
            Self::Remove { .. } => "remove",
            Self::Save => "save",
            Self::Submit { .. } => "submit",
            Self::Ended => "ended",
        }
    }
}

impl ReplayScript {
    pub fn parse(json: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn load(path: &Path) -> Result<Self, ReplayError> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::parse(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_steps_by_tag() {
        let script = ReplayScript::parse(
            r#"{
                "review": { "id": "r1", "deliverable_id": "d1", "video_url": "u" },
                "video": { "width": 1280, "height": 720 },
                "container_width": 640,
                "steps": [
                    { "step": "play" },
                    { "step": "tool", "tool": "circle" },
                    { "step": "color", "color": "blue" },
                    { "step": "commit" },
                    { "step": "submit", "decision": "approved", "note": "ok" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(script.reviewer, "replay");
        assert!(script.video.duration.is_none());
        assert_eq!(
            script.steps,
            vec![
                Step::Play,
                Step::Tool { tool: Tool::Circle },
                Step::Color { color: Color::Blue },
                Step::Commit { note: None },
                Step::Submit {
                    decision: ReviewDecision::Approved,
                    note: Some("ok".into()),
                },
            ]
        );
    }

    #[test]
    fn pending_is_not_a_decision() {
        let result = ReplayScript::parse(
            r#"{
                "review": { "id": "r1", "deliverable_id": "d1", "video_url": "u" },
                "video": { "width": 1280, "height": 720 },
                "container_width": 640,
                "steps": [ { "step": "submit", "decision": "pending" } ]
            }"#,
        );
        assert_matches!(result, Err(ReplayError::Script(_)));
    }

    #[test]
    fn unknown_step_rejected() {
        let result = ReplayScript::parse(
            r#"{
                "review": { "id": "r1", "deliverable_id": "d1", "video_url": "u" },
                "video": { "width": 1280, "height": 720 },
                "container_width": 640,
                "steps": [ { "step": "undo" } ]
            }"#,
        );
        assert_matches!(result, Err(ReplayError::Script(_)));
    }
}
