//! Review record, approval status, and summaries.
//!
//! A review moves `pending -> approved` or `pending -> changes_requested`
//! exactly once. Re-review needs a new record from the upload pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::geometry::{Annotation, Shape};
use crate::types::{ReviewId, Timestamp};

// ---------------------------------------------------------------------------
// Status / decision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    ChangesRequested,
}

/// All valid status strings.
pub const VALID_STATUSES: &[&str] = &["pending", "approved", "changes_requested"];

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::ChangesRequested => "changes_requested",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "changes_requested" => Ok(Self::ChangesRequested),
            _ => Err(CoreError::Validation(format!(
                "Invalid review status '{s}'. Must be one of: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reviewer's final verdict. Cannot express `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    ChangesRequested,
}

impl ReviewDecision {
    pub fn as_str(&self) -> &'static str {
        self.status().as_str()
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "approved" => Ok(Self::Approved),
            "changes_requested" => Ok(Self::ChangesRequested),
            _ => Err(CoreError::Validation(format!(
                "Invalid decision '{s}'. Must be one of: approved, changes_requested"
            ))),
        }
    }

    /// The terminal status this decision moves a review into.
    pub fn status(&self) -> ReviewStatus {
        match self {
            Self::Approved => ReviewStatus::Approved,
            Self::ChangesRequested => ReviewStatus::ChangesRequested,
        }
    }
}

// ---------------------------------------------------------------------------
// Review record
// ---------------------------------------------------------------------------

/// One review of a deliverable's video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub deliverable_id: String,
    /// Time-limited signed reference, resolved by the caller.
    pub video_url: String,
    pub status: ReviewStatus,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub reviewer_note: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<Timestamp>,
}

impl Review {
    /// A fresh pending review with no annotations, as the upload pipeline
    /// creates it.
    pub fn new(
        id: impl Into<ReviewId>,
        deliverable_id: impl Into<String>,
        video_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            deliverable_id: deliverable_id.into(),
            video_url: video_url.into(),
            status: ReviewStatus::Pending,
            annotations: Vec::new(),
            reviewer_note: None,
            reviewed_at: None,
        }
    }

    /// Fold a partial update into this record, the way the store applies it.
    pub fn apply(&mut self, update: &ReviewUpdate) {
        if let Some(annotations) = &update.annotations {
            self.annotations = annotations.clone();
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(note) = &update.reviewer_note {
            self.reviewer_note = Some(note.clone());
        }
        if let Some(at) = update.reviewed_at {
            self.reviewed_at = Some(at);
        }
    }
}

/// Partial update accepted by the persistence collaborator. Absent fields
/// are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<Annotation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReviewStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<Timestamp>,
}

impl ReviewUpdate {
    /// Replace the stored annotation set wholesale.
    pub fn annotations(annotations: Vec<Annotation>) -> Self {
        Self {
            annotations: Some(annotations),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Counts shown on the deliverable dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSummary {
    pub status: ReviewStatus,
    pub total: usize,
    pub with_notes: usize,
    pub by_shape: BTreeMap<&'static str, usize>,
    pub earliest_seconds: Option<f64>,
    pub latest_seconds: Option<f64>,
}

pub fn summarize(review: &Review) -> ReviewSummary {
    let mut by_shape = BTreeMap::new();
    for shape in [Shape::Circle, Shape::Rect] {
        by_shape.insert(shape.as_str(), 0);
    }
    let mut earliest: Option<f64> = None;
    let mut latest: Option<f64> = None;

    for a in &review.annotations {
        *by_shape.entry(a.shape.as_str()).or_insert(0) += 1;
        let t = a.timestamp_seconds;
        earliest = Some(earliest.map_or(t, |e| e.min(t)));
        latest = Some(latest.map_or(t, |l| l.max(t)));
    }

    ReviewSummary {
        status: review.status,
        total: review.annotations.len(),
        with_notes: review.annotations.iter().filter(|a| a.has_note()).count(),
        by_shape,
        earliest_seconds: earliest,
        latest_seconds: latest,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
