//! Annotation geometry model: shapes, palette colors, and validation.
//!
//! Coordinates are drawing-surface pixels relative to the rendered video
//! box (see [`crate::viewport`]), never the video's native resolution.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{AnnotationId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Drags smaller than this on both axes are accidental clicks.
pub const MIN_SHAPE_SIZE_PX: f64 = 10.0;

// ---------------------------------------------------------------------------
// Shape / Tool / Color
// ---------------------------------------------------------------------------

/// The kind of marker drawn over a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Circle,
    Rect,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Rect => "rect",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "circle" => Ok(Self::Circle),
            "rect" => Ok(Self::Rect),
            _ => Err(CoreError::Validation(format!(
                "Invalid shape '{s}'. Must be one of: circle, rect"
            ))),
        }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reviewer toolbar tools. `Select` never draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Select,
    Circle,
    Rect,
}

impl Tool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Circle => "circle",
            Self::Rect => "rect",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "select" => Ok(Self::Select),
            "circle" => Ok(Self::Circle),
            "rect" => Ok(Self::Rect),
            _ => Err(CoreError::Validation(format!(
                "Invalid tool '{s}'. Must be one of: select, circle, rect"
            ))),
        }
    }

    /// The shape this tool draws, or `None` for [`Tool::Select`].
    pub fn shape(&self) -> Option<Shape> {
        match self {
            Self::Select => None,
            Self::Circle => Some(Shape::Circle),
            Self::Rect => Some(Shape::Rect),
        }
    }
}

/// Fixed annotation palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Red,
    Yellow,
    Green,
    Blue,
    White,
}

/// Every palette entry, in toolbar order.
pub const PALETTE: &[Color] = &[
    Color::Red,
    Color::Yellow,
    Color::Green,
    Color::Blue,
    Color::White,
];

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::White => "white",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "red" => Ok(Self::Red),
            "yellow" => Ok(Self::Yellow),
            "green" => Ok(Self::Green),
            "blue" => Ok(Self::Blue),
            "white" => Ok(Self::White),
            _ => Err(CoreError::Validation(format!(
                "Invalid color '{s}'. Must be one of: {}",
                PALETTE
                    .iter()
                    .map(Color::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }

    /// `#RRGGBB` stroke color used by the drawing surface.
    pub fn hex(&self) -> &'static str {
        match self {
            Self::Red => "#EF4444",
            Self::Yellow => "#EAB308",
            Self::Green => "#22C55E",
            Self::Blue => "#3B82F6",
            Self::White => "#FFFFFF",
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Point / Bounds
// ---------------------------------------------------------------------------

/// A position on the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned box with non-negative extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    /// Build from an anchor and a signed drag extent. Negative `w`/`h`
    /// (dragging up or left) move the origin.
    pub fn from_signed(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            left: x.min(x + w),
            top: y.min(y + h),
            width: w.abs(),
            height: h.abs(),
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left
            && p.x <= self.left + self.width
            && p.y >= self.top
            && p.y <= self.top + self.height
    }
}

/// Whether a drag of `w` x `h` is large enough to keep.
///
/// A shape is discarded only when *both* axes fall under the minimum, so a
/// long thin rectangle still counts.
pub fn meets_min_size(w: f64, h: f64, min_size: f64) -> bool {
    w.abs() >= min_size || h.abs() >= min_size
}

// ---------------------------------------------------------------------------
// Annotation
// ---------------------------------------------------------------------------

/// A spatial marker anchored to one playback moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    /// Playback position the marker refers to. Fixed at creation.
    pub timestamp_seconds: f64,
    pub shape: Shape,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: Timestamp,
}

impl Annotation {
    /// Normalised box the shape occupies.
    pub fn bounds(&self) -> Bounds {
        Bounds::from_signed(self.x, self.y, self.w, self.h)
    }

    /// Hit test. Circles are treated as the ellipse inscribed in their box.
    pub fn contains(&self, p: Point) -> bool {
        let b = self.bounds();
        match self.shape {
            Shape::Rect => b.contains(p),
            Shape::Circle => {
                let rx = b.width / 2.0;
                let ry = b.height / 2.0;
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                let c = b.center();
                let dx = (p.x - c.x) / rx;
                let dy = (p.y - c.y) / ry;
                dx * dx + dy * dy <= 1.0
            }
        }
    }

    pub fn has_note(&self) -> bool {
        self.note.as_ref().is_some_and(|n| !n.trim().is_empty())
    }

    /// Check every invariant an annotation must hold before it joins a review.
    pub fn validate(&self, min_size: f64, max_note_length: usize) -> Result<(), CoreError> {
        validate_timestamp(self.timestamp_seconds)?;
        for (name, value) in [("x", self.x), ("y", self.y), ("w", self.w), ("h", self.h)] {
            if !value.is_finite() {
                return Err(CoreError::Validation(format!(
                    "annotation {name} must be a finite number, got {value}"
                )));
            }
        }
        if !meets_min_size(self.w, self.h, min_size) {
            return Err(CoreError::Validation(format!(
                "annotation is {}x{} px, below the {min_size} px minimum",
                self.w.abs(),
                self.h.abs()
            )));
        }
        validate_note(self.note.as_deref(), max_note_length)
    }
}

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

/// Validate that a playback position is a finite, non-negative number.
pub fn validate_timestamp(seconds: f64) -> Result<(), CoreError> {
    if !seconds.is_finite() {
        return Err(CoreError::Validation(
            "timestamp must be a finite number".to_string(),
        ));
    }
    if seconds < 0.0 {
        return Err(CoreError::Validation(format!(
            "timestamp must not be negative, got {seconds}"
        )));
    }
    Ok(())
}

/// Validate an optional note against the length limit.
pub fn validate_note(note: Option<&str>, max_length: usize) -> Result<(), CoreError> {
    if let Some(n) = note {
        let len = n.chars().count();
        if len > max_length {
            return Err(CoreError::Validation(format!(
                "Note exceeds maximum length of {max_length} characters (got {len})"
            )));
        }
    }
    Ok(())
}

/// Trim a note and collapse blank input to `None`.
pub fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
