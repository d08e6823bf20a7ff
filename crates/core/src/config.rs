//! Tunables for a review session.

use crate::geometry::Color;

/// Default half-width of the visibility window around an annotation, in seconds.
pub const DEFAULT_VISIBILITY_TOLERANCE_SECS: f64 = 0.5;

/// Default minimum drag distance, in drawing-surface pixels, for a shape to count.
pub const DEFAULT_MIN_SHAPE_SIZE_PX: f64 = 10.0;

/// Default maximum length of a per-annotation note.
pub const DEFAULT_MAX_NOTE_LENGTH: usize = 2_000;

/// Session configuration shared by the interaction controller and the
/// review coordinator.
///
/// All fields have defaults matching the reviewer UI. Binaries override
/// them from the environment (see `frameproof-replay`).
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewConfig {
    /// While playing, annotations within this many seconds of the playhead are shown.
    pub visibility_tolerance_secs: f64,
    /// Shapes whose `|w|` and `|h|` are both below this are discarded on release.
    pub min_shape_size_px: f64,
    /// Maximum accepted note length in characters.
    pub max_note_length: usize,
    /// Color selected when a controller is created.
    pub default_color: Color,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            visibility_tolerance_secs: DEFAULT_VISIBILITY_TOLERANCE_SECS,
            min_shape_size_px: DEFAULT_MIN_SHAPE_SIZE_PX,
            max_note_length: DEFAULT_MAX_NOTE_LENGTH,
            default_color: Color::Red,
        }
    }
}
