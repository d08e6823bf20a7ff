//! Which annotations to draw for a given playback state.
//!
//! While playing, only annotations near the playhead are shown, so markers
//! flash up as playback passes their moment. While paused, every annotation
//! is shown so the reviewer can survey all open notes without scrubbing.

use crate::geometry::Annotation;
use crate::playback::PlaybackState;

/// Whether a single annotation should be drawn.
pub fn is_visible(
    annotation: &Annotation,
    current_time: f64,
    is_playing: bool,
    tolerance_secs: f64,
) -> bool {
    if !is_playing {
        return true;
    }
    (annotation.timestamp_seconds - current_time).abs() <= tolerance_secs
}

/// The subset of `annotations` to render, in their original order.
pub fn visible_annotations<'a>(
    annotations: &'a [Annotation],
    current_time: f64,
    is_playing: bool,
    tolerance_secs: f64,
) -> Vec<&'a Annotation> {
    annotations
        .iter()
        .filter(|a| is_visible(a, current_time, is_playing, tolerance_secs))
        .collect()
}

/// [`visible_annotations`] driven by a playback snapshot.
pub fn visible_at<'a>(
    annotations: &'a [Annotation],
    playback: &PlaybackState,
    tolerance_secs: f64,
) -> Vec<&'a Annotation> {
    visible_annotations(
        annotations,
        playback.current_time,
        playback.is_playing,
        tolerance_secs,
    )
}
