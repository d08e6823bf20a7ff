//! Playback synchronizer.
//!
//! [`PlaybackSync`] is the single source of truth for playback time. It is
//! fed the surface's native events ([`PlaybackEvent`]) and drives the
//! surface through the minimal [`PlaybackControl`] interface, so it never
//! touches a concrete video element.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::geometry::validate_timestamp;

// ---------------------------------------------------------------------------
// Surface interface
// ---------------------------------------------------------------------------

/// Commands a video surface must accept.
pub trait PlaybackControl {
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, seconds: f64);
}

/// Native notifications emitted by a video surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    TimeUpdate { current_time: f64 },
    LoadedMetadata { duration: f64 },
    Play,
    Pause,
    Ended,
}

/// Read-only snapshot of playback state, cheap to pass around.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PlaybackState {
    pub current_time: f64,
    /// `None` until metadata has loaded.
    pub duration: Option<f64>,
    pub is_playing: bool,
}

// ---------------------------------------------------------------------------
// PlaybackSync
// ---------------------------------------------------------------------------

/// Tracks time, duration and play state for one video surface.
#[derive(Debug)]
pub struct PlaybackSync<P> {
    surface: P,
    state: PlaybackState,
}

impl<P: PlaybackControl> PlaybackSync<P> {
    pub fn new(surface: P) -> Self {
        Self {
            surface,
            state: PlaybackState::default(),
        }
    }

    pub fn current_time(&self) -> f64 {
        self.state.current_time
    }

    pub fn duration(&self) -> Option<f64> {
        self.state.duration
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn surface(&self) -> &P {
        &self.surface
    }

    /// Apply a native event from the surface.
    ///
    /// Malformed values (non-finite times) are dropped; the surface is
    /// trusted for ordering but not for arithmetic.
    pub fn handle_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::TimeUpdate { current_time } => {
                if current_time.is_finite() && current_time >= 0.0 {
                    self.state.current_time = current_time;
                }
            }
            PlaybackEvent::LoadedMetadata { duration } => {
                if duration.is_finite() && duration >= 0.0 {
                    self.state.duration = Some(duration);
                }
            }
            PlaybackEvent::Play => self.state.is_playing = true,
            PlaybackEvent::Pause | PlaybackEvent::Ended => self.state.is_playing = false,
        }
    }

    /// Move the playhead. `current_time` is updated immediately instead of
    /// waiting for the next time-update event. Does not change play state.
    pub fn seek(&mut self, seconds: f64) -> Result<f64, CoreError> {
        validate_timestamp(seconds)?;
        let target = match self.state.duration {
            Some(d) => seconds.min(d),
            None => seconds,
        };
        self.surface.seek(target);
        self.state.current_time = target;
        tracing::debug!(seconds = target, "Seeked");
        Ok(target)
    }

    pub fn play(&mut self) {
        self.surface.play();
        self.state.is_playing = true;
    }

    /// Pause playback. `is_playing` flips immediately so a shape started in
    /// the same tick is anchored to a still frame.
    pub fn pause(&mut self) {
        self.surface.pause();
        self.state.is_playing = false;
    }

    pub fn toggle(&mut self) {
        if self.state.is_playing {
            self.pause();
        } else {
            self.play();
        }
    }
}

// ---------------------------------------------------------------------------
// Headless surface
// ---------------------------------------------------------------------------

/// A surface with no rendering, used by scripted replays and tests.
///
/// It records the commands it receives; time only advances through
/// [`PlaybackEvent::TimeUpdate`] events fed to the synchronizer.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct HeadlessPlayback {
    pub playing: bool,
    pub position: f64,
    pub seeks: Vec<f64>,
    pub pause_calls: usize,
}

impl PlaybackControl for HeadlessPlayback {
    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
        self.pause_calls += 1;
    }

    fn seek(&mut self, seconds: f64) {
        self.position = seconds;
        self.seeks.push(seconds);
    }
}

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

/// Format a playback position as `m:ss.s` for annotation lists.
pub fn format_timestamp(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00.0".to_string();
    }
    let tenths = (seconds * 10.0).round() as u64;
    let minutes = tenths / 600;
    let rem = tenths % 600;
    format!("{minutes}:{:02}.{}", rem / 10, rem % 10)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
