//! Frameproof core: video review and annotation.
//!
//! A reviewer pauses a video deliverable, draws a circle or rectangle over
//! the frame, attaches a note, and finally approves or requests changes.
//! This crate has no internal dependencies so the db, events, and replay
//! crates can all share the same domain types.
//!
//! - [`geometry`]: annotation shapes, palette, and validation.
//! - [`viewport`]: the drawing-surface size shared by every consumer.
//! - [`playback`]: the playback synchronizer, single source of time.
//! - [`interaction`]: pointer-driven shape authoring state machine.
//! - [`visibility`]: which annotations are shown at a given moment.
//! - [`review`]: the review record and approval status.
//! - [`session`]: the coordinator tying the above to persistence.

pub mod config;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod notice;
pub mod playback;
pub mod review;
pub mod session;
pub mod store;
pub mod types;
pub mod viewport;
pub mod visibility;
