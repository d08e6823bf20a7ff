//! Drawing-surface viewport.
//!
//! The drawing surface is sized to the video's *rendered* box. Both the
//! interaction controller and anything that renders annotations read the
//! same [`ViewportHandle`], so the size is computed in one place on every
//! layout change and never derived independently.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::CoreError;
use crate::geometry::Point;

/// Pixel size of the rendered video box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Result<Self, CoreError> {
        if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
            return Err(CoreError::Validation(format!(
                "viewport must have finite, non-negative size, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Zero-sized viewport used before the video has reported its dimensions.
    pub fn empty() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
        }
    }

    /// Fit a video of native size `native_width` x `native_height` into a
    /// container `container_width` wide, preserving aspect ratio.
    pub fn fit(
        native_width: f64,
        native_height: f64,
        container_width: f64,
    ) -> Result<Self, CoreError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(native_width) || !positive(native_height) {
            return Err(CoreError::Validation(format!(
                "native video size must be positive, got {native_width}x{native_height}"
            )));
        }
        let height = container_width * native_height / native_width;
        Self::new(container_width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn contains(&self, p: Point) -> bool {
        p.is_finite() && p.x >= 0.0 && p.y >= 0.0 && p.x <= self.width && p.y <= self.height
    }

    /// Pin a point to the surface edges.
    pub fn clamp(&self, p: Point) -> Point {
        Point::new(p.x.clamp(0.0, self.width), p.y.clamp(0.0, self.height))
    }
}

/// Shared, single-threaded handle to the current [`Viewport`].
///
/// Cloning the handle shares the underlying value; a resize through any
/// clone is seen by all of them.
#[derive(Debug, Clone)]
pub struct ViewportHandle(Rc<Cell<Viewport>>);

impl ViewportHandle {
    pub fn new(viewport: Viewport) -> Self {
        Self(Rc::new(Cell::new(viewport)))
    }

    pub fn get(&self) -> Viewport {
        self.0.get()
    }

    /// Recompute the surface size after the containing layout changed width.
    pub fn resize(
        &self,
        native_width: f64,
        native_height: f64,
        container_width: f64,
    ) -> Result<Viewport, CoreError> {
        let viewport = Viewport::fit(native_width, native_height, container_width)?;
        self.0.set(viewport);
        tracing::debug!(
            width = viewport.width,
            height = viewport.height,
            "Drawing surface resized"
        );
        Ok(viewport)
    }

    pub fn set(&self, viewport: Viewport) {
        self.0.set(viewport);
    }
}

impl Default for ViewportHandle {
    fn default() -> Self {
        Self::new(Viewport::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_preserves_aspect_ratio() {
        let vp = Viewport::fit(1920.0, 1080.0, 960.0).unwrap();
        assert_eq!(vp.width, 960.0);
        assert_eq!(vp.height, 540.0);
    }

    #[test]
    fn fit_rejects_unknown_native_size() {
        assert!(Viewport::fit(0.0, 1080.0, 960.0).is_err());
        assert!(Viewport::fit(f64::NAN, 1080.0, 960.0).is_err());
    }

    #[test]
    fn contains_and_clamp() {
        let vp = Viewport::new(640.0, 360.0).unwrap();
        assert!(vp.contains(Point::new(0.0, 0.0)));
        assert!(vp.contains(Point::new(640.0, 360.0)));
        assert!(!vp.contains(Point::new(641.0, 10.0)));
        assert!(!vp.contains(Point::new(-1.0, 10.0)));
        assert_eq!(vp.clamp(Point::new(700.0, -5.0)), Point::new(640.0, 0.0));
    }

    #[test]
    fn handle_clones_share_resizes() {
        let a = ViewportHandle::default();
        let b = a.clone();
        assert!(b.get().is_empty());

        a.resize(1280.0, 720.0, 640.0).unwrap();
        assert_eq!(b.get(), Viewport::new(640.0, 360.0).unwrap());
    }

    #[test]
    fn failed_resize_keeps_previous_size() {
        let handle = ViewportHandle::new(Viewport::new(640.0, 360.0).unwrap());
        assert!(handle.resize(0.0, 0.0, 800.0).is_err());
        assert_eq!(handle.get().width, 640.0);
    }
}
