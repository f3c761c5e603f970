//! Viewport and coordinate transformation for the diagram canvas.
//!
//! Converts between screen coordinates (pointer events, pixels) and canvas
//! coordinates (where shapes live). Both spaces have (0,0) at the top-left and
//! +Y pointing down, so the mapping is a pan followed by a uniform zoom.

use crate::model::Point;

/// Minimum allowed zoom factor.
pub const MIN_ZOOM: f64 = 0.1;
/// Maximum allowed zoom factor.
pub const MAX_ZOOM: f64 = 50.0;

/// What the interaction layer needs from the renderer's camera.
pub trait ViewportTransform: Send {
    fn screen_to_canvas(&self, screen: Point) -> Point;

    /// Moves the view by a screen-space delta.
    fn pan_by(&mut self, dx: f64, dy: f64);

    fn zoom(&self) -> f64;
}

/// Represents the viewport transformation state (zoom and pan).
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }

    pub fn with_transform(zoom: f64, pan_x: f64, pan_y: f64) -> Self {
        let mut viewport = Self { zoom: 1.0, pan_x, pan_y };
        viewport.set_zoom(zoom);
        viewport
    }

    /// Sets the zoom level, clamped between [`MIN_ZOOM`] and [`MAX_ZOOM`].
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom * 1.2);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom / 1.2);
    }

    pub fn pan(&self) -> Point {
        Point::new(self.pan_x, self.pan_y)
    }

    pub fn set_pan(&mut self, x: f64, y: f64) {
        self.pan_x = x;
        self.pan_y = y;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Converts canvas coordinates to screen coordinates.
    ///
    /// ```text
    /// screen = canvas * zoom + pan
    /// ```
    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        Point::new(canvas.x * self.zoom + self.pan_x, canvas.y * self.zoom + self.pan_y)
    }

    /// Zooms while keeping the canvas point under `screen` fixed.
    pub fn zoom_to_point(&mut self, zoom: f64, screen: Point) {
        let anchor = self.screen_to_canvas(screen);
        self.set_zoom(zoom);
        self.pan_x = screen.x - anchor.x * self.zoom;
        self.pan_y = screen.y - anchor.y * self.zoom;
    }
}

impl ViewportTransform for Viewport {
    /// ```text
    /// canvas = (screen - pan) / zoom
    /// ```
    fn screen_to_canvas(&self, screen: Point) -> Point {
        Point::new((screen.x - self.pan_x) / self.zoom, (screen.y - self.pan_y) / self.zoom)
    }

    fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }
}
