//! Page coordinates.
//!
//! Points are stored as `x` in percent of the viewport width and `y` in
//! document pixels, so a marker keeps its horizontal position across window
//! sizes and its vertical position across scrolling.

/// What the host reports about the visible window at the time of an event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub scroll_y: f64,
}

impl Viewport {
    pub fn new(width: f64, scroll_y: f64) -> Self {
        Self { width, scroll_y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PagePoint {
    pub x: f64,
    pub y: f64,
}

impl PagePoint {
    /// Converts a click in viewport coordinates. A zero-width viewport maps to `x = 0`.
    pub fn capture(client_x: f64, client_y: f64, viewport: &Viewport) -> Self {
        let x = if viewport.width > 0.0 {
            client_x / viewport.width * 100.0
        } else {
            0.0
        };

        Self {
            x,
            y: client_y + viewport.scroll_y,
        }
    }

    /// Absolute document position in pixels, `(left, top)`.
    pub fn to_document(self, viewport: &Viewport) -> (f64, f64) {
        (self.x / 100.0 * viewport.width, self.y)
    }
}
