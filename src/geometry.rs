//! Small 2-D point type and the angle conventions used throughout the
//! pipeline.

/// A fractional 2-D point in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X-coordinate.
    pub x: f64,
    /// Y-coordinate.
    pub y: f64,
}

impl Point {
    /// Create a new [`Point`].
    #[must_use]
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    #[inline]
    pub fn distance(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Angle from `self` to `other`, in degrees, folded into `[0, 90)`.
    ///
    /// Grid axes are indistinguishable from one another, so folding collapses
    /// both carrier-grid axes onto a comparable range (§4.5 Step 1).
    #[must_use]
    #[inline]
    pub fn folded_angle_90(&self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let degrees = dy.atan2(dx).to_degrees();
        if degrees < 0.0 {
            degrees + 90.0
        } else {
            degrees
        }
    }

    /// Full-range angle from `self` to `other`, in `(-180, 180]` degrees.
    #[must_use]
    #[inline]
    pub fn angle_360(&self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dy.atan2(dx).to_degrees()
    }

    /// Rotate this point about the origin by `degrees`.
    #[must_use]
    #[inline]
    pub fn rotate(&self, degrees: f64) -> Point {
        let radians = degrees.to_radians();
        let (sin, cos) = radians.sin_cos();
        Point {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }
}
