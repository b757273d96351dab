//! Pointer geometry shared by gesture state machines.

/// A point in the grid's local coordinate space (logical pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// The origin point (0, 0).
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance_to(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Tracks a press position and reports when movement passes a threshold.
///
/// Gestures that must not hijack a plain click (selection drags, row
/// reorder drags) hold one of these while pending.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragThreshold {
    origin: Point,
    threshold: f32,
}

impl DragThreshold {
    /// Default drag threshold in logical pixels.
    pub const DEFAULT: f32 = 4.0;

    /// Start tracking from `origin`.
    pub fn new(origin: Point, threshold: f32) -> Self {
        Self {
            origin,
            threshold: threshold.max(0.0),
        }
    }

    /// Where the press happened.
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Returns true once `position` is at least the threshold away from the origin.
    pub fn is_exceeded(&self, position: Point) -> bool {
        self.origin.distance_to(position) >= self.threshold
    }
}
