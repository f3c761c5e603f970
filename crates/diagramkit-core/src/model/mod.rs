//! Diagram data model: geometry primitives, shapes, connectors and the
//! per-diagram aggregate.

mod connector;
mod diagram;
mod shape;

pub use connector::{ConnectionSide, Connector, ConnectorUpdate, NewConnector};
pub use diagram::{Diagram, DiagramType};
pub use shape::{descendants, NewShape, Shape, ShapePatch, ShapeUpdate, LIFELINE_TYPE};

use serde::{Deserialize, Serialize};

/// Identifier of a diagram aggregate.
pub type DiagramId = String;
/// Identifier of a shape within a diagram.
pub type ShapeId = String;
/// Identifier of a connector within a diagram.
pub type ConnectorId = String;

/// A point in screen or canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Returns `self - other` as a vector.
    pub fn delta_from(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    /// Returns this point translated by a vector.
    pub fn offset(&self, delta: Point) -> Point {
        Point::new(self.x + delta.x, self.y + delta.y)
    }

    /// Rounds both components to the nearest multiple of `grid`.
    pub fn snapped(&self, grid: f64) -> Point {
        if grid <= 0.0 {
            return *self;
        }
        Point::new((self.x / grid).round() * grid, (self.y / grid).round() * grid)
    }
}

/// Axis-aligned rectangle with a top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds normalised bounds from two arbitrary corners, so a rubber band
    /// dragged up and to the left still yields a positive width and height.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let min_x = a.x.min(b.x);
        let min_y = a.y.min(b.y);
        Self::new(min_x, min_y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    /// Builds bounds from edge coordinates.
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    pub fn min_x(&self) -> f64 {
        self.x
    }

    pub fn min_y(&self) -> f64 {
        self.y
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Edge-inclusive intersection test.
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(self.max_x() < other.min_x()
            || self.min_x() > other.max_x()
            || self.max_y() < other.min_y()
            || self.min_y() > other.max_y())
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Bounds) -> bool {
        other.min_x() >= self.min_x()
            && other.max_x() <= self.max_x()
            && other.min_y() >= self.min_y()
            && other.max_y() <= self.max_y()
    }

    /// Smallest bounds covering both rectangles.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds::from_edges(
            self.min_x().min(other.min_x()),
            self.min_y().min(other.min_y()),
            self.max_x().max(other.max_x()),
            self.max_y().max(other.max_y()),
        )
    }

    /// Union of an iterator of bounds, `None` when empty.
    pub fn union_all<I: IntoIterator<Item = Bounds>>(iter: I) -> Option<Bounds> {
        iter.into_iter().reduce(|acc, b| acc.union(&b))
    }
}
