//! Sheet geometry primitives
//!
//! Coordinates are pixels with the y axis pointing down, as produced by the
//! recognition layer. Vertical distances are compared in interline units
//! through the measure's `Scale`.

use serde::{Deserialize, Serialize};

/// A point on the sheet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect { x, y, width, height }
    }

    /// Rectangle of the given size centered on a point
    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        Rect {
            x: center.x - width / 2.0,
            y: center.y - height / 2.0,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    /// Grow the rectangle to include a point
    pub fn include(&self, p: Point) -> Rect {
        self.union(&Rect::new(p.x, p.y, 0.0, 0.0))
    }

    /// Horizontal overlap with another rectangle (negative when apart)
    pub fn x_overlap(&self, other: &Rect) -> f64 {
        self.right().min(other.right()) - self.x.max(other.x)
    }

    fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ]
    }
}

/// Straight line through two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub left: Point,
    pub right: Point,
}

impl Line {
    pub fn new(left: Point, right: Point) -> Self {
        Line { left, right }
    }

    /// dy/dx, zero for a vertical degenerate line
    pub fn slope(&self) -> f64 {
        let dx = self.right.x - self.left.x;
        if dx.abs() < f64::EPSILON {
            0.0
        } else {
            (self.right.y - self.left.y) / dx
        }
    }

    /// Ordinate of the line at the given abscissa (extrapolated outside the segment)
    pub fn y_at(&self, x: f64) -> f64 {
        self.left.y + (x - self.left.x) * self.slope()
    }

    pub fn length(&self) -> f64 {
        self.left.distance(&self.right)
    }

    pub fn middle(&self) -> Point {
        Point::new(
            (self.left.x + self.right.x) / 2.0,
            (self.left.y + self.right.y) / 2.0,
        )
    }
}

/// Closed polygon, used for the area spanned by two beamed chords
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Polygon { points }
    }

    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Even-odd rule point containment
    pub fn contains(&self, p: Point) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// True if the rectangle and the polygon share any area
    pub fn intersects(&self, rect: &Rect) -> bool {
        if rect.corners().iter().any(|c| self.contains(*c)) {
            return true;
        }
        if self.points.iter().any(|p| rect.contains(*p)) {
            return true;
        }
        let corners = rect.corners();
        let rect_edges: Vec<(Point, Point)> =
            (0..4).map(|i| (corners[i], corners[(i + 1) % 4])).collect();
        self.edges().any(|(a, b)| {
            rect_edges
                .iter()
                .any(|(c, d)| segments_cross(a, b, *c, *d))
        })
    }
}

fn orientation(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn segments_cross(a: Point, b: Point, c: Point, d: Point) -> bool {
    let d1 = orientation(c, d, a);
    let d2 = orientation(c, d, b);
    let d3 = orientation(a, b, c);
    let d4 = orientation(a, b, d);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

/// Sheet scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    /// Distance between two staff lines, in pixels
    pub interline: f64,
}

impl Scale {
    pub fn new(interline: f64) -> Self {
        Scale { interline }
    }

    /// Convert a pixel distance to interline units
    pub fn to_interline(&self, pixels: f64) -> f64 {
        pixels / self.interline
    }

    /// Convert interline units to pixels
    pub fn to_pixels(&self, interlines: f64) -> f64 {
        interlines * self.interline
    }
}

impl Default for Scale {
    fn default() -> Self {
        Scale { interline: 20.0 }
    }
}
