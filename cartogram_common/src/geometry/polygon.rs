use super::{BoundingBox, Point};
use serde::{Deserialize, Serialize};

/// A simple closed ring. The closing duplicate vertex (`vertices[0]` repeated
/// at the end) is never stored; the last-to-first edge is implicit, matching
/// the convention spelled out for the input data model. Use
/// [`Polygon::closed_edges`] to iterate edges including the wrap-around one.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Point>,
    /// Records whether the ring, as originally supplied, was wound
    /// clockwise. Exterior rings are expected to be re-oriented to CCW on
    /// ingest; this flag allows the original winding to be restored on
    /// output.
    pub original_ext_ring_clockwise: bool,
}

impl Polygon {
    pub fn new(vertices: Vec<Point>) -> Polygon {
        Polygon {
            vertices,
            original_ext_ring_clockwise: false,
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Iterates the ring's edges, including the implicit closing edge from
    /// the last vertex back to the first.
    pub fn closed_edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Signed area via the shoelace formula. Positive for a
    /// counter-clockwise ring, negative for clockwise.
    pub fn signed_area(&self) -> f64 {
        let mut area = 0.0;
        for (a, b) in self.closed_edges() {
            area += a.x * b.y - b.x * a.y;
        }
        area / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn is_clockwise(&self) -> bool {
        self.signed_area() < 0.0
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices)
    }

    /// Reverses vertex order in place, flipping orientation.
    pub fn reverse(&mut self) {
        self.vertices.reverse();
    }
}
