use super::{BoundingBox, Point, Polygon};
use serde::{Deserialize, Serialize};

/// One outer [`Polygon`] plus zero or more hole polygons, each disjoint and
/// contained within the outer ring.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolygonWithHoles {
    pub outer: Polygon,
    pub holes: Vec<Polygon>,
}

impl PolygonWithHoles {
    pub fn new(outer: Polygon, holes: Vec<Polygon>) -> PolygonWithHoles {
        PolygonWithHoles { outer, holes }
    }

    pub fn from_outer(outer: Polygon) -> PolygonWithHoles {
        PolygonWithHoles { outer, holes: vec![] }
    }

    /// Absolute area: outer ring area minus the area of every hole.
    pub fn area(&self) -> f64 {
        let mut a = self.outer.area();
        for h in &self.holes {
            a -= h.area();
        }
        a.max(0.0)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.outer.bounding_box()
    }

    /// All vertices of the outer ring and every hole, in order, flattened.
    /// Used by callers that need to touch every live coordinate (e.g. the
    /// integrator's vertex advection pass).
    pub fn all_points_mut(&mut self) -> Vec<&mut Point> {
        let mut pts: Vec<&mut Point> = self.outer.vertices.iter_mut().collect();
        for h in &mut self.holes {
            pts.extend(h.vertices.iter_mut());
        }
        pts
    }
}
