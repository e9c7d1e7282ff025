use cartogram_common::geometry::PolygonWithHoles;
use serde::{Deserialize, Serialize};

/// A named geographic division: one or more disjoint [`PolygonWithHoles`]
/// sharing a single target value. Region ownership is top-down and
/// exclusive — the [`crate::model::MapModel`] is the sole owner of every
/// `Region`, `PolygonWithHoles`, and `Point`; no component holds a second
/// reference to live vertex data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub polygons_with_holes: Vec<PolygonWithHoles>,
}

impl Region {
    pub fn new(id: impl Into<String>) -> Region {
        Region {
            id: id.into(),
            polygons_with_holes: Vec::new(),
        }
    }

    pub fn push(&mut self, pwh: PolygonWithHoles) {
        self.polygons_with_holes.push(pwh);
    }

    pub fn n_polygons_with_holes(&self) -> usize {
        self.polygons_with_holes.len()
    }

    /// Sum of the absolute areas of this region's polygons-with-holes: the
    /// union of its PWHs is the region's extent.
    pub fn area(&self) -> f64 {
        self.polygons_with_holes.iter().map(|p| p.area()).sum()
    }

    pub fn n_points(&self) -> usize {
        self.polygons_with_holes
            .iter()
            .map(|p| p.outer.len() + p.holes.iter().map(|h| h.len()).sum::<usize>())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartogram_common::geometry::{Point, Polygon};

    fn square_region(id: &str, side: f64) -> Region {
        let mut r = Region::new(id);
        r.push(PolygonWithHoles::from_outer(Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ])));
        r
    }

    #[test]
    fn test_area_sums_pwhs() {
        let r = square_region("A", 10.0);
        assert_eq!(r.area(), 100.0);
    }

    #[test]
    fn test_n_points() {
        let r = square_region("A", 10.0);
        assert_eq!(r.n_points(), 4);
    }
}
