use super::region::Region;
use super::target_map::TargetMap;
use cartogram_common::geometry::Point;
use cartogram_common::{Grid, PointGrid};
use serde::{Deserialize, Serialize};

/// Position tag identifying a named inset within the overall map layout:
/// center, left, right, top, bottom.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsetPos {
    C,
    L,
    R,
    T,
    B,
}

impl std::fmt::Display for InsetPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InsetPos::C => "C",
            InsetPos::L => "L",
            InsetPos::R => "R",
            InsetPos::T => "T",
            InsetPos::B => "B",
        };
        write!(f, "{}", s)
    }
}

/// A named subset of regions laid out in its own `(lx, ly)` coordinate
/// frame. Owns the live, mutable region geometry and the
/// working grids (density, projected node positions, cumulative
/// projection) that the pipeline mutates in place each iteration.
///
/// Region vertices are stored in the same coordinate space as `proj`'s grid
/// nodes (`[0, lx] x [0, ly]`), so a vertex can be advected by bilinearly
/// sampling `proj` at the vertex's current position — this is what makes
/// [`PointGrid::sample`] double as both "where did this grid node go" and
/// "where did this arbitrary point go".
#[derive(Clone, Debug)]
pub struct Inset {
    pub pos: InsetPos,
    lx: usize,
    ly: usize,
    /// Live, mutated-in-place regions.
    pub regions: Vec<Region>,
    /// Snapshot taken once after simplification, never mutated again;
    /// reconstructs the equal-area baseline for output.
    pub geo_divs_original: Vec<Region>,
    pub targets: TargetMap,
    pub rho: Grid,
    pub proj: PointGrid,
    pub cum_proj: PointGrid,
}

impl Inset {
    pub fn new(pos: InsetPos, lx: usize, ly: usize, regions: Vec<Region>, targets: TargetMap) -> Inset {
        let geo_divs_original = regions.clone();
        Inset {
            pos,
            lx,
            ly,
            regions,
            geo_divs_original,
            targets,
            rho: Grid::new(lx, ly, 1.0),
            proj: PointGrid::identity(lx, ly),
            cum_proj: PointGrid::identity(lx, ly),
        }
    }

    pub fn lx(&self) -> usize {
        self.lx
    }

    pub fn ly(&self) -> usize {
        self.ly
    }

    /// Snapshots the current (post-simplification) regions as the
    /// equal-area baseline. Callers are expected to invoke it exactly once;
    /// calling it again simply re-baselines, which tests rely on for
    /// isolated setup.
    pub fn snapshot_original(&mut self) {
        self.geo_divs_original = self.regions.clone();
    }

    pub fn total_target_area(&self) -> f64 {
        self.regions
            .iter()
            .filter_map(|r| self.targets.get(&r.id))
            .sum()
    }

    pub fn current_area(&self, id: &str) -> Option<f64> {
        self.regions.iter().find(|r| r.id == id).map(|r| r.area())
    }

    /// `|current_area(R) / target_area(R) - 1|` for every region, the
    /// weight the rasterizer and blur schedule both key off of. Regions
    /// with a (by-now-repaired) zero target are reported as maximally wrong
    /// rather than dividing by zero.
    pub fn area_errors(&self) -> std::collections::HashMap<String, f64> {
        self.regions
            .iter()
            .map(|r| {
                let current = r.area();
                let target = self.targets.get(&r.id).unwrap_or(current);
                let err = if target > 0.0 {
                    (current / target - 1.0).abs()
                } else {
                    f64::INFINITY
                };
                (r.id.clone(), err)
            })
            .collect()
    }

    pub fn max_area_error(&self) -> f64 {
        self.area_errors()
            .values()
            .cloned()
            .fold(0.0, f64::max)
    }

    /// Advects every live vertex of every region by bilinearly sampling
    /// `proj` (the deformation field this iteration's integration step
    /// produced) at the vertex's current position, then composes `proj`
    /// into `cum_proj` the same way: `cum_proj_new(node) =
    /// cum_proj_old.sample(proj_new(node))`.
    pub fn apply_projection(&mut self, new_proj: &PointGrid) {
        for region in &mut self.regions {
            for pwh in &mut region.polygons_with_holes {
                for p in pwh.all_points_mut() {
                    *p = new_proj.sample(*p);
                }
            }
        }
        let mut composed = PointGrid::identity(self.lx, self.ly);
        for i in 0..=self.lx {
            for j in 0..=self.ly {
                let moved = new_proj.get(i, j);
                let through_history = self.cum_proj.sample(moved);
                composed.set(i, j, through_history);
            }
        }
        self.cum_proj = composed;
        self.proj = new_proj.clone();
    }

    /// All live vertex positions across every region, flattened — used by
    /// the rasterizer to restrict its scanline sweep and by tests that
    /// check global invariants.
    pub fn all_points(&self) -> Vec<Point> {
        let mut pts = Vec::new();
        for region in &self.regions {
            for pwh in &region.polygons_with_holes {
                pts.extend(pwh.outer.vertices.iter().copied());
                for h in &pwh.holes {
                    pts.extend(h.vertices.iter().copied());
                }
            }
        }
        pts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartogram_common::geometry::{Point, Polygon, PolygonWithHoles};

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
    fn test_identity_projection_leaves_vertices_unchanged() {
        let mut targets = TargetMap::new();
        targets.set("A", 100.0);
        let mut inset = Inset::new(InsetPos::C, 16, 16, vec![square_region("A", 10.0)], targets);
        let identity = PointGrid::identity(16, 16);
        let before = inset.all_points();
        inset.apply_projection(&identity);
        assert_eq!(inset.all_points(), before);
    }

    #[test]
    fn test_area_error_zero_when_target_matches_current() {
        let mut targets = TargetMap::new();
        targets.set("A", 100.0);
        let inset = Inset::new(InsetPos::C, 16, 16, vec![square_region("A", 10.0)], targets);
        assert!(inset.max_area_error() < 1e-12);
    }

    #[test]
    fn test_inset_pos_display() {
        assert_eq!(InsetPos::L.to_string(), "L");
    }
}
