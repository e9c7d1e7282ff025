// private sub-modules defined in other files
mod attribution;
mod densify;
mod graph;
mod point_key;
mod polyline;
mod reassemble;
mod simplify;

use crate::error::Result;
use crate::model::Region;
use graph::PllGraph;

/// Tunables the simplifier needs from [`crate::config::EngineConfig`]. Both
/// are absolute lengths in the inset's working coordinate frame, where one
/// grid cell is exactly one unit — `densify_chord` is used directly rather
/// than multiplied by a cell size, and `simplify_cost_threshold` is a
/// fraction of it (default 0.2 of the densification length).
#[derive(Clone, Copy, Debug)]
pub struct SimplifierConfig {
    pub densify_chord: f64,
    pub simplify_cost_threshold: f64,
}

/// Runs all six simplification phases over every region's current boundary
/// geometry and returns the simplified regions, preserving ids and
/// vertex-to-region/PWH/hole attribution but replacing vertex sequences.
///
/// Phase order: graph build, split into polylines, densify, attribute
/// (against the *pre-simplification* ring geometry, so attribution sees
/// points still lying on the original boundary), simplify, reassemble.
/// Attribution runs before simplification rather than after so that
/// `Attribution::polyline_idx` indexes consistently into both the densified
/// and the simplified polyline lists — simplification replaces a polyline's
/// points but never reorders or merges polylines.
pub fn simplify_regions(regions: &[Region], cfg: &SimplifierConfig) -> Result<Vec<Region>> {
    let mut graph = PllGraph::new();
    for region in regions {
        for pwh in &region.polygons_with_holes {
            graph.insert_ring(&pwh.outer.vertices);
            for hole in &pwh.holes {
                graph.insert_ring(&hole.vertices);
            }
        }
    }

    let raw_polylines = graph.split_into_polylines();
    let densified = densify::densify_polylines(&raw_polylines, cfg.densify_chord);
    let attributions = attribution::attribute_polylines(&densified, regions)?;
    let threshold = cfg.simplify_cost_threshold * cfg.densify_chord;
    let simplified = simplify::simplify_polylines(&densified, threshold)?;
    reassemble::reassemble(regions, &simplified, &attributions)
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
    fn test_single_square_round_trips_through_all_six_phases() {
        let regions = vec![square_region("A", 20.0)];
        let cfg = SimplifierConfig {
            densify_chord: 5.0,
            simplify_cost_threshold: 0.2,
        };
        let out = simplify_regions(&regions, &cfg).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "A");
        assert!((out[0].area() - 400.0).abs() < 1e-6);
    }

    #[test]
    fn test_shared_edge_is_identical_on_both_sides() {
        let mut left = Region::new("L");
        left.push(PolygonWithHoles::from_outer(Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ])));
        let mut right = Region::new("R");
        right.push(PolygonWithHoles::from_outer(Polygon::new(vec![
            Point::new(10.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(20.0, 10.0),
            Point::new(10.0, 10.0),
        ])));
        let cfg = SimplifierConfig {
            densify_chord: 2.0,
            simplify_cost_threshold: 0.2,
        };
        let out = simplify_regions(&[left, right], &cfg).unwrap();

        let shared_side_points = |region: &Region| -> Vec<Point> {
            region.polygons_with_holes[0]
                .outer
                .vertices
                .iter()
                .copied()
                .filter(|p| (p.x - 10.0).abs() < 1e-9)
                .collect()
        };
        let mut l_shared = shared_side_points(&out[0]);
        let mut r_shared = shared_side_points(&out[1]);
        l_shared.sort_by(|a, b| a.y.partial_cmp(&b.y).unwrap());
        r_shared.sort_by(|a, b| a.y.partial_cmp(&b.y).unwrap());
        assert_eq!(l_shared.len(), r_shared.len());
        for (a, b) in l_shared.iter().zip(r_shared.iter()) {
            assert!(a.nearly_equals(b));
        }
    }

    #[test]
    fn test_donut_hole_survives_simplification() {
        let mut r = Region::new("A");
        r.push(PolygonWithHoles::new(
            Polygon::new(vec![
                Point::new(0.0, 0.0),
                Point::new(20.0, 0.0),
                Point::new(20.0, 20.0),
                Point::new(0.0, 20.0),
            ]),
            vec![Polygon::new(vec![
                Point::new(8.0, 8.0),
                Point::new(12.0, 8.0),
                Point::new(12.0, 12.0),
                Point::new(8.0, 12.0),
            ])],
        ));
        let cfg = SimplifierConfig {
            densify_chord: 2.0,
            simplify_cost_threshold: 0.2,
        };
        let out = simplify_regions(&[r], &cfg).unwrap();
        assert_eq!(out[0].polygons_with_holes[0].holes.len(), 1);
        assert!((out[0].area() - (400.0 - 16.0)).abs() < 1.0);
    }
}
