use super::point_key::PointKey;
use super::polyline::Polyline;
use crate::error::{CartogramError, Result};
use cartogram_common::algorithms::{point_line_distance_squared, segment_intersection};
use cartogram_common::geometry::Point;
use spade::handles::FixedVertexHandle;
use spade::{ConstrainedDelaunayTriangulation, Point2, Triangulation};
use std::collections::HashMap;

type Cdt = ConstrainedDelaunayTriangulation<Point2<f64>>;

/// A constrained Delaunay triangulation of every densified polyline's
/// vertices, plus the bookkeeping needed to turn its constrained edges back
/// into per-polyline crossing barriers.
struct Triangulated {
    point_of: HashMap<FixedVertexHandle, Point>,
    /// Constrained edges actually accepted into `cdt`, grouped by the index
    /// of the polyline that inserted them — an edge a later polyline tried
    /// to add but that crossed an earlier one is absent here.
    edges_by_polyline: Vec<Vec<(FixedVertexHandle, FixedVertexHandle)>>,
}

/// Inserts every densified polyline's vertices and edges into a constrained
/// Delaunay triangulation. Coincident points across polylines collapse to a
/// single triangulation vertex so that polylines sharing an endpoint share a
/// triangulation vertex too — the property the crossing guard below relies
/// on to recognize a shared junction without falling back to float
/// comparison. Constraints that would cross an already-inserted one are
/// skipped rather than inserted blindly: input polylines come from a graph
/// decomposition of already-validated ring geometry, so no two *original*
/// edges cross, but this guards against a caller handing the same densified
/// set to this function twice.
fn build_constraint_triangulation(polylines: &[Polyline]) -> Result<Triangulated> {
    let mut cdt = Cdt::new();
    let mut vertex_of: HashMap<PointKey, FixedVertexHandle> = HashMap::new();
    let mut point_of: HashMap<FixedVertexHandle, Point> = HashMap::new();
    let mut edges_by_polyline = Vec::with_capacity(polylines.len());

    for polyline in polylines {
        let mut own_edges = Vec::new();
        let mut prev: Option<FixedVertexHandle> = None;
        for &p in &polyline.points {
            if !p.is_finite() {
                return Err(CartogramError::Numeric {
                    inset: "simplifier".to_string(),
                    field: "proj",
                    detail: format!("non-finite polyline vertex ({}, {})", p.x, p.y),
                });
            }
            let key = PointKey::of(p);
            let handle = match vertex_of.get(&key) {
                Some(&h) => h,
                None => {
                    let h = cdt.insert(Point2::new(p.x, p.y)).map_err(|e| CartogramError::Numeric {
                        inset: "simplifier".to_string(),
                        field: "proj",
                        detail: format!("failed to insert triangulation vertex: {}", e),
                    })?;
                    vertex_of.insert(key, h);
                    point_of.insert(h, p);
                    h
                }
            };
            if let Some(prev_handle) = prev {
                if prev_handle != handle && cdt.can_add_constraint(prev_handle, handle) {
                    cdt.add_constraint(prev_handle, handle);
                    own_edges.push((prev_handle, handle));
                }
            }
            prev = Some(handle);
        }
        edges_by_polyline.push(own_edges);
    }
    Ok(Triangulated { point_of, edges_by_polyline })
}

/// The triangulation's constrained edges belonging to every polyline *other
/// than* `exclude_idx`, used as the non-crossing barrier a candidate
/// simplified chord must respect. Sourcing the barrier from `cdt`'s own
/// accepted constraints (rather than re-reading the polylines' raw points)
/// means a chord is only ever checked against edges the triangulation
/// itself considers real, topologically-placed constraints.
fn other_polylines_segments(triangulated: &Triangulated, exclude_idx: usize) -> Vec<(Point, Point)> {
    triangulated
        .edges_by_polyline
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != exclude_idx)
        .flat_map(|(_, edges)| {
            edges
                .iter()
                .map(|&(a, b)| (triangulated.point_of[&a], triangulated.point_of[&b]))
        })
        .collect()
}

fn crosses_barrier(a: Point, b: Point, barrier: &[(Point, Point)]) -> bool {
    barrier.iter().any(|&(p, q)| {
        let shares_endpoint = (p.nearly_equals(&a) || p.nearly_equals(&b)) && (q.nearly_equals(&a) || q.nearly_equals(&b));
        if shares_endpoint {
            return false;
        }
        segment_intersection(a, b, p, q).is_some()
    })
}

/// Douglas-Peucker-family simplification of one anchor-to-anchor run of
/// `points`, dropping an interior point only when both its squared cost is
/// within `threshold_sq` of the candidate chord *and* that chord would not
/// cross another polyline's triangulation-constrained edge in `barrier` —
/// keeping polylines that share a vertex topologically consistent with one
/// another as they're each simplified independently.
fn simplify_range(points: &[Point], start: usize, end: usize, threshold_sq: f64, barrier: &[(Point, Point)], keep: &mut [bool]) {
    if end <= start + 1 {
        return;
    }
    let a = points[start];
    let b = points[end];
    let mut farthest_idx = start + 1;
    let mut farthest_dist = -1.0f64;
    for (i, &p) in points.iter().enumerate().take(end).skip(start + 1) {
        let d = point_line_distance_squared(&p, &a, &b);
        if d > farthest_dist {
            farthest_dist = d;
            farthest_idx = i;
        }
    }

    let chord_is_safe = farthest_dist <= threshold_sq && !crosses_barrier(a, b, barrier);
    if chord_is_safe {
        return;
    }

    keep[farthest_idx] = true;
    simplify_range(points, start, farthest_idx, threshold_sq, barrier, keep);
    simplify_range(points, farthest_idx, end, threshold_sq, barrier, keep);
}

fn douglas_peucker(points: &[Point], threshold_sq: f64, barrier: &[(Point, Point)]) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;
    simplify_range(points, 0, last, threshold_sq, barrier, &mut keep);
    points.iter().zip(keep.iter()).filter_map(|(p, &k)| k.then_some(*p)).collect()
}

/// Simplifies every densified polyline, preserving endpoints. `threshold` is
/// the absolute squared-distance cost cutoff (already scaled by
/// `EngineConfig::simplify_cost_threshold * EngineConfig::densify_chord` by
/// the caller). Every polyline is inserted into one shared constrained
/// Delaunay triangulation first, and each polyline's crossing barrier is
/// read back from that triangulation's own accepted constrained edges
/// rather than from the other polylines' raw point sequences.
pub(crate) fn simplify_polylines(polylines: &[Polyline], threshold: f64) -> Result<Vec<Polyline>> {
    let triangulated = build_constraint_triangulation(polylines)?;

    let threshold_sq = threshold * threshold;
    let mut out = Vec::with_capacity(polylines.len());
    for (idx, polyline) in polylines.iter().enumerate() {
        if polyline.points.len() < 3 {
            out.push(polyline.clone());
            continue;
        }
        let barrier = other_polylines_segments(&triangulated, idx);
        let points = douglas_peucker(&polyline.points, threshold_sq, &barrier);
        out.push(Polyline { points });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_line_collapses_to_endpoints() {
        let polyline = Polyline {
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(2.0, 0.0),
                Point::new(3.0, 0.0),
            ],
        };
        let out = simplify_polylines(&[polyline], 0.01).unwrap();
        assert_eq!(out[0].points.len(), 2);
        assert_eq!(out[0].first(), Point::new(0.0, 0.0));
        assert_eq!(out[0].last(), Point::new(3.0, 0.0));
    }

    #[test]
    fn test_sharp_corner_is_retained() {
        let polyline = Polyline {
            points: vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0), Point::new(10.0, 0.0)],
        };
        let out = simplify_polylines(&[polyline], 0.01).unwrap();
        assert_eq!(out[0].points.len(), 3);
    }

    #[test]
    fn test_short_polyline_is_untouched() {
        let polyline = Polyline {
            points: vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
        };
        let out = simplify_polylines(&[polyline], 100.0).unwrap();
        assert_eq!(out[0].points.len(), 2);
    }

    #[test]
    fn test_candidate_chord_crossing_another_polyline_is_rejected() {
        // a near-straight polyline whose simplification would cut a corner
        // that a second, unrelated polyline runs directly through.
        let wobbly = Polyline {
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(5.0, 0.2),
                Point::new(10.0, 0.0),
            ],
        };
        let crossing = Polyline {
            points: vec![Point::new(5.0, -1.0), Point::new(5.0, 1.0)],
        };
        let out = simplify_polylines(&[wobbly, crossing], 10.0).unwrap();
        // the wobbly polyline's midpoint must survive since the straight
        // chord from (0,0) to (10,0) would cross the barrier segment.
        assert_eq!(out[0].points.len(), 3);
    }
}
