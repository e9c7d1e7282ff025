use super::polyline::Polyline;
use crate::error::{CartogramError, Result};
use crate::model::Region;
use cartogram_common::algorithms::point_line_distance;
use cartogram_common::geometry::Point;

const ON_BOUNDARY_EPS: f64 = 1e-7;

fn segment_contains(p: &Point, a: &Point, b: &Point) -> bool {
    if point_line_distance(p, a, b) > ON_BOUNDARY_EPS {
        return false;
    }
    let len_sq = a.distance_squared(b);
    if len_sq < 1e-18 {
        return p.distance(a) <= ON_BOUNDARY_EPS;
    }
    let t = ((p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y)) / len_sq;
    (-1e-6..=1.0 + 1e-6).contains(&t)
}

fn point_on_ring(p: &Point, ring: &[Point]) -> bool {
    let n = ring.len();
    if n < 2 {
        return false;
    }
    (0..n).any(|i| segment_contains(p, &ring[i], &ring[(i + 1) % n]))
}

/// A polyline's assignment to one (region, polygon-with-holes) bucket. A
/// polyline that forms a shared boundary between two adjacent regions (or
/// between a region and a hole it borders) produces one `Attribution` per
/// ring it lies on, so the same polyline can appear in more than one bucket.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Attribution {
    pub polyline_idx: usize,
    pub region_idx: usize,
    pub pwh_idx: usize,
    pub is_hole: bool,
}

/// At least 3 vertex hits against the outer ring attributes a polyline to
/// it — except a documented two-vertex corner case, a tripoint where three
/// regions meet on a straight line: a length-2 polyline whose two endpoints
/// form a boundary edge of the ring, even when neither endpoint alone
/// resolves 3 hits.
fn outer_matches(polyline: &Polyline, ring: &[Point]) -> bool {
    let hits = polyline.points.iter().filter(|p| point_on_ring(p, ring)).count();
    if hits >= 3 {
        return true;
    }
    if polyline.points.len() == 2 {
        let a = polyline.first();
        let b = polyline.last();
        let n = ring.len();
        for i in 0..n {
            let r0 = ring[i];
            let r1 = ring[(i + 1) % n];
            if (a.nearly_equals(&r0) && b.nearly_equals(&r1)) || (a.nearly_equals(&r1) && b.nearly_equals(&r0)) {
                return true;
            }
        }
    }
    false
}

fn hole_matches(polyline: &Polyline, ring: &[Point]) -> bool {
    polyline.points.iter().filter(|p| point_on_ring(p, ring)).count() >= 2
}

/// Attributes every densified polyline to every (region, PWH, hole?) bucket
/// whose ring it lies on. A polyline running along a border shared by two
/// adjacent regions lies on both regions' rings at once, and must be
/// attributed to both so that each region's bucket can be chained back into
/// a closed ring independently; a polyline matching no ring at all is a
/// fatal [`CartogramError::Attribution`].
pub(crate) fn attribute_polylines(polylines: &[Polyline], regions: &[Region]) -> Result<Vec<Attribution>> {
    let mut attributions = Vec::with_capacity(polylines.len());
    for (polyline_idx, polyline) in polylines.iter().enumerate() {
        let mut matches: Vec<(usize, usize, bool)> = Vec::new();
        for (region_idx, region) in regions.iter().enumerate() {
            for (pwh_idx, pwh) in region.polygons_with_holes.iter().enumerate() {
                if outer_matches(polyline, &pwh.outer.vertices) {
                    matches.push((region_idx, pwh_idx, false));
                }
                for hole in &pwh.holes {
                    if hole_matches(polyline, &hole.vertices) {
                        matches.push((region_idx, pwh_idx, true));
                    }
                }
            }
        }
        if matches.is_empty() {
            return Err(CartogramError::Attribution {
                pwh_index: None,
                detail: format!(
                    "polyline {} ({} vertices) matches no region boundary",
                    polyline_idx,
                    polyline.points.len()
                ),
            });
        }
        for (region_idx, pwh_idx, is_hole) in matches {
            attributions.push(Attribution {
                polyline_idx,
                region_idx,
                pwh_idx,
                is_hole,
            });
        }
    }
    Ok(attributions)
}
