/*
Point-in-polygon tests, adapted from the winding-number approach at
http://geomalgorithms.com/a03-_inclusion.html.
*/

use crate::geometry::Point;

/// Tests if `p2` is Left|On|Right of the infinite line through `p0`, `p1`.
///
/// Return: > 0 for `p2` left of the line, = 0 on the line, < 0 right of it.
fn is_left(p0: &Point, p1: &Point, p2: &Point) -> f64 {
    (p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y)
}

/// Winding number of `poly` around `p`. `poly` need not be explicitly
/// closed; the wrap-around edge from the last to the first vertex is
/// included automatically.
pub fn winding_number(p: &Point, poly: &[Point]) -> i32 {
    let n = poly.len();
    let mut wn = 0i32;
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        if a.y <= p.y {
            if b.y > p.y && is_left(&a, &b, p) > 0.0 {
                wn += 1;
            }
        } else if b.y <= p.y && is_left(&a, &b, p) < 0.0 {
            wn -= 1;
        }
    }
    wn
}

/// Point-in-polygon test via the winding number. Points exactly on the
/// boundary are considered outside.
pub fn point_in_poly(p: &Point, poly: &[Point]) -> bool {
    winding_number(p, poly) != 0
}

/// An interior point of a simple polygon, used as a representative sample
/// point for poly-in-poly / attribution tests (e.g. whether a hole's
/// midpoint sits inside a candidate outer ring). Uses the centroid of the
/// first three vertices, nudged toward the polygon's own centroid if that
/// lands outside (handles non-convex rings where the raw vertex average can
/// fall outside the shape).
pub fn interior_point(poly: &[Point]) -> Point {
    let cx: f64 = poly.iter().map(|p| p.x).sum::<f64>() / poly.len() as f64;
    let cy: f64 = poly.iter().map(|p| p.y).sum::<f64>() / poly.len() as f64;
    let centroid = Point::new(cx, cy);
    if point_in_poly(&centroid, poly) {
        return centroid;
    }
    // Fall back to the midpoint of the first edge, pulled slightly toward
    // the centroid, which is inside for any simple polygon's convex edges
    // often enough for our use (hole-containment checks on pre-validated
    // geometry).
    let mid = Point::new((poly[0].x + poly[1].x) / 2.0, (poly[0].y + poly[1].y) / 2.0);
    Point::new((mid.x + centroid.x) / 2.0, (mid.y + centroid.y) / 2.0)
}
