use super::polyline::Polyline;
use cartogram_common::geometry::Point;

/// Subdivides every polyline so no edge exceeds `max_chord`, required so the
/// simplification triangulation can resolve narrow features.
pub(crate) fn densify_polylines(polylines: &[Polyline], max_chord: f64) -> Vec<Polyline> {
    polylines.iter().map(|p| densify_one(p, max_chord)).collect()
}

fn densify_one(polyline: &Polyline, max_chord: f64) -> Polyline {
    let n = polyline.points.len();
    if n == 0 {
        return Polyline { points: Vec::new() };
    }
    let mut out = Vec::with_capacity(n);
    out.push(polyline.points[0]);
    for i in 0..n - 1 {
        let a = polyline.points[i];
        let b = polyline.points[i + 1];
        let dist = a.distance(&b);
        if max_chord > 0.0 && dist > max_chord {
            let steps = (dist / max_chord).ceil() as usize;
            for s in 1..steps {
                let t = s as f64 / steps as f64;
                out.push(Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t));
            }
        }
        out.push(b);
    }
    Polyline { points: out }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_edge_is_untouched() {
        let p = Polyline {
            points: vec![Point::new(0.0, 0.0), Point::new(0.1, 0.0)],
        };
        let out = densify_polylines(&[p], 0.25);
        assert_eq!(out[0].points.len(), 2);
    }

    #[test]
    fn test_long_edge_is_subdivided() {
        let p = Polyline {
            points: vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)],
        };
        let out = densify_polylines(&[p], 0.25);
        assert!(out[0].points.len() >= 5);
        for w in out[0].points.windows(2) {
            assert!(w[0].distance(&w[1]) <= 0.25 + 1e-9);
        }
    }

    #[test]
    fn test_closure_is_preserved() {
        let p = Polyline {
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
                Point::new(0.0, 0.0),
            ],
        };
        let out = densify_polylines(&[p], 2.0);
        assert!(out[0].is_closed());
    }
}
