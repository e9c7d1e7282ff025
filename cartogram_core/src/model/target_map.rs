use super::region::Region;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mapping from region id to a target area in real units. A negative or
/// absent value means *missing*. Values are stored raw (no
/// normalization on insert) so [`TargetMap::is_missing`] can apply the
/// "negative or absent" rule uniformly regardless of how the caller set it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TargetMap {
    raw: HashMap<String, f64>,
}

impl TargetMap {
    pub fn new() -> TargetMap {
        TargetMap { raw: HashMap::new() }
    }

    pub fn set(&mut self, id: impl Into<String>, value: f64) {
        self.raw.insert(id.into(), value);
    }

    /// `true` if the target for `id` is absent or negative.
    pub fn is_missing(&self, id: &str) -> bool {
        match self.raw.get(id) {
            Some(v) => *v < 0.0,
            None => true,
        }
    }

    /// The target area for `id`, or `None` if missing.
    pub fn get(&self, id: &str) -> Option<f64> {
        self.raw.get(id).copied().filter(|v| *v >= 0.0)
    }
}

/// Repairs missing and "too small" target areas in place:
///
/// 1. Any zero or "very small" (< `2e-5` of the sum of non-missing targets)
///    target is replaced by that threshold; if the threshold itself is
///    zero (every non-missing target was zero), the minimum positive
///    region area is used instead.
/// 2. Any missing target is replaced by `region.area() * (sum of known
///    targets / sum of known areas)`; if every target is missing, each
///    region's target becomes its own current area.
pub fn repair_targets(targets: &mut TargetMap, regions: &[Region]) {
    const SMALL_AREA_THRESHOLD_PERCENT: f64 = 2e-5;

    let (known_area, known_target) = known_totals(targets, regions);
    let small_threshold = known_target * SMALL_AREA_THRESHOLD_PERCENT;

    let any_small = regions.iter().any(|r| match targets.get(&r.id) {
        Some(t) => t == 0.0 || t < small_threshold,
        None => false,
    });

    if any_small {
        let replacement = if small_threshold > 0.0 {
            small_threshold
        } else {
            regions
                .iter()
                .map(|r| r.area())
                .fold(f64::INFINITY, f64::min)
        };
        for r in regions {
            if let Some(t) = targets.get(&r.id) {
                if t == 0.0 || t < small_threshold {
                    targets.set(r.id.clone(), replacement);
                }
            }
        }
    }

    let (known_area, known_target) = known_totals(targets, regions);
    let any_missing = regions.iter().any(|r| targets.is_missing(&r.id));
    if any_missing {
        for r in regions {
            if targets.is_missing(&r.id) {
                let new_target = if known_target == 0.0 {
                    r.area()
                } else {
                    (known_target / known_area) * r.area()
                };
                targets.set(r.id.clone(), new_target);
            }
        }
    }
}

fn known_totals(targets: &TargetMap, regions: &[Region]) -> (f64, f64) {
    let mut area = 0.0;
    let mut target = 0.0;
    for r in regions {
        if let Some(t) = targets.get(&r.id) {
            area += r.area();
            target += t;
        }
    }
    (area, target)
}

/// `Σ target_area / Σ current_area` over non-missing regions, the density
/// assigned to grid cells covered by no region.
pub fn mean_density(targets: &TargetMap, regions: &[Region]) -> f64 {
    let (area, target) = known_totals(targets, regions);
    if area > 0.0 {
        target / area
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartogram_common::geometry::{Point, Polygon, PolygonWithHoles};

    fn region(id: &str, side: f64) -> Region {
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
    fn test_missing_target_repaired_proportionally() {
        let regions = vec![region("A", 10.0), region("B", 10.0)];
        let mut targets = TargetMap::new();
        targets.set("A", 400.0); // area is 100, so density 4.0
                                  // B is missing
        repair_targets(&mut targets, &regions);
        let b = targets.get("B").unwrap();
        assert!((b / 100.0 - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_missing_falls_back_to_current_area() {
        let regions = vec![region("A", 10.0), region("B", 7.0)];
        let mut targets = TargetMap::new();
        repair_targets(&mut targets, &regions);
        assert!((targets.get("A").unwrap() - 100.0).abs() < 1e-9);
        assert!((targets.get("B").unwrap() - 49.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_target_replaced_by_threshold() {
        let regions = vec![region("A", 10.0), region("B", 10.0)];
        let mut targets = TargetMap::new();
        targets.set("A", 1_000_000.0);
        targets.set("B", 0.0);
        repair_targets(&mut targets, &regions);
        let threshold = 1_000_000.0 * 2e-5;
        assert!((targets.get("B").unwrap() - threshold).abs() < 1e-6);
    }

    #[test]
    fn test_all_zero_falls_back_to_min_positive_area() {
        let regions = vec![region("A", 10.0), region("B", 3.0)];
        let mut targets = TargetMap::new();
        targets.set("A", 0.0);
        targets.set("B", 0.0);
        repair_targets(&mut targets, &regions);
        assert!((targets.get("A").unwrap() - 9.0).abs() < 1e-9);
        assert!((targets.get("B").unwrap() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_mean_density() {
        let regions = vec![region("A", 10.0)];
        let mut targets = TargetMap::new();
        targets.set("A", 400.0);
        assert!((mean_density(&targets, &regions) - 4.0).abs() < 1e-9);
    }
}
