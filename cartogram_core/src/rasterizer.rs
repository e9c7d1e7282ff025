use crate::error::{CartogramError, Result};
use crate::model::{mean_density as compute_mean_density, Inset, Region};
use cartogram_common::algorithms::ray_y_intersects;
use cartogram_common::geometry::Point;
use cartogram_common::Grid;
use rayon::prelude::*;

/// Tunables the rasterizer needs from [`crate::config::EngineConfig`],
/// pulled out so the rasterizer doesn't depend on the whole config type.
#[derive(Clone, Copy, Debug)]
pub struct RasterizerConfig {
    pub ray_resolution: usize,
    /// See [`crate::config::RasterizerDebugConfig`].
    pub weight_by_trailing_region: bool,
}

/// One ray/edge crossing, after the per-(region, PWH) local direction
/// assignment: intersections are collected and direction-tagged one
/// polygon-with-holes at a time (entering/leaving alternate with the
/// *local*, within-PWH sorted order), and only then merged across regions
/// and re-sorted by `x` for the global fill pass. Assigning direction purely
/// from the merged sequence's index parity would make the "adjacent
/// same-direction intersections" overlap check below impossible to ever
/// trigger, since direction has to be assigned per-PWH before the global
/// sort, not recomputed from it.
#[derive(Clone, Copy, Debug)]
struct Hit {
    x: f64,
    region_idx: usize,
    entering: bool,
}

/// Turns the current geometry of `inset` into a density grid: `ray_resolution`
/// sub-cell rays per row, alternating entering/leaving intersections,
/// weighted accumulation by area error and overlap length, gap-filling
/// between regions, and a `mean_density` fallback for any cell no ray ever
/// touches.
pub fn rasterize(inset: &Inset, cfg: &RasterizerConfig) -> Result<Grid> {
    let lx = inset.lx();
    let ly = inset.ly();
    let regions = &inset.regions;
    if regions.is_empty() {
        return Err(CartogramError::Config(
            "cannot rasterize an inset with no regions".to_string(),
        ));
    }

    let area_errs = inset.area_errors();
    let mean_rho = compute_mean_density(&inset.targets, regions);

    let mut target_density = vec![0.0f64; regions.len()];
    let mut area_err = vec![0.0f64; regions.len()];
    for (idx, r) in regions.iter().enumerate() {
        let area = r.area();
        target_density[idx] = match inset.targets.get(&r.id) {
            Some(t) if area > 0.0 => t / area,
            _ => mean_rho,
        };
        area_err[idx] = *area_errs.get(&r.id).unwrap_or(&0.0);
    }

    let res = cfg.ray_resolution.max(1);
    let epsilon = 1e-6 * (1.0 / res as f64);

    // rho_num/rho_den accumulation partitions cleanly by row `k`: each
    // worker owns disjoint row slices, so no reduction is needed across
    // threads.
    let rows: Vec<(Vec<f64>, Vec<f64>)> = (0..ly)
        .into_par_iter()
        .map(|k| rasterize_row(k, lx, res, epsilon, regions, &target_density, &area_err, cfg.weight_by_trailing_region))
        .collect::<Result<Vec<_>>>()?;

    let mut rho = Grid::new(lx, ly, mean_rho);
    for (k, (num, den)) in rows.into_iter().enumerate() {
        for m in 0..lx {
            let v = if den[m] > 0.0 { num[m] / den[m] } else { mean_rho };
            rho.set(m, k, v);
        }
    }
    Ok(rho)
}

fn rasterize_row(
    k: usize,
    lx: usize,
    res: usize,
    epsilon: f64,
    regions: &[Region],
    target_density: &[f64],
    area_err: &[f64],
    weight_by_trailing_region: bool,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut rho_num = vec![0.0f64; lx];
    let mut rho_den = vec![0.0f64; lx];

    for s in 0..res {
        let ray_y = k as f64 + (s as f64 + 0.5) / res as f64;
        let hits = collect_ray_hits(ray_y, epsilon, regions)?;
        if hits.is_empty() {
            continue;
        }
        accumulate_ray(
            &hits,
            lx,
            area_err,
            target_density,
            weight_by_trailing_region,
            &mut rho_num,
            &mut rho_den,
        );
    }
    Ok((rho_num, rho_den))
}

fn collect_ring_hits(vertices: &[Point], ray_y: f64, epsilon: f64, out: &mut Vec<f64>) {
    let n = vertices.len();
    if n == 0 {
        return;
    }
    let mut prev = vertices[n - 1];
    for &curr in vertices {
        if let Some(x) = ray_y_intersects(curr, prev, ray_y, epsilon) {
            out.push(x);
        }
        prev = curr;
    }
}

fn collect_ray_hits(ray_y: f64, epsilon: f64, regions: &[Region]) -> Result<Vec<Hit>> {
    let mut all = Vec::new();
    for (region_idx, region) in regions.iter().enumerate() {
        for pwh in &region.polygons_with_holes {
            if !pwh.bounding_box().straddles_y(ray_y) {
                continue;
            }
            let mut local = Vec::new();
            collect_ring_hits(&pwh.outer.vertices, ray_y, epsilon, &mut local);
            for hole in &pwh.holes {
                collect_ring_hits(&hole.vertices, ray_y, epsilon, &mut local);
            }
            if local.len() % 2 != 0 {
                return Err(CartogramError::Topology {
                    region_id: Some(region.id.clone()),
                    ray_y,
                    detail: format!(
                        "odd intersection count ({}) for a single polygon-with-holes",
                        local.len()
                    ),
                });
            }
            local.sort_by(|a, b| a.partial_cmp(b).unwrap());
            for (i, x) in local.into_iter().enumerate() {
                all.push(Hit {
                    x,
                    region_idx,
                    entering: i % 2 == 0,
                });
            }
        }
    }
    if all.is_empty() {
        return Ok(all);
    }
    all.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap());
    if all.len() % 2 != 0 {
        return Err(CartogramError::Topology {
            region_id: None,
            ray_y,
            detail: format!("odd total intersection count ({}) across all regions", all.len()),
        });
    }
    for w in all.windows(2) {
        if w[0].entering == w[1].entering {
            return Err(CartogramError::Topology {
                region_id: None,
                ray_y,
                detail: "adjacent intersections share the same direction — overlapping polygons or holes"
                    .to_string(),
            });
        }
    }
    Ok(all)
}

fn accumulate_ray(
    hits: &[Hit],
    lx: usize,
    area_err: &[f64],
    target_density: &[f64],
    weight_by_trailing_region: bool,
    rho_num: &mut [f64],
    rho_den: &mut [f64],
) {
    let n = hits.len();
    let trailing = hits[n - 1].region_idx;

    // Entering/leaving pairs: the segment is inside the region itself.
    let mut l = 0;
    while l + 1 < n {
        let left = &hits[l];
        let right = &hits[l + 1];
        let weighted_region = if weight_by_trailing_region { trailing } else { left.region_idx };
        accumulate_segment(
            rho_num,
            rho_den,
            lx,
            left.x,
            right.x,
            area_err[weighted_region],
            target_density[left.region_idx],
        );
        l += 2;
    }

    // Odd pairs (2l+1, 2l+2): the gap between two regions (or a hole),
    // filled with the left intersection's region density. The original
    // always weights this loop by the local (left) region's area error,
    // never the trailing one — `weight_by_trailing_region` only affects
    // the entering/leaving loop above.
    let mut l = 1;
    while l + 1 < n {
        let left = &hits[l];
        let right = &hits[l + 1];
        accumulate_segment(
            rho_num,
            rho_den,
            lx,
            left.x,
            right.x,
            area_err[left.region_idx],
            target_density[left.region_idx],
        );
        l += 2;
    }

    // Beyond the last intersection, extend to the grid's right edge
    // carrying the last region's density.
    let last = &hits[n - 1];
    accumulate_segment(
        rho_num,
        rho_den,
        lx,
        last.x,
        lx as f64,
        area_err[last.region_idx],
        target_density[last.region_idx],
    );
}

fn accumulate_segment(rho_num: &mut [f64], rho_den: &mut [f64], lx: usize, left_x: f64, right_x: f64, area_err: f64, density: f64) {
    if right_x <= left_x {
        return;
    }
    let m_start = left_x.floor().max(0.0) as usize;
    let m_end = (right_x.ceil() as usize).min(lx);
    for m in m_start..m_end {
        let cell_left = m as f64;
        let cell_right = (m + 1) as f64;
        let overlap = (right_x.min(cell_right) - left_x.max(cell_left)).max(0.0);
        if overlap <= 0.0 {
            continue;
        }
        let weight = area_err * overlap;
        rho_num[m] += weight * density;
        rho_den[m] += weight;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Inset, InsetPos, Region, TargetMap};
    use cartogram_common::geometry::{Point, Polygon, PolygonWithHoles};

    fn square_region(id: &str, x0: f64, side: f64) -> Region {
        let mut r = Region::new(id);
        r.push(PolygonWithHoles::from_outer(Polygon::new(vec![
            Point::new(x0, 0.0),
            Point::new(x0 + side, 0.0),
            Point::new(x0 + side, side),
            Point::new(x0, side),
        ])));
        r
    }

    fn default_cfg() -> RasterizerConfig {
        RasterizerConfig {
            ray_resolution: 16,
            weight_by_trailing_region: false,
        }
    }

    #[test]
    fn test_identity_target_yields_near_uniform_density() {
        let mut targets = TargetMap::new();
        targets.set("A", 100.0);
        let inset = Inset::new(InsetPos::C, 10, 10, vec![square_region("A", 0.0, 10.0)], targets);
        let rho = rasterize(&inset, &default_cfg()).unwrap();
        // area_err is ~0 everywhere, so rho_den is ~0 everywhere and every
        // cell falls back to mean_density.
        for i in 0..10 {
            for j in 0..10 {
                assert!((rho.get(i, j) - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_nonzero_area_error_biases_density_toward_target() {
        let mut targets = TargetMap::new();
        targets.set("A", 400.0); // current area 100, target density 4.0
        let inset = Inset::new(InsetPos::C, 10, 10, vec![square_region("A", 0.0, 10.0)], targets);
        let rho = rasterize(&inset, &default_cfg()).unwrap();
        for i in 0..10 {
            for j in 0..10 {
                assert!((rho.get(i, j) - 4.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_self_intersecting_ring_is_topology_error() {
        let mut r = Region::new("A");
        r.push(PolygonWithHoles::from_outer(Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(5.0, 5.0),
            Point::new(5.0, -5.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ])));
        let mut targets = TargetMap::new();
        targets.set("A", 100.0);
        let inset = Inset::new(InsetPos::C, 10, 10, vec![r], targets);
        let result = rasterize(&inset, &default_cfg());
        assert!(matches!(result, Err(CartogramError::Topology { .. })));
    }

    #[test]
    fn test_gap_between_two_regions_uses_left_density() {
        let mut targets = TargetMap::new();
        targets.set("L", 400.0);
        targets.set("R", 25.0);
        let inset = Inset::new(
            InsetPos::C,
            10,
            10,
            vec![square_region("L", 0.0, 5.0), square_region("R", 5.0, 5.0)],
            targets,
        );
        let rho = rasterize(&inset, &default_cfg()).unwrap();
        assert!(rho.get(0, 5) > rho.get(9, 5));
    }
}
