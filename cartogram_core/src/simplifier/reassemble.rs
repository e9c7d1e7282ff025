use super::attribution::Attribution;
use super::polyline::Polyline;
use crate::error::{CartogramError, Result};
use crate::model::Region;
use cartogram_common::algorithms::{interior_point, point_in_poly};
use cartogram_common::geometry::{Point, Polygon, PolygonWithHoles};
use std::collections::HashMap;

/// Extends `chain` by one polyline if `candidate` shares an endpoint with
/// either end of `chain`, reversing it as needed. Returns `false` without
/// modifying `chain` if no endpoint matches.
fn try_extend(chain: &mut Vec<Point>, candidate: &Polyline) -> bool {
    let front = chain[0];
    let back = *chain.last().expect("chain is never empty");

    if candidate.first().nearly_equals(&back) {
        chain.extend(candidate.points.iter().skip(1));
        true
    } else if candidate.last().nearly_equals(&back) {
        chain.extend(candidate.points.iter().rev().skip(1));
        true
    } else if candidate.last().nearly_equals(&front) {
        let mut prefix: Vec<Point> = candidate.points[..candidate.points.len() - 1].to_vec();
        prefix.extend(chain.iter());
        *chain = prefix;
        true
    } else if candidate.first().nearly_equals(&front) {
        let mut prefix: Vec<Point> = candidate.points.iter().skip(1).rev().copied().collect();
        prefix.extend(chain.iter());
        *chain = prefix;
        true
    } else {
        false
    }
}

fn ring_area(ring: &[Point]) -> f64 {
    Polygon::new(ring.to_vec()).area()
}

/// Chains every polyline in `bucket` into one or more closed rings. A closed
/// island closes on its own; an open polyline is extended by endpoint-chaining
/// until it closes. A bucket left with an unclosable open chain is a fatal
/// [`CartogramError::Reassembly`].
fn chain_into_rings(bucket: &[Polyline], region_id: &str, pwh_idx: usize) -> Result<Vec<Vec<Point>>> {
    let mut visited = vec![false; bucket.len()];
    let mut rings = Vec::new();

    for start in 0..bucket.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;

        if bucket[start].is_closed() {
            let mut pts = bucket[start].points.clone();
            pts.pop();
            rings.push(pts);
            continue;
        }

        let mut chain = bucket[start].points.clone();
        while !chain[0].nearly_equals(chain.last().expect("chain is never empty")) {
            let mut extended = None;
            for (i, candidate) in bucket.iter().enumerate() {
                if visited[i] {
                    continue;
                }
                if try_extend(&mut chain, candidate) {
                    extended = Some(i);
                    break;
                }
            }
            match extended {
                Some(i) => visited[i] = true,
                None => {
                    return Err(CartogramError::Reassembly {
                        region_id: region_id.to_string(),
                        pwh_index: pwh_idx,
                        detail: format!("{} open polyline(s) could not be chained into a closed ring", bucket.len()),
                    })
                }
            }
        }
        chain.pop();
        rings.push(chain);
    }
    Ok(rings)
}

/// Reassembles every (region, PWH) bucket of simplified, attributed
/// polylines back into [`PolygonWithHoles`]: rings are chained per bucket,
/// the largest-area ring becomes the outer ring, and every other closed ring
/// in the bucket is attached as a hole if its interior point falls inside
/// that outer ring. A polyline shared between two regions' buckets is
/// chained independently in each, since `attribute_polylines` produces one
/// attribution per bucket it belongs to.
pub(crate) fn reassemble(regions: &[Region], polylines: &[Polyline], attributions: &[Attribution]) -> Result<Vec<Region>> {
    let mut buckets: HashMap<(usize, usize), Vec<&Attribution>> = HashMap::new();
    for a in attributions {
        buckets.entry((a.region_idx, a.pwh_idx)).or_default().push(a);
    }

    let mut new_regions: Vec<Region> = regions.iter().map(|r| Region::new(r.id.clone())).collect();

    let mut bucket_keys: Vec<(usize, usize)> = buckets.keys().copied().collect();
    bucket_keys.sort_unstable();

    for key @ (region_idx, pwh_idx) in bucket_keys {
        let mut attrs = buckets[&key].clone();
        // holes sorted first, stable, purely for deterministic/debuggable
        // walk order; ring identity below is decided by area and
        // containment, not by which attribution produced it.
        attrs.sort_by_key(|a| (!a.is_hole, a.polyline_idx));

        let bucket: Vec<Polyline> = attrs.iter().map(|a| polylines[a.polyline_idx].clone()).collect();
        let region_id = regions[region_idx].id.clone();
        let mut rings = chain_into_rings(&bucket, &region_id, pwh_idx)?;

        if rings.is_empty() {
            continue;
        }

        let outer_pos = rings
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| ring_area(a).partial_cmp(&ring_area(b)).unwrap())
            .map(|(i, _)| i)
            .expect("rings is non-empty");
        let outer_ring = rings.remove(outer_pos);

        let mut holes = Vec::new();
        for candidate in rings {
            let probe = interior_point(&candidate);
            if point_in_poly(&probe, &outer_ring) {
                holes.push(Polygon::new(candidate));
            } else {
                return Err(CartogramError::Reassembly {
                    region_id: region_id.clone(),
                    pwh_index: pwh_idx,
                    detail: "a reassembled ring is neither the outer boundary nor contained within it".to_string(),
                });
            }
        }

        new_regions[region_idx].push(PolygonWithHoles::new(Polygon::new(outer_ring), holes));
    }

    Ok(new_regions)
}
