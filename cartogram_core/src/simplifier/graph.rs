use super::point_key::PointKey;
use super::polyline::Polyline;
use cartogram_common::geometry::Point;
use std::collections::{HashMap, HashSet};

fn edge_key(a: PointKey, b: PointKey) -> (PointKey, PointKey) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// The undirected graph of every ring edge, shared edges collapsed to one.
#[derive(Default)]
pub(crate) struct PllGraph {
    adjacency: HashMap<PointKey, HashSet<PointKey>>,
    points: HashMap<PointKey, Point>,
}

impl PllGraph {
    pub fn new() -> PllGraph {
        PllGraph::default()
    }

    /// Inserts every edge of a closed ring. `vertices` should not repeat the
    /// first point at the end — closure is implicit here, same convention
    /// [`cartogram_common::geometry::Polygon`] uses.
    pub fn insert_ring(&mut self, vertices: &[Point]) {
        let n = vertices.len();
        if n < 2 {
            return;
        }
        for i in 0..n {
            self.insert_edge(vertices[i], vertices[(i + 1) % n]);
        }
    }

    fn insert_edge(&mut self, a: Point, b: Point) {
        let ka = PointKey::of(a);
        let kb = PointKey::of(b);
        self.points.entry(ka).or_insert(a);
        self.points.entry(kb).or_insert(b);
        if ka == kb {
            return;
        }
        self.adjacency.entry(ka).or_default().insert(kb);
        self.adjacency.entry(kb).or_default().insert(ka);
    }

    fn degree(&self, k: PointKey) -> usize {
        self.adjacency.get(&k).map_or(0, |s| s.len())
    }

    /// Splits the graph into maximal polylines: chains are cut at every
    /// vertex whose degree isn't exactly 2. A
    /// connected component made entirely of degree-2 vertices — a closed
    /// island with no junction — becomes a closed polyline on its own.
    pub fn split_into_polylines(&self) -> Vec<Polyline> {
        let mut visited_edges: HashSet<(PointKey, PointKey)> = HashSet::new();
        let mut polylines = Vec::new();

        let mut specials: Vec<PointKey> = self.adjacency.keys().copied().filter(|&k| self.degree(k) != 2).collect();
        specials.sort_by_key(|k| (k.0, k.1));

        for start in specials {
            let neighbors: Vec<PointKey> = {
                let mut ns: Vec<PointKey> = self.adjacency[&start].iter().copied().collect();
                ns.sort_by_key(|k| (k.0, k.1));
                ns
            };
            for next in neighbors {
                let ek = edge_key(start, next);
                if visited_edges.contains(&ek) {
                    continue;
                }
                visited_edges.insert(ek);
                let chain = self.walk_chain(start, next, &mut visited_edges);
                polylines.push(self.to_polyline(&chain));
            }
        }

        // Remaining edges belong to closed islands where every vertex has
        // degree 2 — no special vertex ever started a walk through them.
        let mut all_keys: Vec<PointKey> = self.adjacency.keys().copied().collect();
        all_keys.sort_by_key(|k| (k.0, k.1));
        for start in all_keys {
            let neighbors: Vec<PointKey> = {
                let mut ns: Vec<PointKey> = self.adjacency[&start].iter().copied().collect();
                ns.sort_by_key(|k| (k.0, k.1));
                ns
            };
            for next in neighbors {
                let ek = edge_key(start, next);
                if visited_edges.contains(&ek) {
                    continue;
                }
                visited_edges.insert(ek);
                let chain = self.walk_chain_closed(start, next, &mut visited_edges);
                polylines.push(self.to_polyline(&chain));
            }
        }

        polylines
    }

    /// Walks from `start` through `next`, continuing while the current
    /// vertex has degree 2, stopping as soon as it lands on another special
    /// (non-degree-2) vertex.
    fn walk_chain(&self, start: PointKey, next: PointKey, visited_edges: &mut HashSet<(PointKey, PointKey)>) -> Vec<PointKey> {
        let mut chain = vec![start, next];
        let mut prev = start;
        let mut curr = next;
        loop {
            if self.degree(curr) != 2 {
                break;
            }
            let advance = self.adjacency[&curr].iter().copied().find(|&n| n != prev);
            match advance {
                Some(nxt) => {
                    let ek = edge_key(curr, nxt);
                    if visited_edges.contains(&ek) {
                        break;
                    }
                    visited_edges.insert(ek);
                    chain.push(nxt);
                    prev = curr;
                    curr = nxt;
                }
                None => break,
            }
        }
        chain
    }

    /// Like [`Self::walk_chain`] but for degree-2-everywhere components:
    /// stops on returning to `start` rather than on a special vertex.
    fn walk_chain_closed(&self, start: PointKey, next: PointKey, visited_edges: &mut HashSet<(PointKey, PointKey)>) -> Vec<PointKey> {
        let mut chain = vec![start, next];
        let mut prev = start;
        let mut curr = next;
        loop {
            if curr == start {
                break;
            }
            let advance = self.adjacency[&curr].iter().copied().find(|&n| n != prev);
            match advance {
                Some(nxt) => {
                    let ek = edge_key(curr, nxt);
                    if visited_edges.contains(&ek) {
                        break;
                    }
                    visited_edges.insert(ek);
                    chain.push(nxt);
                    prev = curr;
                    curr = nxt;
                }
                None => break,
            }
        }
        chain
    }

    fn to_polyline(&self, chain: &[PointKey]) -> Polyline {
        Polyline {
            points: chain.iter().map(|k| self.points[k]).collect(),
        }
    }
}
