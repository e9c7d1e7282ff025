use super::inset::{Inset, InsetPos};
use std::collections::HashMap;

/// The top-level data model the whole pipeline shares: `is_world_map` and
/// `id_header` are carried through from ingest, and `insets` holds the
/// independently laid-out subsets of regions that the engine drives one at
/// a time (or fully in parallel, since insets share no mutable state).
///
/// Splits top-level map bookkeeping from per-inset state the same way
/// [`Inset`] splits per-inset geometry from the rest of the model: one type
/// owns the collection, the other owns a single member's live data.
#[derive(Clone, Debug)]
pub struct MapModel {
    pub is_world_map: bool,
    pub id_header: String,
    pub insets: HashMap<InsetPos, Inset>,
    /// Aggregate round-tripping flag: `true` if every input region's outer
    /// ring was originally wound clockwise.
    pub original_ext_ring_clockwise: bool,
}

impl MapModel {
    pub fn new(is_world_map: bool, id_header: impl Into<String>) -> MapModel {
        MapModel {
            is_world_map,
            id_header: id_header.into(),
            insets: HashMap::new(),
            original_ext_ring_clockwise: false,
        }
    }

    pub fn insert_inset(&mut self, inset: Inset) {
        self.insets.insert(inset.pos, inset);
    }

    /// Sum of every inset's `total_target_area`.
    pub fn total_target_area(&self) -> f64 {
        self.insets.values().map(|i| i.total_target_area()).sum()
    }

    pub fn n_insets(&self) -> usize {
        self.insets.len()
    }

    pub fn max_area_error(&self) -> f64 {
        self.insets
            .values()
            .map(|i| i.max_area_error())
            .fold(0.0, f64::max)
    }
}
