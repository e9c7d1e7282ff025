use crate::model::{InsetPos, Region};
use cartogram_common::PointGrid;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An 8-bit-per-channel RGB color, carried through from ingest to output
/// untouched by the core: colors are an external collaborator's concern, not
/// something the geometry pipeline interprets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// The abstract input the core consumes. Ingesters (a GeoJSON loader, a CSV
/// visual-variable loader) populate this; the core does not parse any file
/// format.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapInput {
    pub is_world_map: bool,
    pub id_header: String,
    pub regions: Vec<Region>,
    /// `None` or a negative value means "missing"; both are folded into
    /// [`crate::model::TargetMap`] identically during ingest.
    pub targets: HashMap<String, Option<f64>>,
    pub colors: HashMap<String, Rgb>,
    pub labels: HashMap<String, String>,
    pub inset_assignment: HashMap<String, InsetPos>,
}

/// Per-iteration diagnostics, one per completed iteration of an inset's
/// control loop.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IterationTrace {
    pub n: usize,
    pub sigma: f64,
    pub max_err: f64,
    pub mean_err: f64,
    pub rho_min: f64,
    pub rho_max: f64,
    pub rho_mean: f64,
    pub rkf_steps: usize,
    pub rkf_rejections: usize,
}

/// The abstract output the core produces for a single inset.
/// `CartogramEngine::run` returns one of these per successfully processed
/// inset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapOutput {
    pub inset: InsetPos,
    pub regions_deformed: Vec<Region>,
    pub cum_proj: PointGrid,
    pub final_max_err: f64,
    pub iterations_performed: usize,
    pub area_errors: HashMap<String, f64>,
    pub iteration_traces: Vec<IterationTrace>,
}
