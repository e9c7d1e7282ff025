use thiserror::Error as ThisError;

/// Errors the cartogram core can surface: every error carries the region id
/// / PWH index / ray coordinate that identifies where it was detected, and
/// the core never silently skips a detected defect.
#[non_exhaustive]
#[derive(Debug, ThisError)]
pub enum CartogramError {
    /// A rasterizer scan-line accumulated an odd intersection count, or two
    /// adjacent same-direction intersections ("enter, enter" / "leave,
    /// leave"), indicating self-intersecting or overlapping input geometry.
    /// Fatal for the affected inset only.
    #[error("topology error in region {region_id:?} at ray y={ray_y}: {detail}")]
    Topology {
        region_id: Option<String>,
        ray_y: f64,
        detail: String,
    },

    /// A simplified polyline could not be matched to any PolygonWithHoles
    /// during reassembly. Fatal for the affected inset only.
    #[error("polyline could not be attributed to any region/PWH (pwh index {pwh_index:?}): {detail}")]
    Attribution {
        pwh_index: Option<usize>,
        detail: String,
    },

    /// A (region, PWH) bucket of simplified polylines could not be chained
    /// back into a closed ring. Fatal for the affected inset only.
    #[error("could not reassemble a closed ring for region {region_id}, pwh index {pwh_index}: {detail}")]
    Reassembly {
        region_id: String,
        pwh_index: usize,
        detail: String,
    },

    /// `NaN`/`Inf` was produced in a density grid or projected position.
    /// Unlike the other variants this is fatal for the entire run, not just
    /// one inset — non-convergence by `max_iter` is a normal return, not
    /// this error.
    #[error("non-finite value encountered in {field} at inset {inset}: {detail}")]
    Numeric {
        inset: String,
        field: &'static str,
        detail: String,
    },

    /// Invalid configuration: non-positive grid dimensions, negative
    /// tolerances, or an empty region set.
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CartogramError>;
