use crate::error::{CartogramError, Result};
use serde::{Deserialize, Serialize};

/// Debug knobs that reproduce an ambiguous accumulation order kept around
/// for regression comparison. None of these affect the default, documented
/// behavior.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RasterizerDebugConfig {
    /// When `true`, the rasterizer weights each accumulated segment by the
    /// area error of the *trailing* (last-sorted) region on the ray rather
    /// than the current intersection's own region. Default `false`: weight
    /// by the current region, the documented default behavior.
    pub weight_by_trailing_region: bool,
}

impl Default for RasterizerDebugConfig {
    fn default() -> RasterizerDebugConfig {
        RasterizerDebugConfig {
            weight_by_trailing_region: false,
        }
    }
}

/// All tunables of the cartogram engine. Every field has the documented
/// default; callers typically start from [`EngineConfig::default`] and
/// override only what they need.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Grid width. Should be a power of two for best spectral performance;
    /// typical value 512.
    pub grid_lx: usize,
    /// Grid height. Should be a power of two for best spectral performance;
    /// typical value 512.
    pub grid_ly: usize,
    /// Termination threshold on the maximum per-region area error.
    pub err_tol: f64,
    /// Termination cap on iteration count.
    pub max_iter: usize,
    /// Sub-cell ray count between consecutive integer grid rows.
    pub ray_resolution: usize,
    /// Maximum chord length, as a fraction of one grid cell, a densified
    /// polyline edge may have before it is subdivided further.
    pub densify_chord: f64,
    /// Douglas-Peucker-family simplification threshold, as a fraction of
    /// the densification length.
    pub simplify_cost_threshold: f64,
    /// Absolute tolerance term of the RKF 4/5 step-acceptance criterion.
    pub abs_tol: f64,
    /// Relative tolerance term of the RKF 4/5 step-acceptance criterion.
    pub rel_tol: f64,
    /// See [`RasterizerDebugConfig`].
    pub rasterizer_debug: RasterizerDebugConfig,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            grid_lx: 512,
            grid_ly: 512,
            err_tol: 0.01,
            max_iter: 100,
            ray_resolution: 16,
            densify_chord: 0.25,
            simplify_cost_threshold: 0.2,
            abs_tol: 1e-9,
            rel_tol: 1e-6,
            rasterizer_debug: RasterizerDebugConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Rejects non-positive grid dimensions or negative tolerances. An empty
    /// region set is checked by the caller once it has a `MapModel` in hand.
    pub fn validate(&self) -> Result<()> {
        if self.grid_lx == 0 || self.grid_ly == 0 {
            return Err(CartogramError::Config(format!(
                "grid dimensions must be positive, got {}x{}",
                self.grid_lx, self.grid_ly
            )));
        }
        if self.err_tol < 0.0 {
            return Err(CartogramError::Config(format!(
                "err_tol must be non-negative, got {}",
                self.err_tol
            )));
        }
        if self.abs_tol < 0.0 || self.rel_tol < 0.0 {
            return Err(CartogramError::Config(
                "abs_tol and rel_tol must be non-negative".to_string(),
            ));
        }
        if self.ray_resolution == 0 {
            return Err(CartogramError::Config(
                "ray_resolution must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Blur schedule: geometrically decreasing standard deviation starting
    /// at roughly `grid diameter / 16`, halved every iteration, floored at
    /// zero once it underflows the cell spacing.
    pub fn blur_sigma(&self, iteration: usize) -> f64 {
        let diameter = ((self.grid_lx * self.grid_lx + self.grid_ly * self.grid_ly) as f64).sqrt();
        let sigma0 = diameter / 16.0;
        let sigma = sigma0 / 2f64.powi(iteration as i32);
        if sigma < 1e-3 {
            0.0
        } else {
            sigma
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_spec() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.err_tol, 0.01);
        assert_eq!(cfg.max_iter, 100);
        assert_eq!(cfg.ray_resolution, 16);
    }

    #[test]
    fn test_validate_rejects_zero_grid() {
        let mut cfg = EngineConfig::default();
        cfg.grid_lx = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_tolerance() {
        let mut cfg = EngineConfig::default();
        cfg.err_tol = -1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_blur_schedule_decreases_and_floors() {
        let cfg = EngineConfig::default();
        let s0 = cfg.blur_sigma(0);
        let s1 = cfg.blur_sigma(1);
        assert!(s1 < s0);
        let s_far = cfg.blur_sigma(50);
        assert_eq!(s_far, 0.0);
    }
}
