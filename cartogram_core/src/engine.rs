use crate::config::EngineConfig;
use crate::error::{CartogramError, Result};
use crate::integrator::{integrate, IntegratorConfig};
use crate::io::{IterationTrace, MapOutput};
use crate::model::{repair_targets, Inset, MapModel};
use crate::rasterizer::{rasterize, RasterizerConfig};
use crate::simplifier::{simplify_regions, SimplifierConfig};
use cartogram_common::spectral::{gaussian_blur_in_place, SpectralPlan};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation, checked only between iterations — never
/// mid-transform. Clones share the same underlying flag: a caller can
/// hand one clone to `CartogramEngine::run` and retain another to call
/// [`CancellationToken::cancel`] from elsewhere (another thread, a signal
/// handler) without coordinating through the engine itself.
#[derive(Clone)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for CancellationToken {
    fn default() -> CancellationToken {
        CancellationToken::new()
    }
}

/// Outer control loop: an explicit value owning only its configuration,
/// rather than free functions closing over a global mutable state. `run`
/// drives every inset of a [`MapModel`] in turn; `run_inset` is exposed
/// standalone for a caller that wants to drive insets concurrently itself,
/// since insets share no mutable state.
pub struct CartogramEngine {
    config: EngineConfig,
}

impl CartogramEngine {
    pub fn new(config: EngineConfig) -> Result<CartogramEngine> {
        config.validate()?;
        Ok(CartogramEngine { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs every inset of `model` to completion. A `Topology`,
    /// `Attribution`, or `Reassembly` error aborts only the inset that
    /// produced it — fatal for the affected inset, but other insets
    /// continue; a `Numeric` error aborts the whole run immediately, since
    /// it signals the pipeline itself has broken down rather than that one
    /// inset's input geometry was malformed.
    pub fn run(&self, model: &mut MapModel, cancellation: &CancellationToken) -> Result<Vec<MapOutput>> {
        if model.n_insets() == 0 {
            return Err(CartogramError::Config("map model has no insets".to_string()));
        }

        let mut positions: Vec<_> = model.insets.keys().copied().collect();
        positions.sort_by_key(|p| p.to_string());

        let mut outputs = Vec::with_capacity(positions.len());
        for pos in positions {
            let inset = model
                .insets
                .get_mut(&pos)
                .expect("position came from this model's own key set");
            match self.run_inset(inset, cancellation) {
                Ok(output) => outputs.push(output),
                Err(err @ (CartogramError::Topology { .. } | CartogramError::Attribution { .. } | CartogramError::Reassembly { .. })) => {
                    warn!("inset {} failed and was skipped: {}", pos, err);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(outputs)
    }

    /// Drives a single inset through target-area repair, one-time boundary
    /// simplification, and an iterate-until-converged loop: rasterize, blur,
    /// integrate, recompute areas, repeated until `max_err <= err_tol` or
    /// `max_iter` iterations have run. Either termination is a successful
    /// return; callers distinguish them via `MapOutput::final_max_err`.
    pub fn run_inset(&self, inset: &mut Inset, cancellation: &CancellationToken) -> Result<MapOutput> {
        if inset.regions.is_empty() {
            return Err(CartogramError::Config(format!("inset {} has no regions", inset.pos)));
        }

        repair_targets(&mut inset.targets, &inset.regions);

        let simplifier_cfg = SimplifierConfig {
            densify_chord: self.config.densify_chord,
            simplify_cost_threshold: self.config.simplify_cost_threshold,
        };
        inset.regions = simplify_regions(&inset.regions, &simplifier_cfg)?;
        inset.snapshot_original();

        let plan = SpectralPlan::new(inset.lx(), inset.ly());
        let raster_cfg = RasterizerConfig {
            ray_resolution: self.config.ray_resolution,
            weight_by_trailing_region: self.config.rasterizer_debug.weight_by_trailing_region,
        };
        let integrator_cfg = IntegratorConfig {
            abs_tol: self.config.abs_tol,
            rel_tol: self.config.rel_tol,
        };

        info!("inset {}: starting, {} region(s)", inset.pos, inset.regions.len());

        let mut traces = Vec::new();
        let mut n = 0usize;
        let mut max_err = inset.max_area_error();

        while max_err > self.config.err_tol && n < self.config.max_iter {
            if cancellation.is_cancelled() {
                info!("inset {}: cancelled after {} iteration(s)", inset.pos, n);
                break;
            }

            let rho = rasterize(inset, &raster_cfg)?;
            let sigma = self.config.blur_sigma(n);
            let mut blurred = rho;
            gaussian_blur_in_place(&mut blurred, &plan, sigma);
            if blurred.has_non_finite() {
                return Err(CartogramError::Numeric {
                    inset: inset.pos.to_string(),
                    field: "rho",
                    detail: "non-finite density after blur".to_string(),
                });
            }
            inset.rho = blurred.clone();

            let (new_proj, stats) = integrate(&blurred, &inset.proj, &integrator_cfg, &inset.pos.to_string())?;
            inset.apply_projection(&new_proj);

            let area_errs = inset.area_errors();
            max_err = area_errs.values().cloned().fold(0.0, f64::max);
            let mean_err = if area_errs.is_empty() {
                0.0
            } else {
                area_errs.values().sum::<f64>() / area_errs.len() as f64
            };

            traces.push(IterationTrace {
                n,
                sigma,
                max_err,
                mean_err,
                rho_min: blurred.min(),
                rho_max: blurred.max(),
                rho_mean: blurred.mean(),
                rkf_steps: stats.rkf_steps,
                rkf_rejections: stats.rkf_rejections,
            });
            debug!("inset {}: iter {} max_err={:.6} sigma={:.4}", inset.pos, n, max_err, sigma);

            n += 1;
        }

        info!("inset {}: finished after {} iteration(s), max_err={:.6}", inset.pos, n, max_err);

        let area_errors = inset.area_errors();
        Ok(MapOutput {
            inset: inset.pos,
            regions_deformed: inset.regions.clone(),
            cum_proj: inset.cum_proj.clone(),
            final_max_err: max_err,
            iterations_performed: n,
            area_errors,
            iteration_traces: traces,
        })
    }
}
