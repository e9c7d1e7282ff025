use crate::grid::Grid;
use rustdct::{DctPlanner, TransformType2And3};
use std::f64::consts::PI;
use std::sync::Arc;

/// The angular wavenumber pair associated with DCT mode `(i, j)` on an
/// `lx`-by-`ly` grid, shared by the Poisson solve and the spectral gradient
/// below so both agree on which continuous frequency a given mode index
/// represents.
pub(crate) fn wavenumber(lx: usize, ly: usize, i: usize, j: usize) -> (f64, f64) {
    (PI * i as f64 / lx as f64, PI * j as f64 / ly as f64)
}

/// Raw (unnormalized) inverse discrete sine transform of type III along one
/// axis: `out[n] = sum_{k=1}^{N-1} coeffs[k] * sin(pi*k*n/N)`. This is the
/// sine-basis counterpart of the cosine-basis `process_dct3` rustdct
/// already provides — differentiating a cosine series term by term turns
/// each `cos(k*x)` coefficient into a `sin(k*x)` one, so reconstructing a
/// spatial derivative from mode-space coefficients needs exactly this
/// transform along the differentiated axis. The `k=0` term never
/// contributes (`sin(0) == 0`), matching the fact that the constant mode
/// has no derivative.
fn dst3_1d(coeffs: &[f64]) -> Vec<f64> {
    let n = coeffs.len();
    let mut out = vec![0.0; n];
    for (sample, slot) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (k, &c) in coeffs.iter().enumerate().skip(1) {
            acc += c * (PI * k as f64 * sample as f64 / n as f64).sin();
        }
        *slot = acc;
    }
    out
}

/// Cached 2D DCT-II/DCT-III plans for a fixed grid size. Creating a
/// `rustdct` plan is the expensive part of a transform; an `Inset` builds
/// one `SpectralPlan` per grid size and reuses it across iterations rather
/// than replanning on every call.
pub struct SpectralPlan {
    lx: usize,
    ly: usize,
    row_plan: Arc<dyn TransformType2And3<f64>>,
    col_plan: Arc<dyn TransformType2And3<f64>>,
}

impl SpectralPlan {
    pub fn new(lx: usize, ly: usize) -> SpectralPlan {
        let mut planner = DctPlanner::new();
        SpectralPlan {
            lx,
            ly,
            row_plan: planner.plan_dct2(ly),
            col_plan: planner.plan_dct2(lx),
        }
    }

    /// In-place, unnormalized 2D DCT-II: rows (length `ly`) first, then
    /// columns (length `lx`).
    pub fn forward(&self, grid: &mut Grid) {
        debug_assert_eq!(grid.lx(), self.lx);
        debug_assert_eq!(grid.ly(), self.ly);
        for i in 0..self.lx {
            self.row_plan.process_dct2(grid.row_mut(i));
        }
        self.transform_columns(grid, |plan, buf| plan.process_dct2(buf));
    }

    /// In-place, unnormalized 2D DCT-III (the inverse transform up to the
    /// `4*lx*ly` scale factor `round_trip_scale` returns): columns first,
    /// then rows — the reverse processing order of `forward`, matching the
    /// standard separable-transform inverse.
    pub fn inverse(&self, grid: &mut Grid) {
        debug_assert_eq!(grid.lx(), self.lx);
        debug_assert_eq!(grid.ly(), self.ly);
        self.transform_columns(grid, |plan, buf| plan.process_dct3(buf));
        for i in 0..self.lx {
            self.row_plan.process_dct3(grid.row_mut(i));
        }
    }

    /// DCT along the column axis (length `lx`) requires gathering strided
    /// elements into a contiguous scratch buffer since `Grid` is row-major.
    fn transform_columns(&self, grid: &mut Grid, apply: impl Fn(&Arc<dyn TransformType2And3<f64>>, &mut [f64])) {
        let mut col = vec![0.0; self.lx];
        for j in 0..self.ly {
            for i in 0..self.lx {
                col[i] = grid.get(i, j);
            }
            apply(&self.col_plan, &mut col);
            for i in 0..self.lx {
                grid.set(i, j, col[i]);
            }
        }
    }

    /// The normalization factor `forward` then `inverse` introduces.
    pub fn round_trip_scale(&self) -> f64 {
        4.0 * (self.lx as f64) * (self.ly as f64)
    }

    /// Reconstructs the spatial partial derivatives `(dphi/dx, dphi/dy)` of
    /// the field whose DCT-II mode coefficients are `phi_hat`, by scaling
    /// each mode by its wavenumber and inverse-transforming with a sine
    /// basis along the differentiated axis and the ordinary cosine basis
    /// along the other — the spectral counterpart of differentiating a 2D
    /// cosine series term by term, in place of a finite-difference stencil.
    pub fn gradient(&self, phi_hat: &Grid) -> (Grid, Grid) {
        debug_assert_eq!(phi_hat.lx(), self.lx);
        debug_assert_eq!(phi_hat.ly(), self.ly);

        let mut gx = Grid::new(self.lx, self.ly, 0.0);
        let mut gy = Grid::new(self.lx, self.ly, 0.0);
        for i in 0..self.lx {
            for j in 0..self.ly {
                let (kx, ky) = wavenumber(self.lx, self.ly, i, j);
                let v = phi_hat.get(i, j);
                gx.set(i, j, -kx * v);
                gy.set(i, j, -ky * v);
            }
        }

        // d/dx: sine reconstruction along x (columns), cosine along y (rows).
        let mut col = vec![0.0; self.lx];
        for j in 0..self.ly {
            for i in 0..self.lx {
                col[i] = gx.get(i, j);
            }
            let transformed = dst3_1d(&col);
            for i in 0..self.lx {
                gx.set(i, j, transformed[i]);
            }
        }
        for i in 0..self.lx {
            self.row_plan.process_dct3(gx.row_mut(i));
        }

        // d/dy: cosine reconstruction along x (columns), sine along y (rows).
        for i in 0..self.lx {
            let transformed = dst3_1d(gy.row(i));
            gy.row_mut(i).copy_from_slice(&transformed);
        }
        self.transform_columns(&mut gy, |plan, buf| plan.process_dct3(buf));

        let scale = self.round_trip_scale();
        for v in gx.as_mut_slice().iter_mut() {
            *v /= scale;
        }
        for v in gy.as_mut_slice().iter_mut() {
            *v /= scale;
        }
        (gx, gy)
    }
}
