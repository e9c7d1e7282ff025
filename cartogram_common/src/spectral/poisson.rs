use super::dct::{wavenumber, SpectralPlan};
use crate::grid::Grid;

/// Solves the Neumann-boundary Poisson equation `∇²φ = ρ - ρ̄` on a
/// rectangular grid via the discrete cosine transform: the `(0, 0)` mode,
/// which would otherwise divide by zero, is pinned to zero, fixing `φ` up
/// to the additive constant the Neumann problem leaves undetermined.
pub struct PoissonSolver {
    plan: SpectralPlan,
    lx: usize,
    ly: usize,
}

impl PoissonSolver {
    pub fn new(lx: usize, ly: usize) -> PoissonSolver {
        PoissonSolver {
            plan: SpectralPlan::new(lx, ly),
            lx,
            ly,
        }
    }

    pub fn lx(&self) -> usize {
        self.lx
    }

    pub fn ly(&self) -> usize {
        self.ly
    }

    /// The potential's DCT-II mode coefficients, after dividing by
    /// `-(k_x²+k_y²)` and pinning the `(0, 0)` mode — the mode-space form
    /// `solve` would otherwise inverse-transform directly into spatial `φ`.
    /// Exposed separately so [`velocity`] can derive the spectral gradient
    /// of `φ` from the same coefficients, without round-tripping through
    /// spatial `φ` and then re-transforming it.
    pub fn solve_modes(&self, rho: &Grid) -> Grid {
        let mut hat = rho.clone();
        self.plan.forward(&mut hat);
        for i in 0..self.lx {
            for j in 0..self.ly {
                if i == 0 && j == 0 {
                    hat.set(0, 0, 0.0);
                    continue;
                }
                let (kx, ky) = wavenumber(self.lx, self.ly, i, j);
                let denom = kx * kx + ky * ky;
                let v = hat.get(i, j);
                hat.set(i, j, -v / denom);
            }
        }
        hat
    }

    /// Returns the potential `φ` satisfying `∇²φ = ρ - ρ̄` with zero normal
    /// derivative at every edge of the grid rectangle.
    pub fn solve(&self, rho: &Grid) -> Grid {
        let mut hat = self.solve_modes(rho);
        self.plan.inverse(&mut hat);
        let scale = self.plan.round_trip_scale();
        for v in hat.as_mut_slice().iter_mut() {
            *v /= scale;
        }
        hat
    }

    /// Re-applies the discrete operator `ρ̂ ↦ -(k_x²+k_y²)·ρ̂` that `solve`
    /// inverts, without pinning the `(0, 0)` mode. Composed with `solve`
    /// this recovers the input up to its mean (the component the Neumann
    /// problem cannot determine) — used to test the Poisson solve's
    /// round-trip property.
    pub fn apply_discrete_laplacian(&self, field: &Grid) -> Grid {
        let mut hat = field.clone();
        self.plan.forward(&mut hat);
        for i in 0..self.lx {
            for j in 0..self.ly {
                let (kx, ky) = wavenumber(self.lx, self.ly, i, j);
                let v = hat.get(i, j);
                hat.set(i, j, -(kx * kx + ky * ky) * v);
            }
        }
        self.plan.inverse(&mut hat);
        let scale = self.plan.round_trip_scale();
        for v in hat.as_mut_slice().iter_mut() {
            *v /= scale;
        }
        hat
    }
}

/// Velocity field `v = -∇φ / ρ` that advects vertices toward equalized
/// density. `∇φ` is reconstructed spectrally from `φ`'s own DCT mode
/// coefficients (see [`SpectralPlan::gradient`]) rather than from a
/// finite-difference stencil over the spatial field, so the derivative
/// stays accurate even where `φ` changes sharply between neighboring
/// cells. `rho` is clamped away from zero so a pathologically small cell
/// density cannot blow the velocity up; a well-formed rasterization
/// should never produce a zero cell in practice.
pub fn velocity(solver: &PoissonSolver, rho: &Grid) -> (Grid, Grid) {
    let phi_hat = solver.solve_modes(rho);
    let (gx, gy) = solver.plan.gradient(&phi_hat);
    let lx = rho.lx();
    let ly = rho.ly();
    let mut vx = Grid::new(lx, ly, 0.0);
    let mut vy = Grid::new(lx, ly, 0.0);
    for i in 0..lx {
        for j in 0..ly {
            let r = rho.get(i, j).max(1e-12);
            vx.set(i, j, -gx.get(i, j) / r);
            vy.set(i, j, -gy.get(i, j) / r);
        }
    }
    (vx, vy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_poisson_round_trip_recovers_forcing_up_to_mean() {
        let lx = 8;
        let ly = 8;
        let solver = PoissonSolver::new(lx, ly);
        let mut rho = Grid::new(lx, ly, 0.0);
        for i in 0..lx {
            for j in 0..ly {
                rho.set(i, j, ((i * 2 + j) % 5) as f64);
            }
        }
        let mean = rho.mean();
        let phi = solver.solve(&rho);
        let recovered = solver.apply_discrete_laplacian(&phi);
        for i in 0..lx {
            for j in 0..ly {
                let expected = rho.get(i, j) - mean;
                assert_abs_diff_eq!(recovered.get(i, j), expected, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_zero_mode_is_pinned() {
        let solver = PoissonSolver::new(8, 8);
        let rho = Grid::new(8, 8, 3.0);
        let phi = solver.solve(&rho);
        // A spatially uniform density has no gradient to diffuse along.
        for v in phi.as_slice() {
            assert_abs_diff_eq!(*v, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_velocity_is_zero_for_uniform_density() {
        let solver = PoissonSolver::new(8, 8);
        let rho = Grid::new(8, 8, 3.0);
        let (vx, vy) = velocity(&solver, &rho);
        for i in 0..8 {
            for j in 0..8 {
                assert_abs_diff_eq!(vx.get(i, j), 0.0, epsilon = 1e-9);
                assert_abs_diff_eq!(vy.get(i, j), 0.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_velocity_is_invariant_to_uniformly_scaling_density() {
        // v = -grad(phi)/rho, and phi solves a linear operator in rho, so
        // scaling every cell of rho by the same positive factor leaves v
        // unchanged: phi (and its gradient) scale by the same factor and
        // cancel against the rescaled rho in the division.
        let lx = 8;
        let ly = 8;
        let solver = PoissonSolver::new(lx, ly);
        let mut rho = Grid::new(lx, ly, 1.0);
        for i in 0..lx {
            for j in 0..ly {
                rho.set(i, j, 1.0 + ((i * 3 + j) % 4) as f64);
            }
        }
        let mut scaled = rho.clone();
        for v in scaled.as_mut_slice().iter_mut() {
            *v *= 2.5;
        }
        let (vx, vy) = velocity(&solver, &rho);
        let (vx2, vy2) = velocity(&solver, &scaled);
        for i in 0..lx {
            for j in 0..ly {
                assert_abs_diff_eq!(vx2.get(i, j), vx.get(i, j), epsilon = 1e-7);
                assert_abs_diff_eq!(vy2.get(i, j), vy.get(i, j), epsilon = 1e-7);
            }
        }
    }
}
