use super::dct::SpectralPlan;
use crate::grid::Grid;
use rayon::prelude::*;
use std::f64::consts::PI;

/// Applies a Gaussian blur to `rho` in place by multiplying its DCT-II
/// coefficients by a Gaussian kernel in mode space and transforming back.
/// `sigma` is the blur standard deviation in grid units; `sigma <= 0` leaves
/// `rho` untouched (the final iterations of the blur schedule floor at
/// zero).
///
/// The kernel multiply is row-parallel: `Grid` is row-major, so each row
/// of length `ly` is a disjoint contiguous chunk of the backing buffer.
pub fn gaussian_blur_in_place(rho: &mut Grid, plan: &SpectralPlan, sigma: f64) {
    if sigma <= 0.0 {
        return;
    }
    plan.forward(rho);
    let lx = rho.lx();
    let ly = rho.ly();
    rho.as_mut_slice().par_chunks_mut(ly).enumerate().for_each(|(i, row)| {
        let kx = PI * i as f64 / lx as f64;
        for (j, v) in row.iter_mut().enumerate() {
            let ky = PI * j as f64 / ly as f64;
            let k2 = kx * kx + ky * ky;
            let kernel = (-0.5 * k2 * sigma * sigma).exp();
            *v *= kernel;
        }
    });
    plan.inverse(rho);
    let scale = plan.round_trip_scale();
    for v in rho.as_mut_slice().iter_mut() {
        *v /= scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sigma_is_a_no_op() {
        let plan = SpectralPlan::new(4, 4);
        let mut rho = Grid::new(4, 4, 0.0);
        rho.set(1, 1, 5.0);
        let before = rho.clone();
        gaussian_blur_in_place(&mut rho, &plan, 0.0);
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(rho.get(i, j), before.get(i, j));
            }
        }
    }

    #[test]
    fn test_blur_preserves_mean() {
        let lx = 8;
        let ly = 8;
        let plan = SpectralPlan::new(lx, ly);
        let mut rho = Grid::new(lx, ly, 1.0);
        rho.set(4, 4, 50.0);
        let mean_before = rho.mean();
        gaussian_blur_in_place(&mut rho, &plan, 2.0);
        assert!((rho.mean() - mean_before).abs() < 1e-8);
    }

    #[test]
    fn test_blur_smooths_a_spike() {
        let lx = 16;
        let ly = 16;
        let plan = SpectralPlan::new(lx, ly);
        let mut rho = Grid::new(lx, ly, 1.0);
        rho.set(8, 8, 100.0);
        let peak_before = rho.get(8, 8);
        gaussian_blur_in_place(&mut rho, &plan, 3.0);
        assert!(rho.get(8, 8) < peak_before);
        assert!(rho.get(7, 8) > 1.0);
    }
}
