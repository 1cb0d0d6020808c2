//! Local ionic potential on the reciprocal grid.

use crate::system::AtomicSystem;
use basis::{CMatrix, PlaneWaveOperators};
use num_complex::Complex64;
use rayon::prelude::*;
use std::f64::consts::PI;

/// Bare point-nucleus potential `V_G = -4 pi / (Omega G^2) sum_a Z_a exp(-i G.X_a)`.
///
/// The G = 0 term and the unpaired Nyquist planes are zeroed, which keeps the
/// real-space potential real on even grids.
pub fn coulomb_potential(system: &AtomicSystem, op: &PlaneWaveOperators) -> CMatrix {
    let grid = op.grid();
    let omega = op.omega();
    let positions = system.positions();
    let charges = system.charges();

    let values: Vec<Complex64> = grid
        .gvectors()
        .par_iter()
        .zip(grid.g2().par_iter())
        .enumerate()
        .map(|(idx, (g, &g2))| {
            if g2 == 0.0 || grid.is_nyquist(idx) {
                return Complex64::default();
            }
            let structure_factor: Complex64 = positions
                .iter()
                .zip(charges)
                .map(|(x, &z)| Complex64::from_polar(z, -g.dot(x)))
                .sum();
            structure_factor * (-4.0 * PI / (omega * g2))
        })
        .collect();

    CMatrix::from_vec(values.len(), 1, values)
}
