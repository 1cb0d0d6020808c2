//! Löwdin orthonormalization and functions of Hermitian overlap matrices.

use crate::error::{DftError, Result};
use basis::{CMatrix, PlaneWaveOperators};
use nalgebra::{DVector, SymmetricEigen};
use num_complex::Complex64;

/// Relative bound below which an overlap eigenvalue counts as zero.
pub const RANK_TOLERANCE: f64 = 1e-12;

/// Eigendecomposition `U = V diag(mu) V^H` of a Hermitian positive-definite overlap.
pub struct OverlapEigen {
    pub values: DVector<f64>,
    pub vectors: CMatrix,
}

impl OverlapEigen {
    pub fn new(u: &CMatrix) -> Result<Self> {
        // symmetrize away rounding asymmetry before the Hermitian solver
        let herm = (u + u.adjoint()) * Complex64::new(0.5, 0.0);
        let eig = SymmetricEigen::try_new(herm, 1e-14, 0).ok_or(DftError::RankDeficient {
            smallest: f64::NAN,
            largest: f64::NAN,
        })?;

        let largest = eig.eigenvalues.max();
        let smallest = eig.eigenvalues.min();
        if !(smallest > 0.0) || smallest <= RANK_TOLERANCE * largest {
            return Err(DftError::RankDeficient { smallest, largest });
        }

        Ok(OverlapEigen {
            values: eig.eigenvalues,
            vectors: eig.eigenvectors,
        })
    }

    /// `V diag(f(mu)) V^H`.
    pub fn apply<F>(&self, f: F) -> CMatrix
    where
        F: Fn(f64) -> f64,
    {
        let mut scaled = self.vectors.clone();
        for (j, mut column) in scaled.column_iter_mut().enumerate() {
            column *= Complex64::new(f(self.values[j]), 0.0);
        }
        scaled * self.vectors.adjoint()
    }

    /// `U^{-1/2}`.
    pub fn inverse_sqrt(&self) -> CMatrix {
        self.apply(|mu| 1.0 / mu.sqrt())
    }

    /// `U^{-1}`.
    pub fn inverse(&self) -> CMatrix {
        self.apply(|mu| 1.0 / mu)
    }

    /// `Q(X) = V [(V^H X V)_ij / (sqrt(mu_i) + sqrt(mu_j))] V^H`, the derivative of `U^{-1/2}`.
    pub fn q_operator(&self, x: &CMatrix) -> CMatrix {
        let v = &self.vectors;
        let inner = v.adjoint() * x * v;
        let roots = self.values.map(f64::sqrt);
        let denom = CMatrix::from_fn(inner.nrows(), inner.ncols(), |i, j| {
            inner[(i, j)] / (roots[i] + roots[j])
        });
        v * denom * v.adjoint()
    }
}

/// Overlap matrix `U = W^H O W`.
pub fn overlap(op: &PlaneWaveOperators, w: &CMatrix) -> CMatrix {
    w.adjoint() * op.o(w)
}

/// Orthonormal orbitals `Y = W U^{-1/2}`, satisfying `Y^H O Y = 1`.
pub fn orth(op: &PlaneWaveOperators, w: &CMatrix) -> Result<CMatrix> {
    let eig = OverlapEigen::new(&overlap(op, w))?;
    Ok(w * eig.inverse_sqrt())
}
