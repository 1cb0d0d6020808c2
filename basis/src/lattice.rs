//! Periodic cell geometry: real-space lattice vectors and their reciprocal set.

use nalgebra::{Matrix3, Vector3};
use std::f64::consts::PI;

/// Simulation cell spanned by three lattice vectors (stored as matrix rows, bohr).
#[derive(Clone, Debug, PartialEq)]
pub struct Lattice {
    vectors: Matrix3<f64>,
    reciprocal: Matrix3<f64>,
    volume: f64,
}

impl Lattice {
    /// Build a lattice from row vectors `a_1, a_2, a_3`.
    ///
    /// Returns `None` when the vectors are (numerically) linearly dependent.
    pub fn new(vectors: Matrix3<f64>) -> Option<Self> {
        let volume = vectors.determinant().abs();
        if !volume.is_finite() || volume <= 1e-12 {
            return None;
        }
        // b_i . a_j = 2 pi delta_ij  =>  B = 2 pi (R^-1)^T
        let reciprocal = vectors.try_inverse()?.transpose() * (2.0 * PI);
        Some(Lattice {
            vectors,
            reciprocal,
            volume,
        })
    }

    pub fn from_rows(rows: [[f64; 3]; 3]) -> Option<Self> {
        Self::new(Matrix3::from_fn(|i, j| rows[i][j]))
    }

    /// Simple cubic cell with edge `a`.
    pub fn cubic(a: f64) -> Option<Self> {
        Self::new(Matrix3::identity() * a)
    }

    pub fn vectors(&self) -> &Matrix3<f64> {
        &self.vectors
    }

    pub fn reciprocal_vectors(&self) -> &Matrix3<f64> {
        &self.reciprocal
    }

    /// Lattice vector `a_i`.
    pub fn vector(&self, i: usize) -> Vector3<f64> {
        self.vectors.row(i).transpose()
    }

    /// Reciprocal lattice vector `b_i`.
    pub fn reciprocal_vector(&self, i: usize) -> Vector3<f64> {
        self.reciprocal.row(i).transpose()
    }

    /// Cell volume Omega.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Cartesian position of fractional coordinates `frac`.
    pub fn to_cartesian(&self, frac: &Vector3<f64>) -> Vector3<f64> {
        self.vectors.transpose() * frac
    }

    /// Fractional coordinates of the Cartesian position `x`, `R^-T x`.
    pub fn to_fractional(&self, x: &Vector3<f64>) -> Vector3<f64> {
        self.reciprocal * x / (2.0 * PI)
    }

    /// `x` shifted by the lattice vector that brings its fractional coordinates into
    /// `[-1/2, 1/2]`.
    pub fn wrap(&self, x: &Vector3<f64>) -> Vector3<f64> {
        let frac = self.to_fractional(x);
        x - self.to_cartesian(&frac.map(f64::round))
    }

    /// Cartesian vector `n_1 a_1 + n_2 a_2 + n_3 a_3`.
    pub fn translation(&self, n: [i32; 3]) -> Vector3<f64> {
        self.to_cartesian(&Vector3::new(n[0] as f64, n[1] as f64, n[2] as f64))
    }

    /// Cartesian reciprocal vector `n_1 b_1 + n_2 b_2 + n_3 b_3`.
    pub fn reciprocal_translation(&self, n: [i32; 3]) -> Vector3<f64> {
        self.reciprocal.transpose() * Vector3::new(n[0] as f64, n[1] as f64, n[2] as f64)
    }
}
