//! Plane-wave basis machinery: cell geometry, sampling grid, truncated basis,
//! 3D FFT and the linear operators built on top of them.

pub mod fft;
pub mod grid;
pub mod lattice;
pub mod operators;

pub use grid::{BasisIndexSet, FftGrid};
pub use lattice::Lattice;
pub use operators::{complex_column, CMatrix, PlaneWaveOperators};
