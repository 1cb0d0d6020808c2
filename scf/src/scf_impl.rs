//! Plane-wave Kohn-Sham DFT
//!
//! This module provides the SCF trait used by the orbital minimizer and its plane-wave
//! implementation: Löwdin orthonormalization, LDA exchange-correlation, the Ewald ion-ion
//! sum, energy accounting and the SCF session that ties them together.

pub mod energy;
pub mod ewald;
pub mod orth;
pub mod session;
pub mod xc;

#[cfg(test)]
mod tests;

use crate::error::Result;
use basis::CMatrix;

pub use energy::Energies;
pub use ewald::EwaldParams;
pub use session::{PlaneWaveSCF, ScfParams, StepFields};

/// The SCF trait defines the interface a minimizer drives
///
/// An implementation evaluates the total energy for a coefficient matrix `W` and, once a
/// step has been taken, the gradient of that energy with respect to `W`.
pub trait SCF {
    /// Rows of `W`.
    fn n_basis(&self) -> usize;
    /// Columns of `W`.
    fn n_states(&self) -> usize;
    /// Evaluate the state at `w` and return the total energy.
    fn scf_step(&mut self, w: &CMatrix) -> Result<f64>;
    /// Energy gradient at `w`, using the fields of the latest step.
    fn energy_gradient(&self, w: &CMatrix) -> Result<CMatrix>;
}
