// Main library file for plane-wave DFT calculations

pub mod app;
pub mod config;
pub mod error;
pub mod io;
pub mod optim_impl;
pub mod potential;
pub mod scf_impl;
pub mod system;

pub use error::{DftError, Result};
pub use optim_impl::{MinimizationOutcome, MinimizerParams, SteepestDescent, StopReason};
pub use scf_impl::{Energies, PlaneWaveSCF, ScfParams, SCF};
pub use system::AtomicSystem;
