//! Configuration management for plane-wave DFT calculations
//!
//! This module handles the YAML configuration structures and their defaults.
//! Every optional value is filled in by `with_defaults()` after parsing.

mod args;

pub use args::Args;

use crate::optim_impl::MinimizerParams;
use crate::scf_impl::xc::SLATER_ALPHA;
use crate::scf_impl::{EwaldParams, ScfParams};
use serde::{Deserialize, Serialize};

/// Main configuration structure for a calculation
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub system: SystemConfig,
    pub minimizer: Option<MinimizerConfig>,
    pub ewald: Option<EwaldConfig>,
    pub xc: Option<XcConfig>,
}

/// Periodic cell, atoms and discretization
#[derive(Debug, Deserialize, Serialize)]
pub struct SystemConfig {
    /// Lattice vectors as rows, in bohr.
    pub lattice: [[f64; 3]; 3],
    pub atoms: Vec<Atom>,
    /// Kinetic energy cutoff in Hartree.
    pub ecut: f64,
    pub grid: [usize; 3],
    /// Orbital occupations; derived from the ionic charges when missing.
    pub occupations: Option<Vec<f64>>,
}

/// Atomic position configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct Atom {
    pub element: String,
    /// Cartesian coordinates in bohr.
    pub coords: [f64; 3],
    /// Ionic charge; defaults to the atomic number.
    pub charge: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MinimizerConfig {
    pub max_iterations: Option<usize>,
    pub step_size: Option<f64>,
    pub energy_tolerance: Option<f64>,
    pub seed: Option<u64>,
}

impl Default for MinimizerConfig {
    fn default() -> Self {
        let params = MinimizerParams::default();
        MinimizerConfig {
            max_iterations: Some(params.max_iterations),
            step_size: Some(params.step_size),
            energy_tolerance: Some(params.energy_tolerance),
            seed: Some(1234),
        }
    }
}

impl MinimizerConfig {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.max_iterations.is_none() {
            self.max_iterations = defaults.max_iterations;
        }
        if self.step_size.is_none() {
            self.step_size = defaults.step_size;
        }
        if self.energy_tolerance.is_none() {
            self.energy_tolerance = defaults.energy_tolerance;
        }
        if self.seed.is_none() {
            self.seed = defaults.seed;
        }
        self
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EwaldConfig {
    pub gcut: Option<f64>,
    pub gamma: Option<f64>,
}

impl Default for EwaldConfig {
    fn default() -> Self {
        let params = EwaldParams::default();
        EwaldConfig {
            gcut: Some(params.gcut),
            gamma: Some(params.gamma),
        }
    }
}

impl EwaldConfig {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.gcut.is_none() {
            self.gcut = defaults.gcut;
        }
        if self.gamma.is_none() {
            self.gamma = defaults.gamma;
        }
        self
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct XcConfig {
    /// Slater exchange scaling.
    pub alpha: Option<f64>,
}

impl Default for XcConfig {
    fn default() -> Self {
        XcConfig {
            alpha: Some(SLATER_ALPHA),
        }
    }
}

impl XcConfig {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        if self.alpha.is_none() {
            self.alpha = Self::default().alpha;
        }
        self
    }
}

impl Config {
    /// Apply defaults to all configuration sections
    pub fn with_defaults(mut self) -> Self {
        self.minimizer = Some(self.minimizer.take().unwrap_or_default().with_defaults());
        self.ewald = Some(self.ewald.take().unwrap_or_default().with_defaults());
        self.xc = Some(self.xc.take().unwrap_or_default().with_defaults());
        self
    }

    /// Minimizer section with defaults applied
    pub fn minimizer(&self) -> MinimizerConfig {
        self.minimizer.clone().unwrap_or_default().with_defaults()
    }

    /// Numerical settings of the SCF session
    pub fn scf_params(&self) -> ScfParams {
        let ewald = self.ewald.clone().unwrap_or_default().with_defaults();
        let xc = self.xc.clone().unwrap_or_default().with_defaults();
        let defaults = ScfParams::default();
        ScfParams {
            xc_alpha: xc.alpha.unwrap_or(defaults.xc_alpha),
            ewald: EwaldParams {
                gcut: ewald.gcut.unwrap_or(defaults.ewald.gcut),
                gamma: ewald.gamma.unwrap_or(defaults.ewald.gamma),
            },
            ..defaults
        }
    }
}

/// Closed-shell filling of `n_electrons`: doubly occupied orbitals plus one partial
/// orbital for any remainder.
pub fn default_occupations(n_electrons: f64) -> Vec<f64> {
    let full = (n_electrons / 2.0).floor();
    let mut occupations = vec![2.0; full as usize];
    let rest = n_electrons - 2.0 * full;
    if rest > 0.0 {
        occupations.push(rest);
    }
    occupations
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
system:
  lattice: [[6.0, 0.0, 0.0], [0.0, 6.0, 0.0], [0.0, 0.0, 6.0]]
  atoms:
    - element: H
      coords: [0.0, 0.0, 0.0]
  ecut: 5.0
  grid: [12, 12, 12]
"#;

    #[test]
    fn test_defaults_filled_in() {
        let config: Config = serde_yml::from_str::<Config>(MINIMAL).unwrap().with_defaults();
        let minimizer = config.minimizer.as_ref().unwrap();
        assert_eq!(minimizer.max_iterations, Some(1001));
        assert_eq!(minimizer.step_size, Some(1e-5));
        assert_eq!(minimizer.energy_tolerance, Some(1e-6));
        assert_eq!(minimizer.seed, Some(1234));
        assert_eq!(config.scf_params(), ScfParams::default());
        assert!(config.system.occupations.is_none());
        assert!(config.system.atoms[0].charge.is_none());
    }

    #[test]
    fn test_explicit_values_kept() {
        let yaml = format!(
            "{}\nminimizer:\n  max_iterations: 20\n  seed: 7\newald:\n  gcut: 3.0\nxc:\n  alpha: 0.7\n",
            MINIMAL
        );
        let config: Config = serde_yml::from_str::<Config>(&yaml).unwrap().with_defaults();
        let minimizer = config.minimizer();
        assert_eq!(minimizer.max_iterations, Some(20));
        assert_eq!(minimizer.seed, Some(7));
        assert_eq!(minimizer.step_size, Some(1e-5));

        let params = config.scf_params();
        assert_eq!(params.ewald.gcut, 3.0);
        assert_eq!(params.ewald.gamma, 1e-8);
        assert_eq!(params.xc_alpha, 0.7);
    }

    #[test]
    fn test_default_occupations() {
        assert_eq!(default_occupations(1.0), vec![1.0]);
        assert_eq!(default_occupations(2.0), vec![2.0]);
        assert_eq!(default_occupations(5.0), vec![2.0, 2.0, 1.0]);
        assert!(default_occupations(0.0).is_empty());
    }
}
