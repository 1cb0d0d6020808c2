//! Error types for the plane-wave SCF library

use thiserror::Error;

/// Energy contributions, used to label diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnergyTerm {
    Kinetic,
    Coulomb,
    ExchangeCorrelation,
    ElectronIon,
}

impl EnergyTerm {
    pub fn name(&self) -> &'static str {
        match self {
            EnergyTerm::Kinetic => "kinetic",
            EnergyTerm::Coulomb => "Coulomb",
            EnergyTerm::ExchangeCorrelation => "exchange-correlation",
            EnergyTerm::ElectronIon => "electron-ion",
        }
    }
}

impl std::fmt::Display for EnergyTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum DftError {
    #[error("invalid atomic system: {0}")]
    InvalidSystem(String),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("coefficient matrix is rank deficient (overlap eigenvalue {smallest:e} vs largest {largest:e})")]
    RankDeficient { smallest: f64, largest: f64 },

    #[error("non-positive density {value:e} at grid point {index}")]
    NonPositiveDensity { index: usize, value: f64 },

    #[error("{term} energy has imaginary residual {imag:e} (real part {real:e})")]
    ImaginaryResidual {
        term: EnergyTerm,
        real: f64,
        imag: f64,
    },

    #[error("non-finite value in {field} at grid point {index}")]
    NonFinite { field: &'static str, index: usize },

    #[error("energy gradient requested before any SCF step")]
    NotStepped,

    #[error("minimization did not converge within {iterations} iterations (last energy {last_energy:?})")]
    NotConverged {
        iterations: usize,
        last_energy: Option<f64>,
    },
}

pub type Result<T> = std::result::Result<T, DftError>;
