//! Total-energy bookkeeping.

use crate::error::{DftError, EnergyTerm, Result};
use basis::{complex_column, CMatrix, PlaneWaveOperators};
use nalgebra::DVector;
use num_complex::Complex64;
use std::fmt;

/// Default bound on |Im E| relative to max(1, |Re E|).
pub const IMAG_TOLERANCE: f64 = 1e-8;

/// Energy contributions in Hartree.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Energies {
    pub kinetic: f64,
    pub coulomb: f64,
    pub xc: f64,
    pub electron_ion: f64,
    pub ewald: f64,
}

impl Energies {
    pub fn total(&self) -> f64 {
        self.kinetic + self.coulomb + self.xc + self.electron_ion + self.ewald
    }
}

impl fmt::Display for Energies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Kinetic:              {:16.10} Ha", self.kinetic)?;
        writeln!(f, "  Coulomb (Hartree):    {:16.10} Ha", self.coulomb)?;
        writeln!(f, "  Exchange-correlation: {:16.10} Ha", self.xc)?;
        writeln!(f, "  Electron-ion:         {:16.10} Ha", self.electron_ion)?;
        writeln!(f, "  Ewald (ion-ion):      {:16.10} Ha", self.ewald)?;
        write!(f, "  Total:                {:16.10} Ha", self.total())
    }
}

/// The electronic terms before the imaginary residue is discarded.
#[derive(Clone, Copy, Debug)]
pub struct RawEnergies {
    pub kinetic: Complex64,
    pub coulomb: Complex64,
    pub xc: Complex64,
    pub electron_ion: Complex64,
}

impl RawEnergies {
    /// Take real parts, failing if any imaginary part exceeds `tol * max(1, |Re|)`.
    pub fn into_real(self, tol: f64, ewald: f64) -> Result<Energies> {
        Ok(Energies {
            kinetic: real_part(EnergyTerm::Kinetic, self.kinetic, tol)?,
            coulomb: real_part(EnergyTerm::Coulomb, self.coulomb, tol)?,
            xc: real_part(EnergyTerm::ExchangeCorrelation, self.xc, tol)?,
            electron_ion: real_part(EnergyTerm::ElectronIon, self.electron_ion, tol)?,
            ewald,
        })
    }
}

fn real_part(term: EnergyTerm, value: Complex64, tol: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(DftError::NonFinite {
            field: term.name(),
            index: 0,
        });
    }
    if value.im.abs() > tol * value.re.abs().max(1.0) {
        return Err(DftError::ImaginaryResidual {
            term,
            real: value.re,
            imag: value.im,
        });
    }
    Ok(value.re)
}

/// Complex energy expressions of one SCF step.
///
/// `y` are orthonormal orbitals, `n` the real-space density, `phi` the reciprocal
/// Hartree potential, `exc` the XC energy density and `v_dual` the real-space dual of
/// the local ionic potential.
pub fn raw_energies(
    op: &PlaneWaveOperators,
    occupations: &[f64],
    y: &CMatrix,
    n: &DVector<f64>,
    phi: &CMatrix,
    exc: &DVector<f64>,
    v_dual: &CMatrix,
) -> RawEnergies {
    let n_c = complex_column(n.as_slice());
    let n_h = n_c.adjoint();

    // tr(F Y^H L Y) with F diagonal
    let yly = y.adjoint() * op.l(y);
    let kinetic = occupations
        .iter()
        .enumerate()
        .map(|(i, &f)| yly[(i, i)] * f)
        .sum::<Complex64>()
        * -0.5;

    let coulomb = (&n_h * op.j_dag(&op.o(phi)))[(0, 0)] * 0.5;
    let exc_c = complex_column(exc.as_slice());
    let xc = (&n_h * op.j_dag(&op.o(&op.j(&exc_c))))[(0, 0)];
    let electron_ion = (v_dual.adjoint() * &n_c)[(0, 0)];

    RawEnergies {
        kinetic,
        coulomb,
        xc,
        electron_ion,
    }
}

/// Energies of one SCF step, with the cached Ewald term added.
#[allow(clippy::too_many_arguments)]
pub fn total_energy(
    op: &PlaneWaveOperators,
    occupations: &[f64],
    y: &CMatrix,
    n: &DVector<f64>,
    phi: &CMatrix,
    exc: &DVector<f64>,
    v_dual: &CMatrix,
    ewald: f64,
    tol: f64,
) -> Result<Energies> {
    raw_energies(op, occupations, y, n, phi, exc, v_dual).into_real(tol, ewald)
}
