//! Plane-wave Kohn-Sham SCF session.
//!
//! A session owns the operators for one `AtomicSystem`, the real-space dual of the local
//! ionic potential and the cached Ewald energy. Each `step` rebuilds the orthonormal
//! orbitals, density, Hartree potential and XC fields from a coefficient matrix `W` and
//! overwrites the previous step's fields.

use super::energy::{total_energy, Energies, IMAG_TOLERANCE};
use super::ewald::{ewald_energy, EwaldParams};
use super::orth::{orth, overlap, OverlapEigen};
use super::xc::{lda_xc, SLATER_ALPHA};
use super::SCF;
use crate::error::{DftError, Result};
use crate::potential::coulomb_potential;
use crate::system::AtomicSystem;
use basis::{complex_column, CMatrix, PlaneWaveOperators};
use nalgebra::{DVector, SymmetricEigen};
use num_complex::Complex64;
use rand::Rng;
use rand_distr::StandardNormal;
use std::f64::consts::PI;
use tracing::{debug, info};

/// Numerical settings of a session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScfParams {
    /// Slater exchange scaling.
    pub xc_alpha: f64,
    /// Allowed relative imaginary residue of the energy terms.
    pub imag_tolerance: f64,
    pub ewald: EwaldParams,
}

impl Default for ScfParams {
    fn default() -> Self {
        ScfParams {
            xc_alpha: SLATER_ALPHA,
            imag_tolerance: IMAG_TOLERANCE,
            ewald: EwaldParams::default(),
        }
    }
}

impl ScfParams {
    fn validate(&self) -> Result<()> {
        if !(self.xc_alpha > 0.0) || !self.xc_alpha.is_finite() {
            return Err(DftError::InvalidParameter {
                name: "xc_alpha",
                reason: format!("must be positive, got {}", self.xc_alpha),
            });
        }
        if !(self.imag_tolerance > 0.0) {
            return Err(DftError::InvalidParameter {
                name: "imag_tolerance",
                reason: format!("must be positive, got {}", self.imag_tolerance),
            });
        }
        self.ewald.validate()
    }
}

/// Fields produced by the latest step.
#[derive(Clone, Debug)]
pub struct StepFields {
    /// Orthonormal orbitals, `|basis| x Ns`.
    pub y: CMatrix,
    /// Real-space electron density.
    pub n: DVector<f64>,
    /// Hartree potential on the reciprocal grid.
    pub phi: CMatrix,
    pub exc: DVector<f64>,
    pub vxc: DVector<f64>,
    pub energies: Energies,
}

pub struct PlaneWaveSCF {
    system: AtomicSystem,
    op: PlaneWaveOperators,
    params: ScfParams,
    v_dual: CMatrix,
    ewald: f64,
    // None until the first step
    state: Option<StepFields>,
}

impl PlaneWaveSCF {
    /// Session with a caller-supplied local potential on the full reciprocal grid.
    pub fn new(system: AtomicSystem, v_local: CMatrix, params: ScfParams) -> Result<Self> {
        params.validate()?;
        let op = PlaneWaveOperators::new(system.lattice(), system.grid_shape(), system.ecut());

        if v_local.nrows() != op.n_grid() || v_local.ncols() != 1 {
            return Err(DftError::InvalidParameter {
                name: "v_local",
                reason: format!(
                    "expected a {}x1 reciprocal grid column, got {}x{}",
                    op.n_grid(),
                    v_local.nrows(),
                    v_local.ncols()
                ),
            });
        }
        if op.n_basis() < system.n_states() {
            return Err(DftError::InvalidSystem(format!(
                "{} plane waves cannot hold {} orthonormal states",
                op.n_basis(),
                system.n_states()
            )));
        }

        let v_dual = op.j_dag(&op.o(&v_local));
        let ewald = ewald_energy(&system, &params.ewald)?;
        if !ewald.is_finite() {
            return Err(DftError::NonFinite {
                field: "Ewald energy",
                index: 0,
            });
        }

        info!("Plane-wave SCF session");
        info!("  Cell volume:   {:.6} bohr^3", op.omega());
        info!("  Grid shape:    {:?} ({} points)", system.grid_shape(), op.n_grid());
        info!("  Basis size:    {} (ecut = {} Ha)", op.n_basis(), system.ecut());
        info!("  States:        {} ({} electrons)", system.n_states(), system.n_electrons());
        info!("  Ewald energy:  {:.10} Ha", ewald);

        Ok(PlaneWaveSCF {
            system,
            op,
            params,
            v_dual,
            ewald,
            state: None,
        })
    }

    /// Session using the bare Coulomb potential of the nuclei.
    pub fn with_coulomb_potential(system: AtomicSystem, params: ScfParams) -> Result<Self> {
        let op = PlaneWaveOperators::new(system.lattice(), system.grid_shape(), system.ecut());
        let v_local = coulomb_potential(&system, &op);
        Self::new(system, v_local, params)
    }

    pub fn system(&self) -> &AtomicSystem {
        &self.system
    }

    pub fn operators(&self) -> &PlaneWaveOperators {
        &self.op
    }

    pub fn params(&self) -> &ScfParams {
        &self.params
    }

    /// Cached ion-ion energy.
    pub fn ewald_energy(&self) -> f64 {
        self.ewald
    }

    /// Real-space dual of the local potential, `Jdag(O(V))`.
    pub fn v_dual(&self) -> &CMatrix {
        &self.v_dual
    }

    /// Fields of the latest step, `None` before the first one.
    pub fn fields(&self) -> Option<&StepFields> {
        self.state.as_ref()
    }

    pub fn energies(&self) -> Option<Energies> {
        self.state.as_ref().map(|s| s.energies)
    }

    /// One SCF evaluation at `w`; `w` itself is left untouched.
    pub fn step(&mut self, w: &CMatrix) -> Result<Energies> {
        self.check_coefficients(w)?;

        let y = orth(&self.op, w)?;
        let n = self.density(&y);
        check_finite("density", n.iter().map(|v| v.is_finite()))?;

        let xc = lda_xc(n.as_slice(), self.params.xc_alpha)?;
        let phi = self.solve_poisson(&n);
        check_finite("potential", phi.iter().map(|c| c.is_finite()))?;

        let energies = total_energy(
            &self.op,
            self.system.occupations(),
            &y,
            &n,
            &phi,
            &xc.exc,
            &self.v_dual,
            self.ewald,
            self.params.imag_tolerance,
        )?;
        if !energies.total().is_finite() {
            return Err(DftError::NonFinite {
                field: "total energy",
                index: 0,
            });
        }
        debug!("SCF step: Etot = {:.12} Ha", energies.total());

        self.state = Some(StepFields {
            y,
            n,
            phi,
            exc: xc.exc,
            vxc: xc.vxc,
            energies,
        });
        Ok(energies)
    }

    /// `n = sum_i f_i |I(Y)_i|^2` on the real-space grid.
    pub fn density(&self, y: &CMatrix) -> DVector<f64> {
        let iy = self.op.i(y);
        let f = self.system.occupations();
        DVector::from_fn(iy.nrows(), |r, _| {
            f.iter()
                .enumerate()
                .map(|(j, &fj)| fj * iy[(r, j)].norm_sqr())
                .sum::<f64>()
        })
    }

    /// Hartree potential `phi = -4 pi Linv(O(J(n)))` on the reciprocal grid.
    pub fn solve_poisson(&self, n: &DVector<f64>) -> CMatrix {
        let op = &self.op;
        op.l_inv(&op.o(&op.j(&complex_column(n.as_slice())))) * Complex64::new(-4.0 * PI, 0.0)
    }

    /// Kohn-Sham operator applied to `w`, using the potentials of the latest step.
    pub fn hamiltonian(&self, w: &CMatrix) -> Result<CMatrix> {
        let state = self.state.as_ref().ok_or(DftError::NotStepped)?;
        Ok(self.apply_hamiltonian(state, w))
    }

    fn apply_hamiltonian(&self, state: &StepFields, w: &CMatrix) -> CMatrix {
        let op = &self.op;
        let veff = &self.v_dual
            + op.j_dag(&op.o(&state.phi))
            + op.j_dag(&op.o(&op.j(&complex_column(state.vxc.as_slice()))));

        let mut iw = op.i(w);
        for mut column in iw.column_iter_mut() {
            column.component_mul_assign(&veff.column(0));
        }
        op.l(w) * Complex64::new(-0.5, 0.0) + op.i_dag(&iw)
    }

    /// Gradient of the total energy with respect to the non-orthogonal `w`.
    pub fn energy_gradient(&self, w: &CMatrix) -> Result<CMatrix> {
        let state = self.state.as_ref().ok_or(DftError::NotStepped)?;
        self.check_coefficients(w)?;
        let op = &self.op;

        let hw = self.apply_hamiltonian(state, w);
        let eig = OverlapEigen::new(&overlap(op, w))?;
        let u12 = eig.inverse_sqrt();
        let u_inv = eig.inverse();
        let ow = op.o(w);
        let whw = w.adjoint() * &hw;
        let ht = &u12 * &whw * &u12;
        let f = self.occupation_matrix();

        let projected = (&hw - &ow * (&u_inv * &whw)) * (&u12 * &f * &u12);
        let commutator = &ht * &f - &f * &ht;
        Ok(projected + &ow * (&u12 * eig.q_operator(&commutator)))
    }

    /// Eigenvalues of the subspace Hamiltonian `Y^H H(Y)`, ascending.
    pub fn orbital_energies(&self, w: &CMatrix) -> Result<DVector<f64>> {
        let state = self.state.as_ref().ok_or(DftError::NotStepped)?;
        let y = orth(&self.op, w)?;
        let hy = self.apply_hamiltonian(state, &y);
        let sub = y.adjoint() * hy;
        let sub = (&sub + sub.adjoint()) * Complex64::new(0.5, 0.0);

        let mut values: Vec<f64> = SymmetricEigen::new(sub).eigenvalues.iter().copied().collect();
        values.sort_by(|a, b| a.total_cmp(b));
        Ok(DVector::from_vec(values))
    }

    /// `Omega / N * sum(n)` for the latest density.
    pub fn electron_count(&self) -> Result<f64> {
        let state = self.state.as_ref().ok_or(DftError::NotStepped)?;
        Ok(self.op.omega() / self.op.n_grid() as f64 * state.n.sum())
    }

    /// Start coefficients with standard-normal real parts.
    pub fn random_coefficients<R: Rng>(&self, rng: &mut R) -> CMatrix {
        CMatrix::from_fn(self.op.n_basis(), self.system.n_states(), |_, _| {
            Complex64::new(rng.sample(StandardNormal), 0.0)
        })
    }

    fn occupation_matrix(&self) -> CMatrix {
        let f = self.system.occupations();
        CMatrix::from_fn(f.len(), f.len(), |i, j| {
            if i == j {
                Complex64::new(f[i], 0.0)
            } else {
                Complex64::default()
            }
        })
    }

    fn check_coefficients(&self, w: &CMatrix) -> Result<()> {
        if w.nrows() != self.op.n_basis() || w.ncols() != self.system.n_states() {
            return Err(DftError::InvalidParameter {
                name: "W",
                reason: format!(
                    "expected {}x{} coefficients, got {}x{}",
                    self.op.n_basis(),
                    self.system.n_states(),
                    w.nrows(),
                    w.ncols()
                ),
            });
        }
        check_finite("coefficients", w.iter().map(|c| c.is_finite()))
    }
}

fn check_finite(field: &'static str, mut finite: impl Iterator<Item = bool>) -> Result<()> {
    match finite.position(|ok| !ok) {
        Some(index) => Err(DftError::NonFinite { field, index }),
        None => Ok(()),
    }
}

impl SCF for PlaneWaveSCF {
    fn n_basis(&self) -> usize {
        self.op.n_basis()
    }

    fn n_states(&self) -> usize {
        self.system.n_states()
    }

    fn scf_step(&mut self, w: &CMatrix) -> Result<f64> {
        self.step(w).map(|e| e.total())
    }

    fn energy_gradient(&self, w: &CMatrix) -> Result<CMatrix> {
        PlaneWaveSCF::energy_gradient(self, w)
    }
}
