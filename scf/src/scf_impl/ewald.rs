//! Ewald summation of the ion-ion electrostatic energy of a periodic point-charge lattice.
//!
//! The conditionally convergent Coulomb sum is split with a Gaussian screening of width
//! 1/nu into a short-ranged real-space sum (erfc), a smooth reciprocal-space sum, a
//! self-interaction correction and a uniform neutralizing background term.

use crate::error::{DftError, Result};
use crate::system::AtomicSystem;
use basis::Lattice;
use itertools::iproduct;
use nalgebra::Vector3;
use rayon::prelude::*;
use std::f64::consts::PI;
use tracing::debug;

/// Cutoff policy for the Ewald sum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EwaldParams {
    /// Reciprocal-space cutoff |G| <= gcut.
    pub gcut: f64,
    /// Target magnitude of the neglected terms.
    pub gamma: f64,
}

impl Default for EwaldParams {
    fn default() -> Self {
        EwaldParams {
            gcut: 2.0,
            gamma: 1e-8,
        }
    }
}

impl EwaldParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.gcut > 0.0) || !self.gcut.is_finite() {
            return Err(DftError::InvalidParameter {
                name: "gcut",
                reason: format!("must be positive, got {}", self.gcut),
            });
        }
        if !(self.gamma > 0.0 && self.gamma < 1.0) {
            return Err(DftError::InvalidParameter {
                name: "gamma",
                reason: format!("must lie in (0, 1), got {}", self.gamma),
            });
        }
        Ok(())
    }

    /// Gaussian splitting parameter nu, chosen so exp(-gcut^2 / 4 nu^2) = gamma.
    pub fn split(&self) -> f64 {
        let gexp = -self.gamma.ln();
        0.5 * (self.gcut * self.gcut / gexp).sqrt()
    }

    /// Real-space radius beyond which erfc(nu r) drops below gamma.
    pub fn real_space_cutoff(&self) -> f64 {
        let gexp = -self.gamma.ln();
        (0.5 * gexp).sqrt() / self.split()
    }
}

/// Ion-ion energy of `system` in Hartree.
pub fn ewald_energy(system: &AtomicSystem, params: &EwaldParams) -> Result<f64> {
    params.validate()?;

    let lattice = system.lattice();
    let omega = lattice.volume();
    let nu = params.split();
    let positions = system.positions();
    let charges = system.charges();

    // pair separations are wrapped into the home cell, so the box must reach rcut past
    // any point of it along every plane normal
    let rcut = params.real_space_cutoff();
    let real_shells = [0, 1, 2].map(|k| {
        let spacing = 2.0 * PI / lattice.reciprocal_vector(k).norm();
        shell_count(rcut, lattice.vector(k).norm()).max((rcut / spacing).ceil() as i32 + 1)
    });
    let translations = index_vectors(real_shells)
        .into_iter()
        .map(|n| lattice.translation(n))
        .collect::<Vec<_>>();

    let recip_shells = [0, 1, 2].map(|k| shell_count(params.gcut, lattice.reciprocal_vector(k).norm()));
    let (gvectors, prefactors): (Vec<Vector3<f64>>, Vec<f64>) = index_vectors(recip_shells)
        .into_iter()
        .map(|n| {
            let g = lattice.reciprocal_translation(n);
            let g2 = g.norm_squared();
            (g, 2.0 * PI / omega * (-0.25 * g2 / (nu * nu)).exp() / g2)
        })
        .unzip();

    debug!(
        "Ewald: nu = {:.6}, real shells {:?} ({} vectors), reciprocal shells {:?} ({} vectors)",
        nu,
        real_shells,
        translations.len(),
        recip_shells,
        gvectors.len()
    );

    let pair_sum: f64 = (0..positions.len())
        .into_par_iter()
        .map(|i| {
            let mut sum = 0.0;
            for j in 0..positions.len() {
                let dx = lattice.wrap(&(positions[i] - positions[j]));
                let zz = charges[i] * charges[j];
                if i != j {
                    let r = dx.norm();
                    sum += 0.5 * zz * libm::erfc(nu * r) / r;
                }
                sum += 0.5 * zz * real_space_sum(&dx, &translations, nu);
                sum += zz * reciprocal_space_sum(&dx, &gvectors, &prefactors);
            }
            sum
        })
        .sum();

    Ok(pair_sum + self_energy(charges, nu) + background_energy(charges, omega, nu))
}

/// Number of lattice shells along a direction of length `step` needed to reach `cutoff`.
fn shell_count(cutoff: f64, step: f64) -> i32 {
    (cutoff / step + 1.5).round() as i32
}

/// All integer triples in the box `[-m, m]` except the origin.
fn index_vectors(m: [i32; 3]) -> Vec<[i32; 3]> {
    iproduct!(-m[0]..=m[0], -m[1]..=m[1], -m[2]..=m[2])
        .filter(|&(a, b, c)| (a, b, c) != (0, 0, 0))
        .map(|(a, b, c)| [a, b, c])
        .collect()
}

fn real_space_sum(dx: &Vector3<f64>, translations: &[Vector3<f64>], nu: f64) -> f64 {
    translations
        .iter()
        .map(|t| {
            let r = (dx + t).norm();
            libm::erfc(nu * r) / r
        })
        .sum()
}

fn reciprocal_space_sum(dx: &Vector3<f64>, gvectors: &[Vector3<f64>], prefactors: &[f64]) -> f64 {
    gvectors
        .iter()
        .zip(prefactors)
        .map(|(g, p)| p * g.dot(dx).cos())
        .sum()
}

fn self_energy(charges: &[f64], nu: f64) -> f64 {
    -nu / PI.sqrt() * charges.iter().map(|z| z * z).sum::<f64>()
}

fn background_energy(charges: &[f64], omega: f64, nu: f64) -> f64 {
    let total: f64 = charges.iter().sum();
    -PI * total * total / (2.0 * omega * nu * nu)
}

/// Madelung-type energy of a single unit charge in `lattice`, mostly useful in tests.
pub fn single_charge_energy(lattice: &Lattice, params: &EwaldParams) -> Result<f64> {
    let system = AtomicSystem::new(
        lattice.clone(),
        vec![Vector3::zeros()],
        vec![1.0],
        1.0,
        [1, 1, 1],
        vec![1.0],
    )?;
    ewald_energy(&system, params)
}
