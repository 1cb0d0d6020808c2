//! Immutable description of the periodic system being solved.

use crate::error::{DftError, Result};
use basis::Lattice;
use nalgebra::Vector3;

/// Closest allowed distance between two nuclei or their periodic images, in bohr.
pub const MIN_SEPARATION: f64 = 1e-6;

/// Nuclei, cell, basis cutoff and orbital occupations of one calculation.
#[derive(Clone, Debug)]
pub struct AtomicSystem {
    lattice: Lattice,
    positions: Vec<Vector3<f64>>,
    charges: Vec<f64>,
    ecut: f64,
    grid_shape: [usize; 3],
    occupations: Vec<f64>,
}

impl AtomicSystem {
    pub fn new(
        lattice: Lattice,
        positions: Vec<Vector3<f64>>,
        charges: Vec<f64>,
        ecut: f64,
        grid_shape: [usize; 3],
        occupations: Vec<f64>,
    ) -> Result<Self> {
        if positions.is_empty() {
            return Err(DftError::InvalidSystem("no atoms given".into()));
        }
        if positions.len() != charges.len() {
            return Err(DftError::InvalidSystem(format!(
                "{} positions but {} charges",
                positions.len(),
                charges.len()
            )));
        }
        if let Some(i) = positions.iter().position(|x| !x.iter().all(|c| c.is_finite())) {
            return Err(DftError::InvalidSystem(format!(
                "atom {} has a non-finite coordinate",
                i
            )));
        }
        if let Some(z) = charges.iter().find(|z| !z.is_finite()) {
            return Err(DftError::InvalidSystem(format!("non-finite charge {}", z)));
        }
        for i in 0..positions.len() {
            for j in 0..i {
                let separation = lattice.wrap(&(positions[i] - positions[j])).norm();
                if separation < MIN_SEPARATION {
                    return Err(DftError::InvalidSystem(format!(
                        "atoms {} and {} coincide up to a lattice vector (separation {:e} bohr)",
                        j, i, separation
                    )));
                }
            }
        }
        if !(ecut > 0.0) || !ecut.is_finite() {
            return Err(DftError::InvalidSystem(format!(
                "cutoff must be positive, got {}",
                ecut
            )));
        }
        if grid_shape.iter().any(|&s| s == 0) {
            return Err(DftError::InvalidSystem(format!(
                "grid shape {:?} has an empty axis",
                grid_shape
            )));
        }
        if occupations.is_empty() {
            return Err(DftError::InvalidSystem("no occupied orbitals".into()));
        }
        if let Some(f) = occupations.iter().find(|f| !(**f >= 0.0) || !f.is_finite()) {
            return Err(DftError::InvalidSystem(format!(
                "occupation {} is not a non-negative number",
                f
            )));
        }

        Ok(AtomicSystem {
            lattice,
            positions,
            charges,
            ecut,
            grid_shape,
            occupations,
        })
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Cartesian atomic positions X (bohr).
    pub fn positions(&self) -> &[Vector3<f64>] {
        &self.positions
    }

    /// Ionic charges Z.
    pub fn charges(&self) -> &[f64] {
        &self.charges
    }

    pub fn n_atoms(&self) -> usize {
        self.positions.len()
    }

    /// Cell volume Omega.
    pub fn volume(&self) -> f64 {
        self.lattice.volume()
    }

    /// Kinetic energy cutoff in Hartree.
    pub fn ecut(&self) -> f64 {
        self.ecut
    }

    pub fn grid_shape(&self) -> [usize; 3] {
        self.grid_shape
    }

    /// Occupation numbers f, one per orbital.
    pub fn occupations(&self) -> &[f64] {
        &self.occupations
    }

    /// Number of orbitals Ns.
    pub fn n_states(&self) -> usize {
        self.occupations.len()
    }

    pub fn n_electrons(&self) -> f64 {
        self.occupations.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell() -> Lattice {
        Lattice::cubic(6.0).unwrap()
    }

    #[test]
    fn test_valid_system() {
        let system = AtomicSystem::new(
            cell(),
            vec![Vector3::zeros(), Vector3::new(1.4, 0.0, 0.0)],
            vec![1.0, 1.0],
            5.0,
            [12, 12, 12],
            vec![2.0],
        )
        .unwrap();
        assert_eq!(system.n_atoms(), 2);
        assert_eq!(system.n_states(), 1);
        assert_eq!(system.n_electrons(), 2.0);
        assert!((system.volume() - 216.0).abs() < 1e-12);
    }

    #[test]
    fn test_mismatched_charges_rejected() {
        let err = AtomicSystem::new(
            cell(),
            vec![Vector3::zeros()],
            vec![1.0, 1.0],
            5.0,
            [8, 8, 8],
            vec![1.0],
        );
        assert!(matches!(err, Err(DftError::InvalidSystem(_))));
    }

    #[test]
    fn test_coincident_atoms_rejected() {
        let build = |second: Vector3<f64>| {
            AtomicSystem::new(
                cell(),
                vec![Vector3::zeros(), second],
                vec![1.0, 1.0],
                5.0,
                [8, 8, 8],
                vec![2.0],
            )
        };
        assert!(matches!(build(Vector3::zeros()), Err(DftError::InvalidSystem(_))));
        // periodic image of the first atom
        assert!(matches!(build(Vector3::new(6.0, 0.0, 0.0)), Err(DftError::InvalidSystem(_))));
        assert!(matches!(build(Vector3::new(-6.0, 12.0, 6.0)), Err(DftError::InvalidSystem(_))));
        assert!(build(Vector3::new(3.0, 0.0, 0.0)).is_ok());
    }

    #[test]
    fn test_bad_cutoff_and_occupations_rejected() {
        let build = |ecut: f64, occ: Vec<f64>, shape: [usize; 3]| {
            AtomicSystem::new(cell(), vec![Vector3::zeros()], vec![1.0], ecut, shape, occ)
        };
        assert!(build(0.0, vec![1.0], [8, 8, 8]).is_err());
        assert!(build(f64::NAN, vec![1.0], [8, 8, 8]).is_err());
        assert!(build(5.0, vec![], [8, 8, 8]).is_err());
        assert!(build(5.0, vec![-1.0], [8, 8, 8]).is_err());
        assert!(build(5.0, vec![1.0], [8, 0, 8]).is_err());
        assert!(build(5.0, vec![1.0], [8, 8, 8]).is_ok());
    }
}
