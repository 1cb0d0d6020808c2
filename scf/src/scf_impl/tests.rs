//! Tests for the plane-wave SCF session

use super::energy::raw_energies;
use super::orth::overlap;
use super::{PlaneWaveSCF, ScfParams, SCF};
use crate::error::DftError;
use crate::optim_impl::{MinimizationOutcome, MinimizerParams, SteepestDescent, StopReason};
use crate::system::AtomicSystem;
use basis::{CMatrix, Lattice};
use nalgebra::Vector3;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Hydrogen at the origin of a 6 bohr cube, ecut 5 Ha, 12^3 grid.
fn toy_hydrogen() -> PlaneWaveSCF {
    let system = AtomicSystem::new(
        Lattice::cubic(6.0).unwrap(),
        vec![Vector3::zeros()],
        vec![1.0],
        5.0,
        [12, 12, 12],
        vec![1.0],
    )
    .unwrap();
    PlaneWaveSCF::with_coulomb_potential(system, ScfParams::default()).unwrap()
}

/// Two unequally occupied states on a coarse grid.
fn two_state_system() -> PlaneWaveSCF {
    let system = AtomicSystem::new(
        Lattice::cubic(6.0).unwrap(),
        vec![Vector3::zeros()],
        vec![1.0],
        3.0,
        [8, 8, 8],
        vec![1.2, 0.8],
    )
    .unwrap();
    PlaneWaveSCF::with_coulomb_potential(system, ScfParams::default()).unwrap()
}

/// `W_G = scale * exp(-|G|^2 / 2)`.
fn gaussian_start(scf: &PlaneWaveSCF, scale: f64) -> CMatrix {
    let g2 = scf.operators().basis().g2();
    CMatrix::from_fn(g2.len(), 1, |i, _| Complex64::new(scale * (-0.5 * g2[i]).exp(), 0.0))
}

fn random_complex(rows: usize, cols: usize, seed: u64) -> CMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    CMatrix::from_fn(rows, cols, |_, _| {
        let re: f64 = rng.sample(StandardNormal);
        let im: f64 = rng.sample(StandardNormal);
        Complex64::new(re, im)
    })
}

fn directional_derivative(scf: &mut PlaneWaveSCF, w: &CMatrix, d: &CMatrix, h: f64) -> f64 {
    let step = Complex64::new(h, 0.0);
    let plus = scf.scf_step(&(w + d * step)).unwrap();
    let minus = scf.scf_step(&(w - d * step)).unwrap();
    (plus - minus) / (2.0 * h)
}

#[test]
fn test_toy_basis_size() {
    let scf = toy_hydrogen();
    assert_eq!(scf.n_basis(), 123);
    assert_eq!(scf.n_states(), 1);
    assert!((scf.ewald_energy() + 0.2364414566233853).abs() < 1e-9);
}

#[test]
fn test_initial_energy_breakdown() {
    let mut scf = toy_hydrogen();
    let energies = scf.step(&gaussian_start(&scf, 0.05)).unwrap();

    assert!((energies.kinetic - 0.7460584150424088).abs() < 1e-8, "{}", energies.kinetic);
    assert!((energies.coulomb - 0.1757947249405929).abs() < 1e-8, "{}", energies.coulomb);
    assert!((energies.xc + 0.3170461929129066).abs() < 1e-8, "{}", energies.xc);
    assert!(
        (energies.electron_ion + 0.6631665643724795).abs() < 1e-8,
        "{}",
        energies.electron_ion
    );
    assert!((energies.total() + 0.2948010739257697).abs() < 1e-8);
}

#[test]
fn test_energy_independent_of_w_scale() {
    let mut scf = toy_hydrogen();
    let small = scf.scf_step(&gaussian_start(&scf, 0.05)).unwrap();
    let large = scf.scf_step(&gaussian_start(&scf, 3.0)).unwrap();
    assert!((small - large).abs() < 1e-10);
}

#[test]
fn test_density_normalization() {
    let mut scf = toy_hydrogen();
    scf.step(&gaussian_start(&scf, 1.0)).unwrap();
    assert!((scf.electron_count().unwrap() - 1.0).abs() < 1e-10);

    let mut scf = two_state_system();
    let w = random_complex(scf.n_basis(), 2, 21);
    scf.step(&w).unwrap();
    assert!((scf.electron_count().unwrap() - 2.0).abs() < 1e-10);
    assert!(scf.fields().unwrap().n.iter().all(|&v| v > 0.0));
}

#[test]
fn test_orbitals_orthonormal_after_step() {
    let mut scf = two_state_system();
    let w = random_complex(scf.n_basis(), 2, 22);
    scf.step(&w).unwrap();
    let y = &scf.fields().unwrap().y;
    let u = overlap(scf.operators(), y);
    assert!((u - CMatrix::identity(2, 2)).norm() < 1e-10);
}

#[test]
fn test_energies_are_real() {
    let mut scf = two_state_system();
    let w = random_complex(scf.n_basis(), 2, 23);
    scf.step(&w).unwrap();
    let fields = scf.fields().unwrap();
    let raw = raw_energies(
        scf.operators(),
        scf.system().occupations(),
        &fields.y,
        &fields.n,
        &fields.phi,
        &fields.exc,
        scf.v_dual(),
    );
    for value in [raw.kinetic, raw.coulomb, raw.xc, raw.electron_ion] {
        assert!(value.im.abs() < 1e-8, "imaginary residue {}", value.im);
    }
}

#[test]
fn test_gradient_requires_step() {
    let scf = toy_hydrogen();
    let w = gaussian_start(&scf, 1.0);
    assert!(matches!(scf.energy_gradient(&w), Err(DftError::NotStepped)));
    assert!(matches!(scf.electron_count(), Err(DftError::NotStepped)));
    assert!(scf.energies().is_none());
}

#[test]
fn test_wrong_coefficient_shape_rejected() {
    let mut scf = toy_hydrogen();
    let w = CMatrix::from_element(scf.n_basis(), 2, Complex64::new(1.0, 0.0));
    assert!(matches!(scf.step(&w), Err(DftError::InvalidParameter { name: "W", .. })));

    let mut w = gaussian_start(&scf, 1.0);
    w[(3, 0)] = Complex64::new(f64::NAN, 0.0);
    assert!(matches!(scf.step(&w), Err(DftError::NonFinite { index: 3, .. })));
}

#[test]
fn test_overflowing_energy_is_fatal() {
    let system = AtomicSystem::new(
        Lattice::cubic(6.0).unwrap(),
        vec![Vector3::zeros()],
        vec![1.0],
        5.0,
        [12, 12, 12],
        vec![1.0],
    )
    .unwrap();
    let params = ScfParams {
        xc_alpha: 1e308,
        ..ScfParams::default()
    };
    let mut scf = PlaneWaveSCF::with_coulomb_potential(system, params).unwrap();
    let w = gaussian_start(&scf, 1.0);
    assert!(matches!(scf.step(&w), Err(DftError::NonFinite { .. })));
    assert!(scf.energies().is_none());
}

#[test]
fn test_non_finite_ewald_energy_rejected() {
    let system = AtomicSystem::new(
        Lattice::cubic(6.0).unwrap(),
        vec![Vector3::zeros()],
        vec![1e200],
        5.0,
        [12, 12, 12],
        vec![1.0],
    )
    .unwrap();
    let result = PlaneWaveSCF::with_coulomb_potential(system, ScfParams::default());
    assert!(matches!(
        result,
        Err(DftError::NonFinite { field: "Ewald energy", .. })
    ));
}

#[test]
fn test_gradient_matches_finite_difference() {
    let mut scf = toy_hydrogen();
    let w = gaussian_start(&scf, 0.05);
    scf.step(&w).unwrap();
    let g = scf.energy_gradient(&w).unwrap();

    let g2 = scf.operators().basis().g2();
    let mut rng = StdRng::seed_from_u64(31);
    let d = CMatrix::from_fn(g2.len(), 1, |i, _| {
        let x: f64 = rng.sample(StandardNormal);
        Complex64::new(0.01 * x * (-0.25 * g2[i]).exp(), 0.0)
    });

    let analytic = 2.0 * (g.adjoint() * &d).trace().re;
    let numeric = directional_derivative(&mut scf, &w, &d, 1e-4);
    assert!(
        (numeric - analytic).abs() < 1e-5 * analytic.abs(),
        "{} vs {}",
        numeric,
        analytic
    );
}

#[test]
fn test_gradient_with_unequal_occupations() {
    let mut scf = two_state_system();
    let w = random_complex(scf.n_basis(), 2, 41);
    let d = random_complex(scf.n_basis(), 2, 42);
    scf.step(&w).unwrap();
    let g = scf.energy_gradient(&w).unwrap();

    let analytic = 2.0 * (g.adjoint() * &d).trace().re;
    let numeric = directional_derivative(&mut scf, &w, &d, 1e-5);
    assert!(
        (numeric - analytic).abs() < 1e-5 * analytic.abs(),
        "{} vs {}",
        numeric,
        analytic
    );
}

#[test]
fn test_orbital_energies_sorted() {
    let mut scf = two_state_system();
    let w = random_complex(scf.n_basis(), 2, 51);
    scf.step(&w).unwrap();
    let eps = scf.orbital_energies(&w).unwrap();
    assert_eq!(eps.len(), 2);
    assert!(eps[0] <= eps[1]);
    assert!(eps.iter().all(|e| e.is_finite()));
}

#[test]
fn test_random_coefficients_are_seeded() {
    let scf = two_state_system();
    let a = scf.random_coefficients(&mut StdRng::seed_from_u64(1234));
    let b = scf.random_coefficients(&mut StdRng::seed_from_u64(1234));
    assert_eq!(a, b);
    assert_eq!(a.shape(), (scf.n_basis(), 2));
    assert!(a.iter().all(|c| c.im == 0.0));
}

#[test]
fn test_toy_minimization_converges() {
    let mut scf = toy_hydrogen();
    let params = MinimizerParams {
        max_iterations: 5,
        step_size: 1e-5,
        energy_tolerance: 1e-6,
    };
    let w0 = gaussian_start(&scf, 1.0);
    let outcome = SteepestDescent::new(params).run(&mut scf, w0).unwrap();

    match outcome {
        MinimizationOutcome::Converged {
            energy,
            iterations,
            history,
            ..
        } => {
            assert_eq!(iterations, 3);
            assert_eq!(history.len(), 3);
            let expected = [
                -0.2948010739257697,
                -0.2948015128847665,
                -0.29480195184139124,
            ];
            for (got, want) in history.iter().zip(expected) {
                assert!((got - want).abs() < 1e-8, "{} vs {}", got, want);
            }
            assert_eq!(energy, history[2]);
        }
        other => panic!("expected convergence, got {:?}", other.history()),
    }
}

#[test]
fn test_toy_minimization_budget_exhausted() {
    let mut scf = toy_hydrogen();
    let params = MinimizerParams {
        max_iterations: 50,
        step_size: 1e-5,
        energy_tolerance: 1e-6,
    };
    let w0 = gaussian_start(&scf, 0.05);
    let outcome = SteepestDescent::new(params).run(&mut scf, w0).unwrap();

    assert!(!outcome.is_converged());
    match &outcome {
        MinimizationOutcome::NotConverged { reason, history, .. } => {
            assert_eq!(*reason, StopReason::IterationBudget);
            assert_eq!(history.len(), 50);
            assert!((history[0] + 0.29480107392576993).abs() < 1e-8);
            assert!((history[1] + 0.2949765634233795).abs() < 1e-8);
            assert!((history[49] + 0.30299159989837166).abs() < 1e-7);
            assert!(history.windows(2).all(|pair| pair[1] < pair[0]));
        }
        MinimizationOutcome::Converged { .. } => unreachable!(),
    }
    assert!(matches!(
        outcome.into_converged(),
        Err(DftError::NotConverged { iterations: 50, .. })
    ));
}

#[test]
fn test_zero_tolerance_never_converges() {
    let mut scf = toy_hydrogen();
    let params = MinimizerParams {
        max_iterations: 2,
        step_size: 1e-5,
        energy_tolerance: 0.0,
    };
    let w0 = gaussian_start(&scf, 1.0);
    let outcome = SteepestDescent::new(params).run(&mut scf, w0).unwrap();
    assert!(!outcome.is_converged());
    assert_eq!(outcome.history().len(), 2);
}
