use crate::config::{Args, Config};
use crate::optim_impl::{MinimizationOutcome, MinimizerParams, SteepestDescent};
use crate::scf_impl::{PlaneWaveSCF, ScfParams};
use crate::system::AtomicSystem;
use color_eyre::eyre::{Result, WrapErr};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

/// Minimizer settings after command-line overrides
#[derive(Clone, Copy, Debug)]
pub struct RunSettings {
    pub params: MinimizerParams,
    pub seed: u64,
}

pub fn resolve_minimizer(args: &Args, config: &Config) -> RunSettings {
    let section = config.minimizer();
    let defaults = MinimizerParams::default();

    let params = MinimizerParams {
        max_iterations: args
            .max_iterations
            .or(section.max_iterations)
            .unwrap_or(defaults.max_iterations),
        step_size: args
            .step_size
            .or(section.step_size)
            .unwrap_or(defaults.step_size),
        energy_tolerance: args
            .energy_tolerance
            .or(section.energy_tolerance)
            .unwrap_or(defaults.energy_tolerance),
    };
    let seed = args.seed.or(section.seed).unwrap_or(1234);
    RunSettings { params, seed }
}

/// Set up the session, draw seeded start coefficients and minimize.
pub fn run_minimization(
    system: AtomicSystem,
    settings: &RunSettings,
    scf_params: ScfParams,
) -> Result<(PlaneWaveSCF, MinimizationOutcome)> {
    let mut scf = PlaneWaveSCF::with_coulomb_potential(system, scf_params)
        .wrap_err("Failed to set up the SCF session")?;

    info!("Drawing initial coefficients with seed {}", settings.seed);
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let initial_w = scf.random_coefficients(&mut rng);

    let outcome = SteepestDescent::new(settings.params)
        .run(&mut scf, initial_w)
        .wrap_err("Minimization aborted")?;
    Ok((scf, outcome))
}
