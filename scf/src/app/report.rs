use crate::io::write_summary;
use crate::optim_impl::MinimizationOutcome;
use crate::scf_impl::PlaneWaveSCF;
use color_eyre::eyre::{eyre, Result, WrapErr};
use std::fs::OpenOptions;
use tracing::info;

/// Log the final state and write the summary, appended to `output` when given and to
/// stdout otherwise.
pub fn report_summary(
    scf: &PlaneWaveSCF,
    outcome: &MinimizationOutcome,
    output: Option<&str>,
) -> Result<()> {
    info!("\nMinimization finished.");
    let energies = scf
        .energies()
        .ok_or_else(|| eyre!("No SCF step was taken"))?;
    let orbital_energies = scf.orbital_energies(outcome.coefficients())?;
    let electron_count = scf.electron_count()?;

    info!("\nEnergy breakdown:\n{}", energies);
    info!("\nOrbital energies:");
    for (i, eps) in orbital_energies.iter().enumerate() {
        info!("  State {}: {:.8} Ha", i + 1, eps);
    }
    info!("Electron count: {:.10}", electron_count);

    match output {
        Some(path) => {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .wrap_err_with(|| format!("Unable to open output file: {}", path))?;
            write_summary(&mut file, outcome, &energies, &orbital_energies, electron_count)
        }
        None => write_summary(
            &mut std::io::stdout().lock(),
            outcome,
            &energies,
            &orbital_energies,
            electron_count,
        ),
    }
}
