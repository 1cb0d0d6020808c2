//! Output formatting and logging utilities

use crate::optim_impl::MinimizationOutcome;
use crate::scf_impl::Energies;
use color_eyre::eyre::Result;
use nalgebra::DVector;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::time::SystemTime as StdSystemTime;
use tracing::info;
use tracing_subscriber::{
    fmt::format::Writer, fmt::layer, fmt::time::FormatTime, layer::SubscriberExt,
    util::SubscriberInitExt, Registry,
};

/// Wall-clock time formatter with second precision
struct SecondPrecisionTimer;

impl FormatTime for SecondPrecisionTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let total_seconds = StdSystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        write!(
            w,
            "{:02}:{:02}:{:02}",
            (total_seconds / 3600) % 24,
            (total_seconds / 60) % 60,
            total_seconds % 60
        )
    }
}

/// Route log output to a file or stdout
pub fn setup_output(output_path: Option<&String>) {
    match output_path {
        Some(path) => match File::create(path) {
            Ok(log) => {
                let file_layer = layer()
                    .with_writer(log)
                    .with_timer(SecondPrecisionTimer)
                    .with_ansi(false);
                Registry::default().with(file_layer).init();
                info!("Output will be written to: {}", path);
            }
            Err(err) => eprintln!("Could not create output file {}: {}", path, err),
        },
        None => {
            let stdout_layer = layer()
                .with_writer(std::io::stdout)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(true);
            Registry::default().with(stdout_layer).init();
            info!("Output will be printed to stdout");
        }
    }
}

/// Write the final energies and convergence record of a run
pub fn write_summary<W: Write>(
    writer: &mut W,
    outcome: &MinimizationOutcome,
    energies: &Energies,
    orbital_energies: &DVector<f64>,
    electron_count: f64,
) -> Result<()> {
    let status = match outcome {
        MinimizationOutcome::Converged { iterations, .. } => {
            format!("converged after {} iterations", iterations)
        }
        MinimizationOutcome::NotConverged { reason, history, .. } => {
            format!("not converged ({:?}) after {} iterations", reason, history.len())
        }
    };
    writeln!(writer, "Status: {}", status)?;
    writeln!(writer, "Energies:")?;
    writeln!(writer, "{}", energies)?;
    writeln!(writer, "Orbital energies:")?;
    for (i, eps) in orbital_energies.iter().enumerate() {
        writeln!(writer, "  State {}: {:.8} Ha", i + 1, eps)?;
    }
    writeln!(writer, "Electron count: {:.10}", electron_count)?;
    Ok(())
}
