mod geometry;
mod report;
mod runner;

pub use geometry::build_system;
pub use report::report_summary;
pub use runner::{resolve_minimizer, run_minimization, RunSettings};

use crate::config::{Args, Config};
use crate::io::setup_output;
use crate::optim_impl::MinimizationOutcome;
use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use std::fs;
use tracing::{info, warn};

pub struct ScfApplication {
    args: Args,
    config: Config,
}

impl ScfApplication {
    pub fn from_cli() -> Result<Self> {
        let args = Args::parse();
        let config = load_config(&args.config_file)?;
        Ok(Self { args, config })
    }

    pub fn new(args: Args, config: Config) -> Self {
        Self { args, config }
    }

    pub fn run(self) -> Result<()> {
        setup_output(self.args.output.as_ref());
        info!("Configuration loaded from {}", self.args.config_file);

        let system = build_system(&self.config)?;
        let settings = resolve_minimizer(&self.args, &self.config);
        let (scf, outcome) = run_minimization(system, &settings, self.config.scf_params())?;
        report_summary(&scf, &outcome, self.args.output.as_deref())?;

        match outcome {
            MinimizationOutcome::Converged { energy, .. } => {
                info!("Final total energy: {:.10} Ha", energy);
                Ok(())
            }
            MinimizationOutcome::NotConverged {
                reason, history, ..
            } => {
                warn!("Minimization stopped without converging ({:?})", reason);
                Err(eyre!(
                    "minimization did not converge within {} iterations (last energy {:?})",
                    history.len(),
                    history.last()
                ))
            }
        }
    }
}

/// Read and parse a YAML configuration file, filling in defaults
pub fn load_config(path: &str) -> Result<Config> {
    let config_content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", path))?;

    let config = serde_yml::from_str::<Config>(&config_content)
        .wrap_err("Failed to parse configuration file")?
        .with_defaults();

    Ok(config)
}
