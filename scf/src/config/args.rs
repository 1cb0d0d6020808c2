//! Command-line argument parsing for plane-wave DFT calculations

use clap::Parser;

/// Plane-wave LDA total-energy minimization with YAML configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config_file: String,

    /// Override output file: (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Override the iteration budget of the minimizer
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Override the steepest-descent step size
    #[arg(long)]
    pub step_size: Option<f64>,

    /// Override the energy convergence tolerance
    #[arg(long)]
    pub energy_tolerance: Option<f64>,

    /// Override the random seed of the initial coefficients
    #[arg(long)]
    pub seed: Option<u64>,
}
