//! Plane-wave DFT Command-Line Interface
//!
//! This is the main entry point for running total-energy minimizations with YAML configuration.

use color_eyre::eyre::Result;
use scf::app::ScfApplication;

fn main() -> Result<()> {
    color_eyre::install()?;
    ScfApplication::from_cli()?.run()
}
