//! Input/Output operations for DFT calculations
//!
//! This module handles logging setup and result files.

mod output;

pub use output::{setup_output, write_summary};
