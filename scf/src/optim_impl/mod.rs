//! Orbital optimization
//!
//! This module contains the direct-minimization driver over the coefficient matrix `W`
//! and the outcome types it reports. Convergence and non-convergence are distinct
//! variants; running out of iterations is not an error.

mod steepest_descent;

pub use steepest_descent::SteepestDescent;

use crate::error::{DftError, Result};
use basis::CMatrix;
use std::ops::ControlFlow;

/// Settings of the steepest-descent loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinimizerParams {
    /// Nit, the number of SCF steps allowed.
    pub max_iterations: usize,
    /// beta in `W <- W - beta * g`.
    pub step_size: f64,
    /// Converged once successive energies differ by less than this.
    pub energy_tolerance: f64,
}

impl Default for MinimizerParams {
    fn default() -> Self {
        MinimizerParams {
            max_iterations: 1001,
            step_size: 1e-5,
            energy_tolerance: 1e-6,
        }
    }
}

impl MinimizerParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.step_size > 0.0) || !self.step_size.is_finite() {
            return Err(DftError::InvalidParameter {
                name: "step_size",
                reason: format!("must be positive, got {}", self.step_size),
            });
        }
        if !(self.energy_tolerance >= 0.0) {
            return Err(DftError::InvalidParameter {
                name: "energy_tolerance",
                reason: format!("must be non-negative, got {}", self.energy_tolerance),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    IterationBudget,
    /// An observer asked to stop.
    Interrupted,
}

#[derive(Clone, Debug)]
pub enum MinimizationOutcome {
    Converged {
        coefficients: CMatrix,
        energy: f64,
        /// SCF steps taken.
        iterations: usize,
        history: Vec<f64>,
    },
    NotConverged {
        coefficients: CMatrix,
        reason: StopReason,
        history: Vec<f64>,
    },
}

impl MinimizationOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, MinimizationOutcome::Converged { .. })
    }

    /// Total energy of every step, in order.
    pub fn history(&self) -> &[f64] {
        match self {
            MinimizationOutcome::Converged { history, .. }
            | MinimizationOutcome::NotConverged { history, .. } => history,
        }
    }

    /// Final coefficient matrix.
    pub fn coefficients(&self) -> &CMatrix {
        match self {
            MinimizationOutcome::Converged { coefficients, .. }
            | MinimizationOutcome::NotConverged { coefficients, .. } => coefficients,
        }
    }

    pub fn last_energy(&self) -> Option<f64> {
        self.history().last().copied()
    }

    /// `(coefficients, energy)` of a converged run, `DftError::NotConverged` otherwise.
    pub fn into_converged(self) -> Result<(CMatrix, f64)> {
        match self {
            MinimizationOutcome::Converged {
                coefficients,
                energy,
                ..
            } => Ok((coefficients, energy)),
            MinimizationOutcome::NotConverged { history, .. } => Err(DftError::NotConverged {
                iterations: history.len(),
                last_energy: history.last().copied(),
            }),
        }
    }
}

/// Progress of one minimizer iteration.
#[derive(Clone, Copy, Debug)]
pub struct IterationReport {
    pub iteration: usize,
    pub energy: f64,
    /// Change from the previous iteration, `None` on the first.
    pub delta: Option<f64>,
}

/// Called after every SCF step; returning `Break` stops the run before the next update.
pub trait IterationObserver {
    fn observe(&mut self, report: &IterationReport) -> ControlFlow<()>;
}

impl<F> IterationObserver for F
where
    F: FnMut(&IterationReport) -> ControlFlow<()>,
{
    fn observe(&mut self, report: &IterationReport) -> ControlFlow<()> {
        self(report)
    }
}

/// Observer that never interrupts.
pub struct NoObserver;

impl IterationObserver for NoObserver {
    fn observe(&mut self, _: &IterationReport) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}
