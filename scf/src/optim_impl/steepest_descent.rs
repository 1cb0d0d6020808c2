//! Steepest Descent minimization of the total energy over the orbital coefficients

use super::{
    IterationObserver, IterationReport, MinimizationOutcome, MinimizerParams, NoObserver,
    StopReason,
};
use crate::error::Result;
use crate::scf_impl::SCF;
use basis::CMatrix;
use num_complex::Complex64;
use std::ops::ControlFlow;

/// Fixed-step steepest descent `W <- W - beta * g`
pub struct SteepestDescent {
    params: MinimizerParams,
}

impl SteepestDescent {
    pub fn new(params: MinimizerParams) -> Self {
        SteepestDescent { params }
    }

    pub fn params(&self) -> &MinimizerParams {
        &self.params
    }

    pub fn run<S: SCF>(&self, scf: &mut S, initial_w: CMatrix) -> Result<MinimizationOutcome> {
        self.run_with_observer(scf, initial_w, &mut NoObserver)
    }

    /// Iterate until successive energies agree to `energy_tolerance`, the budget runs
    /// out or `observer` breaks. Step and gradient errors abort the run.
    pub fn run_with_observer<S, O>(
        &self,
        scf: &mut S,
        initial_w: CMatrix,
        observer: &mut O,
    ) -> Result<MinimizationOutcome>
    where
        S: SCF,
        O: IterationObserver + ?Sized,
    {
        self.params.validate()?;
        let beta = Complex64::new(self.params.step_size, 0.0);
        let etol = self.params.energy_tolerance;

        tracing::info!("#####################################################");
        tracing::info!("--------- Starting Steepest Descent Minimization ---------");
        tracing::info!("#####################################################");
        tracing::info!(
            "  basis = {}, states = {}, Nit = {}, beta = {:e}, etol = {:e}",
            scf.n_basis(),
            scf.n_states(),
            self.params.max_iterations,
            self.params.step_size,
            etol
        );

        let mut w = initial_w;
        let mut history: Vec<f64> = Vec::with_capacity(self.params.max_iterations);

        for iteration in 0..self.params.max_iterations {
            let energy = scf.scf_step(&w)?;
            let delta = history.last().map(|previous| energy - previous);
            history.push(energy);

            tracing::info!(
                "  Iteration {:5}: Etot = {:18.12} Ha  dE = {:>12}",
                iteration,
                energy,
                delta.map_or_else(|| "-".to_string(), |d| format!("{:.3e}", d))
            );

            let report = IterationReport {
                iteration,
                energy,
                delta,
            };
            let interrupted = observer.observe(&report).is_break();

            if iteration > 1 && delta.is_some_and(|d| d.abs() < etol) {
                tracing::info!("Minimization converged after {} iterations", history.len());
                tracing::info!("-----------------------------------------------------\n");
                return Ok(MinimizationOutcome::Converged {
                    coefficients: w,
                    energy,
                    iterations: history.len(),
                    history,
                });
            }

            if interrupted {
                tracing::warn!("Minimization interrupted after {} iterations", history.len());
                return Ok(MinimizationOutcome::NotConverged {
                    coefficients: w,
                    reason: StopReason::Interrupted,
                    history,
                });
            }

            let gradient = scf.energy_gradient(&w)?;
            w -= gradient * beta;
        }

        tracing::warn!(
            "Minimization reached the maximum number of iterations ({}) without converging",
            self.params.max_iterations
        );
        tracing::info!("-----------------------------------------------------\n");
        Ok(MinimizationOutcome::NotConverged {
            coefficients: w,
            reason: StopReason::IterationBudget,
            history,
        })
    }
}
