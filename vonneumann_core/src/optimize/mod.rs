//! Module for solving von Neumann growth problems

pub mod annealing;
pub mod cascade;
pub mod fluxes;
pub mod minover;
pub mod problem;

use crate::network::sparse::SparseNetwork;

/// Struct representing one solution of a von Neumann problem
#[derive(Debug, Clone, PartialEq)]
pub struct FluxSolution {
    /// Highest growth rate the fluxes were verified at
    pub rho: f64,
    /// Flux of every reaction, in reaction order, summing to the number of reactions
    pub fluxes: Vec<f64>,
    /// How the annealing sweep ended
    pub status: SolutionStatus,
    /// Number of trial rho values
    pub trials: usize,
    /// Number of trials that did not converge and were rolled back
    pub backtracks: usize,
    /// minOver updates summed over every trial
    pub total_steps: usize,
}

impl FluxSolution {
    /// Most violated metabolite constraint at the solution's rho
    ///
    /// # Returns
    /// `Some((metabolite index, margin))`, None for a network without metabolites
    pub fn min_constraint(&self, network: &SparseNetwork) -> Option<(usize, f64)> {
        network.min_constraint(&self.fluxes, self.rho)
    }

    /// Whether every constraint margin is at least `-tolerance`
    pub fn is_feasible(&self, network: &SparseNetwork, tolerance: f64) -> bool {
        match self.min_constraint(network) {
            Some((_, margin)) => margin >= -tolerance,
            None => true,
        }
    }
}

/// Status of a solution
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SolutionStatus {
    /// Rho was pushed up to its ceiling
    ReachedRhoMax,
    /// The rho increment shrank to its minimum before the ceiling was reached
    StepExhausted,
    /// minOver did not converge even at the first rho, the fluxes were never verified
    NoFeasibleRho,
}
