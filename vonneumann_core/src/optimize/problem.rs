//! Provides struct representing a von Neumann growth problem
use log::info;
use rand::Rng;
use thiserror::Error;

use crate::network::locks::{LockError, LockSet};
use crate::network::sparse::{NetworkError, SparseNetwork};
use crate::optimize::annealing::{AnnealingController, AnnealingProgress, SolverParameters};
use crate::optimize::cascade::{check_cascades, CascadeReport};
use crate::optimize::fluxes::FluxVector;
use crate::optimize::{FluxSolution, SolutionStatus};

/// A network together with its locked reactions, pruned and ready to be solved
#[derive(Debug, Clone)]
pub struct VonNeumannProblem {
    /// Network with every null reaction detached
    network: SparseNetwork,
    /// User locks followed by the reactions the cascade forced to zero
    locks: LockSet,
    /// What the feasibility cascade found
    cascade: CascadeReport,
}

impl VonNeumannProblem {
    // region Creation Functions
    /// Set up a problem from a network and the user's locks
    ///
    /// The locks are checked against the network, then the feasibility cascade removes
    /// the null reactions and everything they make unproducible. Reactions the cascade
    /// forces to zero are added to the locks.
    ///
    /// # Parameters
    /// - `network`: network to solve, consumed and pruned
    /// - `locks`: reactions pinned to user supplied values
    ///
    /// # Returns
    /// The problem, or a [`ProblemError`] when the locks are inconsistent or no reaction
    /// is left to carry flux
    pub fn new(mut network: SparseNetwork, mut locks: LockSet) -> Result<Self, ProblemError> {
        let n_reactions = network.n_reactions();
        if n_reactions == 0 {
            return Err(ProblemError::NoFeasibleFlux {
                reason: "the network has no reactions".to_string(),
            });
        }
        locks.validate(n_reactions)?;
        if let Some(lock) = locks.iter().find(|l| l.value < 0.) {
            return Err(ProblemError::invalid_parameter(
                "lock value",
                &format!("reaction {} is locked to negative flux {}", lock.reaction + 1, lock.value),
            ));
        }
        let locked_total = locks.locked_total();
        if locked_total > n_reactions as f64 {
            return Err(ProblemError::LockedTotalExceedsReactionCount {
                locked_total,
                n_reactions,
            });
        }

        let cascade = check_cascades(&mut network, &locks.partition_null());
        if cascade.nulls_everything(n_reactions) {
            return Err(ProblemError::NoFeasibleFlux {
                reason: format!(
                    "the feasibility cascade forced all {} reactions to zero",
                    n_reactions
                ),
            });
        }
        let n_locked = locks.extend_with_newly_nulled(&cascade.newly_nulled)?;
        if n_locked >= n_reactions {
            return Err(ProblemError::NoFeasibleFlux {
                reason: "every reaction is locked, nothing is left to solve for".to_string(),
            });
        }

        info!(
            "Problem has {} metabolites, {} reactions, {} locked ({} null)",
            network.n_metabolites(),
            n_reactions,
            n_locked,
            cascade.n_null()
        );
        Ok(VonNeumannProblem {
            network,
            locks,
            cascade,
        })
    }

    /// Set up a problem from a lock specification string (see [`LockSet::parse`])
    pub fn with_lock_spec(network: SparseNetwork, spec: &str) -> Result<Self, ProblemError> {
        let (locks, _) = LockSet::parse(spec)?;
        Self::new(network, locks)
    }
    // endregion Creation Functions

    pub fn network(&self) -> &SparseNetwork {
        &self.network
    }

    pub fn locks(&self) -> &LockSet {
        &self.locks
    }

    pub fn cascade(&self) -> &CascadeReport {
        &self.cascade
    }

    pub fn n_reactions(&self) -> usize {
        self.network.n_reactions()
    }

    // region Solving
    /// Find one flux vector and the highest rho it satisfies
    pub fn solve<R: Rng + ?Sized>(
        &self,
        params: &SolverParameters,
        rng: &mut R,
    ) -> Result<FluxSolution, ProblemError> {
        self.solve_with_observer(params, rng, |_| {})
    }

    /// Find one flux vector, calling `observer` after every trial rho
    ///
    /// Parameters are checked before anything is allocated. Every call starts from a
    /// fresh random flux vector.
    pub fn solve_with_observer<R, F>(
        &self,
        params: &SolverParameters,
        rng: &mut R,
        observer: F,
    ) -> Result<FluxSolution, ProblemError>
    where
        R: Rng + ?Sized,
        F: FnMut(&AnnealingProgress),
    {
        let controller = AnnealingController::new(params)?;
        Ok(self.run_controller(&controller, rng, observer))
    }

    /// Draw `n_solutions` independent solutions, each from its own random starting point
    pub fn sample<R: Rng + ?Sized>(
        &self,
        n_solutions: usize,
        params: &SolverParameters,
        rng: &mut R,
    ) -> Result<Vec<FluxSolution>, ProblemError> {
        let controller = AnnealingController::new(params)?;
        Ok((0..n_solutions)
            .map(|_| self.run_controller(&controller, rng, |_| {}))
            .collect())
    }

    fn run_controller<R, F>(
        &self,
        controller: &AnnealingController,
        rng: &mut R,
        observer: F,
    ) -> FluxSolution
    where
        R: Rng + ?Sized,
        F: FnMut(&AnnealingProgress),
    {
        let mut fluxes = FluxVector::zeros(self.network.n_reactions());
        fluxes.initialize(&self.locks, rng);
        let outcome =
            controller.run_with_observer(&self.network, &mut fluxes, &self.locks, observer);

        let status = if !outcome.converged_any {
            SolutionStatus::NoFeasibleRho
        } else if outcome.reached_rho_max {
            SolutionStatus::ReachedRhoMax
        } else {
            SolutionStatus::StepExhausted
        };
        info!(
            "Solution reached rho = {} ({:?}) after {} trials",
            outcome.rho, status, outcome.trials
        );
        FluxSolution {
            rho: outcome.rho,
            fluxes: fluxes.into_values(),
            status,
            trials: outcome.trials,
            backtracks: outcome.backtracks,
            total_steps: outcome.total_steps,
        }
    }
    // endregion Solving
}

/// Errors associated with setting up or solving a problem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    /// The first rho tried is above the ceiling
    #[error("RHO min ({rho_min}) cannot be larger than RHO max ({rho_max})")]
    InvalidRhoRange { rho_min: f64, rho_max: f64 },
    /// The initial rho increment is below the stopping increment
    #[error("Initial step size ({step_init}) cannot be smaller than final step size ({step_min})")]
    InvalidStepRange { step_init: f64, step_min: f64 },
    /// A solver parameter is out of its domain
    #[error("Invalid {parameter}: {reason}")]
    InvalidParameter { parameter: String, reason: String },
    /// No reaction can carry flux
    #[error("No feasible flux: {reason}")]
    NoFeasibleFlux { reason: String },
    /// The locked values alone exceed the normalization total
    #[error("Locked fluxes sum to {locked_total}, more than the {n_reactions} reactions")]
    LockedTotalExceedsReactionCount { locked_total: f64, n_reactions: usize },
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl ProblemError {
    pub(crate) fn invalid_parameter(parameter: &str, reason: &str) -> Self {
        ProblemError::InvalidParameter {
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        }
    }
}
