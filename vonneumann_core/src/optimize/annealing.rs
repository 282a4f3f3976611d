//! Annealing controller: sweeps rho upwards, using minOver as the feasibility oracle
use derive_builder::Builder;
use log::trace;

use crate::configuration;
use crate::network::locks::LockSet;
use crate::network::sparse::SparseNetwork;
use crate::optimize::fluxes::FluxVector;
use crate::optimize::minover::min_over;
use crate::optimize::problem::ProblemError;

/// Parameters of one annealing run
///
/// Unset fields take the value of the process-wide [`configuration::CONFIGURATION`].
///
/// # Examples
/// ```rust
/// use vonneumann_core::optimize::annealing::SolverParametersBuilder;
/// let params = SolverParametersBuilder::default()
///     .rho_min(0.1)
///     .rho_max(0.5)
///     .build()
///     .unwrap();
/// assert!((params.eta - 1e-4).abs() < 1e-25);
/// ```
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct SolverParameters {
    /// Base gain of the minOver update
    #[builder(default = "configuration::current().eta")]
    pub eta: f64,
    /// Initial minOver update budget
    #[builder(default = "configuration::current().max_steps")]
    pub max_steps: usize,
    /// Initial increment of rho
    #[builder(default = "configuration::current().step_init")]
    pub step_init: f64,
    /// The sweep stops once the increment falls to this value
    #[builder(default = "configuration::current().step_min")]
    pub step_min: f64,
    /// First rho tried
    #[builder(default = "configuration::current().rho_init")]
    pub rho_min: f64,
    /// Ceiling of rho
    #[builder(default = "configuration::current().rho_max")]
    pub rho_max: f64,
    /// Starting multiplier of `eta`
    #[builder(default = "configuration::current().eta_factor_init")]
    pub eta_factor_init: f64,
}

impl SolverParameters {
    /// Reject parameters the sweep cannot run with
    pub fn validate(&self) -> Result<(), ProblemError> {
        // An infinite ceiling or a non-positive stopping step never ends the sweep
        if !self.rho_min.is_finite() {
            return Err(ProblemError::invalid_parameter("rho_min", "must be finite"));
        }
        if !self.rho_max.is_finite() {
            return Err(ProblemError::invalid_parameter("rho_max", "must be finite"));
        }
        if !(self.step_min > 0. && self.step_min.is_finite()) {
            return Err(ProblemError::invalid_parameter(
                "step_min",
                "must be positive and finite",
            ));
        }
        if !self.step_init.is_finite() {
            return Err(ProblemError::invalid_parameter("step_init", "must be finite"));
        }
        if self.rho_min > self.rho_max {
            return Err(ProblemError::InvalidRhoRange {
                rho_min: self.rho_min,
                rho_max: self.rho_max,
            });
        }
        if self.step_init < self.step_min {
            return Err(ProblemError::InvalidStepRange {
                step_init: self.step_init,
                step_min: self.step_min,
            });
        }
        if !(self.eta > 0. && self.eta.is_finite()) {
            return Err(ProblemError::invalid_parameter("eta", "must be positive and finite"));
        }
        if !(self.eta_factor_init > 0. && self.eta_factor_init.is_finite()) {
            return Err(ProblemError::invalid_parameter(
                "eta_factor_init",
                "must be positive and finite",
            ));
        }
        if self.max_steps == 0 {
            return Err(ProblemError::invalid_parameter("max_steps", "must be at least 1"));
        }
        Ok(())
    }
}

impl Default for SolverParameters {
    fn default() -> Self {
        let config = configuration::current();
        SolverParameters {
            eta: config.eta,
            max_steps: config.max_steps,
            step_init: config.step_init,
            step_min: config.step_min,
            rho_min: config.rho_init,
            rho_max: config.rho_max,
            eta_factor_init: config.eta_factor_init,
        }
    }
}

/// State of the sweep after one trial rho, handed to the observer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealingProgress {
    /// Trial number, starting at 1
    pub trial: usize,
    /// Increment of rho that will be applied next
    pub step: f64,
    /// Rho the fluxes are currently verified at (after a backtrack, the last good one)
    pub rho: f64,
    pub eta_factor: f64,
    /// Update budget of the next trial
    pub budget: usize,
    /// minOver updates spent on this trial
    pub steps_used: usize,
    pub converged: bool,
}

/// Summary of a complete sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealingOutcome {
    /// Last rho minOver converged at
    pub rho: f64,
    /// Whether any trial converged (otherwise `rho` was never verified)
    pub converged_any: bool,
    /// Whether the sweep stopped because rho reached its ceiling
    pub reached_rho_max: bool,
    pub trials: usize,
    pub backtracks: usize,
    /// minOver updates summed over every trial
    pub total_steps: usize,
}

/// Drives rho from `rho_min` towards `rho_max`, backtracking when minOver does not converge
#[derive(Debug, Clone)]
pub struct AnnealingController {
    params: SolverParameters,
}

impl AnnealingController {
    /// Create a controller, failing on misconfigured parameters
    pub fn new(params: &SolverParameters) -> Result<Self, ProblemError> {
        params.validate()?;
        Ok(AnnealingController {
            params: params.clone(),
        })
    }

    pub fn params(&self) -> &SolverParameters {
        &self.params
    }

    /// Run the sweep without reporting progress
    pub fn run(
        &self,
        network: &SparseNetwork,
        fluxes: &mut FluxVector,
        locks: &LockSet,
    ) -> AnnealingOutcome {
        self.run_with_observer(network, fluxes, locks, |_| {})
    }

    /// Run the sweep, calling `observer` after every trial rho
    ///
    /// On a trial that does not converge the fluxes are rolled back to the last good
    /// snapshot, rho retreats by one step and the step, gain and budget are adapted.
    /// A trial using more than two thirds of its budget shrinks the step
    /// pre-emptively. The gain gets an extra damping after the first trial at
    /// `rho_min`.
    ///
    /// # Parameters
    /// - `network`: network the constraints are read from
    /// - `fluxes`: initialized and normalized flux vector, left holding the fluxes of
    ///   the returned rho
    /// - `locks`: reactions pinned to fixed values
    /// - `observer`: called with the [`AnnealingProgress`] of every trial
    ///
    /// # Returns
    /// The [`AnnealingOutcome`] of the sweep
    pub fn run_with_observer<F>(
        &self,
        network: &SparseNetwork,
        fluxes: &mut FluxVector,
        locks: &LockSet,
        mut observer: F,
    ) -> AnnealingOutcome
    where
        F: FnMut(&AnnealingProgress),
    {
        let params = &self.params;
        let mut rho = params.rho_min;
        let mut step = params.step_init;
        let mut eta_factor = params.eta_factor_init;
        let mut budget = params.max_steps;
        let mut snapshot = fluxes.backup();

        let mut damped = false;
        let mut converged_any = false;
        let mut trials = 0;
        let mut backtracks = 0;
        let mut total_steps = 0;

        while rho < params.rho_max && step > params.step_min {
            let outcome = min_over(network, fluxes, locks, rho, params.eta * eta_factor, budget);
            trials += 1;
            total_steps += outcome.steps;

            if outcome.converged {
                fluxes.normalize(locks);
                snapshot = fluxes.backup();
                converged_any = true;
                if outcome.steps > 2 * budget / 3 {
                    step /= 1.2;
                    eta_factor /= 1.1;
                    budget = grow(budget, 1.2);
                }
            } else {
                fluxes.restore(&snapshot);
                rho -= step;
                step /= 1.5;
                eta_factor /= 1.2;
                budget = grow(budget, 1.5);
                backtracks += 1;
            }

            if !damped && rho == params.rho_min {
                eta_factor /= 15.;
                damped = true;
            }

            let progress = AnnealingProgress {
                trial: trials,
                step,
                rho,
                eta_factor,
                budget,
                steps_used: outcome.steps,
                converged: outcome.converged,
            };
            trace!("{:?}", progress);
            observer(&progress);

            rho += step;
        }

        AnnealingOutcome {
            rho: rho - step,
            converged_any,
            reached_rho_max: rho >= params.rho_max,
            trials,
            backtracks,
            total_steps,
        }
    }
}

/// Scale an update budget, saturating instead of overflowing
fn grow(budget: usize, factor: f64) -> usize {
    let grown = budget as f64 * factor;
    if grown >= usize::MAX as f64 {
        usize::MAX
    } else {
        grown as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn chain_network() -> SparseNetwork {
        let mut network = SparseNetwork::new(3);
        network.add_metabolite(None, &[(0, -1.), (1, 1.)]).unwrap();
        network.add_metabolite(None, &[(1, -1.), (2, 1.)]).unwrap();
        network
    }

    /// Feasible only for rho <= 0.5
    fn loop_network() -> SparseNetwork {
        let mut network = SparseNetwork::new(2);
        network.add_metabolite(None, &[(0, -2.), (1, 1.)]).unwrap();
        network.add_metabolite(None, &[(1, -2.), (0, 1.)]).unwrap();
        network
    }

    fn params(rho_min: f64, rho_max: f64) -> SolverParameters {
        SolverParametersBuilder::default()
            .eta(0.01)
            .max_steps(10_000)
            .step_init(0.05)
            .step_min(1e-4)
            .rho_min(rho_min)
            .rho_max(rho_max)
            .build()
            .unwrap()
    }

    #[test]
    fn builder_reads_configuration() {
        let params = SolverParametersBuilder::default().build().unwrap();
        assert_eq!(params, SolverParameters::default());
        assert!((params.rho_min - 0.95).abs() < 1e-25);
        assert_eq!(params.max_steps, 1_000_000);
    }

    #[test]
    fn chain_reaches_ceiling() {
        let network = chain_network();
        let locks = LockSet::new();
        let mut rng = StdRng::seed_from_u64(42);
        let mut fluxes = FluxVector::zeros(3);
        fluxes.initialize(&locks, &mut rng);

        let controller = AnnealingController::new(&params(0.1, 0.5)).unwrap();
        let outcome = controller.run(&network, &mut fluxes, &locks);
        assert!(outcome.converged_any);
        assert!(outcome.rho >= 0.1 && outcome.rho <= 0.5);
        for c in network.constraints(fluxes.values(), outcome.rho) {
            assert!(c >= -1e-9);
        }
        assert!((fluxes.total() - 3.).abs() < 1e-9);
        assert!(fluxes.values().iter().all(|v| *v >= 0.));
    }

    #[test]
    fn stalls_below_infeasible_range() {
        let network = loop_network();
        let locks = LockSet::new();
        let mut rng = StdRng::seed_from_u64(5);
        let mut fluxes = FluxVector::zeros(2);
        fluxes.initialize(&locks, &mut rng);
        let start = fluxes.clone();

        let mut params = params(0.6, 0.9);
        params.max_steps = 200;
        params.step_min = 1e-3;
        let controller = AnnealingController::new(&params).unwrap();
        let outcome = controller.run(&network, &mut fluxes, &locks);
        assert!(!outcome.converged_any);
        assert!(!outcome.reached_rho_max);
        assert_eq!(outcome.backtracks, outcome.trials);
        // Nothing converged, so the starting point is what is left
        assert_eq!(fluxes, start);
    }

    #[test]
    fn stops_near_feasibility_limit() {
        let network = loop_network();
        let locks = LockSet::new();
        let mut rng = StdRng::seed_from_u64(9);
        let mut fluxes = FluxVector::zeros(2);
        fluxes.initialize(&locks, &mut rng);

        let mut params = params(0.1, 0.9);
        params.max_steps = 2_000;
        params.step_min = 1e-3;
        let controller = AnnealingController::new(&params).unwrap();
        let outcome = controller.run(&network, &mut fluxes, &locks);
        assert!(outcome.converged_any);
        assert!(outcome.rho <= 0.5 + 1e-9);
        assert!(outcome.backtracks > 0);
        for c in network.constraints(fluxes.values(), outcome.rho) {
            assert!(c >= -1e-9);
        }
    }

    #[test]
    fn observer_sees_every_trial() {
        let network = chain_network();
        let locks = LockSet::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut fluxes = FluxVector::zeros(3);
        fluxes.initialize(&locks, &mut rng);

        let controller = AnnealingController::new(&params(0.1, 0.5)).unwrap();
        let mut seen = Vec::new();
        let outcome =
            controller.run_with_observer(&network, &mut fluxes, &locks, |p| seen.push(*p));
        assert_eq!(seen.len(), outcome.trials);
        for (i, progress) in seen.iter().enumerate() {
            assert_eq!(progress.trial, i + 1);
        }
        assert!((seen[0].rho - 0.1).abs() < 1e-25 || !seen[0].converged);
    }

    #[test]
    fn inverted_rho_range_fails_fast() {
        match AnnealingController::new(&params(0.6, 0.5)) {
            Err(ProblemError::InvalidRhoRange { rho_min, rho_max }) => {
                assert!((rho_min - 0.6).abs() < 1e-25);
                assert!((rho_max - 0.5).abs() < 1e-25);
            }
            _ => panic!("Inverted rho range not caught"),
        }
    }

    #[test]
    fn inverted_step_range_fails_fast() {
        let mut params = params(0.1, 0.5);
        params.step_init = 1e-6;
        params.step_min = 1e-4;
        match AnnealingController::new(&params) {
            Err(ProblemError::InvalidStepRange { .. }) => {}
            _ => panic!("Inverted step range not caught"),
        }
    }

    #[test]
    fn invalid_gain_rejected() {
        let mut params = params(0.1, 0.5);
        params.eta = 0.;
        match params.validate() {
            Err(ProblemError::InvalidParameter { parameter, .. }) => assert_eq!(parameter, "eta"),
            _ => panic!("Zero eta not caught"),
        }
    }

    /// A consumed by reaction 0 and produced by reaction 1
    fn single_link_network() -> SparseNetwork {
        let mut network = SparseNetwork::new(2);
        network.add_metabolite(None, &[(0, -1.), (1, 1.)]).unwrap();
        network
    }

    fn schedule_params(max_steps: usize) -> SolverParameters {
        SolverParametersBuilder::default()
            .eta(0.1)
            .eta_factor_init(10.)
            .max_steps(max_steps)
            .step_init(0.1)
            .step_min(1e-3)
            .rho_min(0.1)
            .rho_max(0.3)
            .build()
            .unwrap()
    }

    fn record(
        network: &SparseNetwork,
        start: Vec<f64>,
        params: &SolverParameters,
    ) -> (AnnealingOutcome, Vec<AnnealingProgress>) {
        let mut fluxes = FluxVector::from_values(start);
        let controller = AnnealingController::new(params).unwrap();
        let mut seen = Vec::new();
        let outcome = controller.run_with_observer(network, &mut fluxes, &LockSet::new(), |p| {
            seen.push(*p)
        });
        (outcome, seen)
    }

    #[test]
    fn first_trial_damps_gain_once() {
        // One update out of ten converges at rho_min, far from a near miss
        let (_, seen) = record(&single_link_network(), vec![2., 0.], &schedule_params(10));
        assert!(seen.len() >= 2);
        assert!(seen[0].converged);
        assert_eq!(seen[0].steps_used, 1);
        assert!((seen[0].rho - 0.1).abs() < 1e-25);
        assert!((seen[0].step - 0.1).abs() < 1e-25);
        assert!((seen[0].eta_factor - 10. / 15.).abs() < 1e-12);
        assert_eq!(seen[0].budget, 10);
        // Later trials at higher rho keep the damped gain
        assert!(seen[1].converged);
        assert_eq!(seen[1].steps_used, 0);
        assert!((seen[1].eta_factor - seen[0].eta_factor).abs() < 1e-25);
    }

    #[test]
    fn near_miss_shrinks_step_and_gain() {
        // Converging on the single update of a budget of one is a near miss
        let (outcome, seen) = record(&single_link_network(), vec![2., 0.], &schedule_params(1));
        assert_eq!(seen.len(), 3);
        assert!(seen[0].converged);
        assert_eq!(seen[0].steps_used, 1);
        assert!((seen[0].step - 0.1 / 1.2).abs() < 1e-12);
        // Near miss then the one-time damping at rho_min
        assert!((seen[0].eta_factor - 10. / 1.1 / 15.).abs() < 1e-12);
        // 1 * 1.2 truncated
        assert_eq!(seen[0].budget, 1);
        for progress in &seen[1..] {
            assert!(progress.converged);
            assert_eq!(progress.steps_used, 0);
            assert!((progress.step - 0.1 / 1.2).abs() < 1e-12);
            assert!((progress.eta_factor - seen[0].eta_factor).abs() < 1e-25);
        }
        assert!((seen[1].rho - (0.1 + 0.1 / 1.2)).abs() < 1e-12);
        assert!(outcome.reached_rho_max);
        assert_eq!(outcome.backtracks, 0);
        assert_eq!(outcome.total_steps, 1);
        assert!((outcome.rho - (0.1 + 2. * 0.1 / 1.2)).abs() < 1e-12);
    }

    #[test]
    fn backtrack_shrinks_step_and_grows_budget() {
        let mut params = params(0.6, 0.9);
        params.eta_factor_init = 10.;
        params.max_steps = 200;
        params.step_min = 1e-3;
        let (outcome, seen) = record(&loop_network(), vec![1., 1.], &params);
        assert!(!outcome.converged_any);

        assert!(!seen[0].converged);
        assert_eq!(seen[0].steps_used, 200);
        assert!((seen[0].rho - 0.55).abs() < 1e-12);
        assert!((seen[0].step - 0.05 / 1.5).abs() < 1e-12);
        assert!((seen[0].eta_factor - 10. / 1.2).abs() < 1e-12);
        assert_eq!(seen[0].budget, 300);

        assert!(!seen[1].converged);
        assert_eq!(seen[1].steps_used, 300);
        assert!((seen[1].rho - 0.55).abs() < 1e-12);
        assert!((seen[1].step - 0.05 / 2.25).abs() < 1e-12);
        assert!((seen[1].eta_factor - 10. / 1.44).abs() < 1e-12);
        assert_eq!(seen[1].budget, 450);
    }

    #[test]
    fn unbounded_sweep_rejected() {
        for (rho_min, rho_max) in [(0.1, f64::INFINITY), (f64::NEG_INFINITY, 0.5), (0.1, f64::NAN)] {
            match params(rho_min, rho_max).validate() {
                Err(ProblemError::InvalidParameter { .. }) => {}
                other => panic!("Non-finite rho bound accepted: {:?}", other),
            }
        }
        for step_min in [0., -1., f64::NAN] {
            let mut params = params(0.1, 0.5);
            params.step_min = step_min;
            match AnnealingController::new(&params) {
                Err(ProblemError::InvalidParameter { parameter, .. }) => {
                    assert_eq!(parameter, "step_min")
                }
                _ => panic!("Non-positive step_min {} accepted", step_min),
            }
        }
        let mut params = params(0.1, 0.5);
        params.step_init = f64::INFINITY;
        assert!(params.validate().is_err());
    }

    #[test]
    fn budget_growth_saturates() {
        assert_eq!(grow(10, 1.5), 15);
        assert_eq!(grow(9, 1.2), 10);
        assert_eq!(grow(usize::MAX, 1.5), usize::MAX);
    }
}
