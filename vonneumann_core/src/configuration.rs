//! Process-wide default solver settings
use std::sync::{LazyLock, RwLock};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

/// Default values used when building [`crate::optimize::annealing::SolverParameters`]
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    /// Base gain of the minOver update
    pub eta: f64,
    /// Initial increment of rho
    pub step_init: f64,
    /// Increment below which annealing stops
    pub step_min: f64,
    /// Initial minOver iteration budget
    pub max_steps: usize,
    /// Starting value of rho
    pub rho_init: f64,
    /// Ceiling of rho
    pub rho_max: f64,
    /// Number of solutions sampled by the front ends
    pub n_solutions: usize,
    /// Multiplier applied to eta at the start of every annealing run
    pub eta_factor_init: f64,
    /// Tolerance used when checking constraint margins of a solution
    pub tolerance: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            eta: 1e-4,
            step_init: 1e-4,
            step_min: 1e-6,
            max_steps: 1_000_000,
            rho_init: 0.95,
            rho_max: 0.999,
            n_solutions: 1,
            eta_factor_init: 10.,
            tolerance: 1e-9,
        }
    }
}

/// Snapshot of the current configuration
///
/// A poisoned lock still holds a usable configuration, so it is read anyway.
pub fn current() -> Configuration {
    match CONFIGURATION.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Replace the process-wide configuration
pub fn set(configuration: Configuration) {
    match CONFIGURATION.write() {
        Ok(mut config) => *config = configuration,
        Err(poisoned) => *poisoned.into_inner() = configuration,
    }
}
