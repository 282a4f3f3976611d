//! The minOver update: repeatedly pushes the fluxes towards the most violated metabolite
use log::trace;

use crate::network::locks::LockSet;
use crate::network::sparse::SparseNetwork;
use crate::optimize::fluxes::FluxVector;

/// Result of one [`min_over`] run at fixed rho
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinOverOutcome {
    /// Number of updates performed
    pub steps: usize,
    /// Whether every constraint was non-negative when the run stopped
    pub converged: bool,
    /// Most violated constraint when the run stopped, `(metabolite, margin)`
    pub min_constraint: Option<(usize, f64)>,
}

/// Run minOver at growth rate `rho` until every constraint is met or `max_steps` updates are spent
///
/// Each update picks the metabolite with the lowest constraint margin (the first one
/// wins ties), lowers the fluxes of its consumers by `coefficient * rho * eta`
/// (never below 0), raises the fluxes of its producers by `coefficient * eta`, then
/// re-pins the locked reactions and normalizes the vector.
///
/// # Parameters
/// - `network`: the network, only read
/// - `fluxes`: starting point, updated in place
/// - `locks`: reactions pinned to fixed values
/// - `rho`: growth rate the constraints are evaluated at
/// - `eta`: gain of the update
/// - `max_steps`: update budget
///
/// # Returns
/// A [`MinOverOutcome`], not converging within budget is not an error
pub fn min_over(
    network: &SparseNetwork,
    fluxes: &mut FluxVector,
    locks: &LockSet,
    rho: f64,
    eta: f64,
    max_steps: usize,
) -> MinOverOutcome {
    let mut steps = 0;
    // Feasibility is checked before the budget: an update that lands on a feasible
    // point with the last unit of budget still counts as converged.
    loop {
        let worst = network.min_constraint(fluxes.values(), rho);
        let (index, margin) = match worst {
            Some((index, margin)) if margin < 0. => (index, margin),
            _ => {
                return MinOverOutcome {
                    steps,
                    converged: true,
                    min_constraint: worst,
                }
            }
        };
        if steps >= max_steps {
            return MinOverOutcome {
                steps,
                converged: false,
                min_constraint: worst,
            };
        }
        trace!(
            "minOver step {}: metabolite {} has margin {}",
            steps,
            index + 1,
            margin
        );

        let metabolite = &network.metabolites()[index];
        let values = fluxes.values_mut();
        for entry in metabolite.input.iter() {
            let value = &mut values[entry.reaction];
            *value -= entry.coefficient * rho * eta;
            if *value < 0. {
                *value = 0.;
            }
        }
        for entry in metabolite.output.iter() {
            values[entry.reaction] += entry.coefficient * eta;
        }
        fluxes.normalize(locks);
        steps += 1;
    }
}
