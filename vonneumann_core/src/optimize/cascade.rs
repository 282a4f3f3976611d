//! Feasibility cascade: removes null reactions and nulls the consumers of unproducible metabolites
use std::collections::VecDeque;

use log::{debug, info};

use crate::network::sparse::SparseNetwork;

/// Result of [`check_cascades`]
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeReport {
    /// Every null reaction, the ones passed in first, then in order of discovery
    pub null_reactions: Vec<usize>,
    /// Reactions forced to zero by the cascade
    pub newly_nulled: Vec<usize>,
    /// Metabolites found to be consumed without being produced
    pub only_consumed: Vec<usize>,
}

impl CascadeReport {
    /// Final number of null reactions
    pub fn n_null(&self) -> usize {
        self.null_reactions.len()
    }

    /// True when no reaction of the network can carry flux
    pub fn nulls_everything(&self, n_reactions: usize) -> bool {
        self.null_reactions.len() >= n_reactions
    }
}

/// Remove null reactions from the network until no metabolite is only consumed
///
/// Every null reaction is detached from every metabolite. A metabolite left with
/// consumers but no producer can never be balanced, so all its consumers are
/// null too and get removed in turn. The work list grows monotonically and is
/// bounded by the number of reactions, so the loop terminates.
///
/// # Parameters
/// - `network`: network to prune in place
/// - `null_reactions`: reactions locked to zero
///
/// # Returns
/// The [`CascadeReport`] listing every null reaction
pub fn check_cascades(network: &mut SparseNetwork, null_reactions: &[usize]) -> CascadeReport {
    let mut is_null = vec![false; network.n_reactions()];
    let mut all_null = Vec::with_capacity(null_reactions.len());
    let mut pending: VecDeque<usize> = VecDeque::new();
    for &reaction in null_reactions {
        if !is_null[reaction] {
            is_null[reaction] = true;
            all_null.push(reaction);
            pending.push_back(reaction);
            debug!("Reaction {} is zero", reaction + 1);
        }
    }

    let mut newly_nulled = Vec::new();
    let mut only_consumed = Vec::new();
    let mut reported = vec![false; network.n_metabolites()];
    loop {
        while let Some(reaction) = pending.pop_front() {
            network.remove_reaction(reaction);
        }

        // Metabolites left with consumers only, their consumers are queued for removal
        for (index, metabolite) in network.metabolites().iter().enumerate() {
            if !metabolite.is_only_consumed() {
                continue;
            }
            if !reported[index] {
                reported[index] = true;
                only_consumed.push(index);
                debug!("Metabolite {} is now only consumed", index + 1);
            }
            for entry in metabolite.input.iter() {
                if !is_null[entry.reaction] {
                    is_null[entry.reaction] = true;
                    debug!("Setting reaction {} to zero", entry.reaction + 1);
                    all_null.push(entry.reaction);
                    newly_nulled.push(entry.reaction);
                    pending.push_back(entry.reaction);
                }
            }
        }

        if pending.is_empty() {
            break;
        }
    }

    if !newly_nulled.is_empty() {
        info!(
            "Feasibility cascade forced {} more reactions to zero",
            newly_nulled.len()
        );
    }
    CascadeReport {
        null_reactions: all_null,
        newly_nulled,
        only_consumed,
    }
}
