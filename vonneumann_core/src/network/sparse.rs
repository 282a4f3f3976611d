//! This module provides the SparseNetwork struct, the bipartite metabolite/reaction graph
use log::debug;
use nalgebra::DMatrix;
use nalgebra_sparse::convert::serial::convert_csr_dense;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use thiserror::Error;

use crate::network::metabolite::{Adjacency, Metabolite};

/// Sparse representation of a metabolic network
///
/// Reactions are only identified by their index into the flux vector, metabolites
/// own the lists of reactions consuming and producing them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseNetwork {
    /// Metabolites, indexed from 0
    metabolites: Vec<Metabolite>,
    /// Number of reactions (length of any flux vector for this network)
    n_reactions: usize,
    /// Optional reaction names, kept for reporting only
    reaction_names: Vec<Option<String>>,
}

impl SparseNetwork {
    /// Create a network with `n_reactions` reactions and no metabolites
    pub fn new(n_reactions: usize) -> Self {
        SparseNetwork {
            metabolites: Vec::new(),
            n_reactions,
            reaction_names: vec![None; n_reactions],
        }
    }

    /// Add a metabolite from a list of `(reaction index, signed coefficient)` pairs
    ///
    /// # Returns
    /// The index of the new metabolite
    ///
    /// # Examples
    /// ```rust
    /// use vonneumann_core::network::sparse::SparseNetwork;
    /// let mut network = SparseNetwork::new(2);
    /// // Consumed by reaction 0, produced by reaction 1
    /// let met = network.add_metabolite(Some("A".to_string()), &[(0, -1.), (1, 2.)]).unwrap();
    /// assert_eq!(met, 0);
    /// ```
    pub fn add_metabolite(
        &mut self,
        name: Option<String>,
        stoichiometry: &[(usize, f64)],
    ) -> Result<usize, NetworkError> {
        let index = self.metabolites.len();
        let mut metabolite = Metabolite::new(name);
        for &(reaction, coefficient) in stoichiometry {
            if reaction >= self.n_reactions {
                return Err(NetworkError::ReactionOutOfRange {
                    reaction,
                    n_reactions: self.n_reactions,
                });
            }
            if !coefficient.is_finite() {
                return Err(NetworkError::NonFiniteCoefficient {
                    metabolite: index,
                    reaction,
                });
            }
            metabolite.attach(reaction, coefficient);
        }
        self.metabolites.push(metabolite);
        Ok(index)
    }

    /// Name a reaction
    pub fn set_reaction_name(&mut self, reaction: usize, name: &str) -> Result<(), NetworkError> {
        match self.reaction_names.get_mut(reaction) {
            Some(slot) => {
                *slot = Some(name.to_string());
                Ok(())
            }
            None => Err(NetworkError::ReactionOutOfRange {
                reaction,
                n_reactions: self.n_reactions,
            }),
        }
    }

    pub fn n_reactions(&self) -> usize {
        self.n_reactions
    }

    pub fn n_metabolites(&self) -> usize {
        self.metabolites.len()
    }

    pub fn metabolites(&self) -> &[Metabolite] {
        &self.metabolites
    }

    pub fn metabolite(&self, index: usize) -> Option<&Metabolite> {
        self.metabolites.get(index)
    }

    pub fn reaction_name(&self, reaction: usize) -> Option<&str> {
        self.reaction_names.get(reaction).and_then(|n| n.as_deref())
    }

    /// Total number of adjacency entries over both sides of every metabolite
    pub fn n_entries(&self) -> usize {
        self.metabolites
            .iter()
            .map(|m| m.input.n_react() + m.output.n_react())
            .sum()
    }

    // region Structural updates
    /// Detach a reaction from every metabolite it takes part in
    ///
    /// Every occurrence is swap-removed, so no entry referencing `reaction` survives.
    ///
    /// # Returns
    /// The number of adjacency entries removed
    pub fn remove_reaction(&mut self, reaction: usize) -> usize {
        let mut removed = 0;
        for (index, metabolite) in self.metabolites.iter_mut().enumerate() {
            removed += Self::drain_reaction(&mut metabolite.input, reaction, index, "inputs");
            removed += Self::drain_reaction(&mut metabolite.output, reaction, index, "outputs");
        }
        removed
    }

    fn drain_reaction(
        adjacency: &mut Adjacency,
        reaction: usize,
        metabolite: usize,
        side: &str,
    ) -> usize {
        let mut removed = 0;
        while adjacency.swap_remove_reaction(reaction).is_some() {
            debug!(
                "Removing reaction {} from {} of metabolite {}",
                reaction + 1,
                side,
                metabolite + 1
            );
            removed += 1;
        }
        removed
    }
    // endregion Structural updates

    // region Constraints
    /// Constraint margin of metabolite `index` at growth rate `rho`
    pub fn constraint(&self, index: usize, fluxes: &[f64], rho: f64) -> f64 {
        self.metabolites[index].constraint(fluxes, rho)
    }

    /// Constraint margins of every metabolite at growth rate `rho`
    pub fn constraints(&self, fluxes: &[f64], rho: f64) -> Vec<f64> {
        self.metabolites
            .iter()
            .map(|m| m.constraint(fluxes, rho))
            .collect()
    }

    /// Most violated constraint, ties going to the metabolite met first
    ///
    /// # Returns
    /// `Some((metabolite index, margin))`, or `None` for a network without metabolites
    pub fn min_constraint(&self, fluxes: &[f64], rho: f64) -> Option<(usize, f64)> {
        let mut minimum: Option<(usize, f64)> = None;
        for (index, metabolite) in self.metabolites.iter().enumerate() {
            let c = metabolite.constraint(fluxes, rho);
            match minimum {
                Some((_, current)) if c >= current => {}
                _ => minimum = Some((index, c)),
            }
        }
        minimum
    }
    // endregion Constraints

    // region Matrix conversions
    /// Build a network from a signed stoichiometric matrix (metabolites x reactions)
    pub fn from_csr(matrix: &CsrMatrix<f64>) -> Result<Self, NetworkError> {
        let mut network = SparseNetwork::new(matrix.ncols());
        for row in matrix.row_iter() {
            let stoichiometry: Vec<(usize, f64)> = row
                .col_indices()
                .iter()
                .copied()
                .zip(row.values().iter().copied())
                .collect();
            network.add_metabolite(None, &stoichiometry)?;
        }
        Ok(network)
    }

    /// Signed stoichiometric matrix in compressed sparse row form
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(self.n_metabolites(), self.n_reactions);
        for (row, metabolite) in self.metabolites.iter().enumerate() {
            for entry in metabolite.input.iter() {
                coo.push(row, entry.reaction, -entry.coefficient);
            }
            for entry in metabolite.output.iter() {
                coo.push(row, entry.reaction, entry.coefficient);
            }
        }
        // Duplicate (row, col) pairs are summed by the conversion
        CsrMatrix::from(&coo)
    }

    /// Dense signed stoichiometric matrix
    pub fn stoichiometric_matrix(&self) -> DMatrix<f64> {
        convert_csr_dense(&self.to_csr())
    }
    // endregion Matrix conversions

    /// Whether two networks hold the same adjacency multisets per metabolite, up to order
    pub fn is_isomorphic_to(&self, other: &SparseNetwork) -> bool {
        if self.n_reactions != other.n_reactions || self.n_metabolites() != other.n_metabolites()
        {
            return false;
        }
        self.metabolites
            .iter()
            .zip(other.metabolites.iter())
            .all(|(a, b)| {
                sorted_entries(&a.input) == sorted_entries(&b.input)
                    && sorted_entries(&a.output) == sorted_entries(&b.output)
            })
    }
}

fn sorted_entries(adjacency: &Adjacency) -> Vec<(usize, f64)> {
    let mut entries: Vec<(usize, f64)> = adjacency
        .iter()
        .map(|e| (e.reaction, e.coefficient))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
    entries
}

/// Errors raised while building a network
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// A reaction index does not fit the flux vector
    #[error("Reaction {reaction} is out of range for a network with {n_reactions} reactions")]
    ReactionOutOfRange { reaction: usize, n_reactions: usize },
    /// A coefficient is NaN or infinite
    #[error("Metabolite {metabolite} has a non-finite coefficient for reaction {reaction}")]
    NonFiniteCoefficient { metabolite: usize, reaction: usize },
}
