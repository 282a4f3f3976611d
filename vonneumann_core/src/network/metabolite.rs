//! This module provides the metabolite struct and its reaction adjacency lists

/// A reaction attached to a metabolite, together with its stoichiometric coefficient
///
/// The coefficient is always positive, whether the reaction consumes or produces the
/// metabolite is encoded by the [`Adjacency`] the entry is stored in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjacencyEntry {
    /// Index of the reaction in the flux vector
    pub reaction: usize,
    /// Magnitude of the stoichiometric coefficient
    pub coefficient: f64,
}

/// Unordered list of reactions attached to one side of a metabolite
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Adjacency {
    entries: Vec<AdjacencyEntry>,
}

impl Adjacency {
    /// Create an empty adjacency list
    pub fn new() -> Self {
        Adjacency {
            entries: Vec::new(),
        }
    }

    /// Append a reaction to the list
    pub fn push(&mut self, reaction: usize, coefficient: f64) {
        self.entries.push(AdjacencyEntry {
            reaction,
            coefficient,
        });
    }

    /// Number of reactions currently attached
    pub fn n_react(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The live entries, in storage order
    pub fn entries(&self) -> &[AdjacencyEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &AdjacencyEntry> {
        self.entries.iter()
    }

    /// Position of the first entry referencing `reaction`
    pub fn position_of(&self, reaction: usize) -> Option<usize> {
        self.entries.iter().position(|e| e.reaction == reaction)
    }

    pub fn contains(&self, reaction: usize) -> bool {
        self.position_of(reaction).is_some()
    }

    /// Remove the first entry referencing `reaction` by swapping it with the last entry
    ///
    /// Removal is O(1) once the entry is found, and does not preserve order.
    pub fn swap_remove_reaction(&mut self, reaction: usize) -> Option<AdjacencyEntry> {
        let position = self.position_of(reaction)?;
        Some(self.entries.swap_remove(position))
    }

    /// Weighted sum `sum(coefficient * s[reaction])` over the list
    pub fn weighted_flux(&self, fluxes: &[f64]) -> f64 {
        self.entries
            .iter()
            .map(|e| e.coefficient * fluxes[e.reaction])
            .sum()
    }
}

/// Represents a metabolite as the lists of reactions consuming and producing it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metabolite {
    /// Optional human-readable name, kept for reporting only
    pub name: Option<String>,
    /// Reactions consuming the metabolite (negative stoichiometry)
    pub input: Adjacency,
    /// Reactions producing the metabolite (positive stoichiometry)
    pub output: Adjacency,
}

impl Metabolite {
    pub fn new(name: Option<String>) -> Self {
        Metabolite {
            name,
            input: Adjacency::new(),
            output: Adjacency::new(),
        }
    }

    /// Add a reaction with a signed stoichiometric coefficient
    ///
    /// Negative coefficients go to `input`, positive ones to `output`, zeros are dropped.
    pub fn attach(&mut self, reaction: usize, signed_coefficient: f64) {
        if signed_coefficient < 0. {
            self.input.push(reaction, -signed_coefficient);
        } else if signed_coefficient > 0. {
            self.output.push(reaction, signed_coefficient);
        }
    }

    /// Constraint margin `c = sum_out coeff*s - rho * sum_in coeff*s`
    pub fn constraint(&self, fluxes: &[f64], rho: f64) -> f64 {
        self.output.weighted_flux(fluxes) - rho * self.input.weighted_flux(fluxes)
    }

    /// True when nothing produces the metabolite but something still consumes it
    pub fn is_only_consumed(&self) -> bool {
        self.output.is_empty() && !self.input.is_empty()
    }

    /// Signed stoichiometric coefficient of `reaction` (0 when not attached)
    pub fn signed_coefficient(&self, reaction: usize) -> f64 {
        let produced: f64 = self
            .output
            .iter()
            .filter(|e| e.reaction == reaction)
            .map(|e| e.coefficient)
            .sum();
        let consumed: f64 = self
            .input
            .iter()
            .filter(|e| e.reaction == reaction)
            .map(|e| e.coefficient)
            .sum();
        produced - consumed
    }
}
