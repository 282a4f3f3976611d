//! Flux vector initialization, normalization and backups
use rand::Rng;

use crate::network::locks::LockSet;

/// Flux values of every reaction of a network, indexed by reaction
#[derive(Debug, Clone, PartialEq)]
pub struct FluxVector {
    values: Vec<f64>,
}

/// Copy of a flux vector, used to roll back a failed rho step
#[derive(Debug, Clone, PartialEq)]
pub struct FluxSnapshot {
    values: Vec<f64>,
}

impl FluxVector {
    /// All-zero flux vector for `n_reactions` reactions
    pub fn zeros(n_reactions: usize) -> Self {
        FluxVector {
            values: vec![0.; n_reactions],
        }
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        FluxVector { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Random starting point
    ///
    /// Free reactions get the absolute value of a standard normal deviate, rescaled so
    /// that free and locked fluxes together sum to the number of reactions. Locked
    /// reactions are then pinned.
    pub fn initialize<R: Rng + ?Sized>(&mut self, locks: &LockSet, rng: &mut R) {
        let mask = locks.mask(self.values.len());
        for (value, locked) in self.values.iter_mut().zip(mask.iter()) {
            *value = if *locked { 0. } else { gaussian_deviate(rng).abs() };
        }
        self.rescale_free(&mask, locks.locked_total());
        locks.pin(&mut self.values);
    }

    /// Rescale the free reactions so the whole vector sums to the number of reactions
    ///
    /// The locked contribution is measured on the current values before locks are
    /// re-pinned, so drift on locked entries is absorbed as well.
    pub fn normalize(&mut self, locks: &LockSet) {
        let mask = locks.mask(self.values.len());
        locks.pin(&mut self.values);
        self.rescale_free(&mask, locks.locked_total());
    }

    /// Scale free entries so they sum to `n_reactions - locked_total`
    fn rescale_free(&mut self, mask: &[bool], locked_total: f64) {
        let target = self.values.len() as f64 - locked_total;
        let n_free = mask.iter().filter(|locked| !**locked).count();
        if n_free == 0 {
            return;
        }
        let free_total: f64 = self
            .values
            .iter()
            .zip(mask.iter())
            .filter(|(_, locked)| !**locked)
            .map(|(v, _)| *v)
            .sum();
        if free_total > 0. {
            let factor = target / free_total;
            self.values
                .iter_mut()
                .zip(mask.iter())
                .filter(|(_, locked)| !**locked)
                .for_each(|(v, _)| *v *= factor);
        } else {
            // Every free flux vanished, spread the budget evenly instead of dividing by 0
            let share = target / n_free as f64;
            self.values
                .iter_mut()
                .zip(mask.iter())
                .filter(|(_, locked)| !**locked)
                .for_each(|(v, _)| *v = share);
        }
    }

    pub fn backup(&self) -> FluxSnapshot {
        FluxSnapshot {
            values: self.values.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: &FluxSnapshot) {
        self.values.copy_from_slice(&snapshot.values);
    }
}

impl FluxSnapshot {
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Standard normal deviate drawn with the polar Box-Muller method
pub fn gaussian_deviate<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    loop {
        let x1 = 2.0 * rng.gen::<f64>() - 1.0;
        let x2 = 2.0 * rng.gen::<f64>() - 1.0;
        let r_squared = x1 * x1 + x2 * x2;
        if r_squared < 1.0 && r_squared > 0.0 {
            return x1 * (-2.0 * r_squared.ln() / r_squared).sqrt();
        }
    }
}
