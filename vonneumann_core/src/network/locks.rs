//! This module provides the LockSet, the reactions pinned to externally supplied values
use std::fmt::{Display, Formatter};

use thiserror::Error;

/// A reaction whose flux is fixed to `value`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lock {
    /// Index of the reaction in the flux vector (0-based)
    pub reaction: usize,
    /// Value the flux is pinned to
    pub value: f64,
}

impl Lock {
    /// A lock to zero makes the reaction a null reaction
    pub fn is_null(&self) -> bool {
        self.value == 0.
    }
}

/// Ordered collection of locked reactions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LockSet {
    locks: Vec<Lock>,
}

impl LockSet {
    pub fn new() -> Self {
        LockSet { locks: Vec::new() }
    }

    /// Parse a lock specification of the form `"idx1:value1,idx2:value2,..."`
    ///
    /// Indices are 1-based in the specification and 0-based in the returned set.
    /// Blank entries (e.g. a trailing comma) are skipped. Locking the same reaction
    /// twice to the same value keeps a single lock.
    ///
    /// # Returns
    /// The lock set and the number of locks with a value of exactly 0
    ///
    /// # Examples
    /// ```rust
    /// use vonneumann_core::network::locks::LockSet;
    /// let (locks, n_null) = LockSet::parse("1:0, 3:2.5").unwrap();
    /// assert_eq!(locks.len(), 2);
    /// assert_eq!(n_null, 1);
    /// assert_eq!(locks.get(1).unwrap().reaction, 2);
    /// ```
    pub fn parse(spec: &str) -> Result<(LockSet, usize), LockError> {
        let mut locks = LockSet::new();
        for entry in spec.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (index, value) = match entry.split_once(':') {
                Some(pair) => pair,
                None => return Err(LockError::malformed(entry, "expected `index:value`")),
            };
            let index: usize = index
                .trim()
                .parse()
                .map_err(|_| LockError::malformed(entry, "reaction index is not an integer"))?;
            if index == 0 {
                return Err(LockError::malformed(entry, "reaction indices start at 1"));
            }
            let value: f64 = value
                .trim()
                .parse()
                .map_err(|_| LockError::malformed(entry, "lock value is not a number"))?;
            if !value.is_finite() {
                return Err(LockError::malformed(entry, "lock value is not finite"));
            }
            locks.insert(index - 1, value)?;
        }
        let n_null = locks.iter().filter(|l| l.is_null()).count();
        Ok((locks, n_null))
    }

    /// Add a lock, rejecting a second lock on the same reaction with another value
    pub fn insert(&mut self, reaction: usize, value: f64) -> Result<(), LockError> {
        match self.value_of(reaction) {
            Some(existing) if existing == value => Ok(()),
            Some(existing) => Err(LockError::ConflictingLock {
                reaction: reaction + 1,
                first: existing,
                second: value,
            }),
            None => {
                self.locks.push(Lock { reaction, value });
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Lock> {
        self.locks.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lock> {
        self.locks.iter()
    }

    /// Value a reaction is locked to, if any
    pub fn value_of(&self, reaction: usize) -> Option<f64> {
        self.locks
            .iter()
            .find(|l| l.reaction == reaction)
            .map(|l| l.value)
    }

    pub fn is_locked(&self, reaction: usize) -> bool {
        self.value_of(reaction).is_some()
    }

    /// Reactions locked to exactly 0, in lock order
    pub fn partition_null(&self) -> Vec<usize> {
        self.locks
            .iter()
            .filter(|l| l.is_null())
            .map(|l| l.reaction)
            .collect()
    }

    /// Lock to zero reactions discovered to be null
    ///
    /// Existing locks are left untouched; reactions already locked to zero are skipped.
    ///
    /// # Returns
    /// The total number of locks after the update
    pub fn extend_with_newly_nulled(&mut self, reactions: &[usize]) -> Result<usize, LockError> {
        for &reaction in reactions {
            match self.value_of(reaction) {
                Some(value) if value == 0. => {}
                Some(value) => {
                    return Err(LockError::LockedReactionForcedNull {
                        reaction: reaction + 1,
                        value,
                    })
                }
                None => self.locks.push(Lock {
                    reaction,
                    value: 0.,
                }),
            }
        }
        Ok(self.locks.len())
    }

    /// Check every lock references a reaction of a network with `n_reactions` reactions
    pub fn validate(&self, n_reactions: usize) -> Result<(), LockError> {
        match self.locks.iter().find(|l| l.reaction >= n_reactions) {
            Some(lock) => Err(LockError::ReactionOutOfRange {
                reaction: lock.reaction + 1,
                n_reactions,
            }),
            None => Ok(()),
        }
    }

    /// Sum of all locked values
    pub fn locked_total(&self) -> f64 {
        self.locks.iter().map(|l| l.value).sum()
    }

    /// Overwrite the locked entries of a flux vector with their pinned values
    pub fn pin(&self, fluxes: &mut [f64]) {
        for lock in &self.locks {
            fluxes[lock.reaction] = lock.value;
        }
    }

    /// Mask of locked reactions for a flux vector of length `n_reactions`
    pub fn mask(&self, n_reactions: usize) -> Vec<bool> {
        let mut mask = vec![false; n_reactions];
        for lock in &self.locks {
            if let Some(slot) = mask.get_mut(lock.reaction) {
                *slot = true;
            }
        }
        mask
    }
}

impl Display for LockSet {
    /// Formats back into the `idx:value,...` specification syntax
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let entries: Vec<String> = self
            .locks
            .iter()
            .map(|l| format!("{}:{}", l.reaction + 1, l.value))
            .collect();
        write!(f, "{}", entries.join(","))
    }
}

/// Errors associated with locked reactions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LockError {
    /// An entry of the lock specification could not be read
    #[error("Malformed lock specification `{entry}`: {reason}")]
    MalformedLockSpec { entry: String, reason: String },
    /// A lock references a reaction the network does not have (1-based)
    #[error("Locked reaction {reaction} does not exist, the network has {n_reactions} reactions")]
    ReactionOutOfRange { reaction: usize, n_reactions: usize },
    /// The same reaction was locked twice to different values (1-based)
    #[error("Reaction {reaction} is locked to both {first} and {second}")]
    ConflictingLock {
        reaction: usize,
        first: f64,
        second: f64,
    },
    /// A reaction locked to a non-zero value can only carry zero flux (1-based)
    #[error("Reaction {reaction} is locked to {value} but consumes a metabolite nothing can produce")]
    LockedReactionForcedNull { reaction: usize, value: f64 },
}

impl LockError {
    fn malformed(entry: &str, reason: &str) -> Self {
        LockError::MalformedLockSpec {
            entry: entry.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single() {
        let (locks, n_null) = LockSet::parse("4:1.5").unwrap();
        assert_eq!(locks.len(), 1);
        assert_eq!(n_null, 0);
        let lock = locks.get(0).unwrap();
        assert_eq!(lock.reaction, 3);
        assert!((lock.value - 1.5).abs() < 1e-25);
    }

    #[test]
    fn parse_several_with_zeros() {
        let (locks, n_null) = LockSet::parse("1:0,2:0.0, 5 : 3,").unwrap();
        assert_eq!(locks.len(), 3);
        assert_eq!(n_null, 2);
        assert_eq!(locks.partition_null(), vec![0, 1]);
        assert!((locks.locked_total() - 3.).abs() < 1e-25);
    }

    #[test]
    fn parse_empty() {
        let (locks, n_null) = LockSet::parse("").unwrap();
        assert!(locks.is_empty());
        assert_eq!(n_null, 0);
    }

    #[test]
    fn parse_malformed() {
        for spec in ["1", "a:2", "2:b", "0:1", ":", "1:inf"] {
            match LockSet::parse(spec) {
                Err(LockError::MalformedLockSpec { .. }) => {}
                _ => panic!("Malformed spec `{}` not caught", spec),
            }
        }
    }

    #[test]
    fn parse_conflicting() {
        match LockSet::parse("2:1,2:3") {
            Err(LockError::ConflictingLock { reaction, .. }) => assert_eq!(reaction, 2),
            _ => panic!("Conflicting locks not caught"),
        }
        let (locks, _) = LockSet::parse("2:1,2:1").unwrap();
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn extend_preserves_existing() {
        let (mut locks, _) = LockSet::parse("1:0,3:2").unwrap();
        let original: Vec<Lock> = locks.iter().copied().collect();
        let total = locks.extend_with_newly_nulled(&[1, 0, 4]).unwrap();
        assert_eq!(total, 4);
        for lock in &original {
            assert_eq!(locks.value_of(lock.reaction), Some(lock.value));
        }
        assert_eq!(locks.partition_null(), vec![0, 1, 4]);
    }

    #[test]
    fn extend_conflicts_with_non_zero_lock() {
        let (mut locks, _) = LockSet::parse("3:2").unwrap();
        match locks.extend_with_newly_nulled(&[2]) {
            Err(LockError::LockedReactionForcedNull { reaction, .. }) => assert_eq!(reaction, 3),
            _ => panic!("Forced null lock not caught"),
        }
    }

    #[test]
    fn validate_range() {
        let (locks, _) = LockSet::parse("3:1").unwrap();
        assert!(locks.validate(3).is_ok());
        assert!(locks.validate(2).is_err());
    }

    #[test]
    fn pin_and_display() {
        let (locks, _) = LockSet::parse("1:0,3:2").unwrap();
        let mut fluxes = vec![5., 5., 5.];
        locks.pin(&mut fluxes);
        assert_eq!(fluxes, vec![0., 5., 2.]);
        assert_eq!(locks.mask(3), vec![true, false, true]);
        assert_eq!(format!("{}", locks), "1:0,3:2");
    }
}
