//! Core rust implementation of vonNeumann, a crate for finding the maximal growth rate of
//! metabolic networks in the von Neumann model.
//!
//! A network is read with [`io::read_network`], wrapped with its locked reactions into an
//! [`optimize::problem::VonNeumannProblem`], and solved by annealing the growth rate while
//! the minOver perceptron rule keeps every metabolite constraint satisfied.

pub mod configuration;
pub mod io;
pub mod network;
pub mod optimize;
