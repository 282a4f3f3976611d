use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use vonneumann_core::io::{parse_network, read_network};
use vonneumann_core::network::sparse::SparseNetwork;
use vonneumann_core::optimize::annealing::{SolverParameters, SolverParametersBuilder};
use vonneumann_core::optimize::problem::VonNeumannProblem;
use vonneumann_core::optimize::FluxSolution;

fn value_error<E: std::fmt::Display>(err: E) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Metabolic network, read from any of the supported file formats
#[pyclass]
#[derive(Clone)]
struct PyNetwork {
    inner: SparseNetwork,
}

#[pymethods]
impl PyNetwork {
    #[staticmethod]
    fn from_file(path: String) -> PyResult<Self> {
        let (inner, _) = read_network(path).map_err(value_error)?;
        Ok(PyNetwork { inner })
    }

    #[staticmethod]
    fn from_string(content: &str) -> PyResult<Self> {
        let (inner, _) = parse_network(content).map_err(value_error)?;
        Ok(PyNetwork { inner })
    }

    #[getter]
    fn n_reactions(&self) -> usize {
        self.inner.n_reactions()
    }

    #[getter]
    fn n_metabolites(&self) -> usize {
        self.inner.n_metabolites()
    }

    /// Constraint margin of every metabolite for the given fluxes
    fn constraints(&self, fluxes: Vec<f64>, rho: f64) -> PyResult<Vec<f64>> {
        if fluxes.len() != self.inner.n_reactions() {
            return Err(PyValueError::new_err(format!(
                "expected {} fluxes, got {}",
                self.inner.n_reactions(),
                fluxes.len()
            )));
        }
        Ok(self.inner.constraints(&fluxes, rho))
    }
}

/// One sampled flux vector
#[pyclass(get_all)]
struct PySolution {
    rho: f64,
    fluxes: Vec<f64>,
    status: String,
    trials: usize,
}

impl From<FluxSolution> for PySolution {
    fn from(solution: FluxSolution) -> Self {
        PySolution {
            rho: solution.rho,
            fluxes: solution.fluxes,
            status: format!("{:?}", solution.status),
            trials: solution.trials,
        }
    }
}

/// Network with its locked reactions, ready to be sampled
#[pyclass]
struct PyProblem {
    inner: VonNeumannProblem,
    params: SolverParameters,
    rng: StdRng,
}

#[pymethods]
impl PyProblem {
    #[new]
    #[pyo3(signature = (network, locks=None, rho_min=None, rho_max=None, eta=None, max_steps=None, step_init=None, step_min=None, seed=None))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        network: &PyNetwork,
        locks: Option<&str>,
        rho_min: Option<f64>,
        rho_max: Option<f64>,
        eta: Option<f64>,
        max_steps: Option<usize>,
        step_init: Option<f64>,
        step_min: Option<f64>,
        seed: Option<u64>,
    ) -> PyResult<Self> {
        let mut builder = SolverParametersBuilder::default();
        if let Some(rho_min) = rho_min {
            builder.rho_min(rho_min);
        }
        if let Some(rho_max) = rho_max {
            builder.rho_max(rho_max);
        }
        if let Some(eta) = eta {
            builder.eta(eta);
        }
        if let Some(max_steps) = max_steps {
            builder.max_steps(max_steps);
        }
        if let Some(step_init) = step_init {
            builder.step_init(step_init);
        }
        if let Some(step_min) = step_min {
            builder.step_min(step_min);
        }
        let params = builder.build().map_err(value_error)?;
        params.validate().map_err(value_error)?;
        let inner = VonNeumannProblem::with_lock_spec(network.inner.clone(), locks.unwrap_or(""))
            .map_err(value_error)?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(PyProblem { inner, params, rng })
    }

    /// Draw one solution
    fn solve(&mut self) -> PyResult<PySolution> {
        let solution = self
            .inner
            .solve(&self.params, &mut self.rng)
            .map_err(value_error)?;
        Ok(solution.into())
    }

    /// Draw `n` independent solutions
    fn sample(&mut self, n: usize) -> PyResult<Vec<PySolution>> {
        let solutions = self
            .inner
            .sample(n, &self.params, &mut self.rng)
            .map_err(value_error)?;
        Ok(solutions.into_iter().map(PySolution::from).collect())
    }

    /// Reactions pinned by the user or forced to zero, as 0-based `(reaction, value)` pairs
    fn locks(&self) -> Vec<(usize, f64)> {
        self.inner
            .locks()
            .iter()
            .map(|l| (l.reaction, l.value))
            .collect()
    }
}

/// A Python module implemented in Rust. The name of this function must match
/// the `lib.name` setting in the `Cargo.toml`, else Python will not be able to
/// import the module.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyNetwork>()?;
    m.add_class::<PyProblem>()?;
    m.add_class::<PySolution>()?;
    Ok(())
}
