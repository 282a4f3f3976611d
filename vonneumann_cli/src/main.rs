//! vonNeumann, a minOver sampler of solutions to a von Neumann problem
//!
//! Reads a network (adjacency list, stoichiometric matrix, reaction list or COBRA JSON),
//! then samples flux vectors `s` solving `s (a - rho b) >= 0` up to a maximal rho.
//! Output values are normalised to the number of reactions.
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use vonneumann_core::configuration;
use vonneumann_core::io::output::{write_constraints, write_fluxes};
use vonneumann_core::io::read_network;
use vonneumann_core::network::locks::LockSet;
use vonneumann_core::optimize::annealing::SolverParametersBuilder;
use vonneumann_core::optimize::problem::VonNeumannProblem;
use vonneumann_core::optimize::SolutionStatus;

const LOG_FILE: &str = "von_Neumann.log";

#[derive(Parser, Debug)]
#[command(name = "vonNeumann", version)]
#[command(about = "A minOver sampler of solutions to a von Neumann problem", long_about = None)]
struct Cli {
    /// Network file: adjacency list, stoichiometric matrix, reaction list or COBRA JSON
    file: PathBuf,

    /// Factor eta of the minOver update
    #[arg(short = 'e', long)]
    eta: Option<f64>,

    /// Locked reactions, a comma separated list of `index:value` (indices start at 1)
    #[arg(short = 'L', long = "lock", value_name = "LOCKS")]
    locks: Option<String>,

    /// Initial minOver step budget
    #[arg(short = 'M', long)]
    max_steps: Option<usize>,

    /// Number of solutions
    #[arg(short = 'n', long)]
    n_solutions: Option<usize>,

    /// Output file, stdout when missing
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Initial rho
    #[arg(short = 'r', long)]
    rho_init: Option<f64>,

    /// Maximal rho
    #[arg(short = 'R', long)]
    rho_max: Option<f64>,

    /// Initial increment of rho
    #[arg(short = 'S', long)]
    step_init: Option<f64>,

    /// Increment of rho below which the search stops
    #[arg(short = 's', long)]
    step_min: Option<f64>,

    /// Log every annealing step to stderr instead of the log file
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Seed of the random generator, drawn from entropy when missing
    #[arg(long)]
    seed: Option<u64>,

    /// Also write the constraint margins of every solution to this file
    #[arg(long, value_name = "FILE")]
    constraints: Option<PathBuf>,
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    if verbose {
        builder.target(env_logger::Target::Stderr);
    } else {
        let log_file =
            File::create(LOG_FILE).with_context(|| format!("Unable to create {}", LOG_FILE))?;
        builder
            .target(env_logger::Target::Pipe(Box::new(log_file)))
            .write_style(env_logger::WriteStyle::Never);
    }
    builder.init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let defaults = configuration::current();
    let mut builder = SolverParametersBuilder::default();
    if let Some(eta) = cli.eta {
        builder.eta(eta);
    }
    if let Some(max_steps) = cli.max_steps {
        builder.max_steps(max_steps);
    }
    if let Some(rho_init) = cli.rho_init {
        builder.rho_min(rho_init);
    }
    if let Some(rho_max) = cli.rho_max {
        builder.rho_max(rho_max);
    }
    if let Some(step_init) = cli.step_init {
        builder.step_init(step_init);
    }
    if let Some(step_min) = cli.step_min {
        builder.step_min(step_min);
    }
    let params = builder.build()?;
    // Misconfiguration is fatal before the network is even read
    params.validate()?;

    let (network, format) = read_network(&cli.file)
        .with_context(|| format!("Unable to load {}", cli.file.display()))?;
    info!(
        "The system has {} metabolites and {} Reactions",
        network.n_metabolites(),
        network.n_reactions()
    );
    debug!("Input read as {:?}", format);

    let (locks, n_null) = match &cli.locks {
        Some(spec) => LockSet::parse(spec)?,
        None => (LockSet::new(), 0),
    };
    debug!("{} locks given, {} of them null", locks.len(), n_null);
    let problem = VonNeumannProblem::new(network, locks)?;
    info!(
        "The system has {} locked reactions ({} of them null)",
        problem.locks().len(),
        problem.cascade().n_null()
    );

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Unable to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut constraints_out = match &cli.constraints {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("Unable to create {}", path.display()))?,
        )),
        None => None,
    };

    let n_solutions = cli.n_solutions.unwrap_or(defaults.n_solutions);
    for sol in 0..n_solutions {
        let solution = if cli.verbose {
            problem.solve_with_observer(&params, &mut rng, |progress| {
                debug!("step {} rho {}", progress.step, progress.rho)
            })?
        } else {
            problem.solve(&params, &mut rng)?
        };
        info!("Solution {}, rho = {}", sol + 1, solution.rho);
        if solution.status == SolutionStatus::NoFeasibleRho {
            warn!(
                "Solution {} did not converge at rho = {}, fluxes are not verified",
                sol + 1,
                params.rho_min
            );
        } else if !solution.is_feasible(problem.network(), defaults.tolerance) {
            warn!(
                "Solution {} violates a constraint by more than {} at rho = {}",
                sol + 1,
                defaults.tolerance,
                solution.rho
            );
        }
        write_fluxes(&mut out, &solution.fluxes)?;
        if let Some(writer) = constraints_out.as_mut() {
            writeln!(writer, "# Solution {}, rho = {}", sol + 1, solution.rho)?;
            write_constraints(writer, problem.network(), &solution.fluxes, solution.rho)?;
        }
    }
    out.flush()?;
    if let Some(mut writer) = constraints_out {
        writer.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_short_flags() {
        let cli = Cli::try_parse_from([
            "vonNeumann", "-e", "0.01", "-L", "1:0,3:2", "-M", "500", "-n", "3", "-r", "0.5",
            "-R", "0.9", "-S", "0.01", "-s", "0.001", "-v", "net.txt",
        ])
        .unwrap();
        assert_eq!(cli.file, PathBuf::from("net.txt"));
        assert_eq!(cli.locks.as_deref(), Some("1:0,3:2"));
        assert_eq!(cli.max_steps, Some(500));
        assert_eq!(cli.n_solutions, Some(3));
        assert!((cli.rho_max.unwrap() - 0.9).abs() < 1e-25);
        assert!((cli.step_min.unwrap() - 0.001).abs() < 1e-25);
        assert!(cli.verbose);
        assert!(cli.output.is_none());
    }

    #[test]
    fn file_is_required() {
        assert!(Cli::try_parse_from(["vonNeumann", "-v"]).is_err());
    }
}
