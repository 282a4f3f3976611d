//! Writers for solutions and networks
//!
//! Every writer takes any [`Write`], so the same code serves files, stdout and in-memory
//! buffers. Networks written here are read back by the parsers of [`crate::io`].
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::io::{metabolite_label, reaction_label, IoError};
use crate::network::sparse::SparseNetwork;

/// Write one solution as a line of space separated fluxes
pub fn write_fluxes<W: Write>(writer: &mut W, fluxes: &[f64]) -> Result<(), IoError> {
    for flux in fluxes {
        write!(writer, "{} ", flux)?;
    }
    writeln!(writer)?;
    Ok(())
}

/// Write every solution to `path`, one line each
pub fn write_flux_file<P: AsRef<Path>>(path: P, solutions: &[Vec<f64>]) -> Result<(), IoError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for fluxes in solutions {
        write_fluxes(&mut writer, fluxes)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a network as an adjacency list, `name: r c r c ...` with 1-based reactions
pub fn write_adjacency_list<W: Write>(
    writer: &mut W,
    network: &SparseNetwork,
) -> Result<(), IoError> {
    for (index, met) in network.metabolites().iter().enumerate() {
        write!(writer, "{}:", metabolite_label(network, index))?;
        for entry in met.input.iter() {
            write!(writer, " {} {}", entry.reaction + 1, -entry.coefficient)?;
        }
        for entry in met.output.iter() {
            write!(writer, " {} {}", entry.reaction + 1, entry.coefficient)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Write a network as a dense stoichiometric matrix, one labelled row per metabolite
pub fn write_stoichiometric_matrix<W: Write>(
    writer: &mut W,
    network: &SparseNetwork,
) -> Result<(), IoError> {
    let dense = network.stoichiometric_matrix();
    for (index, row) in dense.row_iter().enumerate() {
        write!(writer, "{}:", metabolite_label(network, index))?;
        for value in row.iter() {
            write!(writer, " {}", value)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Write a network as a reaction list, `name: (2) A + B --> C`
///
/// Unit coefficients are left out.
pub fn write_reaction_list<W: Write>(
    writer: &mut W,
    network: &SparseNetwork,
) -> Result<(), IoError> {
    let n_reactions = network.n_reactions();
    let mut substrates: Vec<Vec<String>> = vec![Vec::new(); n_reactions];
    let mut products: Vec<Vec<String>> = vec![Vec::new(); n_reactions];
    for (index, met) in network.metabolites().iter().enumerate() {
        let label = metabolite_label(network, index);
        for entry in met.input.iter() {
            substrates[entry.reaction].push(term(entry.coefficient, &label));
        }
        for entry in met.output.iter() {
            products[entry.reaction].push(term(entry.coefficient, &label));
        }
    }
    for reaction in 0..n_reactions {
        writeln!(
            writer,
            "{}: {} --> {}",
            reaction_label(network, reaction),
            substrates[reaction].join(" + "),
            products[reaction].join(" + ")
        )?;
    }
    Ok(())
}

fn term(coefficient: f64, label: &str) -> String {
    if coefficient == 1. {
        label.to_string()
    } else {
        format!("({}) {}", coefficient, label)
    }
}

/// Write the constraint margin of every metabolite at growth rate `rho`
///
/// Metabolites are numbered from 0, one `Metabolite i c margin` line each.
pub fn write_constraints<W: Write>(
    writer: &mut W,
    network: &SparseNetwork,
    fluxes: &[f64],
    rho: f64,
) -> Result<(), IoError> {
    for (index, margin) in network.constraints(fluxes, rho).iter().enumerate() {
        writeln!(writer, "Metabolite {} c {}", index, margin)?;
    }
    Ok(())
}
