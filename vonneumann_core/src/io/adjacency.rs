//! Adjacency list reader: `[name:] r1 c1 r2 c2 ...` per metabolite, reactions counted from 1
use crate::io::{data_lines, IoError};
use crate::network::sparse::SparseNetwork;

/// Parse an adjacency list
///
/// The number of reactions is the largest reaction index found. Zero coefficients
/// are skipped.
///
/// # Examples
/// ```rust
/// use vonneumann_core::io::adjacency::parse_adjacency_list;
/// let network = parse_adjacency_list("A: 1 -1 2 1\nB: 2 -1 3 1\n").unwrap();
/// assert_eq!(network.n_reactions(), 3);
/// assert_eq!(network.metabolite(1).unwrap().name.as_deref(), Some("B"));
/// ```
pub fn parse_adjacency_list(content: &str) -> Result<SparseNetwork, IoError> {
    let mut rows: Vec<(Option<String>, Vec<(usize, f64)>)> = Vec::new();
    let mut n_reactions = 0;
    for line in data_lines(content) {
        let columns: Vec<&str> = line.columns().collect();
        if columns.len() % 2 != 0 {
            return Err(IoError::malformed(
                line.number,
                format!("odd number of columns ({})", columns.len()),
            ));
        }
        let mut stoichiometry = Vec::with_capacity(columns.len() / 2);
        for pair in columns.chunks(2) {
            let reaction: usize = pair[0].parse().map_err(|_| {
                IoError::malformed(line.number, format!("`{}` is not a reaction index", pair[0]))
            })?;
            if reaction == 0 {
                return Err(IoError::malformed(line.number, "reaction indices start at 1"));
            }
            let coefficient: f64 = pair[1].parse().map_err(|_| {
                IoError::malformed(line.number, format!("`{}` is not a coefficient", pair[1]))
            })?;
            n_reactions = n_reactions.max(reaction);
            if coefficient != 0. {
                stoichiometry.push((reaction - 1, coefficient));
            }
        }
        rows.push((line.label.map(str::to_string), stoichiometry));
    }

    let mut network = SparseNetwork::new(n_reactions);
    for (name, stoichiometry) in rows {
        network.add_metabolite(name, &stoichiometry)?;
    }
    Ok(network)
}
