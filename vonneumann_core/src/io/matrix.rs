//! Stoichiometric matrix reader: one row of signed coefficients per metabolite
use crate::io::{data_lines, IoError};
use crate::network::sparse::SparseNetwork;

/// Parse a dense stoichiometric matrix, every row must have as many columns as the first
pub fn parse_stoichiometric_matrix(content: &str) -> Result<SparseNetwork, IoError> {
    let mut rows: Vec<(Option<String>, Vec<(usize, f64)>)> = Vec::new();
    let mut n_reactions: Option<usize> = None;
    for line in data_lines(content) {
        let mut stoichiometry = Vec::new();
        let mut n_columns = 0;
        for (reaction, column) in line.columns().enumerate() {
            let coefficient: f64 = column.parse().map_err(|_| {
                IoError::malformed(line.number, format!("`{}` is not a coefficient", column))
            })?;
            if coefficient != 0. {
                stoichiometry.push((reaction, coefficient));
            }
            n_columns += 1;
        }
        match n_reactions {
            None => n_reactions = Some(n_columns),
            Some(expected) if expected != n_columns => {
                return Err(IoError::malformed(
                    line.number,
                    format!("{} columns, expected {}", n_columns, expected),
                ))
            }
            Some(_) => {}
        }
        rows.push((line.label.map(str::to_string), stoichiometry));
    }

    let mut network = SparseNetwork::new(n_reactions.unwrap_or(0));
    for (name, stoichiometry) in rows {
        network.add_metabolite(name, &stoichiometry)?;
    }
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_matrix() {
        let network = parse_stoichiometric_matrix("A: -1 1 0\nB: 0 -1 2.5\n").unwrap();
        assert_eq!(network.n_reactions(), 3);
        let dense = network.stoichiometric_matrix();
        assert!((dense[(0, 0)] + 1.).abs() < 1e-25);
        assert!((dense[(1, 2)] - 2.5).abs() < 1e-25);
        assert_eq!(network.metabolite(0).unwrap().input.n_react(), 1);
        assert_eq!(network.metabolite(0).unwrap().output.n_react(), 1);
    }

    #[test]
    fn ragged_rows() {
        match parse_stoichiometric_matrix("-1 1 0\n0 -1\n") {
            Err(IoError::MalformedLine { line, .. }) => assert_eq!(line, 2),
            _ => panic!("Ragged matrix not caught"),
        }
    }

    #[test]
    fn bad_coefficient() {
        assert!(parse_stoichiometric_matrix("-1 one\n").is_err());
    }
}
