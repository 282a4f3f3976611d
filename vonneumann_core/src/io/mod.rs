//! Module for reading and writing networks
//!
//! Three plain text formats are understood, plus COBRA JSON models:
//! - adjacency list: one metabolite per line, `[name:] r1 c1 r2 c2 ...` with 1-based
//!   reaction indices and signed coefficients
//! - stoichiometric matrix: one metabolite per line, one signed coefficient per reaction
//! - reaction list: one reaction per line, `[name:] 2 A + B --> C`
use std::fs;
use std::path::Path;

use log::info;
use thiserror::Error;

use crate::io::json::JsonError;
use crate::io::reaction_list::ReactionListError;
use crate::network::sparse::{NetworkError, SparseNetwork};

pub mod adjacency;
pub mod json;
pub mod matrix;
pub mod output;
pub mod reaction_list;

/// Format of a network file
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputFormat {
    AdjacencyList,
    StoichiometricMatrix,
    ReactionList,
    JsonModel,
}

/// Guess the format of a network file from its content
///
/// A JSON object is a COBRA model. Otherwise, a `>` on any data line makes a
/// reaction list, data lines all holding the same number of columns make a
/// stoichiometric matrix, and anything else is an adjacency list.
///
/// # Examples
/// ```rust
/// use vonneumann_core::io::{detect_format, InputFormat};
/// assert_eq!(detect_format("A --> B\n").unwrap(), InputFormat::ReactionList);
/// assert_eq!(detect_format("-1 1\n0 -1\n").unwrap(), InputFormat::StoichiometricMatrix);
/// assert_eq!(detect_format("1 -1 2 1\n2 -1\n").unwrap(), InputFormat::AdjacencyList);
/// ```
pub fn detect_format(content: &str) -> Result<InputFormat, IoError> {
    if content.trim_start().starts_with('{') {
        return Ok(InputFormat::JsonModel);
    }
    let lines: Vec<DataLine> = data_lines(content).collect();
    let first = match lines.first() {
        Some(line) => line,
        None => return Err(IoError::UnknownFileType),
    };
    if lines.iter().any(|l| l.text.contains('>')) {
        return Ok(InputFormat::ReactionList);
    }
    let n_columns = first.columns().count();
    if lines.iter().all(|l| l.columns().count() == n_columns) {
        Ok(InputFormat::StoichiometricMatrix)
    } else {
        Ok(InputFormat::AdjacencyList)
    }
}

/// Parse a network, detecting its format
pub fn parse_network(content: &str) -> Result<(SparseNetwork, InputFormat), IoError> {
    let format = detect_format(content)?;
    let network = parse_network_as(content, format)?;
    Ok((network, format))
}

/// Parse a network in a known format
pub fn parse_network_as(content: &str, format: InputFormat) -> Result<SparseNetwork, IoError> {
    match format {
        InputFormat::AdjacencyList => adjacency::parse_adjacency_list(content),
        InputFormat::StoichiometricMatrix => matrix::parse_stoichiometric_matrix(content),
        InputFormat::ReactionList => Ok(reaction_list::parse_reaction_list(content)?),
        InputFormat::JsonModel => Ok(json::parse_json_network(content)?),
    }
}

/// Read and parse a network file, detecting its format
pub fn read_network<P: AsRef<Path>>(path: P) -> Result<(SparseNetwork, InputFormat), IoError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|err| IoError::UnableToRead {
        path: path.display().to_string(),
        source: err,
    })?;
    let (network, format) = parse_network(&content)?;
    info!(
        "Read {:?} from {}: {} metabolites and {} reactions",
        format,
        path.display(),
        network.n_metabolites(),
        network.n_reactions()
    );
    Ok((network, format))
}

// region Line helpers
/// A non-blank, non-comment line, split from its optional `name:` label
pub(crate) struct DataLine<'a> {
    /// 1-based line number in the file
    pub number: usize,
    pub label: Option<&'a str>,
    /// Text after the label
    pub text: &'a str,
}

impl<'a> DataLine<'a> {
    pub fn columns(&self) -> std::str::SplitWhitespace<'a> {
        self.text.split_whitespace()
    }
}

/// Lines carrying data: blank lines and lines starting with `#` are skipped
pub(crate) fn data_lines(content: &str) -> impl Iterator<Item = DataLine<'_>> {
    content.lines().enumerate().filter_map(|(index, line)| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        let (label, text) = match trimmed.split_once(':') {
            Some((label, text)) => (Some(label.trim()).filter(|l| !l.is_empty()), text),
            None => (None, trimmed),
        };
        Some(DataLine {
            number: index + 1,
            label,
            text,
        })
    })
}

/// Name used for a metabolite in written files
pub(crate) fn metabolite_label(network: &SparseNetwork, index: usize) -> String {
    match network.metabolite(index).and_then(|m| m.name.as_deref()) {
        Some(name) => name.to_string(),
        None => format!("M{}", index + 1),
    }
}

/// Name used for a reaction in written files
pub(crate) fn reaction_label(network: &SparseNetwork, index: usize) -> String {
    match network.reaction_name(index) {
        Some(name) => name.to_string(),
        None => format!("R{}", index + 1),
    }
}
// endregion Line helpers

/// Errors raised while reading or writing networks
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Unable to read {path}: {source}")]
    UnableToRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Unable to write: {0}")]
    UnableToWrite(#[from] std::io::Error),
    /// The content holds no data line
    #[error("Unknown input file type")]
    UnknownFileType,
    /// A line of an adjacency list or matrix could not be read
    #[error("Line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },
    #[error(transparent)]
    ReactionList(#[from] ReactionListError),
    #[error(transparent)]
    Json(#[from] JsonError),
    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl IoError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        IoError::MalformedLine {
            line,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_data(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join(name)
    }

    #[test]
    fn detect_formats() {
        assert_eq!(
            detect_format("# comment\nR1: A + B --> C\n").unwrap(),
            InputFormat::ReactionList
        );
        assert_eq!(
            detect_format("A: -1 1 0\nB: 0 -1 1\n").unwrap(),
            InputFormat::StoichiometricMatrix
        );
        assert_eq!(
            detect_format("A: 1 -1 2 1\nB: 2 -1 3 1 1 -2\n").unwrap(),
            InputFormat::AdjacencyList
        );
        assert_eq!(
            detect_format("  {\"metabolites\": []}").unwrap(),
            InputFormat::JsonModel
        );
    }

    #[test]
    fn unknown_file_type() {
        match detect_format("# only a comment\n\n") {
            Err(IoError::UnknownFileType) => {}
            _ => panic!("Empty file not rejected"),
        }
    }

    #[test]
    fn data_lines_split_labels() {
        let lines: Vec<DataLine> = data_lines("#c\n\nA: 1 2\n 3 4 \n: 5\n").collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].number, 3);
        assert_eq!(lines[0].label, Some("A"));
        assert_eq!(lines[1].label, None);
        assert_eq!(lines[1].columns().collect::<Vec<_>>(), vec!["3", "4"]);
        assert_eq!(lines[2].label, None);
    }

    #[test]
    fn read_every_fixture() {
        let expected = [
            ("toy_adjacency.txt", InputFormat::AdjacencyList),
            ("toy_matrix.txt", InputFormat::StoichiometricMatrix),
            ("toy_reactions.txt", InputFormat::ReactionList),
            ("toy_model.json", InputFormat::JsonModel),
        ];
        let mut networks = Vec::new();
        for (name, format) in expected {
            let (network, detected) = read_network(test_data(name)).unwrap();
            assert_eq!(detected, format, "Wrong format for {}", name);
            assert_eq!(network.n_reactions(), 4);
            assert_eq!(network.n_metabolites(), 3);
            networks.push(network);
        }
        // All fixtures describe the same network
        for network in &networks[1..] {
            assert!(network.is_isomorphic_to(&networks[0]));
        }
    }

    #[test]
    fn missing_file() {
        match read_network(test_data("does_not_exist.txt")) {
            Err(IoError::UnableToRead { .. }) => {}
            _ => panic!("Missing file not reported"),
        }
    }
}
