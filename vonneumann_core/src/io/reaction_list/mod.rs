//! Module for parsing reaction lists, one `[name:] substrates --> products` equation per line

use indexmap::IndexMap;
use thiserror::Error;

use crate::io::data_lines;
use crate::io::reaction_list::lexer::LexerError;
use crate::io::reaction_list::parser::{ParseError, ParsedReaction};
use crate::network::sparse::{NetworkError, SparseNetwork};

pub mod lexer;
pub mod parser;
pub mod token;

/// Parse a single reaction equation
///
/// # Examples
/// ```rust
/// use vonneumann_core::io::reaction_list::parse_reaction;
/// let reaction = parse_reaction("2 glc + atp --> (0.5) g6p").unwrap();
/// assert_eq!(reaction.substrates[0], ("glc".to_string(), 2.));
/// assert_eq!(reaction.products.len(), 1);
/// ```
pub fn parse_reaction(input: &str) -> Result<ParsedReaction, ReactionListError> {
    parse_line(input, 1)
}

fn parse_line(input: &str, line: usize) -> Result<ParsedReaction, ReactionListError> {
    let mut lexer = lexer::Lexer::new(input);
    let tokens: Vec<_> = lexer
        .scan_tokens()
        .map_err(|source| ReactionListError::LexingError { line, source })?
        .iter()
        .cloned()
        .collect();
    let mut parser = parser::ReactionParser::new(tokens);
    parser
        .parse()
        .map_err(|source| ReactionListError::ParsingError { line, source })
}

/// Parse a reaction list into a network
///
/// Reactions are numbered in line order, metabolites in order of first appearance.
/// A label before `:` becomes the reaction name.
pub fn parse_reaction_list(content: &str) -> Result<SparseNetwork, ReactionListError> {
    let mut metabolites: IndexMap<String, Vec<(usize, f64)>> = IndexMap::new();
    let mut reaction_names: Vec<Option<String>> = Vec::new();
    for line in data_lines(content) {
        let reaction = reaction_names.len();
        let parsed = parse_line(line.text, line.number)?;
        for (name, coefficient) in parsed.substrates {
            metabolites.entry(name).or_default().push((reaction, -coefficient));
        }
        for (name, coefficient) in parsed.products {
            metabolites.entry(name).or_default().push((reaction, coefficient));
        }
        reaction_names.push(line.label.map(str::to_string));
    }

    let mut network = SparseNetwork::new(reaction_names.len());
    for (reaction, name) in reaction_names.iter().enumerate() {
        if let Some(name) = name {
            network.set_reaction_name(reaction, name)?;
        }
    }
    for (name, stoichiometry) in metabolites {
        network.add_metabolite(Some(name), &stoichiometry)?;
    }
    Ok(network)
}

/// Enum representing possible lex and parse errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReactionListError {
    /// Lexing Error
    #[error("Line {line}: {source}")]
    LexingError { line: usize, source: LexerError },
    /// Parsing Error
    #[error("Line {line}: {source}")]
    ParsingError { line: usize, source: ParseError },
    #[error(transparent)]
    Network(#[from] NetworkError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list() {
        let content = "# glycolysis, roughly\nHEX: glc + atp --> g6p + adp\nPGI: g6p --> f6p\nEX_glc: --> glc\n";
        let network = parse_reaction_list(content).unwrap();
        assert_eq!(network.n_reactions(), 3);
        assert_eq!(network.n_metabolites(), 5);
        assert_eq!(network.reaction_name(0), Some("HEX"));
        assert_eq!(network.reaction_name(2), Some("EX_glc"));

        let names: Vec<&str> = network
            .metabolites()
            .iter()
            .map(|m| m.name.as_deref().unwrap_or(""))
            .collect();
        assert_eq!(names, vec!["glc", "atp", "g6p", "adp", "f6p"]);

        // glc is consumed by HEX and produced by the exchange
        let glc = network.metabolite(0).unwrap();
        assert_eq!(glc.input.entries()[0].reaction, 0);
        assert_eq!(glc.output.entries()[0].reaction, 2);
        // g6p is produced by HEX and consumed by PGI
        assert!((network.metabolite(2).unwrap().signed_coefficient(1) + 1.).abs() < 1e-25);
    }

    #[test]
    fn same_metabolite_on_both_sides() {
        let network = parse_reaction_list("A + B --> 2 A\n").unwrap();
        let a = network.metabolite(0).unwrap();
        assert_eq!(a.input.n_react(), 1);
        assert_eq!(a.output.n_react(), 1);
        assert!((a.signed_coefficient(0) - 1.).abs() < 1e-25);
    }

    #[test]
    fn error_reports_line() {
        match parse_reaction_list("A --> B\n\nC + D\n") {
            Err(ReactionListError::ParsingError { line, source }) => {
                assert_eq!(line, 3);
                assert_eq!(source, ParseError::MissingArrow);
            }
            _ => panic!("Missing arrow not caught"),
        }
        match parse_reaction_list("A <=> B\n") {
            Err(ReactionListError::LexingError { line, .. }) => assert_eq!(line, 1),
            _ => panic!("Reversible arrow not caught"),
        }
    }
}
