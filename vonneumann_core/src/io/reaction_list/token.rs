//! Module providing Token struct for lexing

/// Represents Tokens of a reaction equation
#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    /// Metabolite name
    Word(String),
    /// Stoichiometric coefficient, bare or in parentheses
    Number(f64),
    /// Separator between two terms of a side
    Plus,
    /// Separator between substrates and products
    Arrow,
    Eof,
}
