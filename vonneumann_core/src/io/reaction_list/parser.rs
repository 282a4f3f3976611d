use thiserror::Error;

use crate::io::reaction_list::token::Token;
/*
Reaction Grammar:
reaction -> side ARROW side ;
side -> ( term ( "+" term )* )? ;
term -> NUMBER WORD | WORD WORD | WORD ;

In `WORD WORD` the first word is the coefficient, a lone WORD has coefficient 1.
e.g. 2 A + (0.5) B --> C
 */

/// Substrates and products of one reaction, as `(metabolite name, coefficient)` pairs
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedReaction {
    pub substrates: Vec<(String, f64)>,
    pub products: Vec<(String, f64)>,
}

/// Reaction equation parser
pub struct ReactionParser {
    /// Vector of tokens from the equation
    tokens: Vec<Token>,
    /// Current token being processed
    current: usize,
}

impl ReactionParser {
    /// Create a new ReactionParser, `tokens` must end with [`Token::Eof`]
    pub fn new(tokens: Vec<Token>) -> ReactionParser {
        ReactionParser { tokens, current: 0 }
    }

    // region Parsing Functions

    /// Parse the token vector into substrates and products
    pub fn parse(&mut self) -> Result<ParsedReaction, ParseError> {
        let substrates = self.side()?;
        if !self.match_token(Token::Arrow) {
            return Err(ParseError::MissingArrow);
        }
        let products = self.side()?;
        if self.check(&Token::Arrow) {
            return Err(ParseError::ExtraArrow);
        }
        if !self.is_at_end() {
            return Err(ParseError::EarlyTermination);
        }
        Ok(ParsedReaction {
            substrates,
            products,
        })
    }

    fn side(&mut self) -> Result<Vec<(String, f64)>, ParseError> {
        let mut terms = Vec::new();
        if self.is_at_end() || self.check(&Token::Arrow) {
            // Empty side, a source or a sink
            return Ok(terms);
        }
        terms.push(self.term()?);
        while self.match_token(Token::Plus) {
            terms.push(self.term()?);
        }
        Ok(terms)
    }

    fn term(&mut self) -> Result<(String, f64), ParseError> {
        match self.advance() {
            Token::Number(coefficient) => {
                let coefficient = Self::validate_coefficient(coefficient, &coefficient.to_string())?;
                match self.match_word() {
                    Some(name) => Ok((name, coefficient)),
                    None => Err(ParseError::ExpectedMetabolite),
                }
            }
            Token::Word(first) => match self.match_word() {
                Some(name) => {
                    let coefficient = first
                        .parse::<f64>()
                        .map_err(|_| ParseError::InvalidCoefficient(first.clone()))?;
                    let coefficient = Self::validate_coefficient(coefficient, &first)?;
                    Ok((name, coefficient))
                }
                None => Ok((first, 1.)),
            },
            _ => Err(ParseError::ExpectedMetabolite),
        }
    }

    fn validate_coefficient(coefficient: f64, text: &str) -> Result<f64, ParseError> {
        if coefficient > 0. && coefficient.is_finite() {
            Ok(coefficient)
        } else {
            Err(ParseError::InvalidCoefficient(text.to_string()))
        }
    }

    // endregion Parsing Functions

    // region parsing helper functions

    /// If the current token is `token`, advance and return true
    fn match_token(&mut self, token: Token) -> bool {
        if self.check(&token) {
            self.advance();
            return true;
        }
        false
    }

    /// If the current token is a word, advance and return it
    fn match_word(&mut self) -> Option<String> {
        if let Token::Word(word) = self.peek() {
            self.advance();
            return Some(word);
        }
        None
    }

    fn check(&self, token: &Token) -> bool {
        if self.is_at_end() {
            return false;
        }
        self.peek() == *token
    }

    /// Advance one position unless at the end, then return the previous token
    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
            return self.tokens[self.current - 1].clone();
        }
        Token::Eof
    }

    fn is_at_end(&self) -> bool {
        self.peek() == Token::Eof
    }

    /// Get a copy of the current token
    fn peek(&self) -> Token {
        self.tokens.get(self.current).cloned().unwrap_or(Token::Eof)
    }

    // endregion parsing helper functions
}

/// Enum representing possible parse errors
#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParseError {
    #[error("Missing arrow between substrates and products")]
    MissingArrow,
    #[error("More than one arrow in a reaction")]
    ExtraArrow,
    #[error("Expected a metabolite name")]
    ExpectedMetabolite,
    #[error("`{0}` is not a positive coefficient")]
    InvalidCoefficient(String),
    #[error("Unexpected tokens after the products")]
    EarlyTermination,
}
