//! Lex a reaction equation into a series of tokens for later parsing

use std::collections::VecDeque;

use thiserror::Error;

use crate::io::reaction_list::token::Token;

pub struct Lexer {
    source: Vec<char>,
    tokens: VecDeque<Token>,
    start: usize,
    current: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            tokens: VecDeque::new(),
            start: 0,
            current: 0,
        }
    }

    pub fn scan_tokens(&mut self) -> Result<&VecDeque<Token>, LexerError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens.push_back(Token::Eof);
        Ok(&self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), LexerError> {
        let c: char = self.advance();
        match c {
            // Whitespace
            ' ' | '\r' | '\n' | '\t' => {}
            // A lone plus separates terms, a plus inside a word belongs to the name (e.g. H+)
            '+' if Lexer::is_separator(self.peek()) => self.add_token(Token::Plus),
            '-' if self.peek() == '>' => {
                self.advance();
                self.add_token(Token::Arrow)
            }
            '-' if self.peek() == '-' && self.peek_next() == '>' => {
                self.advance();
                self.advance();
                self.add_token(Token::Arrow)
            }
            '=' if self.peek() == '>' => {
                self.advance();
                self.add_token(Token::Arrow)
            }
            '<' if self.peek() == '=' || self.peek() == '-' => {
                return Err(LexerError::ReversibleArrow)
            }
            '(' => self.read_coefficient()?,
            _ => self.read_word(),
        };
        Ok(())
    }

    fn advance(&mut self) -> char {
        let char_at_current = self.source[self.current];
        self.current += 1;
        char_at_current
    }

    /// Coefficient written in parentheses, e.g. `(2.5)`
    fn read_coefficient(&mut self) -> Result<(), LexerError> {
        while !self.is_at_end() && self.peek() != ')' {
            self.advance();
        }
        if self.is_at_end() {
            return Err(LexerError::UnclosedParenthesis);
        }
        let text: String = self.source[self.start + 1..self.current].iter().collect();
        // Closing parenthesis
        self.advance();
        match text.trim().parse::<f64>() {
            Ok(value) => {
                self.add_token(Token::Number(value));
                Ok(())
            }
            Err(_) => Err(LexerError::InvalidCoefficient(text)),
        }
    }

    /// Anything up to the next whitespace or arrow
    fn read_word(&mut self) {
        while !self.is_at_end() && !Lexer::is_separator(self.peek()) && !self.arrow_ahead() {
            self.advance();
        }
        let text: String = self.source[self.start..self.current].iter().collect();
        self.add_token(Token::Word(text));
    }

    fn arrow_ahead(&self) -> bool {
        match self.peek() {
            '-' => self.peek_next() == '>' || (self.peek_next() == '-' && self.peek_at(2) == '>'),
            '=' => self.peek_next() == '>',
            _ => false,
        }
    }

    fn is_separator(c: char) -> bool {
        matches!(c, ' ' | '\r' | '\n' | '\t' | '\0')
    }

    fn peek(&self) -> char {
        self.peek_at(0)
    }

    fn peek_next(&self) -> char {
        self.peek_at(1)
    }

    fn peek_at(&self, offset: usize) -> char {
        match self.source.get(self.current + offset) {
            Some(c) => *c,
            None => '\0',
        }
    }

    fn add_token(&mut self, token: Token) {
        self.tokens.push_back(token);
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}

/// Errors raised while lexing a reaction equation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexerError {
    #[error("`{0}` is not a valid coefficient")]
    InvalidCoefficient(String),
    #[error("Missing `)` after coefficient")]
    UnclosedParenthesis,
    #[error("Reversible reactions are not supported, split them into two irreversible ones")]
    ReversibleArrow,
}
