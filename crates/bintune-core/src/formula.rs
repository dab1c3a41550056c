//! Conversion formula evaluator
//!
//! Definition files express raw <-> physical conversions as small arithmetic
//! formulas over one free variable `X`, e.g. `X * 0.5 - 10`. This module
//! evaluates them with a self-contained recursive-descent parser: operators
//! `+ - * /`, unary minus, parentheses, decimal literals. No shared state,
//! no string substitution.
//!
//! Evaluation deliberately fails soft through [`evaluate`]: one malformed
//! formula in a definition file must not abort loading the rest of the
//! image. Callers that need the distinction use [`try_evaluate`].

use thiserror::Error;

/// Errors from formula parsing or evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    /// The formula contains no tokens
    #[error("empty formula")]
    Empty,

    /// A character that is not part of the grammar
    #[error("unknown token '{0}' in formula")]
    UnknownToken(String),

    /// The token stream does not form a valid expression
    #[error("malformed formula near token {0}")]
    Malformed(usize),

    /// Valid expression followed by leftover tokens
    #[error("unexpected trailing input at token {0}")]
    TrailingInput(usize),

    /// The result is not a finite number (e.g. division by zero)
    #[error("formula produced a non-finite result")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Variable,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn lex(input: &str) -> Result<Vec<Token>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            ' ' | '\t' | '\r' | '\n' => continue,
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            '+' => tokens.push(Token::Plus),
            '-' => tokens.push(Token::Minus),
            '*' => tokens.push(Token::Star),
            '/' => tokens.push(Token::Slash),
            'x' | 'X' => tokens.push(Token::Variable),
            ch if ch.is_ascii_digit() || ch == '.' => {
                let mut s = String::new();
                s.push(ch);
                while let Some(&next_ch) = chars.peek() {
                    if next_ch.is_ascii_digit() || next_ch == '.' {
                        s.push(chars.next().unwrap());
                    } else {
                        break;
                    }
                }
                match s.parse::<f64>() {
                    Ok(n) => tokens.push(Token::Number(n)),
                    Err(_) => return Err(FormulaError::UnknownToken(s)),
                }
            }
            other => return Err(FormulaError::UnknownToken(other.to_string())),
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    x: f64,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], x: f64) -> Self {
        Self { tokens, pos: 0, x }
    }

    fn parse_additive(&mut self) -> Result<f64, FormulaError> {
        let mut value = self.parse_multiplicative()?;
        loop {
            if self.match_token(Token::Plus) {
                value += self.parse_multiplicative()?;
            } else if self.match_token(Token::Minus) {
                value -= self.parse_multiplicative()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn parse_multiplicative(&mut self) -> Result<f64, FormulaError> {
        let mut value = self.parse_unary()?;
        loop {
            if self.match_token(Token::Star) {
                value *= self.parse_unary()?;
            } else if self.match_token(Token::Slash) {
                value /= self.parse_unary()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn parse_unary(&mut self) -> Result<f64, FormulaError> {
        if self.match_token(Token::Minus) {
            Ok(-self.parse_unary()?)
        } else {
            self.parse_primary()
        }
    }

    fn parse_primary(&mut self) -> Result<f64, FormulaError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Variable) => Ok(self.x),
            Some(Token::LParen) => {
                let value = self.parse_additive()?;
                if !self.match_token(Token::RParen) {
                    return Err(FormulaError::Malformed(self.pos));
                }
                Ok(value)
            }
            _ => Err(FormulaError::Malformed(self.pos)),
        }
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn match_token(&mut self, token: Token) -> bool {
        if self.tokens.get(self.pos) == Some(&token) {
            self.pos += 1;
            return true;
        }
        false
    }
}

/// Evaluate a formula with `x` bound to the free variable.
///
/// Returns a typed error for malformed input or a non-finite result.
pub fn try_evaluate(expression: &str, x: f64) -> Result<f64, FormulaError> {
    let tokens = lex(expression)?;
    if tokens.is_empty() {
        return Err(FormulaError::Empty);
    }

    let mut parser = Parser::new(&tokens, x);
    let value = parser.parse_additive()?;
    if parser.pos != tokens.len() {
        return Err(FormulaError::TrailingInput(parser.pos));
    }

    if value.is_finite() {
        Ok(value)
    } else {
        Err(FormulaError::NonFinite)
    }
}

/// Evaluate a formula, falling back to `x` unchanged on any failure.
///
/// The identity fallback keeps a partially bad definition file usable;
/// the failure is reported as a diagnostic.
pub fn evaluate(expression: &str, x: f64) -> f64 {
    match try_evaluate(expression, x) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(expression, x, %err, "formula evaluation failed, using value unchanged");
            x
        }
    }
}
