use crate::error::{InvalidPatternReason, RegexError};
#[cfg(test)]
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Internal marker for concatenation, never accepted from user input.
pub const CONCAT_MARKER: char = '+';
/// How epsilon transitions are rendered in automaton dumps.
pub const EPSILON_MARKER: char = '~';

/// Symbols the automata are built over: ASCII letters and digits.
pub fn is_symbol(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Serialize))]
pub enum Token {
    Literal(char),
    Concat,
    Union,
    Star,
    LParen,
    RParen,
}

impl Token {
    /// Stack priority used by the postfix conversion.
    pub(crate) fn priority(&self) -> u8 {
        match self {
            Token::Star => 4,
            Token::Union => 3,
            Token::Concat => 2,
            Token::LParen | Token::RParen | Token::Literal(_) => 0,
        }
    }

    /// Tokens after which an implicit concatenation may start.
    pub(crate) fn ends_operand(&self) -> bool {
        matches!(self, Token::Literal(_) | Token::Star | Token::RParen)
    }

    /// Tokens that can open the right-hand side of an implicit concatenation.
    pub(crate) fn starts_operand(&self) -> bool {
        matches!(self, Token::Literal(_) | Token::LParen)
    }
}

/// Tokens of a pattern, each paired with the offset of the raw pattern character it
/// came from. Inserted concatenation markers borrow the offset of the token they
/// precede.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct TokenSequence {
    tokens: Vec<(usize, Token)>,
}

impl TokenSequence {
    pub fn new(tokens: Vec<(usize, Token)>) -> Self {
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(usize, Token)> {
        self.tokens.iter()
    }

    pub fn tokens(&self) -> impl Iterator<Item = Token> + '_ {
        self.tokens.iter().map(|(_, token)| *token)
    }

    pub(crate) fn push(&mut self, offset: usize, token: Token) {
        self.tokens.push((offset, token));
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", char::from(self))
    }
}

impl Display for TokenSequence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (_, token) in &self.tokens {
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

impl From<Token> for char {
    fn from(value: Token) -> Self {
        char::from(&value)
    }
}

impl From<&Token> for char {
    fn from(value: &Token) -> Self {
        match value {
            Token::Literal(c) => *c,
            Token::Concat => CONCAT_MARKER,
            Token::Union => '|',
            Token::Star => '*',
            Token::LParen => '(',
            Token::RParen => ')',
        }
    }
}

impl TryFrom<char> for Token {
    type Error = InvalidPatternReason;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            '|' => Ok(Token::Union),
            '*' => Ok(Token::Star),
            '(' => Ok(Token::LParen),
            ')' => Ok(Token::RParen),
            c if is_symbol(c) => Ok(Token::Literal(c)),
            c => Err(InvalidPatternReason::UnexpectedChar(c)),
        }
    }
}

impl TryFrom<&str> for TokenSequence {
    type Error = RegexError;

    fn try_from(pattern: &str) -> Result<Self, Self::Error> {
        let mut tokens = Vec::with_capacity(pattern.len());

        for (offset, c) in pattern.chars().enumerate() {
            let token =
                Token::try_from(c).map_err(|reason| RegexError::invalid_pattern(reason, offset))?;
            tokens.push((offset, token));
        }
        Ok(TokenSequence::new(tokens))
    }
}
