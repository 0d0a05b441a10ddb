#[cfg(test)]
use serde::Serialize;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(test, derive(Serialize))]
pub enum InvalidPatternReason {
    #[error("the pattern is empty")]
    Empty,
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("operator '{0}' is missing an operand")]
    MisplacedOperator(char),
    #[error("empty group")]
    EmptyGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(test, derive(Serialize))]
pub enum RegexErrorKind {
    #[error("invalid pattern: {0}")]
    InvalidPattern(InvalidPatternReason),
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    /// Operator without enough operands, or leftover operands, while building the NFA.
    /// Validation runs before construction, so seeing this means an earlier stage let
    /// something through.
    #[error("malformed postfix expression")]
    MalformedPostfix,
    #[error("unknown symbol '{0}'")]
    UnknownSymbol(char),
}

/// Error produced while compiling a pattern or matching a word against it.
///
/// `offset` is the character offset into the raw pattern (or word) that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(test, derive(Serialize))]
pub struct RegexError {
    kind: RegexErrorKind,
    offset: Option<usize>,
}

impl RegexError {
    pub fn new(kind: RegexErrorKind, offset: usize) -> Self {
        RegexError {
            kind,
            offset: Some(offset),
        }
    }

    pub fn new_general(kind: RegexErrorKind) -> Self {
        RegexError { kind, offset: None }
    }

    pub fn invalid_pattern(reason: InvalidPatternReason, offset: usize) -> Self {
        Self::new(RegexErrorKind::InvalidPattern(reason), offset)
    }

    pub fn kind(&self) -> &RegexErrorKind {
        &self.kind
    }

    pub fn offset(&self) -> Option<usize> {
        self.offset
    }
}

impl Display for RegexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "{} at offset {}", self.kind, offset),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for RegexError {}
