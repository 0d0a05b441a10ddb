use crate::error::{InvalidPatternReason, RegexError};
use crate::token::{Token, TokenSequence};
use log::trace;

/// Tokenizes a raw pattern, rejects structurally broken ones and makes every implicit
/// concatenation explicit, so `ab` becomes `a+b` and `(a|b)*abb` becomes `(a|b)*+a+b+b`.
///
/// Parenthesis balance is left to the postfix conversion.
pub fn normalize(pattern: &str) -> Result<TokenSequence, RegexError> {
    if pattern.is_empty() {
        return Err(RegexError::invalid_pattern(InvalidPatternReason::Empty, 0));
    }

    let tokens: Vec<(usize, Token)> = TokenSequence::try_from(pattern)?.iter().copied().collect();
    validate(&tokens)?;

    let mut normalized = TokenSequence::default();
    for (i, &(offset, token)) in tokens.iter().enumerate() {
        normalized.push(offset, token);

        if let Some(&(next_offset, next)) = tokens.get(i + 1) {
            if token.ends_operand() && next.starts_operand() {
                normalized.push(next_offset, Token::Concat);
            }
        }
    }

    trace!("normalized '{pattern}' into '{normalized}'");
    Ok(normalized)
}

fn validate(tokens: &[(usize, Token)]) -> Result<(), RegexError> {
    for (i, &(offset, token)) in tokens.iter().enumerate() {
        let prev = i.checked_sub(1).and_then(|p| tokens.get(p)).map(|(_, t)| *t);
        let next = tokens.get(i + 1).map(|(_, t)| *t);

        let misplaced = match token {
            Token::Union => {
                matches!(prev, None | Some(Token::Union) | Some(Token::LParen))
                    || matches!(next, None | Some(Token::RParen))
            }
            Token::Star => matches!(prev, None | Some(Token::Union) | Some(Token::LParen)),
            Token::LParen if next == Some(Token::RParen) => {
                return Err(RegexError::invalid_pattern(
                    InvalidPatternReason::EmptyGroup,
                    offset,
                ));
            }
            _ => false,
        };

        if misplaced {
            return Err(RegexError::invalid_pattern(
                InvalidPatternReason::MisplacedOperator(char::from(token)),
                offset,
            ));
        }
    }
    Ok(())
}
