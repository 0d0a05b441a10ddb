use crate::error::{RegexError, RegexErrorKind};
use crate::token::{Token, TokenSequence};
use log::trace;

/// Shunting-yard conversion of an explicitly concatenated pattern into postfix order.
///
/// Priorities are `*` (4) > `|` (3) > concatenation (2) > `(` (0). Operators of equal
/// priority pop each other, which keeps union and concatenation left-associative.
/// Union binds tighter than concatenation, so `ab|c` reads as `a(b|c)`.
pub fn to_postfix(normalized: &TokenSequence) -> Result<TokenSequence, RegexError> {
    let mut output = TokenSequence::default();
    let mut stack: Vec<(usize, Token)> = Vec::with_capacity(normalized.len());

    for &(offset, token) in normalized.iter() {
        match token {
            Token::Literal(_) => output.push(offset, token),
            Token::LParen => stack.push((offset, token)),
            Token::RParen => loop {
                match stack.pop() {
                    Some((_, Token::LParen)) => break,
                    Some((op_offset, op)) => output.push(op_offset, op),
                    None => {
                        return Err(RegexError::new(RegexErrorKind::UnbalancedParens, offset));
                    }
                }
            },
            Token::Star | Token::Union | Token::Concat => {
                while let Some(&(top_offset, top)) = stack.last() {
                    if top.priority() < token.priority() {
                        break;
                    }
                    stack.pop();
                    output.push(top_offset, top);
                }
                stack.push((offset, token));
            }
        }
    }

    while let Some((offset, token)) = stack.pop() {
        if token == Token::LParen {
            return Err(RegexError::new(RegexErrorKind::UnbalancedParens, offset));
        }
        output.push(offset, token);
    }

    trace!("postfix of '{normalized}' is '{output}'");
    Ok(output)
}
