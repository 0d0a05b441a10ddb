use crate::input::cursor::CursorPosition;
#[cfg(test)]
use serde::Serialize;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(test, derive(Serialize))]
pub enum InputErrorKind {
    #[error("word is not terminated by '#'")]
    UnterminatedInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(test, derive(Serialize))]
pub struct InputError {
    kind: InputErrorKind,
    position: Option<CursorPosition>,
}

impl InputError {
    pub fn new(kind: InputErrorKind, position: CursorPosition) -> Self {
        InputError {
            kind,
            position: Some(position),
        }
    }

    pub fn new_general(kind: InputErrorKind) -> Self {
        InputError {
            kind,
            position: None,
        }
    }

    pub fn kind(&self) -> &InputErrorKind {
        &self.kind
    }

    pub fn position(&self) -> Option<&CursorPosition> {
        self.position.as_ref()
    }
}

impl Display for InputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.position {
            Some(pos) => write!(f, "{}:{}: {}", pos.cur_line, pos.cur_pos, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for InputError {}
