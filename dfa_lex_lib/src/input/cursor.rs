#[cfg(test)]
use serde::Serialize;
use std::iter::Peekable;
use std::str::Chars;

/// 1-based line, 1-based column of the last consumed character (0 before the first one).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Serialize))]
pub struct CursorPosition {
    pub cur_line: usize,
    pub cur_pos: usize,
}

impl CursorPosition {
    pub fn new(cur_line: usize, cur_pos: usize) -> Self {
        CursorPosition { cur_line, cur_pos }
    }
}

impl Default for CursorPosition {
    fn default() -> Self {
        Self {
            cur_line: 1,
            cur_pos: 0,
        }
    }
}

pub(super) struct Cursor<'a> {
    data: Peekable<Chars<'a>>,
    cursor_pos: CursorPosition,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a str) -> Self {
        Self {
            data: data.chars().peekable(),
            cursor_pos: CursorPosition::default(),
        }
    }

    pub fn next(&mut self) -> Option<char> {
        let n = self.data.next()?;
        self.cursor_pos.cur_pos += 1;
        if n == '\n' {
            self.cursor_pos.cur_pos = 0;
            self.cursor_pos.cur_line += 1;
        }
        Some(n)
    }

    pub fn peek(&mut self) -> Option<&char> {
        self.data.peek()
    }

    /// Position the next character will have once consumed.
    pub fn next_position(&self) -> CursorPosition {
        CursorPosition::new(self.cursor_pos.cur_line, self.cursor_pos.cur_pos + 1)
    }

    pub fn get_position(&self) -> CursorPosition {
        self.cursor_pos
    }
}
