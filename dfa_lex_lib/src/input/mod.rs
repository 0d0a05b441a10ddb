pub(crate) mod cursor;
use crate::error::{InputError, InputErrorKind};
use crate::input::cursor::Cursor;
pub use crate::input::cursor::CursorPosition;
use log::{debug, trace};
use regex::WORD_SEPARATOR;
#[cfg(test)]
use serde::Serialize;

/// A `#`-terminated word and where its first symbol sits in the input.
#[derive(PartialEq, Eq, Debug, Clone)]
#[cfg_attr(test, derive(Serialize))]
pub struct Word {
    position: CursorPosition,
    symbols: String,
}

impl Word {
    pub fn position(&self) -> CursorPosition {
        self.position
    }

    pub fn symbols(&self) -> &str {
        &self.symbols
    }
}

/// Splits recognition input into words.
///
/// Words end with `#`. Line breaks are layout and never part of a word, so one word may
/// span lines. A blank line (two line breaks in a row) ends the input; whatever follows
/// it is ignored. Symbols left over without a closing `#` are an error.
pub struct WordReader<'a> {
    cursor: Cursor<'a>,
    res: Vec<Word>,
}

impl<'a> WordReader<'a> {
    fn flush(&mut self, position: CursorPosition, symbols: &mut String) {
        trace!("word '{symbols}' at {}:{}", position.cur_line, position.cur_pos);
        self.res.push(Word {
            position,
            symbols: std::mem::take(symbols),
        });
    }

    fn analyze(&mut self) -> Result<(), InputError> {
        let mut symbols = String::new();
        let mut word_start = self.cursor.next_position();
        let mut prev_break = false;

        while let Some(&c) = self.cursor.peek() {
            match c {
                '\r' => {
                    self.cursor.next();
                    continue;
                }
                '\n' if prev_break => {
                    self.cursor.next();
                    break;
                }
                '\n' => {
                    self.cursor.next();
                    prev_break = true;
                    continue;
                }
                WORD_SEPARATOR => {
                    self.cursor.next();
                    self.flush(word_start, &mut symbols);
                }
                c => {
                    if symbols.is_empty() {
                        word_start = self.cursor.next_position();
                    }
                    self.cursor.next();
                    symbols.push(c);
                }
            }
            prev_break = false;
            if symbols.is_empty() {
                word_start = self.cursor.next_position();
            }
        }

        if !symbols.is_empty() {
            return Err(InputError::new(InputErrorKind::UnterminatedInput, word_start));
        }
        Ok(())
    }

    pub fn parse(s: &'a str) -> Result<Vec<Word>, InputError> {
        let mut reader = Self {
            cursor: Cursor::new(s),
            res: vec![],
        };

        reader.analyze()?;

        let end = reader.cursor.get_position();
        debug!("read {} words up to {}:{}", reader.res.len(), end.cur_line, end.cur_pos);
        Ok(reader.res)
    }
}
