use crate::dfa::{Dfa, DfaStateId};
use std::collections::BTreeSet;
#[cfg(test)]
use serde::Serialize;
use log::{debug, trace};
use std::fmt::{Display, Formatter};

pub const WORD_SEPARATOR: char = '#';

/// Why a word was not accepted. Offsets count characters within the word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(test, derive(Serialize))]
pub enum Rejection {
    /// The symbol is not part of the automaton's alphabet.
    UnknownSymbol { symbol: char, offset: usize },
    /// The symbol is known but the current state has no edge for it.
    MissingTransition { symbol: char, offset: usize },
    /// The whole word was consumed but the final state does not accept.
    NotAccepting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(test, derive(Serialize))]
pub enum Verdict {
    Pass,
    Rejected(Rejection),
}

/// Outcome of running one word through the automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(test, derive(Serialize))]
pub struct WordReport {
    word: String,
    accepted: Vec<char>,
    verdict: Verdict,
}

impl WordReport {
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Symbols consumed before the walk stopped, in order.
    pub fn accepted(&self) -> &[char] {
        &self.accepted
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn is_pass(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

/// One line per accepted symbol. A stuck walk ends with a lone `error` line, a finished
/// one with `pass` or `error`.
impl Display for WordReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for symbol in &self.accepted {
            writeln!(f, "{symbol}")?;
        }
        match self.verdict {
            Verdict::Pass => write!(f, "pass"),
            Verdict::Rejected(_) => write!(f, "error"),
        }
    }
}

/// Walks words through a DFA one symbol at a time.
pub struct Recognizer<'a> {
    dfa: &'a Dfa,
    alphabet: BTreeSet<char>,
}

impl<'a> Recognizer<'a> {
    pub fn new(dfa: &'a Dfa) -> Self {
        Self {
            dfa,
            alphabet: dfa.alphabet(),
        }
    }

    pub fn recognize_word(&self, word: &str) -> WordReport {
        let mut accepted = Vec::with_capacity(word.len());
        let mut current: DfaStateId = self.dfa.start();

        for (offset, symbol) in word.chars().enumerate() {
            if !self.alphabet.contains(&symbol) {
                return self.report(word, accepted, Rejection::UnknownSymbol { symbol, offset });
            }
            let Some(next) = self.dfa.next(current, symbol) else {
                return self.report(
                    word,
                    accepted,
                    Rejection::MissingTransition { symbol, offset },
                );
            };
            trace!("'{word}': {current} -{symbol}-> {next}");
            accepted.push(symbol);
            current = next;
        }

        if self.dfa.is_accepting(current) {
            WordReport {
                word: word.to_string(),
                accepted,
                verdict: Verdict::Pass,
            }
        } else {
            self.report(word, accepted, Rejection::NotAccepting)
        }
    }

    /// Recognizes every `#`-terminated word of `input`. Line breaks are layout, a blank
    /// line ends the input, and symbols after the last separator are not a word.
    pub fn recognize(&self, input: &str) -> Vec<WordReport> {
        let mut reports = vec![];
        let mut word = String::new();
        let mut prev_break = false;

        for c in input.chars() {
            match c {
                '\r' => continue,
                '\n' if prev_break => break,
                '\n' => {
                    prev_break = true;
                    continue;
                }
                WORD_SEPARATOR => {
                    reports.push(self.recognize_word(&word));
                    word.clear();
                }
                c => word.push(c),
            }
            prev_break = false;
        }
        reports
    }

    fn report(&self, word: &str, accepted: Vec<char>, rejection: Rejection) -> WordReport {
        debug!("rejected '{word}': {rejection:?}");
        WordReport {
            word: word.to_string(),
            accepted,
            verdict: Verdict::Rejected(rejection),
        }
    }
}
