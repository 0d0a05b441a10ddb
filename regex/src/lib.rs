use log::debug;

pub use dfa::{Dfa, DfaListing, DfaState, DfaStateId, Label};
pub use error::{InvalidPatternReason, RegexError, RegexErrorKind};
pub use nfa::Nfa;
pub use recognizer::{Recognizer, Rejection, Verdict, WORD_SEPARATOR, WordReport};
pub use token::TokenSequence;

pub mod dfa;
mod error;
pub mod nfa;
mod normalize;
mod postfix;
mod recognizer;
pub mod token;

/// Every intermediate artifact of compiling a pattern, kept for inspection.
#[derive(Debug, Clone)]
pub struct Compilation {
    normalized: TokenSequence,
    postfix: TokenSequence,
    nfa: Nfa,
    dfa: Dfa,
    minimized: Dfa,
}

impl Compilation {
    pub fn new(pattern: &str) -> Result<Self, RegexError> {
        let normalized = normalize::normalize(pattern)?;
        let postfix = postfix::to_postfix(&normalized)?;
        let nfa = Nfa::from_postfix(&postfix)?;
        let dfa = Dfa::from_nfa(&nfa);
        let minimized = dfa.clone().minimize();

        debug!(
            "compiled '{pattern}': NFA {} states, DFA {} states, minimal DFA {} states",
            nfa.len(),
            dfa.len(),
            minimized.len()
        );
        Ok(Self {
            normalized,
            postfix,
            nfa,
            dfa,
            minimized,
        })
    }

    pub fn normalized(&self) -> &TokenSequence {
        &self.normalized
    }

    pub fn postfix(&self) -> &TokenSequence {
        &self.postfix
    }

    pub fn nfa(&self) -> &Nfa {
        &self.nfa
    }

    pub fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    pub fn minimized(&self) -> &Dfa {
        &self.minimized
    }

    pub fn into_minimized(self) -> Dfa {
        self.minimized
    }
}

/// A compiled pattern matched against whole words through its minimal DFA.
pub struct Regex {
    dfa: Dfa,
}

impl Regex {
    pub fn new(pattern: &str) -> Result<Self, RegexError> {
        let dfa = Compilation::new(pattern)?.into_minimized();

        Ok(Self { dfa })
    }

    pub fn is_exact_match(&self, s: &str) -> bool {
        self.dfa.accepts(s)
    }

    /// Like [`Regex::is_exact_match`], but a symbol the pattern never mentions is an error.
    pub fn try_match(&self, s: &str) -> Result<bool, RegexError> {
        let alphabet = self.dfa.alphabet();
        if let Some((offset, symbol)) = s.chars().enumerate().find(|(_, c)| !alphabet.contains(c)) {
            return Err(RegexError::new(RegexErrorKind::UnknownSymbol(symbol), offset));
        }
        Ok(self.dfa.accepts(s))
    }

    pub fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    pub fn recognizer(&self) -> Recognizer<'_> {
        Recognizer::new(&self.dfa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Every word over `alphabet` up to `max_len` symbols, the empty word included.
    fn all_words(alphabet: &[char], max_len: usize) -> Vec<String> {
        let mut words = vec![String::new()];
        let mut frontier = vec![String::new()];
        for _ in 0..max_len {
            frontier = frontier
                .iter()
                .flat_map(|prefix| {
                    alphabet.iter().map(move |&c| {
                        let mut word = prefix.clone();
                        word.push(c);
                        word
                    })
                })
                .collect();
            words.extend(frontier.iter().cloned());
        }
        words
    }

    const PATTERNS: [&str; 10] = [
        "(a|b)*abb",
        "a*",
        "a|b",
        "ab",
        "(ab)|a",
        "(a*b)*",
        "a(b|c)*d",
        "(ab)*|(ba)*",
        "((a|b)(a|b))*",
        "a**b*",
    ];

    mod compilation {
        use super::*;

        #[test]
        fn exposes_every_stage() {
            // given
            let compilation = Compilation::new("ab").unwrap();

            // then
            assert_eq!(compilation.normalized().to_string(), "a+b");
            assert_eq!(compilation.postfix().to_string(), "ab+");
            assert!(compilation.nfa().accepts("ab"));
            assert!(compilation.dfa().accepts("ab"));
            assert!(compilation.minimized().accepts("ab"));
        }

        #[rstest]
        #[case("", RegexErrorKind::InvalidPattern(InvalidPatternReason::Empty))]
        #[case("a$b", RegexErrorKind::InvalidPattern(InvalidPatternReason::UnexpectedChar('$')))]
        #[case("(ab", RegexErrorKind::UnbalancedParens)]
        #[case("a|", RegexErrorKind::InvalidPattern(InvalidPatternReason::MisplacedOperator('|')))]
        fn rejects_broken_patterns(#[case] pattern: &str, #[case] kind: RegexErrorKind) {
            // when
            let err = Compilation::new(pattern).unwrap_err();

            // then
            assert_eq!(err.kind(), &kind);
        }
    }

    mod language {
        use super::*;

        #[rstest]
        fn every_stage_agrees_with_the_nfa(
            #[values(0, 1, 2, 3, 4, 5, 6, 7, 8, 9)] index: usize,
        ) {
            // given
            let pattern = PATTERNS[index];
            let compilation = Compilation::new(pattern).unwrap();
            let alphabet: Vec<char> = compilation.nfa().alphabet().into_iter().collect();

            // then
            for word in all_words(&alphabet, 6) {
                let expected = compilation.nfa().accepts(&word);
                assert_eq!(compilation.dfa().accepts(&word), expected, "{pattern} / {word}");
                assert_eq!(
                    compilation.minimized().accepts(&word),
                    expected,
                    "{pattern} / {word}"
                );
            }
        }

        #[rstest]
        fn minimization_never_adds_states(
            #[values(0, 1, 2, 3, 4, 5, 6, 7, 8, 9)] index: usize,
        ) {
            // given
            let compilation = Compilation::new(PATTERNS[index]).unwrap();

            // then
            assert!(compilation.minimized().len() <= compilation.dfa().len());
            assert_eq!(
                compilation.minimized().clone().minimize(),
                *compilation.minimized()
            );
        }
    }

    mod regex {
        use super::*;

        #[rstest]
        #[case("(a|b)*abb", "aabb", true)]
        #[case("(a|b)*abb", "ab", false)]
        #[case("a*", "", true)]
        #[case("a|b", "ab", false)]
        fn is_exact_match(#[case] pattern: &str, #[case] input: &str, #[case] expected: bool) {
            // given
            let regex = Regex::new(pattern).unwrap();

            // when
            let matched = regex.is_exact_match(input);

            // then
            assert_eq!(matched, expected);
        }

        #[test]
        fn try_match_reports_unknown_symbol() {
            // given
            let regex = Regex::new("(a|b)*abb").unwrap();

            // when
            let err = regex.try_match("abzb").unwrap_err();

            // then
            assert_eq!(err.kind(), &RegexErrorKind::UnknownSymbol('z'));
            assert_eq!(err.offset(), Some(2));
            assert_eq!(regex.try_match("abb"), Ok(true));
        }

        #[test]
        fn recognizer_uses_the_minimal_dfa() {
            // given
            let regex = Regex::new("a*").unwrap();

            // when
            let reports = regex.recognizer().recognize("aaa#b#");

            // then
            let rendered: Vec<String> = reports.iter().map(WordReport::to_string).collect();
            assert_eq!(rendered, vec!["a\na\na\npass", "error"]);
        }
    }
}
