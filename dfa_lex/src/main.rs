use std::fs;
use std::io::{Read, Write, stdin, stdout};
use std::path::PathBuf;
use std::process::exit;

use anyhow::Context;
use clap::{ArgAction, ArgMatches, Command, arg, value_parser};
use dfa_lex_lib::error::InputError;
use dfa_lex_lib::input::{Word, WordReader};
use log::info;
use regex::{Compilation, Recognizer, RegexError};

const EXIT_ERROR: i32 = 1;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Normalized,
    Postfix,
    Nfa,
    Dfa,
    Min,
}

impl Stage {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "normalized" => Some(Stage::Normalized),
            "postfix" => Some(Stage::Postfix),
            "nfa" => Some(Stage::Nfa),
            "dfa" => Some(Stage::Dfa),
            "min" => Some(Stage::Min),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq)]
struct Config {
    pattern: String,
    input: Option<PathBuf>,
    dumps: Vec<Stage>,
    recognize: bool,
}

impl Config {
    fn from_matches(args: &ArgMatches) -> Self {
        let mut dumps: Vec<Stage> = args
            .get_many::<String>("dump")
            .into_iter()
            .flatten()
            .filter_map(|name| Stage::from_name(name))
            .collect();
        dumps.sort();
        dumps.dedup();

        Config {
            pattern: args.get_one::<String>("PATTERN").cloned().unwrap_or_default(),
            input: args.get_one::<PathBuf>("input").cloned(),
            dumps,
            recognize: !args.get_flag("no-recognize"),
        }
    }
}

fn cli() -> Command {
    Command::new("dfa_lex")
        .about("Compile a regular expression into a minimal DFA and recognize words with it")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(arg!(<PATTERN>).help("Pattern over letters and digits with '|', '*' and groups"))
        .arg(
            arg!(-i --input <FILE>)
                .help("Read '#'-separated words from FILE instead of stdin")
                .required(false)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(-d --dump <STAGE>)
                .help("Print an intermediate automaton before recognition")
                .required(false)
                .value_parser(["normalized", "postfix", "nfa", "dfa", "min"])
                .action(ArgAction::Append),
        )
        .arg(
            arg!(-n --"no-recognize" "Stop after compiling (and dumping)")
                .action(ArgAction::SetTrue),
        )
}

/// Error message followed by the offending source line with a caret under `column`
/// (1-based).
fn with_caret(header: &str, line: &str, column: usize) -> String {
    let pointer_space = " ".repeat(column.saturating_sub(1));
    format!("{header}\n{line}\n{pointer_space}^\n")
}

fn format_regex_error(error: &RegexError, pattern: &str) -> String {
    let header = format!("Error: {}", error);
    match error.offset() {
        Some(offset) => with_caret(&header, pattern, offset + 1),
        None => format!("{header}\n"),
    }
}

fn format_input_error(error: &InputError, source: &str, filename: &str) -> String {
    let Some(pos) = error.position() else {
        return format!("{filename}: Error: {}\n", error.kind());
    };
    let header = format!(
        "{}:{}:{}: Error: {}",
        filename,
        pos.cur_line,
        pos.cur_pos,
        error.kind()
    );
    match source.lines().nth(pos.cur_line.saturating_sub(1)) {
        Some(line) => with_caret(&header, line, pos.cur_pos),
        None => format!("{header}\n(Could not retrieve source line for context)\n"),
    }
}

fn dump(compilation: &Compilation, stage: Stage, out: &mut impl Write) -> std::io::Result<()> {
    match stage {
        Stage::Normalized => {
            writeln!(out, "[normalized]")?;
            writeln!(out, "{}", compilation.normalized())
        }
        Stage::Postfix => {
            writeln!(out, "[postfix]")?;
            writeln!(out, "{}", compilation.postfix())
        }
        Stage::Nfa => {
            writeln!(out, "[nfa]")?;
            write!(out, "{}", compilation.nfa())
        }
        Stage::Dfa => {
            writeln!(out, "[dfa]")?;
            write!(out, "{}", compilation.dfa())
        }
        Stage::Min => {
            writeln!(out, "[min]")?;
            write!(out, "{}", compilation.minimized().listing())
        }
    }
}

fn recognize(recognizer: &Recognizer<'_>, words: &[Word], out: &mut impl Write) -> std::io::Result<()> {
    for word in words {
        writeln!(out, "{}", recognizer.recognize_word(word.symbols()))?;
    }
    Ok(())
}

fn read_input(config: &Config) -> anyhow::Result<(String, String)> {
    match &config.input {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("can't read the file {}", path.display()))?;
            Ok((path.display().to_string(), source))
        }
        None => {
            let mut source = String::new();
            stdin().read_to_string(&mut source).context("can't read stdin")?;
            Ok(("<stdin>".to_string(), source))
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::from_matches(&cli().get_matches());
    info!("running with {config:?}");

    let compilation = match Compilation::new(&config.pattern) {
        Ok(compilation) => compilation,
        Err(err) => {
            eprint!("{}", format_regex_error(&err, &config.pattern));
            exit(EXIT_ERROR);
        }
    };

    let mut out = stdout().lock();
    for &stage in &config.dumps {
        dump(&compilation, stage, &mut out)?;
    }

    if !config.recognize {
        return Ok(());
    }

    let (name, source) = read_input(&config)?;
    let words = match WordReader::parse(&source) {
        Ok(words) => words,
        Err(err) => {
            eprint!("{}", format_input_error(&err, &source, &name));
            exit(EXIT_ERROR);
        }
    };

    recognize(&Recognizer::new(compilation.minimized()), &words, &mut out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    mod config {
        use super::*;

        fn config_of(args: &[&str]) -> Config {
            let matches = cli()
                .try_get_matches_from(std::iter::once("dfa_lex").chain(args.iter().copied()))
                .unwrap();
            Config::from_matches(&matches)
        }

        #[test]
        fn pattern_only() {
            // when
            let config = config_of(&["(a|b)*abb"]);

            // then
            assert_eq!(
                config,
                Config {
                    pattern: "(a|b)*abb".to_string(),
                    input: None,
                    dumps: vec![],
                    recognize: true,
                }
            );
        }

        #[test]
        fn dumps_are_ordered_by_stage_and_deduplicated() {
            // when
            let config = config_of(&[
                "a*", "-d", "min", "--dump", "postfix", "-d", "normalized", "-d", "min", "-n",
            ]);

            // then
            assert_eq!(config.dumps, vec![Stage::Normalized, Stage::Postfix, Stage::Min]);
            assert!(!config.recognize);
        }

        #[test]
        fn input_file() {
            // when
            let config = config_of(&["a", "-i", "words.txt"]);

            // then
            assert_eq!(config.input, Some(PathBuf::from("words.txt")));
        }

        #[rstest]
        #[case(&["a", "-d", "ast"])]
        #[case(&[])]
        fn bad_arguments_are_rejected(#[case] args: &[&str]) {
            let result =
                cli().try_get_matches_from(std::iter::once("dfa_lex").chain(args.iter().copied()));

            assert!(result.is_err());
        }
    }

    mod output {
        use super::*;

        fn render(f: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>) -> String {
            let mut out = vec![];
            f(&mut out).unwrap();
            String::from_utf8(out).unwrap()
        }

        #[test]
        fn regex_error_points_at_offset() {
            // given
            let err = Compilation::new("a|*b").unwrap_err();

            // when
            let message = format_regex_error(&err, "a|*b");

            // then
            insta::assert_snapshot!(message, @r"
            Error: invalid pattern: operator '*' is missing an operand at offset 2
            a|*b
              ^
            ");
        }

        #[test]
        fn input_error_points_at_line_and_column() {
            // given
            let source = "ab#\n cd";
            let err = WordReader::parse(source).unwrap_err();

            // when
            let message = format_input_error(&err, source, "words.txt");

            // then
            insta::assert_snapshot!(message, @r"
            words.txt:2:1: Error: word is not terminated by '#'
             cd
            ^
            ");
        }

        #[test]
        fn min_dump_has_headers() {
            // given
            let compilation = Compilation::new("a|b").unwrap();

            // when
            let text = render(|out| {
                dump(&compilation, Stage::Postfix, out)?;
                dump(&compilation, Stage::Min, out)
            });

            // then
            insta::assert_snapshot!(text, @r"
            [postfix]
            ab|
            [min]
            a b#
            X Y#
            X X-a->Y X-b->Y
            Y
            ");
        }

        #[test]
        fn normalized_dump_shows_concatenation_markers() {
            // given
            let compilation = Compilation::new("(a|b)*abb").unwrap();

            // when
            let text = render(|out| dump(&compilation, Stage::Normalized, out));

            // then
            insta::assert_snapshot!(text, @r"
            [normalized]
            (a|b)*+a+b+b
            ");
        }

        #[test]
        fn recognition_prints_one_block_per_word() {
            // given
            let compilation = Compilation::new("(a|b)*abb").unwrap();
            let words = WordReader::parse("aabb#\nab#\nacbb#\n\n").unwrap();

            // when
            let text = render(|out| {
                recognize(&Recognizer::new(compilation.minimized()), &words, out)
            });

            // then
            insta::assert_snapshot!(text, @r"
            a
            a
            b
            b
            pass
            a
            b
            error
            a
            error
            ");
        }
    }
}
