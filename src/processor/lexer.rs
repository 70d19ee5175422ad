//! Line cleaner for VM source.
//!
//! At this stage we *only* strip comments and split the surviving lines
//! into words. No keywords are recognised yet; `push`, `add`, etc. come
//! out as plain words and the command source interprets them later.
//
//  Lexical rules (informal):
//
//      line     ::= word* comment?
//      word     ::= any run of non-whitespace characters
//      comment  ::= '//' .* end-of-line
//
//  Lines that are empty after removing the comment and surrounding
//  whitespace are discarded.

use std::iter::Enumerate;
use std::str::Lines;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based line number in the source file.
    pub number: usize,
    pub words: Vec<String>,
}

impl SourceLine {
    pub fn new(number: usize, text: &str) -> Self {
        Self {
            number,
            words: text.split_whitespace().map(str::to_string).collect(),
        }
    }
}

#[derive(Clone)]
pub struct Lexer<'a> {
    lines: Enumerate<Lines<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            lines: src.lines().enumerate(),
        }
    }
}

/// Drop the `//` comment and surrounding whitespace.
pub fn clean(line: &str) -> &str {
    line.split_once("//")
        .map(|(code, _)| code)
        .unwrap_or(line)
        .trim()
}

impl Iterator for Lexer<'_> {
    type Item = SourceLine;

    fn next(&mut self) -> Option<Self::Item> {
        for (idx, raw) in self.lines.by_ref() {
            let code = clean(raw);
            if !code.is_empty() {
                return Some(SourceLine::new(idx + 1, code));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{Lexer, SourceLine};

    #[test]
    fn test_tokenisation() {
        let src = "// header comment\n\
                   push constant 7   // seven\n\
                   \n\
                   \t  add\n\
                   if-goto   LOOP_START\r\n";

        let lines: Vec<_> = Lexer::new(src).collect();
        assert_eq!(
            lines,
            vec![
                SourceLine {
                    number: 2,
                    words: vec!["push".into(), "constant".into(), "7".into()],
                },
                SourceLine {
                    number: 4,
                    words: vec!["add".into()],
                },
                SourceLine {
                    number: 5,
                    words: vec!["if-goto".into(), "LOOP_START".into()],
                },
            ]
        );
    }

    #[test]
    fn test_comment_only_and_blank_sources() {
        let test_cases = vec!["", "\n\n", "// nothing here", "   // indented\n\t\n"];

        for src in test_cases {
            assert_eq!(Lexer::new(src).count(), 0, "source {src:?}");
        }
    }

    #[test]
    fn test_comment_glued_to_code() {
        let lines: Vec<_> = Lexer::new("return//done").collect();
        assert_eq!(lines[0].words, vec!["return".to_string()]);
    }
}
