//! Regular-expression tokenizer for the `larch` parser generator.
//!
//! A [`LexerBuilder`] collects named pattern rules and ignore-only
//! rules; the built [`Lexer`] turns a source string into a stream of
//! [`Token`]s with source positions. At each offset, ignore rules are
//! tried first (repeatedly), then regular rules in declaration order;
//! the first match wins and no match at all is a [`LexingError`] at
//! that exact offset.

use larch::{LexingError, SourcePosition, Token};
use regex::Regex;

struct Rule {
    name: String,
    re: Regex,
}

impl Rule {
    fn new(name: &str, pattern: &str) -> Result<Rule, regex::Error> {
        // anchored at the scan position; matching runs on the tail slice
        let re = Regex::new(&format!(r"\A(?:{pattern})"))?;
        Ok(Rule {
            name: name.to_string(),
            re,
        })
    }

    fn matches(&self, s: &str, pos: usize) -> Option<usize> {
        self.re.find(&s[pos..]).map(|m| pos + m.end())
    }
}

/// Collects token and ignore rules. Rules are tried in the order they
/// were added; the first one to match wins.
#[derive(Default)]
pub struct LexerBuilder {
    rules: Vec<Rule>,
    ignore_rules: Vec<Rule>,
}

impl LexerBuilder {
    pub fn new() -> LexerBuilder {
        LexerBuilder::default()
    }

    /// Adds a rule producing tokens named `name`.
    pub fn add(&mut self, name: &str, pattern: &str) -> Result<&mut Self, regex::Error> {
        self.rules.push(Rule::new(name, pattern)?);
        Ok(self)
    }

    /// Adds a rule whose matches are skipped silently.
    pub fn ignore(&mut self, pattern: &str) -> Result<&mut Self, regex::Error> {
        self.ignore_rules.push(Rule::new("", pattern)?);
        Ok(self)
    }

    pub fn build(self) -> Lexer {
        Lexer {
            rules: self.rules,
            ignore_rules: self.ignore_rules,
        }
    }
}

pub struct Lexer {
    rules: Vec<Rule>,
    ignore_rules: Vec<Rule>,
}

impl Lexer {
    /// Starts lexing `s`, yielding one token per `next` call. The
    /// stream holds no buffered tokens; it scans on demand.
    pub fn lex<'l, 's>(&'l self, s: &'s str) -> LexerStream<'l, 's> {
        LexerStream {
            lexer: self,
            s,
            idx: 0,
            lineno: 1,
        }
    }
}

pub struct LexerStream<'l, 's> {
    lexer: &'l Lexer,
    s: &'s str,
    idx: usize,
    lineno: usize,
}

impl LexerStream<'_, '_> {
    /// 1-based column of `pos`, counted from the last newline.
    fn column(&self, pos: usize) -> usize {
        match self.s[..pos].rfind('\n') {
            Some(nl) => pos - nl,
            None => pos + 1,
        }
    }

    fn advance_past(&mut self, start: usize, end: usize) {
        self.lineno += self.s[start..end].matches('\n').count();
        self.idx = end;
    }
}

impl Iterator for LexerStream<'_, '_> {
    type Item = Result<Token, LexingError>;

    fn next(&mut self) -> Option<Self::Item> {
        'skip: loop {
            if self.idx >= self.s.len() {
                return None;
            }
            for rule in &self.lexer.ignore_rules {
                if let Some(end) = rule.matches(self.s, self.idx) {
                    let start = self.idx;
                    self.advance_past(start, end);
                    continue 'skip;
                }
            }
            break;
        }

        let start = self.idx;
        for rule in &self.lexer.rules {
            if let Some(end) = rule.matches(self.s, start) {
                let pos = SourcePosition::new(start, self.lineno, self.column(start));
                self.advance_past(start, end);
                return Some(Ok(Token::with_pos(
                    rule.name.as_str(),
                    &self.s[start..end],
                    pos,
                )));
            }
        }

        let pos = SourcePosition::new(start, self.lineno, self.column(start));
        // the stream is done after a lexing failure
        self.idx = self.s.len();
        Some(Err(LexingError::new(pos)))
    }
}
