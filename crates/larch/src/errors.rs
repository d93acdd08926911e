use thiserror::Error;

use crate::token::{SourcePosition, Token};

/// Fatal problem with the grammar itself, reported before any table is
/// produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("illegal rule name `{0}`: already declared as a terminal")]
    IllegalRuleName(String),
    #[error("precedence already specified for `{0}`")]
    PrecedenceRedeclared(String),
    #[error("associativity must be one of left, right, nonassoc; not `{0}`")]
    InvalidAssociativity(String),
    #[error("precedence `{0}` doesn't exist")]
    UnknownPrecedence(String),
    #[error("symbol `{0}` used but not defined as a terminal or a production")]
    UndefinedSymbol(String),
    #[error("grammar has no productions")]
    EmptyGrammar,
}

/// Raised by a token source when no lexical rule matches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no lexical rule matches at {source_pos}")]
pub struct LexingError {
    pub source_pos: SourcePosition,
}

impl LexingError {
    pub fn new(source_pos: SourcePosition) -> LexingError {
        LexingError { source_pos }
    }
}

/// Runtime parse failure. Lexing errors from the token source propagate
/// unchanged; everything else is a token the tables have no action for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lexing(#[from] LexingError),
    #[error("unexpected token `{}` at {}", .token.name, position_display(.token))]
    UnexpectedToken { token: Token },
    #[error("unexpected end of input")]
    UnexpectedEof,
}

impl ParseError {
    /// Position the failure was detected at, when one exists.
    pub fn source_pos(&self) -> Option<SourcePosition> {
        match self {
            ParseError::Lexing(err) => Some(err.source_pos),
            ParseError::UnexpectedToken { token } => token.source_pos,
            ParseError::UnexpectedEof => None,
        }
    }
}

fn position_display(token: &Token) -> String {
    match token.source_pos {
        Some(pos) => pos.to_string(),
        None => "unknown position".to_string(),
    }
}

/// Non-fatal diagnostics produced while assembling the tables. None of
/// these block table production.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorWarning {
    #[error("{count} shift/reduce conflict(s) resolved as shift")]
    ShiftReduceConflicts { count: usize },
    #[error("reduce/reduce conflict in state {state} resolved using rule ({chosen}) over ({rejected})")]
    ReduceReduce {
        state: usize,
        chosen: String,
        rejected: String,
    },
    #[error("terminal `{0}` is unused")]
    UnusedTerminal(String),
    #[error("nonterminal `{0}` is never reached")]
    UnusedNonterminal(String),
}
