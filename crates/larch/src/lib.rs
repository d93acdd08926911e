//! A grammar-driven LALR(1) parser generator.
//!
//! Declare terminals, productions and precedence on a
//! [`ParserGenerator`], build it, and drive the resulting [`Parser`]
//! with any token source yielding [`Token`]s. Construction computes
//! FIRST/FOLLOW sets, the canonical LALR(1) collection and the
//! ACTION/GOTO tables; parsing is a plain table-driven shift-reduce
//! loop that invokes one semantic action per reduction.

pub mod errors;
mod grammar;
mod lalr;
mod parser;
mod sets;
mod table;
mod token;

pub use errors::{GeneratorWarning, GrammarError, LexingError, ParseError};
pub use grammar::Assoc;
pub use parser::{ParseAction, Parser, ParserGenerator};
pub use token::{SourcePosition, Token};
