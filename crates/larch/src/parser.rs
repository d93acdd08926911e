use crate::errors::{GeneratorWarning, GrammarError, LexingError, ParseError};
use crate::grammar::{Assoc, Grammar, ERROR};
use crate::lalr;
use crate::sets::Analysis;
use crate::table::{self, LRAction, LRTable};
use crate::token::Token;

/// A semantic action: consumes the values of a production's rhs, in
/// left-to-right order, and produces the value of its lhs.
pub type ParseAction<V> = Box<dyn Fn(Vec<V>) -> V + Send + Sync>;

/// Collects terminals, productions and precedence declarations, then
/// compiles them into a [`Parser`].
///
/// `V` is the caller's semantic value type; shifted tokens enter the
/// value stack through its `From<Token>` impl.
pub struct ParserGenerator<V> {
    grammar: Grammar,
    actions: Vec<Option<ParseAction<V>>>,
    error_recovery: bool,
}

impl<V: From<Token>> ParserGenerator<V> {
    pub fn new<I, S>(terminals: I) -> ParserGenerator<V>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ParserGenerator {
            grammar: Grammar::new(terminals),
            // slot 0 belongs to the augmented production
            actions: vec![None],
            error_recovery: false,
        }
    }

    /// Adds a production. In case of conflicting reductions, the
    /// production added first wins.
    pub fn production<F>(&mut self, lhs: &str, rhs: &[&str], action: F) -> Result<(), GrammarError>
    where
        F: Fn(Vec<V>) -> V + Send + Sync + 'static,
    {
        self.grammar.add_production(lhs, rhs, None)?;
        self.actions.push(Some(Box::new(action)));
        Ok(())
    }

    /// Adds a production whose precedence is taken from `prec`, a
    /// terminal that already has a precedence entry, instead of from
    /// the rightmost terminal of `rhs`.
    pub fn production_with_prec<F>(
        &mut self,
        lhs: &str,
        rhs: &[&str],
        prec: &str,
        action: F,
    ) -> Result<(), GrammarError>
    where
        F: Fn(Vec<V>) -> V + Send + Sync + 'static,
    {
        self.grammar.add_production(lhs, rhs, Some(prec))?;
        self.actions.push(Some(Box::new(action)));
        Ok(())
    }

    /// Declares precedence and associativity for a terminal. Each
    /// terminal may be assigned precedence at most once.
    pub fn set_precedence(
        &mut self,
        term: &str,
        assoc: Assoc,
        level: usize,
    ) -> Result<(), GrammarError> {
        self.grammar.set_precedence(term, assoc, level)
    }

    /// Turns on panic-mode recovery: on a syntax error the engine
    /// resynchronizes on productions mentioning the reserved `error`
    /// terminal instead of failing outright.
    pub fn enable_error_recovery(&mut self) -> &mut Self {
        self.error_recovery = true;
        self
    }

    /// Terminals declared but never used on any rhs so far.
    pub fn unused_terminals(&self) -> Vec<String> {
        self.grammar.unused_terminals()
    }

    /// Nonterminals defined or referenced but never used on any rhs.
    pub fn unused_nonterminals(&self) -> Vec<String> {
        self.grammar.unused_nonterminals()
    }

    /// Fixes the start symbol, runs the FIRST/FOLLOW analysis, builds
    /// the LALR(1) automaton and assembles the tables. The automaton
    /// and item arena are discarded; the returned parser holds only
    /// the tables, the actions and the build warnings.
    pub fn build(mut self) -> Result<Parser<V>, GrammarError> {
        if self.grammar.productions.len() < 2 {
            return Err(GrammarError::EmptyGrammar);
        }
        if let Some(sym) = self.grammar.undefined_symbol() {
            return Err(GrammarError::UndefinedSymbol(sym));
        }
        self.grammar.set_start();
        self.grammar.build_lr_items();

        let analysis = Analysis::compute(&self.grammar);
        let automaton = lalr::build(&self.grammar, &analysis);
        let (table, warnings) = table::assemble(&self.grammar, &automaton);

        self.grammar.items.clear();
        Ok(Parser {
            grammar: self.grammar,
            table,
            actions: self.actions,
            warnings,
            error_recovery: self.error_recovery,
        })
    }
}

/// A compiled parser: immutable tables plus the caller's actions. Safe
/// to share across threads and reuse for any number of parses.
pub struct Parser<V> {
    grammar: Grammar,
    table: LRTable,
    actions: Vec<Option<ParseAction<V>>>,
    warnings: Vec<GeneratorWarning>,
    error_recovery: bool,
}

impl<V: From<Token>> Parser<V> {
    /// Non-fatal diagnostics collected while the tables were built.
    pub fn warnings(&self) -> &[GeneratorWarning] {
        &self.warnings
    }

    /// Drives the tables against a token source, pulling one token at
    /// a time, and returns the start symbol's value. A lexing failure
    /// from the source propagates unchanged; a state/lookahead pair
    /// with no action is a parse error at that token's position.
    pub fn parse<I>(&self, tokens: I) -> Result<V, ParseError>
    where
        I: IntoIterator<Item = Result<Token, LexingError>>,
    {
        let mut tokens = tokens.into_iter();
        let mut stack: Vec<(usize, Option<V>)> = vec![(0, None)];
        let mut lookahead = pull(&mut tokens)?;

        loop {
            let state = stack.last().expect("stack holds the initial frame").0;
            match self.lookup(state, lookahead.as_ref()) {
                Some(LRAction::Shift(next)) => {
                    let token = lookahead.take().expect("$end is never shifted");
                    stack.push((next, Some(V::from(token))));
                    lookahead = pull(&mut tokens)?;
                }
                Some(LRAction::Reduce(prod)) => {
                    let p = &self.grammar.productions[prod];
                    let mut args: Vec<V> = Vec::with_capacity(p.len());
                    for _ in 0..p.len() {
                        let (_, value) = stack.pop().expect("reduce pops only shifted frames");
                        args.push(value.expect("shifted frames carry a value"));
                    }
                    args.reverse();
                    let action = self.actions[prod]
                        .as_ref()
                        .expect("user productions always have an action");
                    let value = action(args);
                    let top = stack.last().expect("stack holds the initial frame").0;
                    let next = self.table.goto(top, p.lhs);
                    stack.push((next, Some(value)));
                }
                Some(LRAction::Accept) => {
                    let (_, value) = stack.pop().expect("accept follows a completed start symbol");
                    return Ok(value.expect("start symbol carries the result"));
                }
                Some(LRAction::Error) | None => {
                    let offending = lookahead.clone();
                    if self.error_recovery
                        && self.recover(&mut stack, &mut lookahead, &mut tokens)?
                    {
                        continue;
                    }
                    return Err(match offending {
                        Some(token) => ParseError::UnexpectedToken { token },
                        None => ParseError::UnexpectedEof,
                    });
                }
            }
        }
    }

    fn lookup(&self, state: usize, lookahead: Option<&Token>) -> Option<LRAction> {
        let sym = match lookahead {
            Some(token) => self.grammar.symbols.lookup(&token.name)?,
            None => self.grammar.end_sym,
        };
        self.table.action(state, sym)
    }

    /// Panic-mode resynchronization: pop states until one can shift the
    /// reserved `error` terminal, shift a synthetic `error` token at the
    /// failure position, then discard lookaheads until one has a usable
    /// action again. Gives up (false) when the stack or input runs out.
    fn recover<I>(
        &self,
        stack: &mut Vec<(usize, Option<V>)>,
        lookahead: &mut Option<Token>,
        tokens: &mut I,
    ) -> Result<bool, ParseError>
    where
        I: Iterator<Item = Result<Token, LexingError>>,
    {
        let error_pos = lookahead.as_ref().and_then(|t| t.source_pos);
        loop {
            let state = stack.last().expect("stack holds the initial frame").0;
            if let Some(LRAction::Shift(next)) = self.table.action(state, self.grammar.error_sym) {
                let mut token = Token::new(ERROR, "");
                token.source_pos = error_pos;
                stack.push((next, Some(V::from(token))));
                break;
            }
            if stack.len() == 1 {
                return Ok(false);
            }
            stack.pop();
        }

        let state = stack.last().expect("stack holds the error frame").0;
        loop {
            // a forced nonassoc Error entry is not progress; skip it like
            // a missing entry or the engine re-enters the error path with
            // the same configuration
            match self.lookup(state, lookahead.as_ref()) {
                Some(LRAction::Shift(_)) | Some(LRAction::Reduce(_)) | Some(LRAction::Accept) => {
                    return Ok(true);
                }
                Some(LRAction::Error) | None => {}
            }
            if lookahead.is_none() {
                return Ok(false);
            }
            *lookahead = pull(tokens)?;
        }
    }
}

fn pull<I>(tokens: &mut I) -> Result<Option<Token>, ParseError>
where
    I: Iterator<Item = Result<Token, LexingError>>,
{
    match tokens.next() {
        None => Ok(None),
        Some(Ok(token)) => Ok(Some(token)),
        Some(Err(err)) => Err(err.into()),
    }
}
