use std::collections::HashMap;
use std::str::FromStr;

use crate::errors::GrammarError;

// everything is just indices since it is simpler; all cross-references
// between symbols, productions and LR items go through these
pub(crate) type SymId = usize;
pub(crate) type ProdId = usize;

pub(crate) const END: &str = "$end";
pub(crate) const EMPTY: &str = "<empty>";
pub(crate) const ERROR: &str = "error";
const AUGMENTED: &str = "S'";

/// Associativity of a terminal, used to arbitrate shift/reduce conflicts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    Nonassoc,
}

impl FromStr for Assoc {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Assoc, GrammarError> {
        match s {
            "left" => Ok(Assoc::Left),
            "right" => Ok(Assoc::Right),
            "nonassoc" => Ok(Assoc::Nonassoc),
            other => Err(GrammarError::InvalidAssociativity(other.to_string())),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct SymbolTable {
    names: Vec<String>,
    ids: HashMap<String, SymId>,
}

impl SymbolTable {
    fn intern(&mut self, name: &str) -> SymId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.names.len();
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<SymId> {
        self.ids.get(name).copied()
    }

    pub(crate) fn name(&self, id: SymId) -> &str {
        &self.names[id]
    }

    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }
}

/// A rewrite rule `lhs -> rhs`, identified by its position in the
/// grammar's production list. Production 0 is the synthetic
/// `S' -> start` inserted by `set_start`.
#[derive(Debug)]
pub(crate) struct Production {
    pub(crate) number: ProdId,
    pub(crate) lhs: SymId,
    pub(crate) rhs: Vec<SymId>,
    pub(crate) prec: (Assoc, usize),
}

impl Production {
    pub(crate) fn len(&self) -> usize {
        self.rhs.len()
    }
}

/// One LR(0) item in the arena: a production with a dot at `dot`.
/// `before` is the symbol the dot just moved past; `after` lists the
/// productions of the symbol right after the dot, which is what closure
/// expansion walks instead of re-scanning the grammar.
#[derive(Debug)]
pub(crate) struct LRItem {
    pub(crate) prod: ProdId,
    pub(crate) dot: usize,
    pub(crate) before: Option<SymId>,
    pub(crate) after: Vec<ProdId>,
}

/// The grammar model: interned symbols, the production list, the
/// precedence table and the use-site bookkeeping behind the
/// unused-symbol diagnostics. Mutated only while the generator is
/// collecting productions; immutable once the tables exist.
#[derive(Debug, Default)]
pub(crate) struct Grammar {
    pub(crate) symbols: SymbolTable,
    is_terminal: Vec<bool>,
    /// Declared terminals, declaration order (includes `error`).
    decl_terminals: Vec<SymId>,
    /// Nonterminals in first-seen order.
    nonterminals: Vec<SymId>,
    pub(crate) productions: Vec<Production>,
    /// Per symbol, the productions with that lhs.
    prods_of: Vec<Vec<ProdId>>,
    /// Per symbol, the productions whose rhs mentions it.
    used_in: Vec<Vec<ProdId>>,
    precedence: HashMap<SymId, (Assoc, usize)>,
    pub(crate) start: Option<SymId>,
    pub(crate) end_sym: SymId,
    pub(crate) empty_sym: SymId,
    pub(crate) error_sym: SymId,
    augmented_sym: SymId,
    /// LR item arena; `item_base[p] + dot` addresses the item of
    /// production `p` with the dot at `dot`.
    pub(crate) items: Vec<LRItem>,
    item_base: Vec<usize>,
}

impl Grammar {
    pub(crate) fn new<I, S>(terminals: I) -> Grammar
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut g = Grammar::default();
        g.end_sym = g.intern(END);
        g.empty_sym = g.intern(EMPTY);
        g.augmented_sym = g.intern(AUGMENTED);
        g.error_sym = g.intern(ERROR);
        g.is_terminal[g.error_sym] = true;
        for t in terminals {
            let id = g.intern(t.as_ref());
            if !g.is_terminal[id] {
                g.is_terminal[id] = true;
                g.decl_terminals.push(id);
            }
        }
        // placeholder for the augmented production; filled by set_start
        g.productions.push(Production {
            number: 0,
            lhs: g.augmented_sym,
            rhs: Vec::new(),
            prec: (Assoc::Right, 0),
        });
        g
    }

    fn intern(&mut self, name: &str) -> SymId {
        let id = self.symbols.intern(name);
        if id == self.is_terminal.len() {
            self.is_terminal.push(false);
            self.prods_of.push(Vec::new());
            self.used_in.push(Vec::new());
        }
        id
    }

    pub(crate) fn is_terminal(&self, sym: SymId) -> bool {
        self.is_terminal[sym]
    }

    pub(crate) fn name(&self, sym: SymId) -> &str {
        self.symbols.name(sym)
    }

    pub(crate) fn num_symbols(&self) -> usize {
        self.symbols.len()
    }

    pub(crate) fn nonterminals(&self) -> &[SymId] {
        &self.nonterminals
    }

    pub(crate) fn productions_of(&self, sym: SymId) -> &[ProdId] {
        &self.prods_of[sym]
    }

    pub(crate) fn precedence_of(&self, term: SymId) -> (Assoc, usize) {
        self.precedence.get(&term).copied().unwrap_or((Assoc::Right, 0))
    }

    pub(crate) fn set_precedence(
        &mut self,
        term: &str,
        assoc: Assoc,
        level: usize,
    ) -> Result<(), GrammarError> {
        let id = self.intern(term);
        if self.precedence.contains_key(&id) {
            return Err(GrammarError::PrecedenceRedeclared(term.to_string()));
        }
        self.precedence.insert(id, (assoc, level));
        Ok(())
    }

    /// Adds a production and assigns it the next sequential number.
    /// Effective precedence is the explicit override when given, else
    /// the entry of the rightmost terminal on the rhs, else the
    /// `(right, 0)` default.
    pub(crate) fn add_production(
        &mut self,
        lhs: &str,
        rhs: &[&str],
        precedence: Option<&str>,
    ) -> Result<ProdId, GrammarError> {
        if self.symbols.lookup(lhs).is_some_and(|id| self.is_terminal[id]) {
            return Err(GrammarError::IllegalRuleName(lhs.to_string()));
        }

        let rhs: Vec<SymId> = rhs.iter().map(|s| self.intern(s)).collect();

        let prod_prec = match precedence {
            None => {
                let rightmost = rhs.iter().rev().find(|&&s| self.is_terminal[s]);
                rightmost.map_or((Assoc::Right, 0), |t| self.precedence_of(*t))
            }
            Some(term) => {
                let id = self.symbols.lookup(term);
                match id.and_then(|id| self.precedence.get(&id)) {
                    Some(&prec) => prec,
                    None => return Err(GrammarError::UnknownPrecedence(term.to_string())),
                }
            }
        };

        let number = self.productions.len();
        let lhs = self.intern(lhs);
        if self.prods_of[lhs].is_empty() && !self.nonterminals.contains(&lhs) {
            self.nonterminals.push(lhs);
        }

        for &sym in &rhs {
            self.used_in[sym].push(number);
            if !self.is_terminal[sym] && !self.nonterminals.contains(&sym) {
                self.nonterminals.push(sym);
            }
        }

        self.prods_of[lhs].push(number);
        self.productions.push(Production {
            number,
            lhs,
            rhs,
            prec: prod_prec,
        });
        Ok(number)
    }

    /// Fixes the start symbol (lhs of the first user production) and
    /// fills in the augmented production `S' -> start`.
    pub(crate) fn set_start(&mut self) {
        let start = self.productions[1].lhs;
        self.productions[0].rhs = vec![start];
        self.used_in[start].push(0);
        self.start = Some(start);
    }

    /// Declared terminals never mentioned on any rhs. The reserved
    /// `error` terminal is exempt.
    pub(crate) fn unused_terminals(&self) -> Vec<String> {
        self.decl_terminals
            .iter()
            .filter(|&&t| self.used_in[t].is_empty())
            .map(|&t| self.name(t).to_string())
            .collect()
    }

    /// Nonterminals never mentioned on any rhs (the start symbol is
    /// referenced by the augmented production, so it never shows here).
    pub(crate) fn unused_nonterminals(&self) -> Vec<String> {
        self.nonterminals
            .iter()
            .filter(|&&n| self.used_in[n].is_empty())
            .map(|&n| self.name(n).to_string())
            .collect()
    }

    /// First rhs symbol that is neither a terminal nor the lhs of any
    /// production. Such a symbol can never be reduced to, so every
    /// production mentioning it is dead.
    pub(crate) fn undefined_symbol(&self) -> Option<String> {
        self.productions
            .iter()
            .flat_map(|p| &p.rhs)
            .find(|&&s| !self.is_terminal[s] && self.prods_of[s].is_empty())
            .map(|&s| self.name(s).to_string())
    }

    /// Walks the production list and builds the complete LR item arena.
    pub(crate) fn build_lr_items(&mut self) {
        self.items.clear();
        self.item_base.clear();
        for p in &self.productions {
            self.item_base.push(self.items.len());
            for dot in 0..=p.len() {
                let before = dot.checked_sub(1).map(|i| p.rhs[i]);
                let after = match p.rhs.get(dot) {
                    Some(&sym) if !self.is_terminal[sym] => self.prods_of[sym].clone(),
                    _ => Vec::new(),
                };
                self.items.push(LRItem {
                    prod: p.number,
                    dot,
                    before,
                    after,
                });
            }
        }
    }

    pub(crate) fn item_id(&self, prod: ProdId, dot: usize) -> usize {
        self.item_base[prod] + dot
    }

    /// The symbol immediately after the item's dot, if any.
    pub(crate) fn sym_after(&self, item: usize) -> Option<SymId> {
        let it = &self.items[item];
        self.productions[it.prod].rhs.get(it.dot).copied()
    }

    /// `lhs -> a b c` rendering for diagnostics.
    pub(crate) fn production_display(&self, prod: ProdId) -> String {
        let p = &self.productions[prod];
        let rhs: Vec<&str> = p.rhs.iter().map(|&s| self.name(s)).collect();
        format!("{} -> {}", self.name(p.lhs), rhs.join(" "))
    }
}
