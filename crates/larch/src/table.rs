use std::collections::HashMap;

use crate::errors::GeneratorWarning;
use crate::grammar::{Assoc, Grammar, ProdId, SymId};
use crate::lalr::Automaton;

/// Runtime decision for a (state, terminal) pair. Entries that are
/// absent from the table are implicit errors; an explicit `Error` entry
/// is the nonassoc resolution, which forces a syntax error where a
/// shift would otherwise be possible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LRAction {
    Shift(usize),
    Reduce(ProdId),
    Accept,
    Error,
}

/// The assembled ACTION/GOTO tables, the only artifact kept once the
/// automaton is discarded.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct LRTable {
    pub(crate) action: Vec<HashMap<SymId, LRAction>>,
    pub(crate) goto: Vec<HashMap<SymId, usize>>,
}

impl LRTable {
    pub(crate) fn action(&self, state: usize, sym: SymId) -> Option<LRAction> {
        self.action[state].get(&sym).copied()
    }

    pub(crate) fn goto(&self, state: usize, sym: SymId) -> usize {
        self.goto[state][&sym]
    }
}

/// Emits ACTION/GOTO from the automaton, arbitrating conflicts with the
/// declared precedence table. Shift entries are installed first; each
/// reduce item then either fills an empty cell or fights the existing
/// entry.
pub(crate) fn assemble(grammar: &Grammar, automaton: &Automaton) -> (LRTable, Vec<GeneratorWarning>) {
    let mut action: Vec<HashMap<SymId, LRAction>> = Vec::with_capacity(automaton.states.len());
    let mut goto: Vec<HashMap<SymId, usize>> = Vec::with_capacity(automaton.states.len());
    let mut warnings = Vec::new();
    let mut sr_conflicts = 0usize;

    for (s, state) in automaton.states.iter().enumerate() {
        let mut row: HashMap<SymId, LRAction> = HashMap::new();
        let mut goto_row: HashMap<SymId, usize> = HashMap::new();

        for &(sym, target) in &state.transitions {
            if grammar.is_terminal(sym) {
                row.insert(sym, LRAction::Shift(target));
            } else {
                goto_row.insert(sym, target);
            }
        }

        // items are sorted by arena id, so reduce items arrive in
        // production-number order and the earliest declaration wins ties
        for (idx, &item) in state.items.iter().enumerate() {
            if grammar.sym_after(item).is_some() {
                continue;
            }
            let prod = grammar.items[item].prod;
            let mut lookaheads: Vec<SymId> = state.lookaheads[idx].iter().collect();
            lookaheads.sort_unstable();

            for term in lookaheads {
                if prod == 0 {
                    if term == grammar.end_sym {
                        row.insert(term, LRAction::Accept);
                    }
                    continue;
                }
                match row.get(&term).copied() {
                    None => {
                        row.insert(term, LRAction::Reduce(prod));
                    }
                    Some(LRAction::Shift(_)) => {
                        let (_, slevel) = grammar.precedence_of(term);
                        let (rassoc, rlevel) = grammar.productions[prod].prec;
                        if slevel < rlevel || (slevel == rlevel && rassoc == Assoc::Left) {
                            row.insert(term, LRAction::Reduce(prod));
                        } else if slevel == rlevel && rassoc == Assoc::Nonassoc {
                            row.insert(term, LRAction::Error);
                        } else if slevel == 0 && rlevel == 0 {
                            // neither side declared precedence; favor the shift
                            sr_conflicts += 1;
                        }
                    }
                    Some(LRAction::Reduce(other)) => {
                        let (chosen, rejected) = if other < prod {
                            (other, prod)
                        } else {
                            (prod, other)
                        };
                        row.insert(term, LRAction::Reduce(chosen));
                        warnings.push(GeneratorWarning::ReduceReduce {
                            state: s,
                            chosen: grammar.production_display(chosen),
                            rejected: grammar.production_display(rejected),
                        });
                    }
                    Some(LRAction::Accept) | Some(LRAction::Error) => {}
                }
            }
        }

        action.push(row);
        goto.push(goto_row);
    }

    if sr_conflicts > 0 {
        warnings.push(GeneratorWarning::ShiftReduceConflicts {
            count: sr_conflicts,
        });
    }
    for t in grammar.unused_terminals() {
        warnings.push(GeneratorWarning::UnusedTerminal(t));
    }
    for n in grammar.unused_nonterminals() {
        warnings.push(GeneratorWarning::UnusedNonterminal(n));
    }

    (LRTable { action, goto }, warnings)
}
