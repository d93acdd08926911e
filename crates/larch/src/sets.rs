use bit_set::BitSet;

use crate::grammar::{Grammar, SymId};

/// A set of grammar symbols, backed by a bitset over the symbol-id
/// universe. FIRST/FOLLOW members are terminals plus the `<empty>` and
/// `$end` sentinels, so the universe is finite and every union is
/// monotone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct SymSet {
    data: BitSet,
}

impl SymSet {
    pub(crate) fn with_universe(n: usize) -> SymSet {
        SymSet {
            data: BitSet::with_capacity(n),
        }
    }

    pub(crate) fn insert(&mut self, sym: SymId) -> bool {
        self.data.insert(sym)
    }

    pub(crate) fn remove(&mut self, sym: SymId) -> bool {
        self.data.remove(sym)
    }

    pub(crate) fn contains(&self, sym: SymId) -> bool {
        self.data.contains(sym)
    }

    /// Unions `other` into `self`; true if anything was added.
    pub(crate) fn union_with(&mut self, other: &SymSet) -> bool {
        let before = self.data.len();
        self.data.union_with(&other.data);
        self.data.len() != before
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = SymId> + '_ {
        self.data.iter()
    }
}

/// FIRST and FOLLOW for every symbol, indexed by symbol id. A pure
/// function of the finalized grammar; both maps are fixpoints.
#[derive(Debug)]
pub(crate) struct Analysis {
    pub(crate) first: Vec<SymSet>,
    pub(crate) follow: Vec<SymSet>,
}

impl Analysis {
    pub(crate) fn compute(grammar: &Grammar) -> Analysis {
        let first = compute_first(grammar);
        let follow = compute_follow(grammar, &first);
        Analysis { first, follow }
    }
}

/// FIRST of a symbol sequence: accumulate each symbol's FIRST set until
/// one of them is not nullable; an empty or all-nullable sequence keeps
/// the `<empty>` marker.
pub(crate) fn sequence_first(grammar: &Grammar, first: &[SymSet], beta: &[SymId]) -> SymSet {
    let mut result = SymSet::with_universe(grammar.num_symbols());
    let mut all_nullable = true;
    for &x in beta {
        result.union_with(&first[x]);
        if !first[x].contains(grammar.empty_sym) {
            all_nullable = false;
            break;
        }
    }
    result.remove(grammar.empty_sym);
    if all_nullable {
        result.insert(grammar.empty_sym);
    }
    result
}

fn compute_first(grammar: &Grammar) -> Vec<SymSet> {
    let n = grammar.num_symbols();
    let mut first = vec![SymSet::with_universe(n); n];

    for sym in 0..n {
        if grammar.is_terminal(sym) {
            first[sym].insert(sym);
        }
    }
    first[grammar.end_sym].insert(grammar.end_sym);
    first[grammar.empty_sym].insert(grammar.empty_sym);

    let mut changed = true;
    while changed {
        changed = false;
        for &nt in grammar.nonterminals() {
            for &p in grammar.productions_of(nt) {
                let seq = sequence_first(grammar, &first, &grammar.productions[p].rhs);
                changed |= first[nt].union_with(&seq);
            }
        }
    }
    first
}

fn compute_follow(grammar: &Grammar, first: &[SymSet]) -> Vec<SymSet> {
    let n = grammar.num_symbols();
    let mut follow = vec![SymSet::with_universe(n); n];

    let start = grammar.start.expect("follow sets require a finalized grammar");
    follow[start].insert(grammar.end_sym);

    let mut added = true;
    while added {
        added = false;
        for p in &grammar.productions[1..] {
            for (i, &b) in p.rhs.iter().enumerate() {
                if grammar.is_terminal(b) {
                    continue;
                }
                let mut fst = sequence_first(grammar, first, &p.rhs[i + 1..]);
                let nullable = fst.remove(grammar.empty_sym);
                added |= follow[b].union_with(&fst);
                if nullable {
                    let from_lhs = follow[p.lhs].clone();
                    added |= follow[b].union_with(&from_lhs);
                }
            }
        }
    }
    follow
}
