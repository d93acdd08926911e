use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::grammar::{Grammar, SymId};
use crate::sets::{sequence_first, Analysis, SymSet};

/// One state of the LALR(1) automaton: the closed LR(0) item set (item
/// arena ids, sorted), one lookahead set per item, and the outgoing
/// transitions ordered by symbol id. Two occurrences with the same item
/// set are the same state; their lookaheads are unioned.
#[derive(Debug)]
pub(crate) struct State {
    pub(crate) items: Vec<usize>,
    pub(crate) lookaheads: Vec<SymSet>,
    pub(crate) transitions: Vec<(SymId, usize)>,
}

impl State {
    fn item_index(&self, item: usize) -> usize {
        self.items
            .binary_search(&item)
            .expect("item belongs to this state's closure")
    }

    pub(crate) fn transition(&self, sym: SymId) -> Option<usize> {
        self.transitions
            .binary_search_by_key(&sym, |&(s, _)| s)
            .ok()
            .map(|i| self.transitions[i].1)
    }
}

#[derive(Debug)]
pub(crate) struct Automaton {
    pub(crate) states: Vec<State>,
}

/// Expands a kernel to its full item set: whenever the dot sits before
/// a nonterminal, that nonterminal's dot-0 items join the set. The
/// arena's `after` links drive the expansion.
fn closure(grammar: &Grammar, kernel: &[usize]) -> Vec<usize> {
    let mut set: Vec<usize> = kernel.to_vec();
    let mut work: VecDeque<usize> = kernel.iter().copied().collect();
    while let Some(item) = work.pop_front() {
        for &p in &grammar.items[item].after {
            let id = grammar.item_id(p, 0);
            if !set.contains(&id) {
                set.push(id);
                work.push_back(id);
            }
        }
    }
    set.sort_unstable();
    set
}

/// Builds the canonical LALR(1) collection: LR(0) states discovered in
/// worklist order with core merging, then lookahead sets grown to a
/// fixpoint by propagation along goto edges and spontaneous generation
/// into closure items.
pub(crate) fn build(grammar: &Grammar, analysis: &Analysis) -> Automaton {
    let n = grammar.num_symbols();
    let mut states: Vec<State> = Vec::new();
    let mut known: HashMap<Vec<usize>, usize> = HashMap::new();

    let initial = closure(grammar, &[grammar.item_id(0, 0)]);
    known.insert(initial.clone(), 0);
    states.push(new_state(initial, n));

    let mut work: VecDeque<usize> = VecDeque::from([0]);
    while let Some(s) = work.pop_front() {
        // group the state's items by the symbol after the dot, in
        // symbol-id order so discovery numbering is reproducible
        let mut moves: BTreeMap<SymId, Vec<usize>> = BTreeMap::new();
        for &item in &states[s].items {
            if let Some(sym) = grammar.sym_after(item) {
                // the advanced item is the arena neighbor
                moves.entry(sym).or_default().push(item + 1);
            }
        }

        for (sym, kernel) in moves {
            let set = closure(grammar, &kernel);
            let target = match known.get(&set) {
                Some(&t) => t,
                None => {
                    let t = states.len();
                    known.insert(set.clone(), t);
                    states.push(new_state(set, n));
                    work.push_back(t);
                    t
                }
            };
            states[s].transitions.push((sym, target));
        }
    }

    propagate_lookaheads(grammar, analysis, &mut states);
    Automaton { states }
}

fn new_state(items: Vec<usize>, universe: usize) -> State {
    let lookaheads = vec![SymSet::with_universe(universe); items.len()];
    State {
        items,
        lookaheads,
        transitions: Vec::new(),
    }
}

/// Grows every item's lookahead set until nothing changes. The
/// augmented item in state 0 is seeded with `$end`; an item
/// `A -> α . X β` with lookaheads L pushes L to its advanced twin in
/// `goto(state, X)`, and when X is a nonterminal it generates
/// FIRST(β) — with L substituted when β is nullable — into every
/// `X -> . γ` closure item of the same state.
fn propagate_lookaheads(grammar: &Grammar, analysis: &Analysis, states: &mut [State]) {
    let seed = states[0].item_index(grammar.item_id(0, 0));
    states[0].lookaheads[seed].insert(grammar.end_sym);

    let mut changed = true;
    while changed {
        changed = false;
        for s in 0..states.len() {
            let items = states[s].items.clone();
            for (idx, &item) in items.iter().enumerate() {
                let Some(sym) = grammar.sym_after(item) else {
                    continue;
                };
                let la = states[s].lookaheads[idx].clone();

                let target = states[s]
                    .transition(sym)
                    .expect("every dotted symbol has a goto transition");
                let adv = states[target].item_index(item + 1);
                changed |= states[target].lookaheads[adv].union_with(&la);

                if !grammar.is_terminal(sym) && !grammar.items[item].after.is_empty() {
                    let it = &grammar.items[item];
                    let beta = &grammar.productions[it.prod].rhs[it.dot + 1..];
                    let mut gen = sequence_first(grammar, &analysis.first, beta);
                    if gen.remove(grammar.empty_sym) {
                        gen.union_with(&la);
                    }
                    for &p in &grammar.items[item].after {
                        let pos = states[s].item_index(grammar.item_id(p, 0));
                        changed |= states[s].lookaheads[pos].union_with(&gen);
                    }
                }
            }
        }
    }

    debug_assert!(within_follow(grammar, analysis, states));
}

/// LALR lookaheads never leave FOLLOW of the reduced nonterminal; the
/// approximation merges states, it does not invent lookaheads.
fn within_follow(grammar: &Grammar, analysis: &Analysis, states: &[State]) -> bool {
    states.iter().all(|state| {
        state.items.iter().zip(&state.lookaheads).all(|(&item, la)| {
            let it = &grammar.items[item];
            if it.prod == 0 || grammar.sym_after(item).is_some() {
                return true;
            }
            let lhs = grammar.productions[it.prod].lhs;
            la.iter().all(|t| analysis.follow[lhs].contains(t))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // main -> expr ; expr -> expr PLUS expr | expr MINUS expr | NUMBER
    fn calc_grammar() -> Grammar {
        let mut g = Grammar::new(["NUMBER", "PLUS", "MINUS"]);
        g.add_production("main", &["expr"], None).unwrap();
        g.add_production("expr", &["expr", "PLUS", "expr"], None).unwrap();
        g.add_production("expr", &["expr", "MINUS", "expr"], None).unwrap();
        g.add_production("expr", &["NUMBER"], None).unwrap();
        g.set_start();
        g.build_lr_items();
        g
    }

    #[test]
    fn initial_state_closes_over_the_start_productions() {
        let g = calc_grammar();
        let analysis = Analysis::compute(&g);
        let automaton = build(&g, &analysis);

        let mut expected = vec![
            g.item_id(0, 0),
            g.item_id(1, 0),
            g.item_id(2, 0),
            g.item_id(3, 0),
            g.item_id(4, 0),
        ];
        expected.sort_unstable();
        assert_eq!(automaton.states[0].items, expected);
    }

    #[test]
    fn identical_cores_are_merged_rather_than_duplicated() {
        let g = calc_grammar();
        let analysis = Analysis::compute(&g);
        let automaton = build(&g, &analysis);

        // after expr PLUS and expr MINUS, shifting NUMBER must land in
        // the same state both times
        let number = g.symbols.lookup("NUMBER").unwrap();
        let targets: Vec<usize> = automaton
            .states
            .iter()
            .filter_map(|s| s.transition(number))
            .collect();
        assert!(targets.len() > 1);
        assert!(targets.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn construction_is_deterministic() {
        let g1 = calc_grammar();
        let g2 = calc_grammar();
        let a1 = build(&g1, &Analysis::compute(&g1));
        let a2 = build(&g2, &Analysis::compute(&g2));

        assert_eq!(a1.states.len(), a2.states.len());
        for (s1, s2) in a1.states.iter().zip(&a2.states) {
            assert_eq!(s1.items, s2.items);
            assert_eq!(s1.transitions, s2.transitions);
            assert_eq!(s1.lookaheads, s2.lookaheads);
        }
    }

    #[test]
    fn augmented_item_sees_only_end_of_input() {
        let g = calc_grammar();
        let analysis = Analysis::compute(&g);
        let automaton = build(&g, &analysis);

        // S' -> main . lives in goto(0, main)
        let main = g.symbols.lookup("main").unwrap();
        let t = automaton.states[0].transition(main).unwrap();
        let idx = automaton.states[t].item_index(g.item_id(0, 1));
        let la: Vec<usize> = automaton.states[t].lookaheads[idx].iter().collect();
        assert_eq!(la, vec![g.end_sym]);
    }

    #[test]
    fn reduce_item_lookaheads_match_follow_for_this_grammar() {
        let g = calc_grammar();
        let analysis = Analysis::compute(&g);
        let automaton = build(&g, &analysis);

        // expr -> NUMBER . must be reducible on PLUS, MINUS and $end
        let number = g.symbols.lookup("NUMBER").unwrap();
        let t = automaton.states[0].transition(number).unwrap();
        let idx = automaton.states[t].item_index(g.item_id(4, 1));
        let mut la: Vec<&str> = automaton.states[t].lookaheads[idx]
            .iter()
            .map(|s| g.name(s))
            .collect();
        la.sort();
        assert_eq!(la, vec!["$end", "MINUS", "PLUS"]);
    }
}
