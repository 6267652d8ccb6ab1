//! SLR(1) automaton construction: nullable/FIRST/FOLLOW analysis, the LR(0)
//! collection, and action-table emission with static conflict resolution.
//!
//! Resolution policy: shift/reduce conflicts consult declared precedence
//! (reduce when the rule binds tighter, or on a tie with left associativity)
//! and default to shift; reduce/reduce conflicts keep the earlier rule.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use oxiby_language::{Action, Production, State, Symbol, SymbolInfo};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::Assoc;

pub(crate) struct Grammar<'a> {
    pub(crate) symbols: &'a [SymbolInfo],
    pub(crate) productions: &'a [Production],
    pub(crate) prod_precs: &'a [Option<(u8, Assoc)>],
    pub(crate) token_precs: &'a FxHashMap<Symbol, (u8, Assoc)>,
}

pub(crate) fn construct(grammar: &Grammar<'_>) -> Vec<State> {
    let analysis = Analysis::run(grammar);
    let (state_items, transitions) = collect_states(grammar, &analysis);
    emit_states(grammar, &analysis, &state_items, &transitions)
}

/// Dotted position inside a production.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Item {
    prod: u32,
    dot: u32,
}

struct Analysis {
    nullable: Vec<bool>,
    first: Vec<BitSet>,
    follow: Vec<BitSet>,
    prods_by_lhs: Vec<Vec<u32>>,
}

impl Analysis {
    fn run(grammar: &Grammar<'_>) -> Self {
        let symbol_count = grammar.symbols.len();

        let mut prods_by_lhs = vec![Vec::new(); symbol_count];
        for (index, prod) in grammar.productions.iter().enumerate() {
            prods_by_lhs[prod.lhs.index()].push(index as u32);
        }

        let mut nullable = vec![false; symbol_count];
        loop {
            let mut changed = false;
            for prod in grammar.productions {
                if !nullable[prod.lhs.index()]
                    && prod.rhs.iter().all(|symbol| nullable[symbol.index()])
                {
                    nullable[prod.lhs.index()] = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        let mut first = vec![BitSet::new(symbol_count); symbol_count];
        for (index, info) in grammar.symbols.iter().enumerate() {
            if info.terminal {
                first[index].insert(index);
            }
        }
        loop {
            let mut changed = false;
            for prod in grammar.productions {
                for &symbol in &prod.rhs {
                    let source = first[symbol.index()].clone();
                    changed |= first[prod.lhs.index()].union_with(&source);
                    if !nullable[symbol.index()] {
                        break;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        let mut follow = vec![BitSet::new(symbol_count); symbol_count];
        // Production 0 is `$start := root`; end-of-input follows the start.
        follow[grammar.productions[0].lhs.index()].insert(Symbol::END.index());
        loop {
            let mut changed = false;
            for prod in grammar.productions {
                for (position, &symbol) in prod.rhs.iter().enumerate() {
                    if grammar.symbols[symbol.index()].terminal {
                        continue;
                    }
                    let mut rest_nullable = true;
                    for &rest in &prod.rhs[position + 1..] {
                        let source = first[rest.index()].clone();
                        changed |= follow[symbol.index()].union_with(&source);
                        if !nullable[rest.index()] {
                            rest_nullable = false;
                            break;
                        }
                    }
                    if rest_nullable {
                        let source = follow[prod.lhs.index()].clone();
                        changed |= follow[symbol.index()].union_with(&source);
                    }
                }
            }
            if !changed {
                break;
            }
        }

        Self { nullable, first, follow, prods_by_lhs }
    }
}

fn closure(grammar: &Grammar<'_>, analysis: &Analysis, kernel: Vec<Item>) -> Vec<Item> {
    let mut items = kernel;
    let mut seen: FxHashSet<Item> = items.iter().copied().collect();
    let mut cursor = 0;
    while cursor < items.len() {
        let item = items[cursor];
        cursor += 1;
        let prod = &grammar.productions[item.prod as usize];
        let Some(&next) = prod.rhs.get(item.dot as usize) else { continue };
        if grammar.symbols[next.index()].terminal {
            continue;
        }
        for &candidate in &analysis.prods_by_lhs[next.index()] {
            let new = Item { prod: candidate, dot: 0 };
            if seen.insert(new) {
                items.push(new);
            }
        }
    }
    items.sort_unstable();
    items
}

type Transitions = Vec<BTreeMap<Symbol, u32>>;

fn collect_states(grammar: &Grammar<'_>, analysis: &Analysis) -> (Vec<Vec<Item>>, Transitions) {
    let start = closure(grammar, analysis, vec![Item { prod: 0, dot: 0 }]);
    let mut intern: FxHashMap<Vec<Item>, u32> = FxHashMap::default();
    intern.insert(start.clone(), 0);
    let mut state_items = vec![start];
    let mut transitions: Transitions = Vec::new();

    let mut cursor = 0;
    while cursor < state_items.len() {
        let items = state_items[cursor].clone();
        cursor += 1;

        let mut kernels: BTreeMap<Symbol, Vec<Item>> = BTreeMap::new();
        for item in &items {
            let prod = &grammar.productions[item.prod as usize];
            if let Some(&next) = prod.rhs.get(item.dot as usize) {
                kernels.entry(next).or_default().push(Item { prod: item.prod, dot: item.dot + 1 });
            }
        }

        let mut state_transitions = BTreeMap::new();
        for (symbol, kernel) in kernels {
            let closed = closure(grammar, analysis, kernel);
            let target = match intern.entry(closed) {
                std::collections::hash_map::Entry::Occupied(entry) => *entry.get(),
                std::collections::hash_map::Entry::Vacant(entry) => {
                    let id = state_items.len() as u32;
                    state_items.push(entry.key().clone());
                    entry.insert(id);
                    id
                }
            };
            state_transitions.insert(symbol, target);
        }
        transitions.push(state_transitions);
    }

    (state_items, transitions)
}

fn emit_states(
    grammar: &Grammar<'_>,
    analysis: &Analysis,
    state_items: &[Vec<Item>],
    transitions: &Transitions,
) -> Vec<State> {
    let mut states = Vec::with_capacity(state_items.len());
    for (items, state_transitions) in state_items.iter().zip(transitions) {
        let mut actions: BTreeMap<Symbol, Action> = BTreeMap::new();
        let mut gotos: BTreeMap<Symbol, u32> = BTreeMap::new();

        for (&symbol, &target) in state_transitions {
            if grammar.symbols[symbol.index()].terminal {
                actions.insert(symbol, Action::Shift(target));
            } else {
                gotos.insert(symbol, target);
            }
        }

        for item in items {
            let prod = &grammar.productions[item.prod as usize];
            if item.dot as usize != prod.rhs.len() {
                continue;
            }
            if item.prod == 0 {
                actions.insert(Symbol::END, Action::Accept);
                continue;
            }
            for terminal in analysis.follow[prod.lhs.index()].iter() {
                add_reduce(grammar, &mut actions, Symbol::new(terminal as u16), item.prod);
            }
        }

        states.push(State {
            actions: actions.into_iter().collect::<Vec<_>>().into_boxed_slice(),
            gotos: gotos.into_iter().collect::<Vec<_>>().into_boxed_slice(),
        });
    }
    states
}

fn add_reduce(
    grammar: &Grammar<'_>,
    actions: &mut BTreeMap<Symbol, Action>,
    terminal: Symbol,
    prod: u32,
) {
    match actions.entry(terminal) {
        Entry::Vacant(entry) => {
            entry.insert(Action::Reduce(prod));
        }
        Entry::Occupied(mut entry) => match *entry.get() {
            Action::Shift(_) => {
                let rule_prec = grammar.prod_precs[prod as usize];
                let token_prec = grammar.token_precs.get(&terminal);
                if let (Some((rule_level, assoc)), Some(&(token_level, _))) =
                    (rule_prec, token_prec)
                {
                    if rule_level > token_level
                        || (rule_level == token_level && assoc == Assoc::Left)
                    {
                        entry.insert(Action::Reduce(prod));
                    }
                }
            }
            Action::Reduce(existing) => {
                if prod < existing {
                    entry.insert(Action::Reduce(prod));
                }
            }
            Action::Accept => {}
        },
    }
}

/// Fixed-width bit set over symbol ids.
#[derive(Clone, PartialEq, Eq)]
struct BitSet {
    words: Vec<u64>,
}

impl BitSet {
    fn new(len: usize) -> Self {
        Self { words: vec![0; len.div_ceil(64)] }
    }

    fn insert(&mut self, index: usize) -> bool {
        let mask = 1u64 << (index % 64);
        let word = &mut self.words[index / 64];
        let missing = *word & mask == 0;
        *word |= mask;
        missing
    }

    fn union_with(&mut self, other: &Self) -> bool {
        let mut changed = false;
        for (word, &source) in self.words.iter_mut().zip(&other.words) {
            let merged = *word | source;
            changed |= merged != *word;
            *word = merged;
        }
        changed
    }

    fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(index, &word)| {
            (0..64usize)
                .filter(move |&bit| word & (1u64 << bit) != 0)
                .map(move |bit| index * 64 + bit)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitset_insert_union_iter() {
        let mut a = BitSet::new(130);
        assert!(a.insert(0));
        assert!(a.insert(129));
        assert!(!a.insert(0));

        let mut b = BitSet::new(130);
        b.insert(64);
        assert!(b.union_with(&a));
        assert!(!b.union_with(&a));
        assert_eq!(b.iter().collect::<Vec<_>>(), vec![0, 64, 129]);
    }
}
