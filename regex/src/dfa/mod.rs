mod minimize;

use crate::nfa::{Nfa, StateSet};
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::{Display, Formatter};

pub type DfaStateId = usize;

/// Printable name of a DFA state.
///
/// The start state renders as `X`, accepting states as `Y`, `Y1`, `Y2`... and every
/// other state as its ordinal. Identity is the [`DfaStateId`], never the label.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    Start,
    Accept(usize),
    Ordinal(usize),
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Start => write!(f, "X"),
            Label::Accept(0) => write!(f, "Y"),
            Label::Accept(n) => write!(f, "Y{n}"),
            Label::Ordinal(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DfaState {
    label: Label,
    accepting: bool,
    transitions: BTreeMap<char, DfaStateId>,
}

impl DfaState {
    pub fn label(&self) -> Label {
        self.label
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    pub fn transitions(&self) -> &BTreeMap<char, DfaStateId> {
        &self.transitions
    }
}

/// Deterministic automaton: at most one successor per state and symbol, no epsilon
/// edges. A missing transition means the word is rejected.
#[derive(Clone, Debug, PartialEq)]
pub struct Dfa {
    states: Vec<DfaState>,
    start: DfaStateId,
}

impl Dfa {
    /// Subset construction. DFA states are discovered breadth-first from the closure
    /// of the NFA start, trying symbols in ascending order, and numbered in discovery
    /// order.
    pub fn from_nfa(nfa: &Nfa) -> Self {
        let alphabet = nfa.alphabet();
        let initial = nfa.epsilon_closure(&StateSet::from([nfa.start()]));

        let mut registry: BTreeMap<StateSet, DfaStateId> = BTreeMap::new();
        let mut discovered: Vec<StateSet> = vec![];
        let mut transitions: Vec<BTreeMap<char, DfaStateId>> = vec![];
        let mut worklist: VecDeque<DfaStateId> = VecDeque::new();

        registry.insert(initial.clone(), 0);
        discovered.push(initial);
        transitions.push(BTreeMap::new());
        worklist.push_back(0);

        while let Some(id) = worklist.pop_front() {
            for &symbol in &alphabet {
                let target = nfa.epsilon_closure(&nfa.move_on(&discovered[id], symbol));
                if target.is_empty() {
                    continue;
                }

                let target_id = match registry.get(&target) {
                    Some(&known) => known,
                    None => {
                        let new_id = discovered.len();
                        trace!("discovered DFA state {new_id} = {target:?}");
                        registry.insert(target.clone(), new_id);
                        discovered.push(target);
                        transitions.push(BTreeMap::new());
                        worklist.push_back(new_id);
                        new_id
                    }
                };
                transitions[id].insert(symbol, target_id);
            }
        }

        let labels = rename(&discovered, nfa.accept());
        let states: Vec<DfaState> = discovered
            .iter()
            .zip(labels)
            .zip(transitions)
            .map(|((set, label), transitions)| DfaState {
                label,
                accepting: set.contains(&nfa.accept()),
                transitions,
            })
            .collect();

        let dfa = Self { states, start: 0 };
        debug!(
            "determinized NFA of {} states into DFA of {} states, {} transitions",
            nfa.len(),
            dfa.len(),
            dfa.transition_count()
        );
        dfa
    }

    pub fn start(&self) -> DfaStateId {
        self.start
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[DfaState] {
        &self.states
    }

    pub fn state(&self, id: DfaStateId) -> Option<&DfaState> {
        self.states.get(id)
    }

    pub fn next(&self, id: DfaStateId, symbol: char) -> Option<DfaStateId> {
        self.states
            .get(id)
            .and_then(|state| state.transitions.get(&symbol))
            .copied()
    }

    pub fn is_accepting(&self, id: DfaStateId) -> bool {
        self.states.get(id).is_some_and(|state| state.accepting)
    }

    pub fn transition_count(&self) -> usize {
        self.states.iter().map(|s| s.transitions.len()).sum()
    }

    /// Symbols used by at least one transition, in ascending order.
    pub fn alphabet(&self) -> BTreeSet<char> {
        self.states
            .iter()
            .flat_map(|s| s.transitions.keys().copied())
            .collect()
    }

    /// Whole-word match. Unlike the recognizer this gives no per-symbol detail.
    pub fn accepts(&self, word: &str) -> bool {
        let mut cur = self.start;
        for symbol in word.chars() {
            match self.next(cur, symbol) {
                Some(next) => cur = next,
                None => return false,
            }
        }
        self.is_accepting(cur)
    }

    fn successors(&self) -> Vec<BTreeSet<DfaStateId>> {
        self.states
            .iter()
            .map(|state| state.transitions.values().copied().collect())
            .collect()
    }

    fn predecessors(&self) -> Vec<BTreeSet<DfaStateId>> {
        let mut predecessors = vec![BTreeSet::new(); self.states.len()];
        for (id, state) in self.states.iter().enumerate() {
            for &target in state.transitions.values() {
                predecessors[target].insert(id);
            }
        }
        predecessors
    }

    /// States in dump order: start, accepting, then ordinals.
    fn display_order(&self) -> Vec<DfaStateId> {
        let mut order: Vec<DfaStateId> = (0..self.states.len()).collect();
        order.sort_by_key(|&id| (id != self.start, self.states[id].label, id));
        order
    }

    /// The dump preceded by the alphabet line (`a b#`) and the state line (`X Y 0#`).
    pub fn listing(&self) -> DfaListing<'_> {
        DfaListing { dfa: self }
    }
}

fn rename(discovered: &[StateSet], nfa_accept: usize) -> Vec<Label> {
    let mut accepting = 0;
    let mut ordinals = 0;
    discovered
        .iter()
        .enumerate()
        .map(|(id, set)| {
            if id == 0 {
                Label::Start
            } else if set.contains(&nfa_accept) {
                accepting += 1;
                Label::Accept(accepting - 1)
            } else {
                ordinals += 1;
                Label::Ordinal(ordinals - 1)
            }
        })
        .collect()
}

impl Display for Dfa {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for id in self.display_order() {
            let state = &self.states[id];
            write!(f, "{}", state.label)?;
            for (symbol, &target) in &state.transitions {
                write!(f, " {}-{}->{}", state.label, symbol, self.states[target].label)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub struct DfaListing<'a> {
    dfa: &'a Dfa,
}

impl Display for DfaListing<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let symbols: Vec<String> = self.dfa.alphabet().iter().map(char::to_string).collect();
        writeln!(f, "{}#", symbols.join(" "))?;

        let labels: Vec<String> = self
            .dfa
            .display_order()
            .into_iter()
            .map(|id| self.dfa.states[id].label.to_string())
            .collect();
        writeln!(f, "{}#", labels.join(" "))?;

        write!(f, "{}", self.dfa)
    }
}
