use crate::error::{RegexError, RegexErrorKind};
use crate::token::{EPSILON_MARKER, Token, TokenSequence};
use log::debug;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::{Display, Formatter};
use std::mem;

pub type StateId = usize;

/// A set of NFA states. Ordered, so equal sets compare and iterate identically.
pub type StateSet = BTreeSet<StateId>;

/// Outgoing edges of one NFA state. Each state owns its edges; splicing fragments
/// moves them between states explicitly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NfaState {
    transitions: BTreeMap<char, StateSet>,
    epsilon: StateSet,
}

impl NfaState {
    pub fn transitions(&self) -> &BTreeMap<char, StateSet> {
        &self.transitions
    }

    pub fn epsilon(&self) -> &StateSet {
        &self.epsilon
    }

    fn absorb(&mut self, other: NfaState) {
        for (symbol, targets) in other.transitions {
            self.transitions.entry(symbol).or_default().extend(targets);
        }
        self.epsilon.extend(other.epsilon);
    }

    fn redirect(&mut self, from: StateId, to: StateId) {
        for targets in self
            .transitions
            .values_mut()
            .chain(std::iter::once(&mut self.epsilon))
        {
            if targets.remove(&from) {
                targets.insert(to);
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Nfa {
    states: Vec<NfaState>,
    start_state: StateId,
    accept_state: StateId,
}

/// Sub-automaton with a single entry and a single exit. The entry never has incoming
/// edges and the exit never has outgoing ones; every operator below keeps it that way.
#[derive(Clone, Copy, Debug)]
struct Fragment {
    start: StateId,
    end: StateId,
}

struct ThompsonBuilder {
    states: Vec<NfaState>,
    discarded: Vec<bool>,
    stack: Vec<Fragment>,
}

impl ThompsonBuilder {
    fn new() -> Self {
        Self {
            states: vec![],
            discarded: vec![],
            stack: vec![],
        }
    }

    fn add_state(&mut self) -> StateId {
        self.states.push(NfaState::default());
        self.discarded.push(false);
        self.states.len() - 1
    }

    fn pop(&mut self, offset: usize) -> Result<Fragment, RegexError> {
        self.stack
            .pop()
            .ok_or(RegexError::new(RegexErrorKind::MalformedPostfix, offset))
    }

    /// Folds `from` into `into`: its edges move over, edges pointing at it are redirected,
    /// and `from` stops existing.
    fn merge(&mut self, into: StateId, from: StateId) {
        let absorbed = mem::take(&mut self.states[from]);
        self.states[into].absorb(absorbed);
        for state in &mut self.states {
            state.redirect(from, into);
        }
        self.discarded[from] = true;
    }

    fn literal(&mut self, c: char) {
        let start = self.add_state();
        let end = self.add_state();
        self.states[start]
            .transitions
            .entry(c)
            .or_default()
            .insert(end);
        self.stack.push(Fragment { start, end });
    }

    fn concatenate(&mut self, offset: usize) -> Result<(), RegexError> {
        let right = self.pop(offset)?;
        let left = self.pop(offset)?;

        self.merge(left.end, right.start);
        self.stack.push(Fragment {
            start: left.start,
            end: right.end,
        });
        Ok(())
    }

    /// Both branches share the left branch's entry and exit. No fresh states or
    /// epsilon edges are added, unlike the textbook construction.
    fn alternate(&mut self, offset: usize) -> Result<(), RegexError> {
        let right = self.pop(offset)?;
        let left = self.pop(offset)?;

        self.merge(left.start, right.start);
        self.merge(left.end, right.end);
        self.stack.push(left);
        Ok(())
    }

    /// The loop body is re-entered from the old exit: the old entry keeps a single
    /// epsilon edge to the exit, the exit takes over the entry's edges, and a fresh
    /// state becomes the new exit.
    fn kleene_star(&mut self, offset: usize) -> Result<(), RegexError> {
        let fragment = self.pop(offset)?;

        let body = mem::take(&mut self.states[fragment.start]);
        self.states[fragment.end].absorb(body);
        self.states[fragment.start].epsilon.insert(fragment.end);

        let new_end = self.add_state();
        self.states[fragment.end].epsilon.insert(new_end);

        self.stack.push(Fragment {
            start: fragment.start,
            end: new_end,
        });
        Ok(())
    }

    /// Drops discarded states and renumbers the survivors in allocation order.
    fn finish(mut self, offset: usize) -> Result<Nfa, RegexError> {
        let fragment = match (self.stack.pop(), self.stack.is_empty()) {
            (Some(fragment), true) => fragment,
            _ => return Err(RegexError::new(RegexErrorKind::MalformedPostfix, offset)),
        };

        let mut new_ids = vec![None; self.states.len()];
        let mut next_id = 0;
        for (id, discarded) in self.discarded.iter().enumerate() {
            if !discarded {
                new_ids[id] = Some(next_id);
                next_id += 1;
            }
        }
        let renumber = |targets: StateSet| -> StateSet {
            targets.into_iter().filter_map(|t| new_ids[t]).collect()
        };

        let mut states = Vec::with_capacity(next_id);
        for (id, state) in self.states.into_iter().enumerate() {
            if new_ids[id].is_none() {
                continue;
            }
            states.push(NfaState {
                transitions: state
                    .transitions
                    .into_iter()
                    .map(|(symbol, targets)| (symbol, renumber(targets)))
                    .collect(),
                epsilon: renumber(state.epsilon),
            });
        }

        match (new_ids[fragment.start], new_ids[fragment.end]) {
            (Some(start_state), Some(accept_state)) => Ok(Nfa {
                states,
                start_state,
                accept_state,
            }),
            _ => Err(RegexError::new(RegexErrorKind::MalformedPostfix, offset)),
        }
    }
}

impl Nfa {
    /// Thompson construction over a postfix token stream.
    pub fn from_postfix(postfix: &TokenSequence) -> Result<Self, RegexError> {
        let mut builder = ThompsonBuilder::new();
        let mut last_offset = 0;

        for &(offset, token) in postfix.iter() {
            last_offset = offset;
            match token {
                Token::Literal(c) => builder.literal(c),
                Token::Concat => builder.concatenate(offset)?,
                Token::Union => builder.alternate(offset)?,
                Token::Star => builder.kleene_star(offset)?,
                Token::LParen | Token::RParen => {
                    return Err(RegexError::new(RegexErrorKind::MalformedPostfix, offset));
                }
            }
        }

        let nfa = builder.finish(last_offset)?;
        debug!(
            "built NFA for '{}': {} states, {} transitions",
            postfix,
            nfa.len(),
            nfa.transition_count()
        );
        Ok(nfa)
    }

    pub fn start(&self) -> StateId {
        self.start_state
    }

    pub fn accept(&self) -> StateId {
        self.accept_state
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, id: StateId) -> Option<&NfaState> {
        self.states.get(id)
    }

    pub fn transition_count(&self) -> usize {
        self.states
            .iter()
            .map(|s| s.epsilon.len() + s.transitions.values().map(|t| t.len()).sum::<usize>())
            .sum()
    }

    /// Symbols that label at least one transition, in ascending order.
    pub fn alphabet(&self) -> BTreeSet<char> {
        self.states
            .iter()
            .flat_map(|s| s.transitions.keys().copied())
            .collect()
    }

    pub fn epsilon_closure(&self, initial_states: &StateSet) -> StateSet {
        let mut reachable = initial_states.clone();
        let mut queue: VecDeque<StateId> = initial_states.iter().copied().collect();

        while let Some(cur) = queue.pop_front() {
            for &next in &self.states[cur].epsilon {
                if reachable.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        reachable
    }

    /// States reachable from `states` over a single edge labelled `symbol`.
    pub fn move_on(&self, states: &StateSet, symbol: char) -> StateSet {
        states
            .iter()
            .filter_map(|&state| self.states[state].transitions.get(&symbol))
            .flatten()
            .copied()
            .collect()
    }

    /// Direct simulation, independent of the DFA stages.
    pub fn accepts(&self, s: &str) -> bool {
        let mut current_states = self.epsilon_closure(&StateSet::from([self.start_state]));
        for c in s.chars() {
            current_states = self.epsilon_closure(&self.move_on(&current_states, c));
            if current_states.is_empty() {
                return false;
            }
        }

        current_states.contains(&self.accept_state)
    }

    /// Dump labels indexed by state id: `X`, `Y`, then ordinals in allocation order.
    fn labels(&self) -> Vec<String> {
        let mut ordinal = 0;
        (0..self.states.len())
            .map(|id| {
                if id == self.start_state {
                    "X".to_string()
                } else if id == self.accept_state {
                    "Y".to_string()
                } else {
                    ordinal += 1;
                    (ordinal - 1).to_string()
                }
            })
            .collect()
    }
}

/// One line per state: start (`X`) first, accept (`Y`) second, the rest in allocation
/// order. Epsilon edges come before labelled ones.
impl Display for Nfa {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rest = (0..self.states.len())
            .filter(|&id| id != self.start_state && id != self.accept_state);
        let order = [self.start_state, self.accept_state].into_iter().chain(rest);

        let labels = self.labels();
        for id in order {
            let from = &labels[id];
            write!(f, "{from}")?;
            let state = &self.states[id];
            for &target in &state.epsilon {
                write!(f, " {from}-{EPSILON_MARKER}->{}", labels[target])?;
            }
            for (symbol, targets) in &state.transitions {
                for &target in targets {
                    write!(f, " {from}-{symbol}->{}", labels[target])?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
