use super::{Dfa, DfaState, DfaStateId, Label};
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::mem;

/// Blocks of states that are not yet known to behave differently.
///
/// Every live state is in exactly one block; accepting and rejecting states start in
/// separate blocks and splitting never brings them back together.
struct Partition {
    blocks: Vec<Vec<DfaStateId>>,
    block_of: Vec<usize>,
}

impl Partition {
    fn new(dfa: &Dfa) -> Self {
        let (accepting, rejecting): (Vec<DfaStateId>, Vec<DfaStateId>) =
            (0..dfa.len()).partition(|&id| dfa.states[id].accepting);

        let blocks: Vec<Vec<DfaStateId>> = [rejecting, accepting]
            .into_iter()
            .filter(|block| !block.is_empty())
            .collect();

        let mut block_of = vec![0; dfa.len()];
        for (block, members) in blocks.iter().enumerate() {
            for &member in members {
                block_of[member] = block;
            }
        }
        Self { blocks, block_of }
    }

    /// Groups the members of `block` by the block their `symbol` edge lands in. Members
    /// without such an edge form a group of their own. `None` when nothing splits.
    fn split(&self, dfa: &Dfa, block: usize, symbol: char) -> Option<Vec<Vec<DfaStateId>>> {
        let mut groups: BTreeMap<Option<usize>, Vec<DfaStateId>> = BTreeMap::new();
        for &member in &self.blocks[block] {
            let key = dfa.next(member, symbol).map(|target| self.block_of[target]);
            groups.entry(key).or_default().push(member);
        }

        (groups.len() > 1).then(|| groups.into_values().collect())
    }

    /// Splits blocks until no block splits on any symbol.
    ///
    /// Only blocks that may have become splittable are revisited: the ones just split
    /// and the ones holding a predecessor of a moved state.
    fn refine(&mut self, dfa: &Dfa) {
        let alphabet = dfa.alphabet();
        let predecessors = dfa.predecessors();
        let mut worklist: VecDeque<usize> = (0..self.blocks.len()).collect();
        let mut queued = vec![true; self.blocks.len()];

        while let Some(block) = worklist.pop_front() {
            queued[block] = false;
            if self.blocks[block].len() < 2 {
                continue;
            }

            let Some(groups) = alphabet
                .iter()
                .find_map(|&symbol| self.split(dfa, block, symbol))
            else {
                continue;
            };
            trace!("block {block} splits into {groups:?}");

            let mut touched = vec![block];
            let mut groups = groups.into_iter();
            if let Some(first) = groups.next() {
                self.blocks[block] = first;
            }
            for group in groups {
                let new_block = self.blocks.len();
                for &member in &group {
                    self.block_of[member] = new_block;
                }
                self.blocks.push(group);
                queued.push(false);
                touched.push(new_block);
            }

            let mut requeue: BTreeSet<usize> = touched.iter().copied().collect();
            for &changed in &touched {
                for &member in &self.blocks[changed] {
                    requeue.extend(predecessors[member].iter().map(|&p| self.block_of[p]));
                }
            }
            for block in requeue {
                if !queued[block] {
                    queued[block] = true;
                    worklist.push_back(block);
                }
            }
        }
    }

    /// One state per block, represented by its first member. Edges between members of
    /// the same block collapse onto a single self-loop of the representative.
    fn merge(mut self, dfa: &Dfa) -> Dfa {
        self.blocks.sort_by_key(|members| members.first().copied());
        for (block, members) in self.blocks.iter().enumerate() {
            for &member in members {
                self.block_of[member] = block;
            }
        }

        let states = self
            .blocks
            .iter()
            .filter_map(|members| {
                let representative = &dfa.states[*members.first()?];
                let mut transitions = BTreeMap::new();
                for &member in members {
                    for (&symbol, &target) in &dfa.states[member].transitions {
                        transitions.insert(symbol, self.block_of[target]);
                    }
                }
                Some(DfaState {
                    label: representative.label,
                    accepting: representative.accepting,
                    transitions,
                })
            })
            .collect();

        Dfa {
            states,
            start: self.block_of[dfa.start],
        }
    }
}

fn flood(mut seen: Vec<bool>, edges: &[BTreeSet<DfaStateId>]) -> Vec<bool> {
    let mut queue: VecDeque<DfaStateId> = (0..seen.len()).filter(|&id| seen[id]).collect();
    while let Some(id) = queue.pop_front() {
        for &next in &edges[id] {
            if !seen[next] {
                seen[next] = true;
                queue.push_back(next);
            }
        }
    }
    seen
}

impl Dfa {
    /// Drops every state that is unreachable from the start or cannot reach an accepting
    /// state, together with all transitions touching it, and returns the dropped labels.
    ///
    /// The start state always survives, even when the language is empty.
    pub fn eliminate_dead_states(&mut self) -> Vec<Label> {
        let mut roots = vec![false; self.states.len()];
        roots[self.start] = true;
        let from_start = flood(roots, &self.successors());
        let to_accept = flood(
            self.states.iter().map(|state| state.accepting).collect(),
            &self.predecessors(),
        );

        let alive: Vec<bool> = (0..self.states.len())
            .map(|id| id == self.start || (from_start[id] && to_accept[id]))
            .collect();

        let mut new_ids = vec![None; self.states.len()];
        let mut next_id = 0;
        for (id, &is_alive) in alive.iter().enumerate() {
            if is_alive {
                new_ids[id] = Some(next_id);
                next_id += 1;
            }
        }

        let mut removed = vec![];
        let mut survivors = Vec::with_capacity(next_id);
        for (id, mut state) in mem::take(&mut self.states).into_iter().enumerate() {
            if new_ids[id].is_none() {
                removed.push(state.label);
                continue;
            }
            state.transitions = state
                .transitions
                .into_iter()
                .filter_map(|(symbol, target)| new_ids[target].map(|target| (symbol, target)))
                .collect();
            survivors.push(state);
        }

        self.start = alive[..self.start].iter().filter(|&&a| a).count();
        self.states = survivors;

        if !removed.is_empty() {
            debug!("eliminated dead states {removed:?}");
        }
        removed
    }

    /// Dead-state elimination followed by partition refinement.
    pub fn minimize(mut self) -> Self {
        let initial_len = self.len();
        self.eliminate_dead_states();

        let mut partition = Partition::new(&self);
        partition.refine(&self);
        let minimized = partition.merge(&self);

        debug!(
            "minimized DFA from {} to {} states, {} transitions",
            initial_len,
            minimized.len(),
            minimized.transition_count()
        );
        minimized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Compilation;
    use rstest::rstest;

    /// Builds a DFA by hand: state 0 is the start, labels follow the usual scheme.
    fn dfa_of(len: usize, accepting: &[DfaStateId], edges: &[(DfaStateId, char, DfaStateId)]) -> Dfa {
        let mut accept_count = 0;
        let mut ordinal_count = 0;
        let mut states: Vec<DfaState> = (0..len)
            .map(|id| {
                let is_accepting = accepting.contains(&id);
                let label = if id == 0 {
                    Label::Start
                } else if is_accepting {
                    accept_count += 1;
                    Label::Accept(accept_count - 1)
                } else {
                    ordinal_count += 1;
                    Label::Ordinal(ordinal_count - 1)
                };
                DfaState {
                    label,
                    accepting: is_accepting,
                    transitions: BTreeMap::new(),
                }
            })
            .collect();
        for &(from, symbol, to) in edges {
            states[from].transitions.insert(symbol, to);
        }
        Dfa { states, start: 0 }
    }

    fn minimized(pattern: &str) -> Dfa {
        Compilation::new(pattern).unwrap().minimized().clone()
    }

    mod dead_states {
        use super::*;

        #[test]
        fn removes_unreachable_and_trap_states() {
            // given: 3 is unreachable, 4 is a trap that never accepts
            let mut dfa = dfa_of(
                5,
                &[2],
                &[(0, 'a', 1), (1, 'a', 2), (3, 'a', 2), (1, 'b', 4), (4, 'a', 4)],
            );

            // when
            let removed = dfa.eliminate_dead_states();

            // then
            assert_eq!(removed, vec![Label::Ordinal(1), Label::Ordinal(2)]);
            assert_eq!(dfa.len(), 3);
            assert_eq!(dfa.transition_count(), 2);
            assert!(dfa.accepts("aa"));
        }

        #[test]
        fn keeps_every_state_on_a_start_to_accept_path() {
            // given
            let mut dfa = dfa_of(3, &[2], &[(0, 'a', 1), (1, 'b', 0), (1, 'c', 2)]);
            let before = dfa.clone();

            // when
            let removed = dfa.eliminate_dead_states();

            // then
            assert!(removed.is_empty());
            assert_eq!(dfa, before);
        }

        #[test]
        fn start_survives_when_nothing_is_accepted() {
            // given
            let mut dfa = dfa_of(2, &[], &[(0, 'a', 1)]);

            // when
            dfa.eliminate_dead_states();

            // then
            assert_eq!(dfa.len(), 1);
            assert_eq!(dfa.transition_count(), 0);
            assert!(!dfa.accepts(""));
        }

        #[test]
        fn surviving_labels_keep_their_gaps() {
            // given
            let dfa = dfa_of(4, &[3], &[(0, 'a', 2), (0, 'b', 1), (2, 'a', 3)]);

            // when
            let minimized = dfa.minimize();

            // then
            insta::assert_snapshot!(minimized.listing().to_string(), @r"
            a#
            X Y 1#
            X X-a->1
            Y
            1 1-a->Y
            ");
        }
    }

    mod partition_refinement {
        use super::*;

        #[test]
        fn star_collapses_into_single_accepting_start() {
            // given
            let compilation = Compilation::new("a*").unwrap();

            // when
            let dfa = compilation.minimized();

            // then
            assert_eq!(compilation.dfa().len(), 2);
            assert_eq!(dfa.len(), 1);
            assert!(dfa.is_accepting(dfa.start()));
            insta::assert_snapshot!(dfa.to_string(), @"X X-a->X");
        }

        #[test]
        fn union_of_literals_has_two_edges_into_accept() {
            // given
            let dfa = minimized("a|b");

            // then
            assert_eq!(dfa.len(), 2);
            insta::assert_snapshot!(dfa.to_string(), @r"
            X X-a->Y X-b->Y
            Y
            ");
        }

        #[test]
        fn textbook_pattern_reaches_four_states() {
            // given
            let dfa = minimized("(a|b)*abb");

            // then
            insta::assert_snapshot!(dfa.listing().to_string(), @r"
            a b#
            X Y 0 2#
            X X-a->0 X-b->X
            Y Y-a->0 Y-b->X
            0 0-a->0 0-b->2
            2 2-a->0 2-b->Y
            ");
        }

        #[test]
        fn merged_cycle_keeps_its_self_loop() {
            // given: two accepting states bouncing on `a`
            let dfa = dfa_of(2, &[0, 1], &[(0, 'a', 1), (1, 'a', 0)]);

            // when
            let minimized = dfa.minimize();

            // then
            insta::assert_snapshot!(minimized.to_string(), @"X X-a->X");
            assert!(minimized.accepts("aaa"));
        }

        #[test]
        fn missing_transition_is_its_own_group() {
            // given: 0 and 1 agree on `a` but only 1 has `b`
            let dfa = dfa_of(3, &[2], &[(0, 'c', 1), (0, 'a', 2), (1, 'a', 2), (1, 'b', 2)]);

            // when
            let minimized = dfa.minimize();

            // then
            assert_eq!(minimized.len(), 3);
            assert!(minimized.accepts("cb"));
            assert!(!minimized.accepts("b"));
        }

        #[test]
        fn accepting_states_with_different_futures_stay_apart() {
            // given
            let dfa = minimized("(ab)|a");

            // then
            assert_eq!(dfa.len(), 3);
            assert!(dfa.accepts("a"));
            assert!(dfa.accepts("ab"));
            assert!(!dfa.accepts("abb"));
        }

        #[rstest]
        #[case("(a|b)*abb")]
        #[case("a*")]
        #[case("(ab)*|(ab)*c")]
        #[case("a(b|c)*d")]
        #[case("(a*b)*")]
        fn minimizing_twice_changes_nothing(#[case] pattern: &str) {
            // given
            let once = minimized(pattern);

            // when
            let twice = once.clone().minimize();

            // then
            assert_eq!(twice, once);
        }
    }
}
