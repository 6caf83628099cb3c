//! The `Dfa` value: a deterministic finite automaton with a partial transition function.

use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use std::collections::VecDeque;
use tracing::trace;

use crate::{Error, Result};

// define type alias for state-id and input symbol
pub type StateId = String;
pub type Symbol = char;

/// Nested transition table: source state -> symbol -> target state.
pub type TransitionMap = HashMap<StateId, HashMap<Symbol, StateId>>;

/// A node of the graph view handed to renderers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphNode {
    pub id: StateId,
    pub accepting: bool,
    pub initial: bool,
}

/// A labeled edge of the graph view: `source --label--> target`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphEdge {
    pub source: StateId,
    pub label: Symbol,
    pub target: StateId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dfa {
    pub(crate) states: HashSet<StateId>,
    pub(crate) alphabet: HashSet<Symbol>,
    pub(crate) transitions: TransitionMap,
    pub(crate) start_state: StateId,
    pub(crate) accept_states: HashSet<StateId>,
}

impl Dfa {
    /// Build an automaton and check that every referenced state and symbol is declared.
    pub fn new<T>(
        states: HashSet<StateId>,
        alphabet: HashSet<Symbol>,
        transitions: T,
        start_state: StateId,
        accept_states: HashSet<StateId>,
    ) -> Result<Self>
    where
        T: IntoIterator<Item = ((StateId, Symbol), StateId)>,
    {
        let dfa =
            Self::from_parts_unchecked(states, alphabet, transitions, start_state, accept_states);
        dfa.validate()?;
        Ok(dfa)
    }

    /// Build an automaton without checking its invariants.
    ///
    /// Later entries for the same `(state, symbol)` key overwrite earlier ones.
    pub fn from_parts_unchecked<T>(
        states: HashSet<StateId>,
        alphabet: HashSet<Symbol>,
        transitions: T,
        start_state: StateId,
        accept_states: HashSet<StateId>,
    ) -> Self
    where
        T: IntoIterator<Item = ((StateId, Symbol), StateId)>,
    {
        let mut table: TransitionMap = HashMap::default();
        for ((source, symbol), target) in transitions {
            table.entry(source).or_default().insert(symbol, target);
        }
        Self {
            states,
            alphabet,
            transitions: table,
            start_state,
            accept_states,
        }
    }

    /// Check the structural invariants, reporting the first violation found.
    ///
    /// States and symbols are visited in sorted order so the reported error is stable.
    pub fn validate(&self) -> Result<()> {
        if !self.states.contains(&self.start_state) {
            return Err(Error::UnknownStartState(self.start_state.clone()));
        }
        let mut accept_states: Vec<&StateId> = self.accept_states.iter().collect();
        accept_states.sort_unstable();
        if let Some(state) = accept_states.into_iter().find(|s| !self.states.contains(*s)) {
            return Err(Error::UnknownAcceptState(state.clone()));
        }
        let mut triples: Vec<(&StateId, Symbol, &StateId)> = self.transition_triples().collect();
        triples.sort_unstable();
        for (source, symbol, target) in triples {
            if !self.states.contains(source) {
                return Err(Error::UnknownTransitionSource(source.clone()));
            }
            if !self.alphabet.contains(&symbol) {
                return Err(Error::UnknownSymbol(source.clone(), symbol));
            }
            if !self.states.contains(target) {
                return Err(Error::UnknownTransitionTarget(target.clone()));
            }
        }
        Ok(())
    }

    pub fn states(&self) -> &HashSet<StateId> {
        &self.states
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn alphabet(&self) -> &HashSet<Symbol> {
        &self.alphabet
    }

    pub fn transitions(&self) -> &TransitionMap {
        &self.transitions
    }

    pub fn start_state(&self) -> &StateId {
        &self.start_state
    }

    pub fn accept_states(&self) -> &HashSet<StateId> {
        &self.accept_states
    }

    /// Whether `state` is accepting. Unknown states are simply not accepting.
    pub fn is_accepting(&self, state: &str) -> bool {
        self.accept_states.contains(state)
    }

    /// Look up the successor of `state` on `symbol`; `None` means there is no edge.
    pub fn transition(&self, state: &str, symbol: Symbol) -> Option<&StateId> {
        self.transitions.get(state)?.get(&symbol)
    }

    /// Iterate over every transition as `(source, symbol, target)`.
    pub fn transition_triples(&self) -> impl Iterator<Item = (&StateId, Symbol, &StateId)> + '_ {
        self.transitions.iter().flat_map(|(source, edges)| {
            edges
                .iter()
                .map(move |(symbol, target)| (source, *symbol, target))
        })
    }

    /// Run the automaton on `input` from the start state.
    ///
    /// The walk stops at the first missing transition and rejects, whatever input is left.
    pub fn simulate<I>(&self, input: I) -> bool
    where
        I: IntoIterator<Item = Symbol>,
    {
        let mut current_state = &self.start_state;
        for symbol in input {
            current_state = match self.transition(current_state, symbol) {
                Some(next_state) => {
                    trace!(from = %current_state, %symbol, to = %next_state, "step");
                    next_state
                }
                None => {
                    trace!(from = %current_state, %symbol, "no transition, rejecting");
                    return false;
                }
            };
        }
        self.is_accepting(current_state)
    }

    /// Simulate over the characters of `input`.
    pub fn accepts(&self, input: &str) -> bool {
        self.simulate(input.chars())
    }

    /// States visited while reading `input`, starting with the start state.
    ///
    /// Returns `None` if the walk hits a missing transition.
    pub fn state_sequence<I>(&self, input: I) -> Option<Vec<StateId>>
    where
        I: IntoIterator<Item = Symbol>,
    {
        let mut current_state = &self.start_state;
        let mut seq = vec![current_state.clone()];
        for symbol in input {
            current_state = self.transition(current_state, symbol)?;
            seq.push(current_state.clone());
        }
        Some(seq)
    }

    /// States reachable from the start state, the start state included.
    pub fn reachable_states(&self) -> HashSet<StateId> {
        let mut reachable: HashSet<StateId> = HashSet::from_iter([self.start_state.clone()]);
        let mut queue: VecDeque<&StateId> = VecDeque::from([&self.start_state]);
        while let Some(state) = queue.pop_front() {
            if let Some(edges) = self.transitions.get(state) {
                for next_state in edges.values() {
                    if reachable.insert(next_state.clone()) {
                        queue.push_back(next_state);
                    }
                }
            }
        }
        reachable
    }

    /// The alphabet in a fixed order.
    pub(crate) fn sorted_alphabet(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.alphabet.iter().copied().collect();
        symbols.sort_unstable();
        symbols
    }

    /// Nodes and labeled edges for a renderer, both sorted.
    pub fn to_graph(&self) -> (Vec<GraphNode>, Vec<GraphEdge>) {
        let mut nodes: Vec<GraphNode> = self
            .states
            .iter()
            .map(|state| GraphNode {
                id: state.clone(),
                accepting: self.is_accepting(state),
                initial: *state == self.start_state,
            })
            .collect();
        nodes.sort_unstable();
        let mut edges: Vec<GraphEdge> = self
            .transition_triples()
            .map(|(source, label, target)| GraphEdge {
                source: source.clone(),
                label,
                target: target.clone(),
            })
            .collect();
        edges.sort_unstable();
        (nodes, edges)
    }
}

fn sorted<T: Ord + Clone>(items: &HashSet<T>) -> Vec<T> {
    let mut items: Vec<T> = items.iter().cloned().collect();
    items.sort_unstable();
    items
}

impl std::fmt::Display for Dfa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "States: {:?}", sorted(&self.states))?;
        writeln!(f, "Alphabet: {:?}", self.sorted_alphabet())?;
        writeln!(f, "Transitions:")?;
        let mut triples: Vec<_> = self.transition_triples().collect();
        triples.sort_unstable();
        for (source, symbol, target) in triples {
            writeln!(f, "  ({source}, {symbol}) -> {target}")?;
        }
        writeln!(f, "Start State: {}", self.start_state)?;
        write!(f, "Accept States: {:?}", sorted(&self.accept_states))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn state_set(ids: &[&str]) -> HashSet<StateId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    pub(crate) fn edges(triples: &[(&str, Symbol, &str)]) -> Vec<((StateId, Symbol), StateId)> {
        triples
            .iter()
            .map(|(s, a, t)| ((s.to_string(), *a), t.to_string()))
            .collect()
    }

    /// A,0->B  A,1->A  B,0->A  B,1->C  C,0->C  C,1->C, accepting {C}.
    pub(crate) fn three_state_dfa() -> Dfa {
        Dfa::new(
            state_set(&["A", "B", "C"]),
            HashSet::from_iter(['0', '1']),
            edges(&[
                ("A", '0', "B"),
                ("A", '1', "A"),
                ("B", '0', "A"),
                ("B", '1', "C"),
                ("C", '0', "C"),
                ("C", '1', "C"),
            ]),
            "A".to_string(),
            state_set(&["C"]),
        )
        .unwrap()
    }

    #[test]
    fn simulate_three_state_dfa() {
        let dfa = three_state_dfa();
        assert!(dfa.accepts("01"));
        assert!(!dfa.accepts("11"));
        assert!(!dfa.accepts("0"));
        assert!(!dfa.accepts(""));
        assert!(dfa.accepts("0111"));
        assert!(dfa.simulate(vec!['0', '1', '0']));
    }

    #[test]
    fn transition_lookup() {
        let dfa = three_state_dfa();
        assert_eq!(dfa.transition("A", '0').map(String::as_str), Some("B"));
        assert_eq!(dfa.transition("B", '1').map(String::as_str), Some("C"));
        assert_eq!(dfa.transition("A", '2'), None);
        assert_eq!(dfa.transition("Z", '0'), None);
    }

    #[test]
    fn is_accepting_unknown_state() {
        let dfa = three_state_dfa();
        assert!(dfa.is_accepting("C"));
        assert!(!dfa.is_accepting("A"));
        assert!(!dfa.is_accepting("nowhere"));
    }

    #[test]
    fn incomplete_transitions_reject() {
        let dfa = Dfa::new(
            state_set(&["A", "B"]),
            HashSet::from_iter(['0', '1']),
            edges(&[("A", '0', "B")]),
            "A".to_string(),
            state_set(&["B"]),
        )
        .unwrap();
        assert!(dfa.accepts("0"));
        assert!(!dfa.accepts("00"));
        assert!(!dfa.accepts("1"));
        assert!(!dfa.accepts("10"));
        assert_eq!(dfa.transition("B", '0'), None);
        assert_eq!(dfa.transition("B", '1'), None);
    }

    #[test]
    fn empty_accept_set_rejects_everything() {
        let dfa = Dfa::new(
            state_set(&["A"]),
            HashSet::from_iter(['a']),
            edges(&[("A", 'a', "A")]),
            "A".to_string(),
            HashSet::default(),
        )
        .unwrap();
        for input in ["", "a", "aa", "aaaa"] {
            assert!(!dfa.accepts(input));
        }
    }

    #[test]
    fn state_sequence_follows_walk() {
        let dfa = three_state_dfa();
        let seq = dfa.state_sequence("011".chars()).unwrap();
        assert_eq!(seq, vec!["A", "B", "C", "C"]);
        assert_eq!(dfa.state_sequence("x".chars()), None);
        assert_eq!(dfa.state_sequence("".chars()).unwrap(), vec!["A"]);
    }

    #[test]
    fn later_transitions_overwrite_earlier() {
        let dfa = Dfa::new(
            state_set(&["A", "B"]),
            HashSet::from_iter(['a']),
            edges(&[("A", 'a', "A"), ("A", 'a', "B")]),
            "A".to_string(),
            state_set(&["B"]),
        )
        .unwrap();
        assert_eq!(dfa.transition("A", 'a').map(String::as_str), Some("B"));
        assert_eq!(dfa.transition_triples().count(), 1);
    }

    #[test]
    fn new_rejects_broken_invariants() {
        let alphabet: HashSet<Symbol> = HashSet::from_iter(['a']);
        let err = Dfa::new(
            state_set(&["A"]),
            alphabet.clone(),
            edges(&[]),
            "Z".to_string(),
            HashSet::default(),
        )
        .unwrap_err();
        assert_eq!(err, Error::UnknownStartState("Z".to_string()));

        let err = Dfa::new(
            state_set(&["A"]),
            alphabet.clone(),
            edges(&[]),
            "A".to_string(),
            state_set(&["Q"]),
        )
        .unwrap_err();
        assert_eq!(err, Error::UnknownAcceptState("Q".to_string()));

        let err = Dfa::new(
            state_set(&["A"]),
            alphabet.clone(),
            edges(&[("X", 'a', "A")]),
            "A".to_string(),
            HashSet::default(),
        )
        .unwrap_err();
        assert_eq!(err, Error::UnknownTransitionSource("X".to_string()));

        let err = Dfa::new(
            state_set(&["A"]),
            alphabet.clone(),
            edges(&[("A", 'b', "A")]),
            "A".to_string(),
            HashSet::default(),
        )
        .unwrap_err();
        assert_eq!(err, Error::UnknownSymbol("A".to_string(), 'b'));
        assert_eq!(err.state(), "A");

        let err = Dfa::new(
            state_set(&["A"]),
            alphabet,
            edges(&[("A", 'a', "Y")]),
            "A".to_string(),
            HashSet::default(),
        )
        .unwrap_err();
        assert_eq!(err, Error::UnknownTransitionTarget("Y".to_string()));
        assert!(err.to_string().contains("\"Y\""));
    }

    #[test]
    fn unchecked_construction_skips_validation() {
        let dfa = Dfa::from_parts_unchecked(
            state_set(&["A"]),
            HashSet::from_iter(['a']),
            edges(&[("A", 'a', "B")]),
            "A".to_string(),
            HashSet::default(),
        );
        assert!(dfa.validate().is_err());
        assert!(!dfa.accepts("a"));
    }

    #[test]
    fn reachable_states_skip_islands() {
        let dfa = Dfa::new(
            state_set(&["A", "B", "U"]),
            HashSet::from_iter(['a']),
            edges(&[("A", 'a', "B"), ("B", 'a', "A"), ("U", 'a', "A")]),
            "A".to_string(),
            state_set(&["B"]),
        )
        .unwrap();
        assert_eq!(dfa.reachable_states(), state_set(&["A", "B"]));
    }

    #[test]
    fn graph_view_marks_start_and_accept() {
        let dfa = three_state_dfa();
        let (nodes, edges) = dfa.to_graph();
        assert_eq!(
            nodes,
            vec![
                GraphNode {
                    id: "A".to_string(),
                    accepting: false,
                    initial: true
                },
                GraphNode {
                    id: "B".to_string(),
                    accepting: false,
                    initial: false
                },
                GraphNode {
                    id: "C".to_string(),
                    accepting: true,
                    initial: false
                },
            ]
        );
        assert_eq!(edges.len(), 6);
        assert_eq!(
            edges[0],
            GraphEdge {
                source: "A".to_string(),
                label: '0',
                target: "B".to_string(),
            }
        );
    }

    #[test]
    fn display_lists_all_parts() {
        let text = three_state_dfa().to_string();
        assert!(text.contains("States: [\"A\", \"B\", \"C\"]"));
        assert!(text.contains("Alphabet: ['0', '1']"));
        assert!(text.contains("  (B, 1) -> C"));
        assert!(text.contains("Start State: A"));
        assert!(text.ends_with("Accept States: [\"C\"]"));
    }
}
