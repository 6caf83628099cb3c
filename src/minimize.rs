//! Minimization of a [`Dfa`] by Moore-style partition refinement.
//!
//! The partition starts as {accepting, non-accepting} and every pass splits each block by
//! the signature of its states: the successor of each state on every symbol, in sorted symbol
//! order, with a missing edge kept as its own value. The quotient automaton keeps one
//! representative per block, the smallest state identifier in it.

use rayon::prelude::*;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use std::collections::hash_map::Entry;
use tracing::{debug, info};

use crate::dfa::{Dfa, StateId, Symbol, TransitionMap};

/// What a signature records for each successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Refinement {
    /// Successors are compared by the block they currently belong to. Produces the coarsest
    /// stable partition, i.e. the true minimal automaton.
    #[default]
    BlockSignature,
    /// Successors are compared by identity. Merges only states whose literal successors
    /// agree, so equivalent states with different successors may stay apart.
    RawSuccessor,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MinimizeConfig {
    refinement: Refinement,
    prune_unreachable: bool,
}

impl MinimizeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refinement(mut self, refinement: Refinement) -> Self {
        self.refinement = refinement;
        self
    }

    /// Drop states unreachable from the start state before partitioning.
    pub fn prune_unreachable(mut self, yes: bool) -> Self {
        self.prune_unreachable = yes;
        self
    }

    pub fn get_refinement(&self) -> Refinement {
        self.refinement
    }

    pub fn get_prune_unreachable(&self) -> bool {
        self.prune_unreachable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Successor<'a> {
    Block(usize),
    State(&'a str),
}

type Signature<'a> = Vec<Option<Successor<'a>>>;

impl Dfa {
    /// Minimize in place with the default configuration.
    pub fn minimize(&mut self) {
        self.minimize_with(&MinimizeConfig::default());
    }

    /// Minimize in place. The quotient is built first and then swapped in whole.
    pub fn minimize_with(&mut self, config: &MinimizeConfig) {
        *self = self.minimized_with(config);
    }

    /// The equivalence classes of the stable partition, each sorted, ordered by their
    /// smallest member.
    pub fn equivalence_classes(&self, config: &MinimizeConfig) -> Vec<Vec<StateId>> {
        let mut classes: Vec<Vec<StateId>> = self
            .refine(config)
            .into_iter()
            .map(|block| block.into_iter().cloned().collect())
            .collect();
        classes.sort_unstable();
        classes
    }

    /// Build the quotient automaton without modifying `self`.
    pub fn minimized_with(&self, config: &MinimizeConfig) -> Dfa {
        let blocks = self.refine(config);

        let mut representative_of: HashMap<&str, &StateId> = HashMap::default();
        let mut states: HashSet<StateId> = HashSet::default();
        let mut accept_states: HashSet<StateId> = HashSet::default();
        for block in &blocks {
            // blocks are sorted, so the first member is the smallest
            let Some(&representative) = block.first() else {
                continue;
            };
            states.insert(representative.clone());
            if self.is_accepting(representative) {
                accept_states.insert(representative.clone());
            }
            for &state in block {
                representative_of.insert(state.as_str(), representative);
            }
        }

        let mut transitions: TransitionMap = HashMap::default();
        for (source, symbol, target) in self.transition_triples() {
            // sources outside the partition were pruned as unreachable
            let (Some(&from), Some(&to)) = (
                representative_of.get(source.as_str()),
                representative_of.get(target.as_str()),
            ) else {
                continue;
            };
            transitions
                .entry(from.clone())
                .or_default()
                .insert(symbol, to.clone());
        }

        let start_state = representative_of
            .get(self.start_state.as_str())
            .map_or_else(|| self.start_state.clone(), |&s| s.clone());

        info!(
            before = self.num_states(),
            after = states.len(),
            refinement = ?config.refinement,
            "minimized automaton"
        );

        Dfa {
            states,
            alphabet: self.alphabet.clone(),
            transitions,
            start_state,
            accept_states,
        }
    }

    /// Refine {accepting, non-accepting} until no block splits. Every block is sorted.
    fn refine(&self, config: &MinimizeConfig) -> Vec<Vec<&StateId>> {
        let symbols = self.sorted_alphabet();
        let mut live: Vec<&StateId> = if config.prune_unreachable {
            let reachable = self.reachable_states();
            self.states
                .iter()
                .filter(|s| reachable.contains(*s))
                .collect()
        } else {
            self.states.iter().collect()
        };
        live.sort_unstable();

        let (accepting, rejecting): (Vec<&StateId>, Vec<&StateId>) =
            live.into_iter().partition(|s| self.is_accepting(s));
        let mut blocks: Vec<Vec<&StateId>> = [accepting, rejecting]
            .into_iter()
            .filter(|block| !block.is_empty())
            .collect();

        let mut pass = 0;
        loop {
            pass += 1;
            let block_of: HashMap<&str, usize> = blocks
                .iter()
                .enumerate()
                .flat_map(|(i, block)| block.iter().map(move |s| (s.as_str(), i)))
                .collect();
            let refined: Vec<Vec<Vec<&StateId>>> = blocks
                .par_iter()
                .map(|block| self.split_block(block, &symbols, &block_of, config.refinement))
                .collect();
            let changed = refined.iter().any(|parts| parts.len() > 1);
            blocks = refined.into_iter().flatten().collect();
            debug!(pass, blocks = blocks.len(), changed, "refinement pass");
            if !changed {
                break;
            }
        }
        blocks
    }

    /// Group the states of `block` by signature, keeping first-seen order.
    fn split_block<'a>(
        &'a self,
        block: &[&'a StateId],
        symbols: &[Symbol],
        block_of: &HashMap<&str, usize>,
        refinement: Refinement,
    ) -> Vec<Vec<&'a StateId>> {
        let mut groups: Vec<Vec<&StateId>> = Vec::new();
        let mut index: HashMap<Signature<'a>, usize> = HashMap::default();
        for &state in block {
            let signature = self.signature(state, symbols, block_of, refinement);
            match index.entry(signature) {
                Entry::Occupied(e) => groups[*e.get()].push(state),
                Entry::Vacant(e) => {
                    e.insert(groups.len());
                    groups.push(vec![state]);
                }
            }
        }
        groups
    }

    fn signature<'a>(
        &'a self,
        state: &str,
        symbols: &[Symbol],
        block_of: &HashMap<&str, usize>,
        refinement: Refinement,
    ) -> Signature<'a> {
        symbols
            .iter()
            .map(|&symbol| {
                let target = self.transition(state, symbol)?;
                Some(match refinement {
                    Refinement::RawSuccessor => Successor::State(target.as_str()),
                    Refinement::BlockSignature => block_of
                        .get(target.as_str())
                        .map_or(Successor::State(target.as_str()), |&i| Successor::Block(i)),
                })
            })
            .collect()
    }
}
