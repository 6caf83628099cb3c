//! # DFA_Engine
//!
//! `dfa_engine` crate simulates deterministic finite automata and minimizes them by
//! partition refinement.

pub mod dfa;
pub mod error;
pub mod minimize;

pub use dfa::{Dfa, GraphEdge, GraphNode, StateId, Symbol, TransitionMap};
pub use error::{Error, Result};
pub use minimize::{MinimizeConfig, Refinement};
