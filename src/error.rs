//! The Errors that may occur within the crate.

use thiserror::Error;

use crate::dfa::{StateId, Symbol};

pub type Result<T, E = crate::Error> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Start state {0:?} is not a member of the state set")]
    UnknownStartState(StateId),
    #[error("Accept state {0:?} is not a member of the state set")]
    UnknownAcceptState(StateId),
    #[error("Transition source {0:?} is not a member of the state set")]
    UnknownTransitionSource(StateId),
    #[error("Transition target {0:?} is not a member of the state set")]
    UnknownTransitionTarget(StateId),
    #[error("Transition from state {0:?} uses symbol {1:?} outside the alphabet")]
    UnknownSymbol(StateId, Symbol),
}

impl Error {
    /// The state identifier the violation is about.
    pub fn state(&self) -> &StateId {
        match self {
            Self::UnknownStartState(s)
            | Self::UnknownAcceptState(s)
            | Self::UnknownTransitionSource(s)
            | Self::UnknownTransitionTarget(s)
            | Self::UnknownSymbol(s, _) => s,
        }
    }
}
