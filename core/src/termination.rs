//! # Functionality Related to Early Solver Termination
//!
//! An early termination ends a run as [`crate::Outcome::Interrupted`]. The
//! kernel records why it stopped so that callers can tell an external
//! interrupt apart from an exhausted limit.

use std::fmt;

/// Early termination reasons for [`crate::Solve::solve`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// Terminated because of maximum number of oracle calls reached
    OracleCallsLimit,
    /// Terminated because of maximum number of models reached
    ModelsLimit,
    /// Terminated because the search engine itself was interrupted
    OracleInterrupted,
    /// Termination because of external interrupt
    Interrupted,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::OracleCallsLimit => {
                write!(f, "Solver terminated early because of oracle call limit")
            }
            Termination::ModelsLimit => {
                write!(f, "Solver terminated early because of model limit")
            }
            Termination::OracleInterrupted => {
                write!(f, "Solver terminated early because the oracle was interrupted")
            }
            Termination::Interrupted => {
                write!(f, "Solver terminated early because of interrupt signal")
            }
        }
    }
}
