//! # Options
//!
//! This module contains all configuration options of the optimization core.

use std::fmt;

/// Kernel-wide configuration options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KernelOptions {
    /// The optimization algorithm to run on each level
    pub algorithm: Algorithm,
    /// Pass the weights of the objective literals to the decision heuristic
    pub preferred_choices: bool,
    /// The maximum number of cores to extract in one OLL step
    pub oll_cores_per_step: Option<usize>,
    /// The maximum number of models to enumerate in one BB step
    pub bb_models_per_step: Option<usize>,
}

impl Default for KernelOptions {
    fn default() -> Self {
        KernelOptions {
            algorithm: Default::default(),
            preferred_choices: true,
            oll_cores_per_step: None,
            bb_models_per_step: None,
        }
    }
}

impl KernelOptions {
    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        self.algorithm = algorithm;
    }
}

/// Algorithms for solving a single level
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Algorithm {
    /// Alternate core-guided refinement and branch and bound
    #[default]
    OllBb,
    /// Only model-guided branch and bound
    ModelGuided,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::OllBb => write!(f, "oll-bb"),
            Algorithm::ModelGuided => write!(f, "model-guided"),
        }
    }
}

/// The statistic deciding when the combined heuristic moves on to the next
/// domain heuristic
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum SwitchPolicy {
    /// Number of restarts per choice
    #[default]
    RestartRatio,
    /// The active heuristic's own threshold
    Threshold,
}

impl fmt::Display for SwitchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchPolicy::RestartRatio => write!(f, "restart-ratio"),
            SwitchPolicy::Threshold => write!(f, "threshold"),
        }
    }
}

/// Limits for a call to [`crate::Solve::solve`]
#[derive(Clone, Copy, Default, Debug)]
pub struct Limits {
    /// The maximum number of oracle calls to make
    pub oracle_calls: Option<usize>,
    /// The maximum number of models to find
    pub models: Option<usize>,
}

impl Limits {
    /// No limits
    pub fn none() -> Limits {
        Limits {
            oracle_calls: None,
            models: None,
        }
    }
}
