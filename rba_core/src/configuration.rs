//! Global defaults used when building models and solving them
use std::sync::{LazyLock, RwLock};

use crate::rba::search::SearchSettings;

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

#[derive(Clone, Debug)]
pub struct Configuration {
    /// Default lower flux bound for reactions that don't declare one
    pub lower_bound: f64,
    /// Default upper flux bound for reactions that don't declare one
    pub upper_bound: f64,
    /// Largest constraint violation accepted at a point an interior point solver returned without
    /// full convergence
    pub tolerance: f64,
    /// Which LP backend `solve` should use
    pub solver: Solver,
    /// Wall clock limit (in seconds) for a single LP solve, None for no limit
    pub time_limit: Option<f64>,
    /// Settings for the growth rate bisection
    pub search: SearchSettings,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            tolerance: 1e-06,
            solver: Solver::default(),
            time_limit: None,
            search: SearchSettings::default(),
        }
    }
}

impl Configuration {
    /// Take a copy of the current global configuration
    ///
    /// A poisoned lock still holds a usable configuration, so it is read anyway.
    pub fn snapshot() -> Configuration {
        match CONFIGURATION.read() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Read the default lower bound, used by the builders
pub(crate) fn default_lower_bound() -> f64 {
    Configuration::snapshot().lower_bound
}

/// Read the default upper bound, used by the builders
pub(crate) fn default_upper_bound() -> f64 {
    Configuration::snapshot().upper_bound
}

/// Read the default constraint tolerance, used by the interior point backend
pub(crate) fn default_tolerance() -> f64 {
    Configuration::snapshot().tolerance
}

/// Enum used to specify the default solver to use
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Solver {
    /// Use the Clarabel interior point solver
    Clarabel,
    /// Use the HiGHS solver, requires the highs feature to be enabled
    Highs,
    /// Use the microlp simplex solver, requires the minilp feature to be enabled
    Minilp,
}

cfg_if::cfg_if! {
    if #[cfg(feature = "minilp")] {
        const DEFAULT_SOLVER: Solver = Solver::Minilp;
    } else {
        const DEFAULT_SOLVER: Solver = Solver::Clarabel;
    }
}

impl Default for Solver {
    /// The simplex backend when it is compiled in, Clarabel otherwise
    fn default() -> Self {
        DEFAULT_SOLVER
    }
}

impl std::str::FromStr for Solver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clarabel" => Ok(Solver::Clarabel),
            "highs" => Ok(Solver::Highs),
            "minilp" | "microlp" => Ok(Solver::Minilp),
            other => Err(format!("unknown solver '{}'", other)),
        }
    }
}

impl std::fmt::Display for Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Solver::Clarabel => write!(f, "clarabel"),
            Solver::Highs => write!(f, "highs"),
            Solver::Minilp => write!(f, "minilp"),
        }
    }
}
