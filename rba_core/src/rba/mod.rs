//! Resource Balance Analysis: build the program for a growth rate, search for the largest feasible
//! one, and read the resource allocation back out
pub mod matrix;
pub mod results;
pub mod search;

use log::info;
use thiserror::Error;

use crate::configuration::Configuration;
use crate::model::model::{ModelError, RbaModel};
use crate::optimize::problem::ProblemError;
use crate::optimize::solvers::{oracle_for, LpOracle, OracleError};
use crate::optimize::OptimizationStatus;
use crate::rba::results::Results;
use crate::rba::search::SearchSettings;

/// Find the optimal growth rate of a model in a medium, using the global configuration
///
/// The solver and the search settings are read from [`crate::CONFIGURATION`].
pub fn solve(model: &RbaModel, medium: &str) -> Result<Results, RbaError> {
    let configuration = Configuration::snapshot();
    let mut oracle = oracle_for(&configuration).map_err(RbaError::SolverSetup)?;
    solve_with(model, medium, &mut oracle, &configuration.search)
}

/// Find the optimal growth rate of a model in a medium with an explicit oracle and settings
pub fn solve_with(
    model: &RbaModel,
    medium: &str,
    oracle: &mut dyn LpOracle,
    settings: &SearchSettings,
) -> Result<Results, RbaError> {
    let medium = model.medium(medium)?;
    info!(
        "Solving model {} in medium {} with {}",
        model.id.as_deref().unwrap_or("<unnamed>"),
        medium.id,
        oracle.name()
    );
    let outcome = search::search(model, medium, oracle, settings)?;
    results::extract(model, &outcome.program, &outcome.solution)
}

impl RbaModel {
    /// Find the optimal growth rate of this model in a medium
    ///
    /// # Examples
    /// ```rust
    /// use rba_core::model::model::{FluxTargetBuilder, RbaModel};
    /// use rba_core::model::function::GrowthFunction;
    /// use rba_core::model::medium::Medium;
    /// use rba_core::model::reaction::ReactionBuilder;
    /// let mut model = RbaModel::new_empty();
    /// model.add_reaction(
    ///     ReactionBuilder::default().id("R").lower_bound(0.).upper_bound(3.).build().unwrap(),
    /// );
    /// model.add_target(
    ///     FluxTargetBuilder::default()
    ///         .id("growth")
    ///         .reaction("R")
    ///         .value(GrowthFunction::linear(0., 1.))
    ///         .build()
    ///         .unwrap(),
    /// );
    /// model.add_medium(Medium::empty("default"));
    /// let results = model.solve("default").unwrap();
    /// assert!((results.growth_rate() - 3.).abs() < 1e-5);
    /// ```
    pub fn solve(&self, medium: &str) -> Result<Results, RbaError> {
        solve(self, medium)
    }
}

/// Errors from analysing a model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RbaError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Model can't be satisfied even without growth")]
    ModelInfeasible,
    #[error("Growth is unbounded, still feasible at growth rate {last_feasible}")]
    UnboundedGrowth { last_feasible: f64 },
    #[error("Solver timed out at growth rate {growth_rate}")]
    OracleTimeout { growth_rate: f64 },
    #[error("Solver failed at growth rate {growth_rate}: {source}")]
    Oracle {
        growth_rate: f64,
        source: OracleError,
    },
    #[error("Unable to create solver: {0}")]
    SolverSetup(OracleError),
    #[error("Growth objective is unbounded at growth rate {growth_rate}")]
    UnboundedObjective { growth_rate: f64 },
    #[error("Solve at growth rate {growth_rate} ended {status}")]
    FinalSolveFailed {
        growth_rate: f64,
        status: OptimizationStatus,
    },
    #[error("Solution has {found} values for {expected} columns")]
    SolutionShape { expected: usize, found: usize },
    #[error("Linear program doesn't match the model: {0}")]
    ProgramMismatch(String),
    #[error("Invalid growth rate {0}")]
    InvalidGrowthRate(f64),
    #[error("Invalid search settings: {0}")]
    InvalidSettings(String),
    #[error(transparent)]
    Problem(#[from] ProblemError),
}
