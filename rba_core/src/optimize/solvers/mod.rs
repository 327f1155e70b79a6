//! Solver interfaces: anything that can decide a [`LinearProgram`] is an [`LpOracle`]
use thiserror::Error;

use crate::configuration::{Configuration, Solver};
use crate::optimize::problem::LinearProgram;
use crate::optimize::LpSolution;

pub mod clarabel;
#[cfg(feature = "highs")]
pub mod highs;
#[cfg(feature = "minilp")]
pub mod minilp;

/// A linear program solver treated as a black box
///
/// Solving takes `&mut self`: an oracle is never asked to solve two programs at once, so
/// backends wrapping stateful native libraries don't need to be reentrant.
pub trait LpOracle {
    /// Name of the backend, used in log messages
    fn name(&self) -> &'static str;

    /// Solve a linear program
    ///
    /// Infeasible and unbounded programs are reported through the solution status. An `Err` is
    /// returned only when the solver could not reach a verdict.
    fn solve(&mut self, program: &LinearProgram) -> Result<LpSolution, OracleError>;

    /// Decide whether a program has a feasible point, whatever its objective
    ///
    /// Backends that behave better without an objective override this.
    fn check_feasibility(&mut self, program: &LinearProgram) -> Result<bool, OracleError> {
        Ok(self.solve(program)?.is_feasible())
    }
}

impl<O: LpOracle + ?Sized> LpOracle for Box<O> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn solve(&mut self, program: &LinearProgram) -> Result<LpSolution, OracleError> {
        (**self).solve(program)
    }

    fn check_feasibility(&mut self, program: &LinearProgram) -> Result<bool, OracleError> {
        (**self).check_feasibility(program)
    }
}

/// Failures of the solver itself, as opposed to verdicts about the program
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("Solver hit its time limit")]
    Timeout,
    #[error("Solver hit its iteration limit")]
    IterationLimit,
    #[error("Solver ran into numerical trouble: {0}")]
    Numerical(String),
    #[error("Solver failed: {0}")]
    Backend(String),
    #[error("Solver {0} is not available, enable its feature")]
    SolverUnavailable(String),
}

/// Create the oracle selected by a configuration
pub fn oracle_for(configuration: &Configuration) -> Result<Box<dyn LpOracle>, OracleError> {
    match configuration.solver {
        Solver::Clarabel => Ok(Box::new(
            clarabel::ClarabelOracle::new(configuration.time_limit)
                .with_tolerance(configuration.tolerance),
        )),
        Solver::Highs => highs_oracle(configuration.time_limit),
        Solver::Minilp => minilp_oracle(),
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "highs")] {
        fn highs_oracle(time_limit: Option<f64>) -> Result<Box<dyn LpOracle>, OracleError> {
            Ok(Box::new(highs::HighsOracle::new(time_limit)))
        }
    } else {
        fn highs_oracle(_time_limit: Option<f64>) -> Result<Box<dyn LpOracle>, OracleError> {
            Err(OracleError::SolverUnavailable(Solver::Highs.to_string()))
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "minilp")] {
        fn minilp_oracle() -> Result<Box<dyn LpOracle>, OracleError> {
            Ok(Box::new(minilp::MinilpOracle::new()))
        }
    } else {
        fn minilp_oracle() -> Result<Box<dyn LpOracle>, OracleError> {
            Err(OracleError::SolverUnavailable(Solver::Minilp.to_string()))
        }
    }
}

#[cfg(test)]
pub(crate) mod test_programs {
    //! Small programs with known answers shared by the backend tests
    use crate::optimize::constraint::{Relation, RowKind};
    use crate::optimize::objective::ObjectiveSense;
    use crate::optimize::problem::{LinearProgram, LinearProgramBuilder};
    use crate::optimize::variable::ColumnKind;

    /// max x + y  s.t.  x + 2y <= 4,  3x + y <= 6,  x - y = 0,  0 <= x, y
    /// optimum at x = y = 4/3, objective 8/3
    pub fn bounded() -> LinearProgram {
        let mut builder = LinearProgramBuilder::new(ObjectiveSense::Maximize, 0.);
        let x = builder
            .add_column("x", ColumnKind::Flux, 0., f64::INFINITY)
            .unwrap();
        let y = builder
            .add_column("y", ColumnKind::Flux, 0., f64::INFINITY)
            .unwrap();
        builder
            .add_row("a", RowKind::Density, &[(x, 1.), (y, 2.)], Relation::LessEqual, 4.)
            .unwrap();
        builder
            .add_row("b", RowKind::Density, &[(x, 3.), (y, 1.)], Relation::LessEqual, 6.)
            .unwrap();
        builder
            .add_row("c", RowKind::MassBalance, &[(x, 1.), (y, -1.)], Relation::Equal, 0.)
            .unwrap();
        builder.set_objective_coefficient(x, 1.).unwrap();
        builder.set_objective_coefficient(y, 1.).unwrap();
        builder.build().unwrap()
    }

    /// x >= 2 and x <= 1
    pub fn infeasible() -> LinearProgram {
        let mut builder = LinearProgramBuilder::new(ObjectiveSense::Maximize, 0.);
        let x = builder.add_column("x", ColumnKind::Flux, 0., 10.).unwrap();
        builder
            .add_row("low", RowKind::Target, &[(x, 1.)], Relation::GreaterEqual, 2.)
            .unwrap();
        builder
            .add_row("high", RowKind::Density, &[(x, 1.)], Relation::LessEqual, 1.)
            .unwrap();
        builder.build().unwrap()
    }

    /// A column whose lower bound exceeds its upper bound
    pub fn inverted_bounds() -> LinearProgram {
        let mut builder = LinearProgramBuilder::new(ObjectiveSense::Maximize, 0.);
        let x = builder.add_column("x", ColumnKind::Flux, 1., 0.).unwrap();
        builder
            .add_row("free", RowKind::MassBalance, &[(x, 1.)], Relation::LessEqual, 5.)
            .unwrap();
        builder.build().unwrap()
    }

    /// max x with x only bounded below
    pub fn unbounded() -> LinearProgram {
        let mut builder = LinearProgramBuilder::new(ObjectiveSense::Maximize, 0.);
        let x = builder
            .add_column("x", ColumnKind::Flux, 0., f64::INFINITY)
            .unwrap();
        let y = builder.add_column("y", ColumnKind::Flux, 0., 1.).unwrap();
        builder
            .add_row("c", RowKind::Target, &[(x, 1.), (y, 1.)], Relation::GreaterEqual, 1.)
            .unwrap();
        builder.set_objective_coefficient(x, 1.).unwrap();
        builder.build().unwrap()
    }
}
