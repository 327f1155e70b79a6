//! Implements a solver interface for HiGHS
//!
//! HiGHS presolve may only conclude that a program is unbounded or infeasible. The program is
//! then solved again without its objective, which cannot be unbounded, to tell the two apart.
use highs::{HighsModelStatus, RowProblem, Sense, SolvedModel};
use log::debug;
use nalgebra::DVector;

use crate::optimize::constraint::Relation;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::LinearProgram;
use crate::optimize::solvers::{LpOracle, OracleError};
use crate::optimize::{LpSolution, OptimizationStatus};

/// Dual simplex backend linking the HiGHS library
#[derive(Clone, Debug, Default)]
pub struct HighsOracle {
    /// Time limit in seconds for a single solve
    time_limit: Option<f64>,
}

impl HighsOracle {
    pub fn new(time_limit: Option<f64>) -> Self {
        HighsOracle { time_limit }
    }

    /// Hand a program to HiGHS, keeping its objective only if `with_objective` is set
    fn optimise(&self, program: &LinearProgram, with_objective: bool) -> SolvedModel {
        let mut problem = RowProblem::default();
        let columns: Vec<_> = program
            .columns()
            .iter()
            .zip(program.objective().iter())
            .map(|(column, coefficient)| {
                let cost = if with_objective { *coefficient } else { 0. };
                problem.add_column(cost, column.lower_bound..=column.upper_bound)
            })
            .collect();
        let mut row_terms: Vec<Vec<(highs::Col, f64)>> = vec![Vec::new(); program.num_rows()];
        for (row, column, value) in program.matrix().triplet_iter() {
            row_terms[row].push((columns[column], *value));
        }
        for (row, terms) in program.rows().iter().zip(row_terms) {
            match row.relation {
                Relation::LessEqual => problem.add_row(..=row.rhs, terms),
                Relation::Equal => problem.add_row(row.rhs..=row.rhs, terms),
                Relation::GreaterEqual => problem.add_row(row.rhs.., terms),
            }
        }

        let sense = match program.sense() {
            ObjectiveSense::Maximize => Sense::Maximise,
            ObjectiveSense::Minimize => Sense::Minimise,
        };
        let mut model = problem.optimise(sense);
        model.make_quiet();
        if let Some(limit) = self.time_limit {
            model.set_option("time_limit", limit);
        }
        model.solve()
    }

    /// Settle an unbounded-or-infeasible verdict from the status of the objective free solve
    fn settle(status: HighsModelStatus) -> Result<OptimizationStatus, OracleError> {
        match status {
            HighsModelStatus::Optimal => Ok(OptimizationStatus::Unbounded),
            HighsModelStatus::Infeasible => Ok(OptimizationStatus::Infeasible),
            HighsModelStatus::ReachedTimeLimit => Err(OracleError::Timeout),
            HighsModelStatus::ReachedIterationLimit => Err(OracleError::IterationLimit),
            other => Err(OracleError::Backend(format!("{:?}", other))),
        }
    }
}

impl LpOracle for HighsOracle {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn solve(&mut self, program: &LinearProgram) -> Result<LpSolution, OracleError> {
        if program
            .columns()
            .iter()
            .any(|c| c.lower_bound > c.upper_bound)
        {
            return Ok(LpSolution::without_primal(OptimizationStatus::Infeasible));
        }

        let solved = self.optimise(program, true);
        match solved.status() {
            HighsModelStatus::Optimal => {
                let primal = DVector::from_vec(solved.get_solution().columns().to_vec());
                let objective_value = program.objective_value(&primal);
                Ok(LpSolution::optimal(objective_value, primal))
            }
            HighsModelStatus::Infeasible => {
                Ok(LpSolution::without_primal(OptimizationStatus::Infeasible))
            }
            HighsModelStatus::Unbounded => {
                Ok(LpSolution::without_primal(OptimizationStatus::Unbounded))
            }
            HighsModelStatus::UnboundedOrInfeasible => {
                debug!(
                    "HiGHS could not separate unbounded from infeasible at growth rate {}",
                    program.growth_rate()
                );
                let status = Self::settle(self.optimise(program, false).status())?;
                Ok(LpSolution::without_primal(status))
            }
            HighsModelStatus::ReachedTimeLimit => Err(OracleError::Timeout),
            HighsModelStatus::ReachedIterationLimit => Err(OracleError::IterationLimit),
            other => Err(OracleError::Backend(format!("{:?}", other))),
        }
    }

    fn check_feasibility(&mut self, program: &LinearProgram) -> Result<bool, OracleError> {
        if program
            .columns()
            .iter()
            .any(|c| c.lower_bound > c.upper_bound)
        {
            return Ok(false);
        }
        match self.optimise(program, false).status() {
            HighsModelStatus::Optimal => Ok(true),
            HighsModelStatus::Infeasible => Ok(false),
            HighsModelStatus::ReachedTimeLimit => Err(OracleError::Timeout),
            HighsModelStatus::ReachedIterationLimit => Err(OracleError::IterationLimit),
            other => Err(OracleError::Backend(format!("{:?}", other))),
        }
    }
}
