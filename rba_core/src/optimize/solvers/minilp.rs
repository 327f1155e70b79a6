//! Implements a solver interface for microlp, a pure rust simplex solver
use log::debug;
use microlp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem, Variable};
use nalgebra::DVector;

use crate::optimize::constraint::Relation;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::LinearProgram;
use crate::optimize::solvers::{LpOracle, OracleError};
use crate::optimize::{LpSolution, OptimizationStatus};

/// Simplex backend
///
/// microlp has no time limit, every solve runs to a verdict.
#[derive(Clone, Debug, Default)]
pub struct MinilpOracle {}

impl MinilpOracle {
    pub fn new() -> Self {
        MinilpOracle {}
    }
}

impl LpOracle for MinilpOracle {
    fn name(&self) -> &'static str {
        "minilp"
    }

    fn solve(&mut self, program: &LinearProgram) -> Result<LpSolution, OracleError> {
        if let Some(column) = program
            .columns()
            .iter()
            .find(|c| c.lower_bound > c.upper_bound)
        {
            debug!("Column {} has crossed bounds, skipping the simplex", column);
            return Ok(LpSolution::without_primal(OptimizationStatus::Infeasible));
        }

        let direction = match program.sense() {
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
        };
        let mut problem = Problem::new(direction);
        let variables: Vec<Variable> = program
            .columns()
            .iter()
            .zip(program.objective().iter())
            .map(|(column, coefficient)| {
                problem.add_var(*coefficient, (column.lower_bound, column.upper_bound))
            })
            .collect();

        let mut expressions: Vec<LinearExpr> =
            (0..program.num_rows()).map(|_| LinearExpr::empty()).collect();
        let mut terms = vec![0usize; program.num_rows()];
        for (row, column, value) in program.matrix().triplet_iter() {
            expressions[row].add(variables[column], *value);
            terms[row] += 1;
        }
        for ((row, expression), terms) in program.rows().iter().zip(expressions).zip(terms) {
            if terms == 0 {
                // Nothing to hand to the simplex, the row holds or fails on its own
                if row.violation(0.) > 0. {
                    return Ok(LpSolution::without_primal(OptimizationStatus::Infeasible));
                }
                continue;
            }
            let op = match row.relation {
                Relation::LessEqual => ComparisonOp::Le,
                Relation::Equal => ComparisonOp::Eq,
                Relation::GreaterEqual => ComparisonOp::Ge,
            };
            problem.add_constraint(expression, op, row.rhs);
        }

        match problem.solve() {
            Ok(solution) => {
                let primal = DVector::from_iterator(
                    variables.len(),
                    variables.iter().map(|v| solution[*v]),
                );
                Ok(LpSolution::optimal(solution.objective(), primal))
            }
            Err(microlp::Error::Infeasible) => {
                Ok(LpSolution::without_primal(OptimizationStatus::Infeasible))
            }
            Err(microlp::Error::Unbounded) => {
                Ok(LpSolution::without_primal(OptimizationStatus::Unbounded))
            }
            Err(other) => Err(OracleError::Backend(other.to_string())),
        }
    }
}
