//! Implements a solver interface for Clarabel
//!
//! Clarabel solves `min q·x  s.t.  A·x + s = b,  s ∈ K`. Equality rows go into the zero cone,
//! inequality rows and finite column bounds into the nonnegative cone.
//!
//! Close to the edge of the feasible region the interior point method can stall
//! (`InsufficientProgress`) or stop at reduced accuracy. The point it stopped at is then checked
//! against the program, and accepted only if no row or bound is violated by more than the
//! oracle's tolerance.
use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use log::{debug, warn};
use nalgebra::DVector;

use crate::optimize::constraint::Relation;
use crate::optimize::problem::LinearProgram;
use crate::optimize::solvers::{LpOracle, OracleError};
use crate::optimize::{LpSolution, OptimizationStatus};

/// Interior point backend
#[derive(Clone, Debug)]
pub struct ClarabelOracle {
    /// Time limit in seconds for a single solve
    time_limit: Option<f64>,
    /// Largest violation accepted at a point Clarabel did not fully converge to
    tolerance: f64,
}

impl ClarabelOracle {
    /// Create an oracle using the configured constraint tolerance
    pub fn new(time_limit: Option<f64>) -> Self {
        ClarabelOracle {
            time_limit,
            tolerance: crate::configuration::default_tolerance(),
        }
    }

    /// Replace the constraint tolerance, returning self for chaining
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Run Clarabel on a conic form, returning its status and the point it stopped at
    fn run(&self, form: &ConicForm) -> Result<(SolverStatus, DVector<f64>), OracleError> {
        let n = form.q.len();
        let settings = DefaultSettingsBuilder::default()
            .verbose(false)
            .time_limit(self.time_limit.unwrap_or(f64::INFINITY))
            .build()
            .map_err(|err| OracleError::Backend(err.to_string()))?;
        let p = CscMatrix::<f64>::zeros((n, n));
        let mut solver = DefaultSolver::new(&p, &form.q, &form.a, &form.b, &form.cones, settings);
        solver.solve();
        Ok((
            solver.solution.status,
            DVector::from_vec(solver.solution.x.clone()),
        ))
    }

    /// Whether a point Clarabel did not fully converge to satisfies the program
    fn accepts(&self, program: &LinearProgram, status: &SolverStatus, x: &DVector<f64>) -> bool {
        let violation = program.max_violation(x);
        debug!(
            "Clarabel stopped with {:?} at growth rate {}, largest violation {:e}",
            status,
            program.growth_rate(),
            violation
        );
        violation <= self.tolerance
    }
}

impl Default for ClarabelOracle {
    fn default() -> Self {
        ClarabelOracle::new(None)
    }
}

/// A program rewritten into Clarabel's conic form
struct ConicForm {
    a: CscMatrix<f64>,
    b: Vec<f64>,
    q: Vec<f64>,
    cones: Vec<SupportedConeT<f64>>,
}

impl ConicForm {
    /// Rewrite a program, keeping its objective only if `with_objective` is set
    fn from_program(program: &LinearProgram, with_objective: bool) -> ConicForm {
        let n = program.num_columns();
        let mut row_terms: Vec<Vec<(usize, f64)>> = vec![Vec::new(); program.num_rows()];
        for (row, column, value) in program.matrix().triplet_iter() {
            row_terms[row].push((column, *value));
        }

        let mut column_entries: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        let mut b = Vec::new();
        let mut push_row = |terms: &[(usize, f64)], sign: f64, rhs: f64, b: &mut Vec<f64>| {
            let k = b.len();
            for (column, value) in terms {
                column_entries[*column].push((k, sign * value));
            }
            b.push(sign * rhs);
        };

        for (row, terms) in program.rows().iter().zip(&row_terms) {
            if row.relation == Relation::Equal {
                push_row(terms, 1., row.rhs, &mut b);
            }
        }
        let equalities = b.len();
        for (row, terms) in program.rows().iter().zip(&row_terms) {
            match row.relation {
                Relation::LessEqual => push_row(terms, 1., row.rhs, &mut b),
                Relation::GreaterEqual => push_row(terms, -1., row.rhs, &mut b),
                Relation::Equal => {}
            }
        }
        for (j, column) in program.columns().iter().enumerate() {
            if column.upper_bound.is_finite() {
                push_row(&[(j, 1.)], 1., column.upper_bound, &mut b);
            }
            if column.lower_bound.is_finite() {
                push_row(&[(j, 1.)], -1., column.lower_bound, &mut b);
            }
        }
        let inequalities = b.len() - equalities;

        let mut colptr = Vec::with_capacity(n + 1);
        let mut rowval = Vec::new();
        let mut nzval = Vec::new();
        colptr.push(0);
        for mut entries in column_entries {
            entries.sort_by_key(|(row, _)| *row);
            for (row, value) in entries {
                rowval.push(row);
                nzval.push(value);
            }
            colptr.push(rowval.len());
        }

        let mut cones = Vec::new();
        if equalities > 0 {
            cones.push(SupportedConeT::ZeroConeT(equalities));
        }
        if inequalities > 0 {
            cones.push(SupportedConeT::NonnegativeConeT(inequalities));
        }
        let q = if with_objective {
            let sign = program.sense().minimization_sign();
            program.objective().iter().map(|c| sign * c).collect()
        } else {
            vec![0.; n]
        };
        ConicForm {
            a: CscMatrix::new(b.len(), n, colptr, rowval, nzval),
            b,
            q,
            cones,
        }
    }
}

impl LpOracle for ClarabelOracle {
    fn name(&self) -> &'static str {
        "clarabel"
    }

    fn solve(&mut self, program: &LinearProgram) -> Result<LpSolution, OracleError> {
        let n = program.num_columns();
        let form = ConicForm::from_program(program, true);
        if form.b.is_empty() {
            // Nothing constrains the columns
            return Ok(if form.q.iter().all(|c| *c == 0.) {
                LpSolution::optimal(0., DVector::zeros(n))
            } else {
                LpSolution::without_primal(OptimizationStatus::Unbounded)
            });
        }

        let (status, primal) = self.run(&form)?;
        match status {
            SolverStatus::Solved => {
                let objective_value = program.objective_value(&primal);
                Ok(LpSolution::optimal(objective_value, primal))
            }
            SolverStatus::AlmostSolved
            | SolverStatus::InsufficientProgress
            | SolverStatus::NumericalError => {
                if !self.accepts(program, &status, &primal) {
                    return Err(OracleError::Numerical(format!("{:?}", status)));
                }
                warn!(
                    "Clarabel reached reduced accuracy ({:?}) at growth rate {}",
                    status,
                    program.growth_rate()
                );
                let objective_value = program.objective_value(&primal);
                Ok(LpSolution::optimal(objective_value, primal))
            }
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                Ok(LpSolution::without_primal(OptimizationStatus::Infeasible))
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                Ok(LpSolution::without_primal(OptimizationStatus::Unbounded))
            }
            SolverStatus::MaxTime => Err(OracleError::Timeout),
            SolverStatus::MaxIterations => Err(OracleError::IterationLimit),
            other => Err(OracleError::Backend(format!("{:?}", other))),
        }
    }

    /// Solve with a zero objective, so only the constraints steer the interior point method
    fn check_feasibility(&mut self, program: &LinearProgram) -> Result<bool, OracleError> {
        let form = ConicForm::from_program(program, false);
        if form.b.is_empty() {
            return Ok(true);
        }
        let (status, point) = self.run(&form)?;
        match status {
            SolverStatus::Solved
            | SolverStatus::DualInfeasible
            | SolverStatus::AlmostDualInfeasible => Ok(true),
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => Ok(false),
            SolverStatus::AlmostSolved
            | SolverStatus::InsufficientProgress
            | SolverStatus::NumericalError => Ok(self.accepts(program, &status, &point)),
            SolverStatus::MaxTime => Err(OracleError::Timeout),
            SolverStatus::MaxIterations => Err(OracleError::IterationLimit),
            other => Err(OracleError::Backend(format!("{:?}", other))),
        }
    }
}
