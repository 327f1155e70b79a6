//! Module for constructing linear programs and handing them to a solver

pub mod constraint;
pub mod objective;
pub mod problem;
pub mod solvers;
pub mod variable;

use nalgebra::DVector;

/// Struct representing the solution to a linear program
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    /// The status reported by the solver
    pub status: OptimizationStatus,
    /// Optimized value of the objective
    ///
    /// Some(f64) if the optimization was completed successfully, None otherwise
    pub objective_value: Option<f64>,
    /// Values of the columns at the optimum, in column order
    ///
    /// Some(DVector) if the problem could be solved to optimality, None otherwise
    pub primal: Option<DVector<f64>>,
}

impl LpSolution {
    /// An optimal solution
    pub fn optimal(objective_value: f64, primal: DVector<f64>) -> Self {
        LpSolution {
            status: OptimizationStatus::Optimal,
            objective_value: Some(objective_value),
            primal: Some(primal),
        }
    }

    /// A solution without primal values
    pub fn without_primal(status: OptimizationStatus) -> Self {
        LpSolution {
            status,
            objective_value: None,
            primal: None,
        }
    }

    /// Whether the linear program has at least one feasible point
    ///
    /// An unbounded objective still means the constraints can be satisfied.
    pub fn is_feasible(&self) -> bool {
        matches!(
            self.status,
            OptimizationStatus::Optimal | OptimizationStatus::Unbounded
        )
    }
}

/// Status of a solved linear program
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OptimizationStatus {
    /// Problem has been optimized
    Optimal,
    /// Problem can't be optimized because objective value is not bounded
    Unbounded,
    /// Problem can't be solved because it is infeasible (conflicting constraints)
    Infeasible,
}

impl std::fmt::Display for OptimizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptimizationStatus::Optimal => write!(f, "optimal"),
            OptimizationStatus::Unbounded => write!(f, "unbounded"),
            OptimizationStatus::Infeasible => write!(f, "infeasible"),
        }
    }
}
