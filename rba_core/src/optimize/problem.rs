//! Provides struct representing a linear program
use indexmap::IndexMap;
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CscMatrix};
use thiserror::Error;

use crate::optimize::constraint::{Relation, Row, RowKind};
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::variable::{Column, ColumnKind};

/// A linear program built for one growth rate
///
/// `max/min objective·x  subject to  matrix·x (relation) rhs,  lower <= x <= upper`
///
/// Programs are never modified once built; probing another growth rate means building a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearProgram {
    /// Columns, in the order they were added
    columns: Vec<Column>,
    /// Rows, in the order they were added
    rows: Vec<Row>,
    /// Coefficients, rows x columns
    matrix: CscMatrix<f64>,
    /// Dense objective coefficients, one per column
    objective: DVector<f64>,
    /// Sense of the objective
    sense: ObjectiveSense,
    /// Growth rate the coefficients were evaluated at
    growth_rate: f64,
    /// Position of each column, keyed by kind and id
    column_index: IndexMap<(ColumnKind, String), usize>,
}

impl LinearProgram {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn matrix(&self) -> &CscMatrix<f64> {
        &self.matrix
    }

    pub fn objective(&self) -> &DVector<f64> {
        &self.objective
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    pub fn growth_rate(&self) -> f64 {
        self.growth_rate
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Position of the column standing for a model entity
    pub fn column_position(&self, kind: ColumnKind, id: &str) -> Option<usize> {
        self.column_index.get(&(kind, id.to_string())).copied()
    }

    /// Position of the first row of a kind built for a model entity
    pub fn row_position(&self, kind: RowKind, id: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.kind == kind && r.id == id)
    }

    /// Coefficient at a row and column, 0 for structural zeros
    pub fn coefficient(&self, row: usize, column: usize) -> f64 {
        self.matrix
            .get_entry(row, column)
            .map(|entry| entry.into_value())
            .unwrap_or(0.)
    }

    /// Compute `matrix·x`
    pub fn row_activities(&self, x: &DVector<f64>) -> DVector<f64> {
        let mut activities = DVector::zeros(self.rows.len());
        for (row, column, value) in self.matrix.triplet_iter() {
            activities[row] += value * x[column];
        }
        activities
    }

    /// Value of the objective at `x`
    pub fn objective_value(&self, x: &DVector<f64>) -> f64 {
        self.objective.dot(x)
    }

    /// Largest amount by which `x` violates a row or a column bound
    pub fn max_violation(&self, x: &DVector<f64>) -> f64 {
        let activities = self.row_activities(x);
        let row_violation = self
            .rows
            .iter()
            .zip(activities.iter())
            .map(|(row, activity)| row.violation(*activity))
            .fold(0., f64::max);
        let bound_violation = self
            .columns
            .iter()
            .zip(x.iter())
            .map(|(column, value)| {
                (column.lower_bound - value)
                    .max(value - column.upper_bound)
                    .max(0.)
            })
            .fold(0., f64::max);
        row_violation.max(bound_violation)
    }
}

/// Accumulates columns and rows, then assembles them into a [`LinearProgram`]
#[derive(Debug, Clone)]
pub struct LinearProgramBuilder {
    columns: Vec<Column>,
    rows: Vec<Row>,
    triplets: Vec<(usize, usize, f64)>,
    objective: Vec<f64>,
    sense: ObjectiveSense,
    growth_rate: f64,
    column_index: IndexMap<(ColumnKind, String), usize>,
}

impl LinearProgramBuilder {
    /// Start an empty program for a growth rate
    pub fn new(sense: ObjectiveSense, growth_rate: f64) -> Self {
        LinearProgramBuilder {
            columns: Vec::new(),
            rows: Vec::new(),
            triplets: Vec::new(),
            objective: Vec::new(),
            sense,
            growth_rate,
            column_index: IndexMap::new(),
        }
    }

    /// Add a column, returning its position
    pub fn add_column(
        &mut self,
        id: &str,
        kind: ColumnKind,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<usize, ProblemError> {
        if lower_bound.is_nan() || upper_bound.is_nan() {
            return Err(ProblemError::InvalidBound(id.to_string()));
        }
        let position = self.columns.len();
        if self
            .column_index
            .insert((kind, id.to_string()), position)
            .is_some()
        {
            return Err(ProblemError::ColumnAlreadyExists(id.to_string()));
        }
        self.columns.push(Column {
            id: id.to_string(),
            kind,
            lower_bound,
            upper_bound,
        });
        self.objective.push(0.);
        Ok(position)
    }

    /// Position of a column already added
    pub fn column_position(&self, kind: ColumnKind, id: &str) -> Result<usize, ProblemError> {
        self.column_index
            .get(&(kind, id.to_string()))
            .copied()
            .ok_or_else(|| ProblemError::NonExistentColumn(format!("{}:{}", id, kind)))
    }

    /// Add a row, returning its position
    ///
    /// Terms referring to the same column are summed. Zero coefficients are dropped.
    pub fn add_row(
        &mut self,
        id: &str,
        kind: RowKind,
        terms: &[(usize, f64)],
        relation: Relation,
        rhs: f64,
    ) -> Result<usize, ProblemError> {
        if rhs.is_nan() {
            return Err(ProblemError::NonFiniteCoefficient(format!("{}[{}]", kind, id)));
        }
        let position = self.rows.len();
        for (column, coefficient) in terms {
            if *column >= self.columns.len() {
                return Err(ProblemError::NonExistentColumn(format!("#{}", column)));
            }
            if !coefficient.is_finite() {
                return Err(ProblemError::NonFiniteCoefficient(format!("{}[{}]", kind, id)));
            }
        }
        self.triplets.extend(
            terms
                .iter()
                .filter(|(_, coefficient)| *coefficient != 0.)
                .map(|(column, coefficient)| (position, *column, *coefficient)),
        );
        self.rows.push(Row {
            id: id.to_string(),
            kind,
            relation,
            rhs,
        });
        Ok(position)
    }

    /// Set the objective coefficient of a column
    pub fn set_objective_coefficient(
        &mut self,
        column: usize,
        coefficient: f64,
    ) -> Result<(), ProblemError> {
        match self.objective.get_mut(column) {
            Some(c) => {
                *c = coefficient;
                Ok(())
            }
            None => Err(ProblemError::NonExistentColumn(format!("#{}", column))),
        }
    }

    /// Assemble the sparse matrix and finish the program
    pub fn build(self) -> Result<LinearProgram, ProblemError> {
        let (row_indices, (col_indices, values)): (Vec<usize>, (Vec<usize>, Vec<f64>)) = self
            .triplets
            .into_iter()
            .map(|(r, c, v)| (r, (c, v)))
            .unzip();
        let coo = CooMatrix::try_from_triplets(
            self.rows.len(),
            self.columns.len(),
            row_indices,
            col_indices,
            values,
        )
        .map_err(|err| ProblemError::MatrixAssembly(err.to_string()))?;
        Ok(LinearProgram {
            columns: self.columns,
            rows: self.rows,
            matrix: CscMatrix::from(&coo),
            objective: DVector::from_vec(self.objective),
            sense: self.sense,
            growth_rate: self.growth_rate,
            column_index: self.column_index,
        })
    }
}

/// Errors associated with building a linear program
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    /// Error when trying to add a column with the same kind and id as an existing one
    #[error("Tried to add column {0} twice")]
    ColumnAlreadyExists(String),
    /// Error when a column bound is NaN
    #[error("Column {0} has a NaN bound")]
    InvalidBound(String),
    /// Error when a row refers to a column not in the program
    #[error("Tried to access column {0} which doesn't exist")]
    NonExistentColumn(String),
    /// Error when a row has a NaN or infinite coefficient
    #[error("Row {0} has a non finite coefficient")]
    NonFiniteCoefficient(String),
    /// Error while converting the coefficients to a sparse matrix
    #[error("Unable to assemble constraint matrix: {0}")]
    MatrixAssembly(String),
}
