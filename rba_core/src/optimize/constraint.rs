//! Provides structs describing the rows of a linear program
use std::fmt::{Display, Formatter};

/// A row of a linear program, `terms (relation) rhs`
///
/// The coefficients themselves live in the program's sparse matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Id of the model entity the row comes from
    pub id: String,
    /// What the row enforces
    pub kind: RowKind,
    /// How the row activity compares with `rhs`
    pub relation: Relation,
    /// Right hand side
    pub rhs: f64,
}

impl Row {
    /// How far `activity` is from satisfying the row, 0 if it does
    pub fn violation(&self, activity: f64) -> f64 {
        match self.relation {
            Relation::LessEqual => (activity - self.rhs).max(0.),
            Relation::Equal => (activity - self.rhs).abs(),
            Relation::GreaterEqual => (self.rhs - activity).max(0.),
        }
    }
}

impl Display for Row {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}] {} {}", self.kind, self.id, self.relation, self.rhs)
    }
}

/// Comparison between a row's activity and its right hand side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    LessEqual,
    Equal,
    GreaterEqual,
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Relation::LessEqual => write!(f, "<="),
            Relation::Equal => write!(f, "="),
            Relation::GreaterEqual => write!(f, ">="),
        }
    }
}

/// The constraint family a row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    /// Steady state (or medium bounded) balance of a species
    MassBalance,
    /// Forward flux limited by enzyme concentration
    EnzymeForward,
    /// Backward flux limited by enzyme concentration
    EnzymeBackward,
    /// Flux magnitude column bounding one sign of a flux
    FluxMagnitude,
    /// Demand on a process machinery limited by its concentration
    ProcessCapacity,
    /// Weighted machinery total limited by a density
    Density,
    /// Minimal flux through a reaction
    Target,
}

impl Display for RowKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RowKind::MassBalance => write!(f, "MASS_BALANCE"),
            RowKind::EnzymeForward => write!(f, "ENZYME_FORWARD"),
            RowKind::EnzymeBackward => write!(f, "ENZYME_BACKWARD"),
            RowKind::FluxMagnitude => write!(f, "FLUX_MAGNITUDE"),
            RowKind::ProcessCapacity => write!(f, "PROCESS_CAPACITY"),
            RowKind::Density => write!(f, "DENSITY"),
            RowKind::Target => write!(f, "TARGET"),
        }
    }
}
