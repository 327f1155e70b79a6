//! Module providing representation of linear program columns
use std::fmt::{Display, Formatter};

/// A column (variable) of a linear program
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Id of the model entity this column stands for
    pub id: String,
    /// What the column measures
    pub kind: ColumnKind,
    /// Lowest value the column can take
    pub lower_bound: f64,
    /// Highest value the column can take
    pub upper_bound: f64,
}

impl Display for Column {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.id, self.kind)
    }
}

/// Represents the kind of quantity a column measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Flux through a reaction
    Flux,
    /// Concentration of an enzyme
    Enzyme,
    /// Concentration of a process machinery
    Process,
    /// Upper bound on the absolute flux of a reversible reaction
    FluxMagnitude,
}

impl Display for ColumnKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Flux => write!(f, "FLUX"),
            ColumnKind::Enzyme => write!(f, "ENZYME"),
            ColumnKind::Process => write!(f, "PROCESS"),
            ColumnKind::FluxMagnitude => write!(f, "MAGNITUDE"),
        }
    }
}
