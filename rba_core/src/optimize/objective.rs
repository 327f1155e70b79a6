//! Provides the sense of a linear program's objective

/// Represents the sense of the objective, whether it should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    Minimize,
    /// The objective should be maximized
    Maximize,
}

impl ObjectiveSense {
    /// Multiplier turning the objective into a minimization
    pub fn minimization_sign(&self) -> f64 {
        match self {
            ObjectiveSense::Minimize => 1.,
            ObjectiveSense::Maximize => -1.,
        }
    }
}
