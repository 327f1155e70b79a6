//! This module provides the Process struct, representing a macromolecular machine (such as the
//! ribosome) with a finite capacity
use std::fmt::{Display, Formatter};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::model::function::GrowthFunction;

/// A process machinery whose abundance limits what depends on it
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Process {
    /// Used to identify the process
    #[builder(setter(into))]
    pub id: String,
    /// Human Readable process name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Amount of work one unit of machinery performs per unit time
    pub capacity: GrowthFunction,
    /// Everything that uses this machinery, and how much of it
    #[builder(default = "Vec::new()")]
    pub requirements: Vec<ProcessRequirement>,
}

/// A single demand placed on a process machinery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRequirement {
    /// What needs the machinery
    #[serde(flatten)]
    pub target: RequirementTarget,
    /// Work needed per unit of flux (reactions) or per unit produced (enzymes and processes)
    pub cost: f64,
}

impl ProcessRequirement {
    pub fn new(target: RequirementTarget, cost: f64) -> Self {
        ProcessRequirement { target, cost }
    }
}

/// What a [`ProcessRequirement`] refers to
///
/// Enzymes and process machineries have to be synthesised at the rate growth dilutes them, so
/// their requirement scales with the growth rate. Reaction requirements scale with the flux.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementTarget {
    Reaction(String),
    Enzyme(String),
    Process(String),
}

impl Display for RequirementTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RequirementTarget::Reaction(id) => write!(f, "reaction {}", id),
            RequirementTarget::Enzyme(id) => write!(f, "enzyme {}", id),
            RequirementTarget::Process(id) => write!(f, "process {}", id),
        }
    }
}
