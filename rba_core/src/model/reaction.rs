//! This module provides a struct for representing reactions
use derive_builder::Builder;
use indexmap::IndexMap;

use crate::model::medium::{FluxBounds, Medium};

/// Represents a reaction in the RBA model
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Reaction {
    /// Used to identify the reaction
    #[builder(setter(into))]
    pub id: String,
    /// Species stoichiometry of the reaction, in declaration order
    #[builder(default = "IndexMap::new()")]
    pub stoichiometry: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Lower flux bound
    #[builder(default = "crate::configuration::default_lower_bound()")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "crate::configuration::default_upper_bound()")]
    pub upper_bound: f64,
    /// Whether this reaction exchanges species with the environment
    #[builder(default = "false")]
    pub boundary: bool,
}

impl Reaction {
    /// Flux bounds in a medium, the medium's override if it has one
    pub fn bounds_in(&self, medium: &Medium) -> FluxBounds {
        medium
            .reaction_bounds
            .get(&self.id)
            .copied()
            .unwrap_or(FluxBounds {
                lower: self.lower_bound,
                upper: self.upper_bound,
            })
    }

    /// Whether the reaction may run backwards in a medium
    pub fn is_reversible_in(&self, medium: &Medium) -> bool {
        self.bounds_in(medium).lower < 0.
    }

    /// Stoichiometric coefficient of a species in this reaction (0 if it doesn't take part)
    pub fn coefficient(&self, species: &str) -> f64 {
        self.stoichiometry.get(species).copied().unwrap_or(0.)
    }
}
