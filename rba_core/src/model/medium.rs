//! This module provides the Medium struct, describing what the environment makes available
use derive_builder::Builder;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A growth medium
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Medium {
    /// Name of the medium
    #[builder(setter(into))]
    pub id: String,
    /// Availability of each boundary species, absent species are unavailable
    #[builder(default = "IndexMap::new()")]
    pub concentrations: IndexMap<String, f64>,
    /// Reaction bounds replacing the declared ones while this medium is active
    #[builder(default = "IndexMap::new()")]
    pub reaction_bounds: IndexMap<String, FluxBounds>,
}

/// Lower and upper bound on a flux
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluxBounds {
    pub lower: f64,
    pub upper: f64,
}

impl Medium {
    /// Create a medium with no available species and no bound overrides
    pub fn empty(id: &str) -> Medium {
        Medium {
            id: id.to_string(),
            concentrations: IndexMap::new(),
            reaction_bounds: IndexMap::new(),
        }
    }

    /// Availability of a species in this medium, 0 if absent
    pub fn availability(&self, species: &str) -> f64 {
        self.concentrations.get(species).copied().unwrap_or(0.)
    }

    /// Set the availability of a species, returning self for chaining
    pub fn with_concentration(mut self, species: &str, availability: f64) -> Medium {
        self.concentrations.insert(species.to_string(), availability);
        self
    }

    /// Override the bounds of a reaction, returning self for chaining
    pub fn with_reaction_bounds(mut self, reaction: &str, lower: f64, upper: f64) -> Medium {
        self.reaction_bounds
            .insert(reaction.to_string(), FluxBounds { lower, upper });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_defaults_to_zero() {
        let medium = Medium::empty("default").with_concentration("glc_e", 10.);
        assert!((medium.availability("glc_e") - 10.).abs() < 1e-25);
        assert!(medium.availability("o2_e").abs() < 1e-25);
    }

    #[test]
    fn builder() {
        let medium = MediumBuilder::default().id("minimal").build().unwrap();
        assert_eq!(medium, Medium::empty("minimal"));
    }
}
