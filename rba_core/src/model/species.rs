//! This module provides the Species struct representing a reaction participant

use std::hash::Hash;

use derive_builder::Builder;

/// Represents a species taking part in reactions
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Species {
    /// Used to identify the species (must be unique)
    #[builder(setter(into))]
    pub id: String,
    /// Human Readable name of the species
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Whether the species is exchanged with the environment
    ///
    /// Boundary species are not held at steady state, instead their net production is bounded
    /// below by the availability the active medium gives them.
    #[builder(default = "false")]
    pub boundary: bool,
}

impl Species {
    /// Create a new internal (balanced) species
    pub fn internal(id: &str) -> Species {
        Species {
            id: id.to_string(),
            name: None,
            boundary: false,
        }
    }

    /// Create a new boundary species
    pub fn boundary(id: &str) -> Species {
        Species {
            id: id.to_string(),
            name: None,
            boundary: true,
        }
    }
}

impl Hash for Species {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
