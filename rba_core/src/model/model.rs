//! This module provides the RbaModel struct for representing an entire resource allocation model
use derive_builder::Builder;
use indexmap::IndexMap;
use thiserror::Error;

use crate::model::enzyme::Enzyme;
use crate::model::function::{FunctionVariable, GrowthFunction};
use crate::model::medium::Medium;
use crate::model::process::{Process, RequirementTarget};
use crate::model::reaction::Reaction;
use crate::model::species::Species;

/// Represents a cell model for Resource Balance Analysis
///
/// Every collection is an IndexMap so iteration follows declaration order, which is what makes
/// the linear programs built from the model (and the results read from them) reproducible.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RbaModel {
    /// Id associated with the Model
    pub id: Option<String>,
    /// Map of species ids to Species
    pub species: IndexMap<String, Species>,
    /// Map of reaction ids to Reactions
    pub reactions: IndexMap<String, Reaction>,
    /// Map of enzyme ids to Enzymes
    pub enzymes: IndexMap<String, Enzyme>,
    /// Map of process ids to Processes
    pub processes: IndexMap<String, Process>,
    /// Map of target ids to flux targets
    pub targets: IndexMap<String, FluxTarget>,
    /// Map of density ids to density constraints
    pub densities: IndexMap<String, Density>,
    /// Map of medium names to Media
    pub media: IndexMap<String, Medium>,
    /// Reaction whose flux is maximized at a fixed growth rate, None for a pure feasibility
    /// objective
    pub growth_reaction: Option<String>,
}

impl RbaModel {
    pub fn new_empty() -> Self {
        RbaModel::default()
    }

    /// Add a species to the model
    pub fn add_species(&mut self, species: Species) {
        let id = species.id.clone();
        self.species.insert(id, species);
    }

    /// Add a reaction to the model
    ///
    /// # Examples
    /// ```rust
    /// use rba_core::model::model::RbaModel;
    /// use rba_core::model::reaction::ReactionBuilder;
    /// let mut model = RbaModel::new_empty();
    /// let new_reaction = ReactionBuilder::default().id("new_reaction").build().unwrap();
    /// model.add_reaction(new_reaction);
    /// assert!(model.reactions.contains_key("new_reaction"));
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) {
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
    }

    /// Add an enzyme to the model
    pub fn add_enzyme(&mut self, enzyme: Enzyme) {
        let id = enzyme.id.clone();
        self.enzymes.insert(id, enzyme);
    }

    /// Add a process machinery to the model
    pub fn add_process(&mut self, process: Process) {
        let id = process.id.clone();
        self.processes.insert(id, process);
    }

    /// Add a flux target to the model
    pub fn add_target(&mut self, target: FluxTarget) {
        let id = target.id.clone();
        self.targets.insert(id, target);
    }

    /// Add a density constraint to the model
    pub fn add_density(&mut self, density: Density) {
        let id = density.id.clone();
        self.densities.insert(id, density);
    }

    /// Add a medium to the model
    pub fn add_medium(&mut self, medium: Medium) {
        let id = medium.id.clone();
        self.media.insert(id, medium);
    }

    /// Look up a medium by name
    ///
    /// An absent medium is an error, there is no fallback to another medium.
    pub fn medium(&self, name: &str) -> Result<&Medium, ModelError> {
        self.media
            .get(name)
            .ok_or_else(|| ModelError::MediumNotFound(name.to_string()))
    }

    /// Reactions flagged as exchanging species with the environment, in declaration order
    pub fn boundary_reactions(&self) -> impl Iterator<Item = &Reaction> {
        self.reactions.values().filter(|r| r.boundary)
    }

    // region Validation
    /// Check that the model is internally consistent
    ///
    /// Returns the first problem found. Reaction bounds with `lower > upper` are not checked here:
    /// they make the linear program infeasible rather than the model malformed.
    pub fn validate(&self) -> Result<(), ModelError> {
        for reaction in self.reactions.values() {
            for (species, coefficient) in &reaction.stoichiometry {
                if !self.species.contains_key(species) {
                    return Err(ModelError::UnknownSpecies {
                        species: species.clone(),
                        referenced_by: format!("reaction {}", reaction.id),
                    });
                }
                if !coefficient.is_finite() {
                    return Err(ModelError::InvalidCoefficient(format!(
                        "stoichiometry of {} in reaction {}",
                        species, reaction.id
                    )));
                }
            }
            if reaction.lower_bound.is_nan() || reaction.upper_bound.is_nan() {
                return Err(ModelError::InvalidCoefficient(format!(
                    "bounds of reaction {}",
                    reaction.id
                )));
            }
        }

        let mut catalysed: IndexMap<&str, &str> = IndexMap::new();
        for enzyme in self.enzymes.values() {
            let referenced_by = format!("enzyme {}", enzyme.id);
            self.check_reaction(&enzyme.reaction, &referenced_by)?;
            if let Some(other) = catalysed.insert(enzyme.reaction.as_str(), enzyme.id.as_str()) {
                return Err(ModelError::DuplicateCatalyst {
                    reaction: enzyme.reaction.clone(),
                    first: other.to_string(),
                    second: enzyme.id.clone(),
                });
            }
            self.check_function(&enzyme.forward_efficiency, &referenced_by)?;
            if let Some(backward) = &enzyme.backward_efficiency {
                self.check_function(backward, &referenced_by)?;
            }
        }

        for process in self.processes.values() {
            let referenced_by = format!("process {}", process.id);
            self.check_function(&process.capacity, &referenced_by)?;
            for requirement in &process.requirements {
                if !requirement.cost.is_finite() {
                    return Err(ModelError::InvalidCoefficient(format!(
                        "cost of {} in {}",
                        requirement.target, referenced_by
                    )));
                }
                match &requirement.target {
                    RequirementTarget::Reaction(id) => self.check_reaction(id, &referenced_by)?,
                    RequirementTarget::Enzyme(id) => self.check_enzyme(id, &referenced_by)?,
                    RequirementTarget::Process(id) => self.check_process(id, &referenced_by)?,
                }
            }
        }

        for target in self.targets.values() {
            let referenced_by = format!("target {}", target.id);
            self.check_reaction(&target.reaction, &referenced_by)?;
            self.check_function(&target.value, &referenced_by)?;
        }

        for density in self.densities.values() {
            let referenced_by = format!("density {}", density.id);
            self.check_function(&density.limit, &referenced_by)?;
            for (enzyme, weight) in &density.enzyme_weights {
                self.check_enzyme(enzyme, &referenced_by)?;
                if !weight.is_finite() {
                    return Err(ModelError::InvalidCoefficient(format!(
                        "weight of enzyme {} in {}",
                        enzyme, referenced_by
                    )));
                }
            }
            for (process, weight) in &density.process_weights {
                self.check_process(process, &referenced_by)?;
                if !weight.is_finite() {
                    return Err(ModelError::InvalidCoefficient(format!(
                        "weight of process {} in {}",
                        process, referenced_by
                    )));
                }
            }
        }

        for medium in self.media.values() {
            let referenced_by = format!("medium {}", medium.id);
            for (species, availability) in &medium.concentrations {
                if !self.species.contains_key(species) {
                    return Err(ModelError::UnknownSpecies {
                        species: species.clone(),
                        referenced_by,
                    });
                }
                if availability.is_nan() || *availability < 0. {
                    return Err(ModelError::NegativeAvailability {
                        medium: medium.id.clone(),
                        species: species.clone(),
                    });
                }
            }
            for (reaction, bounds) in &medium.reaction_bounds {
                self.check_reaction(reaction, &referenced_by)?;
                if bounds.lower.is_nan() || bounds.upper.is_nan() {
                    return Err(ModelError::InvalidCoefficient(format!(
                        "bounds of reaction {} in {}",
                        reaction, referenced_by
                    )));
                }
            }
        }

        if let Some(growth_reaction) = &self.growth_reaction {
            self.check_reaction(growth_reaction, "the growth objective")?;
        }
        Ok(())
    }

    fn check_reaction(&self, id: &str, referenced_by: &str) -> Result<(), ModelError> {
        if self.reactions.contains_key(id) {
            Ok(())
        } else {
            Err(ModelError::UnknownReaction {
                reaction: id.to_string(),
                referenced_by: referenced_by.to_string(),
            })
        }
    }

    fn check_enzyme(&self, id: &str, referenced_by: &str) -> Result<(), ModelError> {
        if self.enzymes.contains_key(id) {
            Ok(())
        } else {
            Err(ModelError::UnknownEnzyme {
                enzyme: id.to_string(),
                referenced_by: referenced_by.to_string(),
            })
        }
    }

    fn check_process(&self, id: &str, referenced_by: &str) -> Result<(), ModelError> {
        if self.processes.contains_key(id) {
            Ok(())
        } else {
            Err(ModelError::UnknownProcess {
                process: id.to_string(),
                referenced_by: referenced_by.to_string(),
            })
        }
    }

    fn check_function(
        &self,
        function: &GrowthFunction,
        referenced_by: &str,
    ) -> Result<(), ModelError> {
        if !function.is_well_formed() {
            return Err(ModelError::InvalidCoefficient(format!(
                "function parameters of {}",
                referenced_by
            )));
        }
        if let FunctionVariable::Medium(species) = function.variable() {
            if !self.species.contains_key(species) {
                return Err(ModelError::UnknownSpecies {
                    species: species.clone(),
                    referenced_by: referenced_by.to_string(),
                });
            }
        }
        Ok(())
    }
    // endregion Validation
}

// region Targets and Densities
/// Requires a reaction to carry at least `value` flux
///
/// With `value` growing with μ this is what ties the network to growth, for example a biomass
/// reaction that has to keep up with dilution.
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct FluxTarget {
    /// Used to identify the target
    #[builder(setter(into))]
    pub id: String,
    /// Reaction the target applies to
    #[builder(setter(into))]
    pub reaction: String,
    /// Minimal flux through the reaction
    pub value: GrowthFunction,
}

/// Caps the weighted total of machinery concentrations, such as the protein a compartment can
/// hold
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Density {
    /// Used to identify the density constraint
    #[builder(setter(into))]
    pub id: String,
    /// Largest allowed weighted total
    pub limit: GrowthFunction,
    /// Weight of each enzyme counted against the limit
    #[builder(default = "IndexMap::new()")]
    pub enzyme_weights: IndexMap<String, f64>,
    /// Weight of each process machinery counted against the limit
    #[builder(default = "IndexMap::new()")]
    pub process_weights: IndexMap<String, f64>,
}
// endregion Targets and Densities

/// Errors in the definition of a model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Species {species} referenced by {referenced_by} is not in the model")]
    UnknownSpecies {
        species: String,
        referenced_by: String,
    },
    #[error("Reaction {reaction} referenced by {referenced_by} is not in the model")]
    UnknownReaction {
        reaction: String,
        referenced_by: String,
    },
    #[error("Enzyme {enzyme} referenced by {referenced_by} is not in the model")]
    UnknownEnzyme {
        enzyme: String,
        referenced_by: String,
    },
    #[error("Process {process} referenced by {referenced_by} is not in the model")]
    UnknownProcess {
        process: String,
        referenced_by: String,
    },
    #[error("Reaction {reaction} is catalysed by both {first} and {second}")]
    DuplicateCatalyst {
        reaction: String,
        first: String,
        second: String,
    },
    #[error("The {kind} id {id} is declared more than once")]
    DuplicateId { kind: &'static str, id: String },
    #[error("Invalid coefficient in {0}")]
    InvalidCoefficient(String),
    #[error("Medium {medium} gives species {species} a negative availability")]
    NegativeAvailability { medium: String, species: String },
    #[error("Medium {0} is not defined by the model")]
    MediumNotFound(String),
    /// Feasibility was observed to increase with the growth rate, which bisection can't handle
    #[error("Growth rate {infeasible} is infeasible although {feasible} is feasible")]
    NonMonotonicFeasibility { feasible: f64, infeasible: f64 },
}
