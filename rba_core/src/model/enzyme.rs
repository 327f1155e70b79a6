//! This module provides the Enzyme struct, linking a catalysed reaction to the concentration of
//! the enzyme catalysing it
use derive_builder::Builder;

use crate::model::function::GrowthFunction;

/// Represents an enzyme catalysing a single reaction
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Enzyme {
    /// Used to identify the enzyme
    #[builder(setter(into))]
    pub id: String,
    /// Human Readable enzyme name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Id of the reaction this enzyme catalyses
    #[builder(setter(into))]
    pub reaction: String,
    /// Forward catalytic efficiency, flux per unit enzyme
    pub forward_efficiency: GrowthFunction,
    /// Backward catalytic efficiency
    ///
    /// When None, the forward efficiency also bounds the backward flux.
    #[builder(default = "None")]
    pub backward_efficiency: Option<GrowthFunction>,
}

impl Enzyme {
    /// The efficiency bounding backward flux
    pub fn effective_backward_efficiency(&self) -> &GrowthFunction {
        self.backward_efficiency
            .as_ref()
            .unwrap_or(&self.forward_efficiency)
    }
}
