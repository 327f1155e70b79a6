//! Fixtures shared by the integration tests
#![allow(dead_code)]
use std::path::PathBuf;

use indexmap::IndexMap;
use rba_core::model::function::GrowthFunction;
use rba_core::model::medium::Medium;
use rba_core::model::model::{DensityBuilder, FluxTargetBuilder};
use rba_core::model::process::{ProcessBuilder, ProcessRequirement, RequirementTarget};
use rba_core::model::reaction::ReactionBuilder;
use rba_core::RbaModel;

pub fn toy_model_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join("toy_model")
}

/// Optimal growth rate of the toy cell, the smaller root of 0.3μ² - 8μ + 20
pub fn toy_optimum() -> f64 {
    (8. - 40f64.sqrt()) / 0.6
}

/// Growth reaction G and a reversible side reaction R share one unit of machinery P
///
/// `v_G >= μ` and `v_G + |v_R| <= P <= 1`, so μ* = 1 whichever way R runs.
pub fn shared_machinery_model() -> RbaModel {
    let mut model = RbaModel::new_empty();
    model.add_reaction(
        ReactionBuilder::default()
            .id("G")
            .lower_bound(0.)
            .upper_bound(f64::INFINITY)
            .build()
            .unwrap(),
    );
    model.add_reaction(
        ReactionBuilder::default()
            .id("R")
            .lower_bound(-10.)
            .upper_bound(10.)
            .build()
            .unwrap(),
    );
    model.add_process(
        ProcessBuilder::default()
            .id("P")
            .capacity(GrowthFunction::constant(1.))
            .requirements(vec![
                ProcessRequirement::new(RequirementTarget::Reaction("G".to_string()), 1.),
                ProcessRequirement::new(RequirementTarget::Reaction("R".to_string()), 1.),
            ])
            .build()
            .unwrap(),
    );
    let mut process_weights = IndexMap::new();
    process_weights.insert("P".to_string(), 1.);
    model.add_density(
        DensityBuilder::default()
            .id("cell")
            .limit(GrowthFunction::constant(1.))
            .process_weights(process_weights)
            .build()
            .unwrap(),
    );
    model.add_target(
        FluxTargetBuilder::default()
            .id("growth")
            .reaction("G")
            .value(GrowthFunction::linear(0., 1.))
            .build()
            .unwrap(),
    );
    model.growth_reaction = Some("G".to_string());
    model.add_medium(Medium::empty("default"));
    model
}
