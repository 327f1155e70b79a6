//! End to end tests: load the toy cell, search its growth rate, check the allocation
#![cfg(feature = "minilp")]

mod common;

use std::fs;

use approx::assert_abs_diff_eq;
use indexmap::IndexMap;
use rba_core::io::json::read_model_dir;
use rba_core::io::tsv::{format_boundary_fluxes, write_results};
use rba_core::model::function::GrowthFunction;
use rba_core::model::medium::Medium;
use rba_core::model::model::{DensityBuilder, FluxTargetBuilder};
use rba_core::model::reaction::ReactionBuilder;
use rba_core::model::species::Species;
use rba_core::optimize::solvers::minilp::MinilpOracle;
use rba_core::rba::search::{is_feasible, SearchSettings};
use rba_core::{solve_with, ModelError, RbaError, RbaModel, Results};

use common::{shared_machinery_model, toy_model_dir, toy_optimum};

const TOLERANCE: f64 = 1e-7;

fn solve_toy(medium: &str) -> Results {
    let model = read_model_dir(toy_model_dir()).unwrap();
    let mut oracle = MinilpOracle::new();
    solve_with(&model, medium, &mut oracle, &SearchSettings::default()).unwrap()
}

#[test]
fn load_toy_model() {
    let model = read_model_dir(toy_model_dir()).unwrap();
    assert_eq!(model.id.as_deref(), Some("toy_cell"));
    assert_eq!(model.species.len(), 3);
    assert_eq!(model.reactions.len(), 3);
    assert!(model.reactions["TRANS"].boundary);
    assert!(!model.reactions["BIO"].boundary);
    let media: Vec<&str> = model.media.keys().map(|k| k.as_str()).collect();
    assert_eq!(media, vec!["default", "poor"]);
    assert_abs_diff_eq!(model.medium("poor").unwrap().availability("S_e"), 1.);
}

#[test]
fn toy_growth_rate() {
    let results = solve_toy("default");
    assert_abs_diff_eq!(results.growth_rate(), toy_optimum(), epsilon = 1e-5);
    assert!(results.growth_rate() <= toy_optimum() + 1e-9);
    assert_abs_diff_eq!(
        results.objective_value().unwrap(),
        results.growth_rate(),
        epsilon = 1e-5
    );
}

#[test]
fn toy_allocation_is_consistent() {
    let results = solve_toy("default");
    let mu = results.growth_rate();
    let flux = |id: &str| results.flux(id).unwrap();
    let enzyme = |id: &str| results.enzyme_concentrations()[id];
    let ribosome = results.process_machinery_concentrations()["ribosome"];

    // Internal species are balanced, the boundary one is bounded by the medium
    assert_abs_diff_eq!(flux("TRANS") - flux("CONV"), 0., epsilon = TOLERANCE);
    assert_abs_diff_eq!(flux("CONV") - flux("BIO"), 0., epsilon = TOLERANCE);
    assert!(flux("TRANS") <= 100. + TOLERANCE);

    // Enzyme capacity
    assert!(flux("TRANS") <= 10. * enzyme("E_T") + TOLERANCE);
    assert!(flux("CONV") <= 5. * enzyme("E_C") + TOLERANCE);

    // Ribosome capacity and density
    assert!(mu * (enzyme("E_T") + enzyme("E_C") + 2. * ribosome) <= 20. * ribosome + TOLERANCE);
    assert!(enzyme("E_T") + enzyme("E_C") + ribosome <= 1. + TOLERANCE);

    // Growth target
    assert!(flux("BIO") >= mu - TOLERANCE);
}

#[test]
fn poor_medium_limits_uptake() {
    let results = solve_toy("poor");
    assert_abs_diff_eq!(results.growth_rate(), 1., epsilon = 1e-5);
    assert!(results.flux("TRANS").unwrap() <= 1. + TOLERANCE);
    let ranked = results.sorted_boundary_fluxes();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].reaction, "TRANS");
}

#[test]
fn repeated_solves_are_identical() {
    assert_eq!(solve_toy("default"), solve_toy("default"));
}

#[test]
fn unknown_medium() {
    let model = read_model_dir(toy_model_dir()).unwrap();
    let mut oracle = MinilpOracle::new();
    assert_eq!(
        solve_with(&model, "nonexistent", &mut oracle, &SearchSettings::default()),
        Err(RbaError::Model(ModelError::MediumNotFound(
            "nonexistent".to_string()
        )))
    );
}

#[test]
fn feasibility_at_zero_growth() {
    let model = read_model_dir(toy_model_dir()).unwrap();
    let medium = model.medium("default").unwrap();
    let mut oracle = MinilpOracle::new();
    assert!(is_feasible(&model, medium, &mut oracle, 0.).unwrap());
    assert!(!is_feasible(&model, medium, &mut oracle, toy_optimum() + 0.01).unwrap());
}

#[test]
fn crossed_bounds_are_infeasible() {
    let mut model = RbaModel::new_empty();
    model.add_species(Species::internal("X"));
    model.add_reaction(
        ReactionBuilder::default()
            .id("R")
            .lower_bound(1.)
            .upper_bound(0.)
            .build()
            .unwrap(),
    );
    model.add_medium(Medium::empty("default"));
    let mut oracle = MinilpOracle::new();
    assert_eq!(
        solve_with(&model, "default", &mut oracle, &SearchSettings::default()),
        Err(RbaError::ModelInfeasible)
    );
}

#[test]
fn growth_without_resource_limit_is_unbounded() {
    let mut model = RbaModel::new_empty();
    model.add_reaction(
        ReactionBuilder::default()
            .id("R")
            .lower_bound(0.)
            .upper_bound(f64::INFINITY)
            .build()
            .unwrap(),
    );
    model.add_target(
        FluxTargetBuilder::default()
            .id("growth")
            .reaction("R")
            .value(GrowthFunction::linear(0., 1.))
            .build()
            .unwrap(),
    );
    model.add_medium(Medium::empty("default"));
    let mut oracle = MinilpOracle::new();
    let settings = SearchSettings {
        max_doublings: 8,
        ..SearchSettings::default()
    };
    assert_eq!(
        solve_with(&model, "default", &mut oracle, &settings),
        Err(RbaError::UnboundedGrowth {
            last_feasible: 0.5 * 256.
        })
    );
}

#[test]
fn empty_density_leaves_reaction_bound_limiting() {
    let mut model = RbaModel::new_empty();
    model.add_reaction(
        ReactionBuilder::default()
            .id("R")
            .lower_bound(0.)
            .upper_bound(0.75)
            .build()
            .unwrap(),
    );
    model.add_target(
        FluxTargetBuilder::default()
            .id("growth")
            .reaction("R")
            .value(GrowthFunction::linear(0., 1.))
            .build()
            .unwrap(),
    );
    model.add_density(
        DensityBuilder::default()
            .id("empty")
            .limit(GrowthFunction::constant(1.))
            .enzyme_weights(IndexMap::new())
            .build()
            .unwrap(),
    );
    model.growth_reaction = Some("R".to_string());
    model.add_medium(Medium::empty("default"));
    let mut oracle = MinilpOracle::new();
    let results = solve_with(&model, "default", &mut oracle, &SearchSettings::default()).unwrap();
    assert_abs_diff_eq!(results.growth_rate(), 0.75, epsilon = 1e-6);
    assert!(results.enzyme_concentrations().is_empty());
}

#[test]
fn monotone_toy_passes_sampling() {
    let model = read_model_dir(toy_model_dir()).unwrap();
    let mut oracle = MinilpOracle::new();
    let settings = SearchSettings {
        monotonicity_samples: 8,
        ..SearchSettings::default()
    };
    let sampled = solve_with(&model, "default", &mut oracle, &settings).unwrap();
    assert_abs_diff_eq!(sampled.growth_rate(), toy_optimum(), epsilon = 1e-5);
    assert_eq!(sampled, solve_toy("default"));
}

#[test]
fn reversed_flux_still_occupies_machinery() {
    let model = shared_machinery_model();
    let mut oracle = MinilpOracle::new();
    let results = solve_with(&model, "default", &mut oracle, &SearchSettings::default()).unwrap();
    assert_abs_diff_eq!(results.growth_rate(), 1., epsilon = 1e-6);
    let g = results.flux("G").unwrap();
    let r = results.flux("R").unwrap();
    let machinery = results.process_machinery_concentrations()["P"];
    assert!(g + r.abs() <= machinery + TOLERANCE);
    assert!(machinery <= 1. + TOLERANCE);

    // Running R backwards no longer helps once the medium forces it to
    let mut forced = model.clone();
    forced.add_medium(Medium::empty("backwards").with_reaction_bounds("R", -10., -0.5));
    let results =
        solve_with(&forced, "backwards", &mut oracle, &SearchSettings::default()).unwrap();
    assert_abs_diff_eq!(results.growth_rate(), 0.5, epsilon = 1e-6);
    assert!(results.flux("R").unwrap() <= -0.5 + TOLERANCE);
}

#[test]
fn global_configuration_solve() {
    let model = read_model_dir(toy_model_dir()).unwrap();
    let results = model.solve("default").unwrap();
    assert_abs_diff_eq!(results.growth_rate(), toy_optimum(), epsilon = 1e-5);
}

#[test]
fn write_and_reload() {
    let model = read_model_dir(toy_model_dir()).unwrap();
    let dir = tempfile::tempdir().unwrap();

    model.write_json(dir.path().join("model.json")).unwrap();
    let reloaded = read_model_dir(dir.path()).unwrap();
    assert_eq!(reloaded, model);

    let results = solve_toy("default");
    let out = dir.path().join("out");
    write_results(&out, &results).unwrap();
    let reactions = fs::read_to_string(out.join("reactions.out")).unwrap();
    let lines: Vec<&str> = reactions.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "Reaction\tFlux");
    assert!(lines[1].starts_with("TRANS\t"));
    let enzymes = fs::read_to_string(out.join("enzymes.out")).unwrap();
    assert!(enzymes.starts_with("Enzyme\tConcentration\nE_T\t"));
    let processes = fs::read_to_string(out.join("process_machineries.out")).unwrap();
    assert!(processes.starts_with("Process\tMachinery Concentration\nribosome\t"));

    let top = format_boundary_fluxes(&results, 10);
    assert_eq!(top.lines().count(), 1);
    assert!(top.starts_with("TRANS\t"));
}
