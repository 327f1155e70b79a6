//! Translates an [`RbaModel`] into the linear program for one growth rate
//!
//! Columns come in blocks, each in model declaration order: one flux per reaction, one
//! concentration per enzyme, one concentration per process machinery, then one magnitude column
//! `u >= |v|` per reversible reaction that a process charges for. Rows follow the same
//! discipline: mass balances (one per species), enzyme capacities, flux magnitudes, process
//! capacities, densities, then flux targets. The same model, medium and growth rate therefore
//! always give the same program.
//!
//! The growth rate never becomes a column. It only enters through the coefficients:
//!
//! - enzyme capacity: `v - k(μ)·E <= 0` (and `-v - k_b(μ)·E <= 0` when `v` can be negative)
//! - flux magnitude: `u - v >= 0` and `u + v >= 0`
//! - process capacity: `Σ cost·|v| + Σ μ·cost·E + Σ μ·cost·P' - c(μ)·P <= 0`, with `|v|` read
//!   from the magnitude column when the reaction can run backwards
//! - density: `Σ w·E + Σ w·P <= d(μ)`
//! - target: `v >= t(μ)`
use indexmap::IndexSet;
use log::trace;

use crate::model::function::{FunctionVariable, GrowthFunction};
use crate::model::medium::Medium;
use crate::model::model::{ModelError, RbaModel};
use crate::model::process::RequirementTarget;
use crate::optimize::constraint::{Relation, RowKind};
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::{LinearProgram, LinearProgramBuilder};
use crate::optimize::variable::ColumnKind;
use crate::rba::RbaError;

/// Evaluate a growth rate dependent coefficient
///
/// This is the only place [`GrowthFunction`]s are evaluated.
pub fn evaluate(function: &GrowthFunction, growth_rate: f64, medium: &Medium) -> f64 {
    let x = match function.variable() {
        FunctionVariable::GrowthRate => growth_rate,
        FunctionVariable::Medium(species) => medium.availability(species),
    };
    match function {
        GrowthFunction::Constant { value } => *value,
        GrowthFunction::Linear {
            intercept,
            slope,
            x_min,
            x_max,
            y_min,
            y_max,
            ..
        } => {
            let x = clamp(x, *x_min, *x_max);
            clamp(intercept + slope * x, *y_min, *y_max)
        }
        GrowthFunction::MichaelisMenten { kmax, km, y_min, .. } => {
            let y = if km + x == 0. { 0. } else { kmax * x / (km + x) };
            clamp(y, *y_min, None)
        }
        GrowthFunction::Exponential { rate, .. } => (rate * x).exp(),
        GrowthFunction::Indicator { x_min, x_max, .. } => {
            if *x_min <= x && x <= *x_max {
                1.
            } else {
                0.
            }
        }
    }
}

fn clamp(value: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    let value = min.map_or(value, |m| value.max(m));
    max.map_or(value, |m| value.min(m))
}

/// Build the linear program of a model in a medium at a growth rate
///
/// Crossed flux bounds are passed through unchanged and make the program infeasible. References
/// to entities missing from the model are reported as [`ModelError`]s.
pub fn build(
    model: &RbaModel,
    medium: &Medium,
    growth_rate: f64,
) -> Result<LinearProgram, RbaError> {
    if !growth_rate.is_finite() || growth_rate < 0. {
        return Err(RbaError::InvalidGrowthRate(growth_rate));
    }
    let mu = growth_rate;
    let mut builder = LinearProgramBuilder::new(ObjectiveSense::Maximize, mu);

    // region Columns
    for reaction in model.reactions.values() {
        let bounds = reaction.bounds_in(medium);
        builder.add_column(&reaction.id, ColumnKind::Flux, bounds.lower, bounds.upper)?;
    }
    for enzyme in model.enzymes.values() {
        builder.add_column(&enzyme.id, ColumnKind::Enzyme, 0., f64::INFINITY)?;
    }
    for process in model.processes.values() {
        builder.add_column(&process.id, ColumnKind::Process, 0., f64::INFINITY)?;
    }
    let mut magnitudes = IndexSet::new();
    for process in model.processes.values() {
        for requirement in &process.requirements {
            if let RequirementTarget::Reaction(id) = &requirement.target {
                if model
                    .reactions
                    .get(id)
                    .is_some_and(|reaction| reaction.is_reversible_in(medium))
                {
                    magnitudes.insert(id.as_str());
                }
            }
        }
    }
    for id in &magnitudes {
        builder.add_column(id, ColumnKind::FluxMagnitude, 0., f64::INFINITY)?;
    }
    // endregion Columns

    // region Mass balance
    let mut balances: Vec<Vec<(usize, f64)>> = vec![Vec::new(); model.species.len()];
    for (column, reaction) in model.reactions.values().enumerate() {
        for (species, coefficient) in &reaction.stoichiometry {
            let row = model
                .species
                .get_index_of(species)
                .ok_or_else(|| ModelError::UnknownSpecies {
                    species: species.clone(),
                    referenced_by: format!("reaction {}", reaction.id),
                })?;
            balances[row].push((column, *coefficient));
        }
    }
    for (species, terms) in model.species.values().zip(&balances) {
        if species.boundary {
            let availability = medium.availability(&species.id);
            builder.add_row(
                &species.id,
                RowKind::MassBalance,
                terms,
                Relation::GreaterEqual,
                -availability,
            )?;
        } else {
            builder.add_row(&species.id, RowKind::MassBalance, terms, Relation::Equal, 0.)?;
        }
    }
    // endregion Mass balance

    // region Enzyme capacity
    for enzyme in model.enzymes.values() {
        let referenced_by = format!("enzyme {}", enzyme.id);
        let flux = reaction_column(&builder, &enzyme.reaction, &referenced_by)?;
        let concentration = builder.column_position(ColumnKind::Enzyme, &enzyme.id)?;
        let forward = evaluate(&enzyme.forward_efficiency, mu, medium);
        builder.add_row(
            &enzyme.id,
            RowKind::EnzymeForward,
            &[(flux, 1.), (concentration, -forward)],
            Relation::LessEqual,
            0.,
        )?;
        // Flux columns come first, in reaction order
        if model.reactions[flux].is_reversible_in(medium) {
            let backward = evaluate(enzyme.effective_backward_efficiency(), mu, medium);
            builder.add_row(
                &enzyme.id,
                RowKind::EnzymeBackward,
                &[(flux, -1.), (concentration, -backward)],
                Relation::LessEqual,
                0.,
            )?;
        }
    }
    // endregion Enzyme capacity

    // region Flux magnitude
    for id in &magnitudes {
        let flux = reaction_column(&builder, id, "a process requirement")?;
        let magnitude = builder.column_position(ColumnKind::FluxMagnitude, id)?;
        for sign in [-1., 1.] {
            builder.add_row(
                id,
                RowKind::FluxMagnitude,
                &[(magnitude, 1.), (flux, sign)],
                Relation::GreaterEqual,
                0.,
            )?;
        }
    }
    // endregion Flux magnitude

    // region Process capacity
    for process in model.processes.values() {
        let referenced_by = format!("process {}", process.id);
        let machinery = builder.column_position(ColumnKind::Process, &process.id)?;
        let mut terms = Vec::with_capacity(process.requirements.len() + 1);
        for requirement in &process.requirements {
            let term = match &requirement.target {
                RequirementTarget::Reaction(id) if magnitudes.contains(id.as_str()) => (
                    builder.column_position(ColumnKind::FluxMagnitude, id)?,
                    requirement.cost,
                ),
                RequirementTarget::Reaction(id) => {
                    (reaction_column(&builder, id, &referenced_by)?, requirement.cost)
                }
                RequirementTarget::Enzyme(id) => (
                    builder
                        .column_position(ColumnKind::Enzyme, id)
                        .map_err(|_| ModelError::UnknownEnzyme {
                            enzyme: id.clone(),
                            referenced_by: referenced_by.clone(),
                        })?,
                    mu * requirement.cost,
                ),
                RequirementTarget::Process(id) => (
                    builder
                        .column_position(ColumnKind::Process, id)
                        .map_err(|_| ModelError::UnknownProcess {
                            process: id.clone(),
                            referenced_by: referenced_by.clone(),
                        })?,
                    mu * requirement.cost,
                ),
            };
            terms.push(term);
        }
        terms.push((machinery, -evaluate(&process.capacity, mu, medium)));
        builder.add_row(
            &process.id,
            RowKind::ProcessCapacity,
            &terms,
            Relation::LessEqual,
            0.,
        )?;
    }
    // endregion Process capacity

    // region Densities and targets
    for density in model.densities.values() {
        let mut terms = Vec::new();
        for (enzyme, weight) in &density.enzyme_weights {
            terms.push((builder.column_position(ColumnKind::Enzyme, enzyme)?, *weight));
        }
        for (process, weight) in &density.process_weights {
            terms.push((builder.column_position(ColumnKind::Process, process)?, *weight));
        }
        builder.add_row(
            &density.id,
            RowKind::Density,
            &terms,
            Relation::LessEqual,
            evaluate(&density.limit, mu, medium),
        )?;
    }
    for target in model.targets.values() {
        let flux = reaction_column(&builder, &target.reaction, &format!("target {}", target.id))?;
        builder.add_row(
            &target.id,
            RowKind::Target,
            &[(flux, 1.)],
            Relation::GreaterEqual,
            evaluate(&target.value, mu, medium),
        )?;
    }
    // endregion Densities and targets

    if let Some(growth_reaction) = &model.growth_reaction {
        let flux = reaction_column(&builder, growth_reaction, "the growth objective")?;
        builder.set_objective_coefficient(flux, 1.)?;
    }

    let program = builder.build()?;
    trace!(
        "Built program with {} rows and {} columns at growth rate {}",
        program.num_rows(),
        program.num_columns(),
        mu
    );
    Ok(program)
}

fn reaction_column(
    builder: &LinearProgramBuilder,
    reaction: &str,
    referenced_by: &str,
) -> Result<usize, ModelError> {
    builder
        .column_position(ColumnKind::Flux, reaction)
        .map_err(|_| ModelError::UnknownReaction {
            reaction: reaction.to_string(),
            referenced_by: referenced_by.to_string(),
        })
}
