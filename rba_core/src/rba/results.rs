//! Reads an optimal solution back into model terms
use indexmap::IndexMap;
use serde::Serialize;

use crate::model::model::RbaModel;
use crate::optimize::problem::LinearProgram;
use crate::optimize::variable::ColumnKind;
use crate::optimize::LpSolution;
use crate::rba::RbaError;

/// Flux through a boundary reaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryFlux {
    pub reaction: String,
    pub flux: f64,
}

/// The state of a cell growing at its optimal growth rate
///
/// Maps follow model declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Results {
    growth_rate: f64,
    objective_value: Option<f64>,
    reaction_fluxes: IndexMap<String, f64>,
    enzyme_concentrations: IndexMap<String, f64>,
    process_machinery_concentrations: IndexMap<String, f64>,
    sorted_boundary_fluxes: Vec<BoundaryFlux>,
}

impl Results {
    /// Optimal growth rate
    pub fn growth_rate(&self) -> f64 {
        self.growth_rate
    }

    /// Value of the growth objective at the optimal growth rate, if the model has one
    pub fn objective_value(&self) -> Option<f64> {
        self.objective_value
    }

    pub fn reaction_fluxes(&self) -> &IndexMap<String, f64> {
        &self.reaction_fluxes
    }

    pub fn enzyme_concentrations(&self) -> &IndexMap<String, f64> {
        &self.enzyme_concentrations
    }

    pub fn process_machinery_concentrations(&self) -> &IndexMap<String, f64> {
        &self.process_machinery_concentrations
    }

    /// Boundary fluxes, largest magnitude first
    pub fn sorted_boundary_fluxes(&self) -> &[BoundaryFlux] {
        &self.sorted_boundary_fluxes
    }

    /// The `n` boundary fluxes with the largest magnitude
    pub fn top_boundary_fluxes(&self, n: usize) -> &[BoundaryFlux] {
        &self.sorted_boundary_fluxes[..n.min(self.sorted_boundary_fluxes.len())]
    }

    /// Flux through a reaction
    pub fn flux(&self, reaction: &str) -> Option<f64> {
        self.reaction_fluxes.get(reaction).copied()
    }
}

/// Read the solution of a program built from `model` into a [`Results`]
pub fn extract(
    model: &RbaModel,
    program: &LinearProgram,
    solution: &LpSolution,
) -> Result<Results, RbaError> {
    let primal = solution
        .primal
        .as_ref()
        .ok_or(RbaError::FinalSolveFailed {
            growth_rate: program.growth_rate(),
            status: solution.status,
        })?;
    if primal.len() != program.num_columns() {
        return Err(RbaError::SolutionShape {
            expected: program.num_columns(),
            found: primal.len(),
        });
    }
    let value = |kind: ColumnKind, id: &str| -> Result<f64, RbaError> {
        program
            .column_position(kind, id)
            .map(|position| primal[position])
            .ok_or_else(|| RbaError::ProgramMismatch(format!("no column for {} {}", kind, id)))
    };

    let mut reaction_fluxes = IndexMap::with_capacity(model.reactions.len());
    for id in model.reactions.keys() {
        reaction_fluxes.insert(id.clone(), value(ColumnKind::Flux, id)?);
    }
    let mut enzyme_concentrations = IndexMap::with_capacity(model.enzymes.len());
    for id in model.enzymes.keys() {
        enzyme_concentrations.insert(id.clone(), value(ColumnKind::Enzyme, id)?);
    }
    let mut process_machinery_concentrations = IndexMap::with_capacity(model.processes.len());
    for id in model.processes.keys() {
        process_machinery_concentrations.insert(id.clone(), value(ColumnKind::Process, id)?);
    }

    let sorted_boundary_fluxes = rank_boundary_fluxes(
        model
            .boundary_reactions()
            .map(|r| (r.id.clone(), reaction_fluxes[&r.id])),
    );

    Ok(Results {
        growth_rate: program.growth_rate(),
        objective_value: solution.objective_value,
        reaction_fluxes,
        enzyme_concentrations,
        process_machinery_concentrations,
        sorted_boundary_fluxes,
    })
}

/// Order fluxes by decreasing magnitude
///
/// Ties keep their input order.
pub fn rank_boundary_fluxes<I>(fluxes: I) -> Vec<BoundaryFlux>
where
    I: IntoIterator<Item = (String, f64)>,
{
    let mut ranked: Vec<BoundaryFlux> = fluxes
        .into_iter()
        .map(|(reaction, flux)| BoundaryFlux { reaction, flux })
        .collect();
    ranked.sort_by(|a, b| b.flux.abs().total_cmp(&a.flux.abs()));
    ranked
}
