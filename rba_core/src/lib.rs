//! Resource Balance Analysis in rust.
//!
//! Finds the largest growth rate at which a cell model can balance its metabolic
//! fluxes against the finite capacity of its enzymes and process machineries, and
//! reports the resource allocation at that growth rate.

pub mod configuration;
pub mod io;
pub mod model;
pub mod optimize;
pub mod rba;

pub use configuration::{Configuration, Solver, CONFIGURATION};
pub use model::model::{ModelError, RbaModel};
pub use rba::results::{BoundaryFlux, Results};
pub use rba::{solve, solve_with, RbaError};
