//! Module providing the structured RBA model: species, reactions, enzymes, process machineries,
//! and the media they can grow in.

pub mod enzyme;
pub mod function;
pub mod medium;
pub mod model;
pub mod process;
pub mod reaction;
pub mod species;
