//! Module for reading models and writing results
pub mod json;
pub mod tsv;
