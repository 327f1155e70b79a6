//! Tab separated files: media in, results out
use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use thiserror::Error;

use crate::model::medium::Medium;
use crate::rba::results::Results;

/// Read a medium from a `species<TAB>availability` file
///
/// Blank lines and lines starting with `#` are skipped. A first line whose second column isn't a
/// number is taken as a header.
pub fn read_medium<P: AsRef<Path>>(path: P, name: &str) -> Result<Medium, TsvError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(io_error(path))?;
    let mut medium = Medium::empty(name);
    let mut first = true;
    for (number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let is_first = std::mem::replace(&mut first, false);
        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        let malformed = || TsvError::MalformedLine {
            file: path.display().to_string(),
            line: number + 1,
        };
        if fields.len() != 2 || fields[0].is_empty() {
            return Err(malformed());
        }
        match fields[1].parse::<f64>() {
            Ok(availability) => {
                medium
                    .concentrations
                    .insert(fields[0].to_string(), availability);
            }
            Err(_) if is_first => continue,
            Err(_) => return Err(malformed()),
        }
    }
    Ok(medium)
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> TsvError {
    let path = path.display().to_string();
    move |source| TsvError::Io { path, source }
}

fn write_column(out: &mut String, header: &str, values: &IndexMap<String, f64>) -> fmt::Result {
    writeln!(out, "{}", header)?;
    for (id, value) in values {
        writeln!(out, "{}\t{}", id, value)?;
    }
    Ok(())
}

fn format_column(header: &str, values: &IndexMap<String, f64>) -> Result<String, TsvError> {
    let mut out = String::new();
    write_column(&mut out, header, values)?;
    Ok(out)
}

fn write_table(path: &Path, header: &str, values: &IndexMap<String, f64>) -> Result<(), TsvError> {
    fs::write(path, format_column(header, values)?).map_err(io_error(path))
}

/// Write the fluxes and concentrations of a result into `dir`
///
/// Creates `reactions.out`, `enzymes.out` and `process_machineries.out`, each a two column table
/// in model declaration order.
pub fn write_results<P: AsRef<Path>>(dir: P, results: &Results) -> Result<(), TsvError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(io_error(dir))?;
    write_table(
        &dir.join("reactions.out"),
        "Reaction\tFlux",
        results.reaction_fluxes(),
    )?;
    write_table(
        &dir.join("enzymes.out"),
        "Enzyme\tConcentration",
        results.enzyme_concentrations(),
    )?;
    write_table(
        &dir.join("process_machineries.out"),
        "Process\tMachinery Concentration",
        results.process_machinery_concentrations(),
    )
}

/// Format the `n` largest boundary fluxes, one `reaction<TAB>flux` per line
pub fn format_boundary_fluxes(results: &Results, n: usize) -> String {
    let mut out = String::new();
    for boundary in results.top_boundary_fluxes(n) {
        out.push_str(&format!("{}\t{}\n", boundary.reaction, boundary.flux));
    }
    out
}

#[derive(Error, Debug)]
pub enum TsvError {
    #[error("Unable to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to format table")]
    Format(#[from] fmt::Error),
    #[error("Malformed line {line} in {file}")]
    MalformedLine { file: String, line: usize },
}
