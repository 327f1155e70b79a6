//! Module providing JSON IO for RBA models
//!
//! A model directory holds `model.json` and optionally a `media/` directory of TSV files, one
//! medium per file named after the medium.
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::io::tsv::{read_medium, TsvError};
use crate::model::enzyme::Enzyme;
use crate::model::function::GrowthFunction;
use crate::model::medium::{FluxBounds, Medium};
use crate::model::model::{Density, FluxTarget, ModelError, RbaModel};
use crate::model::process::{Process, ProcessRequirement};
use crate::model::reaction::{Reaction, ReactionBuilder, ReactionBuilderError};
use crate::model::species::Species;

// region JSON Model
/// Represents a JSON serialized model, used for reading and writing models in json format
#[derive(Serialize, Deserialize)]
struct JsonModel {
    id: Option<String>,
    growth_reaction: Option<String>,
    #[serde(default)]
    species: Vec<JsonSpecies>,
    reactions: Vec<JsonReaction>,
    #[serde(default)]
    enzymes: Vec<JsonEnzyme>,
    #[serde(default)]
    processes: Vec<JsonProcess>,
    #[serde(default)]
    targets: Vec<JsonTarget>,
    #[serde(default)]
    densities: Vec<JsonDensity>,
    #[serde(default)]
    media: IndexMap<String, JsonMedium>,
}

#[derive(Serialize, Deserialize)]
struct JsonSpecies {
    id: String,
    name: Option<String>,
    #[serde(default)]
    boundary: bool,
}

#[derive(Serialize, Deserialize)]
struct JsonReaction {
    id: String,
    name: Option<String>,
    stoichiometry: IndexMap<String, f64>,
    lower_bound: Option<f64>,
    upper_bound: Option<f64>,
    /// Defaults to whether the reaction touches a boundary species
    boundary: Option<bool>,
}

#[derive(Serialize, Deserialize)]
struct JsonEnzyme {
    id: String,
    name: Option<String>,
    reaction: String,
    forward_efficiency: GrowthFunction,
    backward_efficiency: Option<GrowthFunction>,
}

#[derive(Serialize, Deserialize)]
struct JsonProcess {
    id: String,
    name: Option<String>,
    capacity: GrowthFunction,
    #[serde(default)]
    requirements: Vec<ProcessRequirement>,
}

#[derive(Serialize, Deserialize)]
struct JsonTarget {
    id: String,
    reaction: String,
    value: GrowthFunction,
}

#[derive(Serialize, Deserialize)]
struct JsonDensity {
    id: String,
    limit: GrowthFunction,
    #[serde(default)]
    enzyme_weights: IndexMap<String, f64>,
    #[serde(default)]
    process_weights: IndexMap<String, f64>,
}

#[derive(Serialize, Deserialize, Default)]
struct JsonMedium {
    #[serde(default)]
    concentrations: IndexMap<String, f64>,
    #[serde(default)]
    reaction_bounds: IndexMap<String, FluxBounds>,
}
// endregion JSON Model

// region Conversions
impl From<JsonSpecies> for Species {
    fn from(s: JsonSpecies) -> Self {
        Self {
            id: s.id,
            name: s.name,
            boundary: s.boundary,
        }
    }
}

impl From<JsonEnzyme> for Enzyme {
    fn from(e: JsonEnzyme) -> Self {
        Self {
            id: e.id,
            name: e.name,
            reaction: e.reaction,
            forward_efficiency: e.forward_efficiency,
            backward_efficiency: e.backward_efficiency,
        }
    }
}

impl From<JsonProcess> for Process {
    fn from(p: JsonProcess) -> Self {
        Self {
            id: p.id,
            name: p.name,
            capacity: p.capacity,
            requirements: p.requirements,
        }
    }
}

impl From<JsonTarget> for FluxTarget {
    fn from(t: JsonTarget) -> Self {
        Self {
            id: t.id,
            reaction: t.reaction,
            value: t.value,
        }
    }
}

impl From<JsonDensity> for Density {
    fn from(d: JsonDensity) -> Self {
        Self {
            id: d.id,
            limit: d.limit,
            enzyme_weights: d.enzyme_weights,
            process_weights: d.process_weights,
        }
    }
}

impl From<&Species> for JsonSpecies {
    fn from(s: &Species) -> Self {
        Self {
            id: s.id.clone(),
            name: s.name.clone(),
            boundary: s.boundary,
        }
    }
}

impl From<&Reaction> for JsonReaction {
    fn from(r: &Reaction) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            stoichiometry: r.stoichiometry.clone(),
            lower_bound: Some(r.lower_bound),
            upper_bound: Some(r.upper_bound),
            boundary: Some(r.boundary),
        }
    }
}

impl From<&Enzyme> for JsonEnzyme {
    fn from(e: &Enzyme) -> Self {
        Self {
            id: e.id.clone(),
            name: e.name.clone(),
            reaction: e.reaction.clone(),
            forward_efficiency: e.forward_efficiency.clone(),
            backward_efficiency: e.backward_efficiency.clone(),
        }
    }
}

impl From<&Process> for JsonProcess {
    fn from(p: &Process) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            capacity: p.capacity.clone(),
            requirements: p.requirements.clone(),
        }
    }
}

impl From<&FluxTarget> for JsonTarget {
    fn from(t: &FluxTarget) -> Self {
        Self {
            id: t.id.clone(),
            reaction: t.reaction.clone(),
            value: t.value.clone(),
        }
    }
}

impl From<&Density> for JsonDensity {
    fn from(d: &Density) -> Self {
        Self {
            id: d.id.clone(),
            limit: d.limit.clone(),
            enzyme_weights: d.enzyme_weights.clone(),
            process_weights: d.process_weights.clone(),
        }
    }
}

impl From<&Medium> for JsonMedium {
    fn from(m: &Medium) -> Self {
        Self {
            concentrations: m.concentrations.clone(),
            reaction_bounds: m.reaction_bounds.clone(),
        }
    }
}
// endregion Conversions

impl RbaModel {
    /// Read a model from a json file
    ///
    /// The model is not validated, see [`read_model_dir`] for loading a checked model.
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<RbaModel, JsonError> {
        let path = path.as_ref();
        let model_str = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => {
                return Err(JsonError::UnableToRead(format!(
                    "{}: {}",
                    path.display(),
                    err
                )))
            }
        };
        let json_model = match serde_json::from_str::<JsonModel>(&model_str) {
            Ok(model) => model,
            Err(err) => return Err(JsonError::UnableToParse(format!("{}", err))),
        };
        RbaModel::from_json(json_model)
    }

    /// Write a model to a json file
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), JsonError> {
        let json_model = self.to_json();
        let model_string = serde_json::to_string_pretty(&json_model)?;
        let path = path.as_ref();
        fs::write(path, model_string).map_err(|source| JsonError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    fn from_json(json_model: JsonModel) -> Result<Self, JsonError> {
        let mut model = RbaModel::new_empty();
        model.id = json_model.id;
        model.growth_reaction = json_model.growth_reaction;
        for s in json_model.species {
            declare_once(&model.species, "species", &s.id)?;
            model.add_species(Species::from(s));
        }
        for rxn in json_model.reactions {
            declare_once(&model.reactions, "reaction", &rxn.id)?;
            let boundary = rxn.boundary.unwrap_or_else(|| {
                rxn.stoichiometry
                    .keys()
                    .any(|s| model.species.get(s).is_some_and(|s| s.boundary))
            });
            let mut builder = ReactionBuilder::default();
            builder
                .id(rxn.id)
                .name(rxn.name)
                .stoichiometry(rxn.stoichiometry)
                .boundary(boundary);
            // Unset bounds fall back to the configured defaults
            if let Some(lower) = rxn.lower_bound {
                builder.lower_bound(lower);
            }
            if let Some(upper) = rxn.upper_bound {
                builder.upper_bound(upper);
            }
            model.add_reaction(builder.build()?);
        }
        for e in json_model.enzymes {
            declare_once(&model.enzymes, "enzyme", &e.id)?;
            model.add_enzyme(Enzyme::from(e));
        }
        for p in json_model.processes {
            declare_once(&model.processes, "process", &p.id)?;
            model.add_process(Process::from(p));
        }
        for t in json_model.targets {
            declare_once(&model.targets, "target", &t.id)?;
            model.add_target(FluxTarget::from(t));
        }
        for d in json_model.densities {
            declare_once(&model.densities, "density", &d.id)?;
            model.add_density(Density::from(d));
        }
        for (name, medium) in json_model.media {
            model.add_medium(Medium {
                id: name,
                concentrations: medium.concentrations,
                reaction_bounds: medium.reaction_bounds,
            });
        }
        Ok(model)
    }

    fn to_json(&self) -> JsonModel {
        JsonModel {
            id: self.id.clone(),
            growth_reaction: self.growth_reaction.clone(),
            species: self.species.values().map(JsonSpecies::from).collect(),
            reactions: self.reactions.values().map(JsonReaction::from).collect(),
            enzymes: self.enzymes.values().map(JsonEnzyme::from).collect(),
            processes: self.processes.values().map(JsonProcess::from).collect(),
            targets: self.targets.values().map(JsonTarget::from).collect(),
            densities: self.densities.values().map(JsonDensity::from).collect(),
            media: self
                .media
                .iter()
                .map(|(name, m)| (name.clone(), JsonMedium::from(m)))
                .collect(),
        }
    }
}

fn declare_once<V>(
    declared: &IndexMap<String, V>,
    kind: &'static str,
    id: &str,
) -> Result<(), ModelError> {
    if declared.contains_key(id) {
        return Err(ModelError::DuplicateId {
            kind,
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Load and validate the model stored in a directory
///
/// Reads `dir/model.json`, then adds every `dir/media/<name>.tsv` as the medium `<name>`,
/// replacing a medium of the same name from the json file. Media files are read in file name
/// order.
pub fn read_model_dir<P: AsRef<Path>>(dir: P) -> Result<RbaModel, JsonError> {
    let dir = dir.as_ref();
    let mut model = RbaModel::read_json(dir.join("model.json"))?;
    let media_dir = dir.join("media");
    if media_dir.is_dir() {
        let mut media_files: Vec<_> = fs::read_dir(&media_dir)
            .map_err(|source| JsonError::Io {
                path: media_dir.display().to_string(),
                source,
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "tsv"))
            .collect();
        media_files.sort();
        for path in media_files {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            debug!("Reading medium {} from {}", name, path.display());
            model.add_medium(read_medium(&path, name)?);
        }
    }
    model.validate()?;
    info!(
        "Loaded model with {} species, {} reactions, {} enzymes, {} processes and {} media",
        model.species.len(),
        model.reactions.len(),
        model.enzymes.len(),
        model.processes.len(),
        model.media.len()
    );
    Ok(model)
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to parse json due to {0}")]
    UnableToParse(String),
    #[error("Unable to build reaction")]
    UnableToBuildReaction(#[from] ReactionBuilderError),
    #[error("Serde json parse error")]
    SerdeJsonParseError(#[from] serde_json::Error),
    #[error("Unable to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to read medium: {0}")]
    Medium(#[from] TsvError),
    #[error("Model is invalid: {0}")]
    InvalidModel(#[from] ModelError),
}
