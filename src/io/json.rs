//! Module providing COBRA-JSON model reading
//!
//! Only the parts of the format relevant to trophic analysis are kept:
//! metabolites, reactions, bounds, and objective coefficients. Gene and
//! annotation data are ignored on read.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::{Reaction, ReactionBuilder, ReactionBuilderError};

// region JSON Model
/// Represents a JSON serialized model, used for reading models in json format
#[derive(Deserialize)]
struct JsonModel {
    metabolites: Vec<JsonMetabolite>,
    reactions: Vec<JsonReaction>,
    id: Option<String>,
    compartments: Option<IndexMap<String, String>>,
    version: Option<String>,
}

#[derive(Deserialize)]
struct JsonMetabolite {
    id: String,
    name: Option<String>,
    compartment: Option<String>,
    charge: Option<i32>,
    formula: Option<String>,
}

#[derive(Deserialize)]
struct JsonReaction {
    id: String,
    name: Option<String>,
    metabolites: IndexMap<String, f64>,
    lower_bound: f64,
    upper_bound: f64,
    objective_coefficient: Option<f64>,
    subsystem: Option<String>,
}
// endregion JSON Model

// region Conversions
impl From<JsonMetabolite> for Metabolite {
    fn from(m: JsonMetabolite) -> Self {
        Self {
            id: m.id,
            name: m.name,
            compartment: m.compartment,
            charge: m.charge.unwrap_or_default(),
            formula: m.formula,
        }
    }
}

impl Model {
    /// Read a COBRA-JSON model file
    ///
    /// Models without an embedded id fall back to the file stem, so that every
    /// community member stays addressable in pipeline outputs.
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Model, JsonError> {
        let path = path.as_ref();
        let model_str = fs::read_to_string(path).map_err(|source| JsonError::UnableToRead {
            path: path.to_path_buf(),
            source,
        })?;
        let json_model = serde_json::from_str::<JsonModel>(&model_str).map_err(|source| {
            JsonError::UnableToParse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let mut model = Model::from_json(json_model)?;
        if model.id.is_none() {
            model.id = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned());
        }
        Ok(model)
    }

    fn from_json(json_model: JsonModel) -> Result<Self, JsonError> {
        let mut reactions: IndexMap<String, Reaction> = IndexMap::new();
        let mut metabolites: IndexMap<String, Metabolite> = IndexMap::new();
        let mut objective: IndexMap<String, f64> = IndexMap::new();
        json_model.metabolites.into_iter().for_each(|m| {
            metabolites.insert(m.id.clone(), Metabolite::from(m));
        });
        /* Iterate through the reactions, adding to the objective along
        the way */
        for rxn in json_model.reactions {
            let new_reaction = ReactionBuilder::default()
                .id(rxn.id.clone())
                .metabolites(rxn.metabolites)
                .name(rxn.name)
                .lower_bound(rxn.lower_bound)
                .upper_bound(rxn.upper_bound)
                .subsystem(rxn.subsystem)
                .build()?;
            reactions.insert(rxn.id.clone(), new_reaction);
            if let Some(coef) = rxn.objective_coefficient {
                if coef != 0. {
                    objective.insert(rxn.id, coef);
                }
            }
        }
        Ok(Model {
            reactions,
            metabolites,
            objective,
            id: json_model.id,
            compartments: json_model.compartments,
            version: json_model.version,
        })
    }
}
// endregion Conversions

/// Read every `.json` model in a directory, sorted by file name
///
/// Hidden files are skipped. The sort keeps downstream artifacts reproducible
/// regardless of directory iteration order.
pub fn read_models_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<Model>, JsonError> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|source| JsonError::UnableToList {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            let hidden = path
                .file_name()
                .map(|name| name.to_string_lossy().starts_with('.'))
                .unwrap_or(true);
            !hidden && path.extension().is_some_and(|ext| ext == "json")
        })
        .collect();
    paths.sort();
    paths.into_iter().map(Model::read_json).collect()
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("unable to read model file {path}: {source}")]
    UnableToRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unable to parse model file {path}: {source}")]
    UnableToParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("unable to build reaction: {0}")]
    UnableToBuildReaction(#[from] ReactionBuilderError),
    #[error("unable to list models directory {path}: {source}")]
    UnableToList {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    const TOY_MODEL: &str = r#"{
"id":"toy",
"version":"1",
"compartments":{"c":"cytosol","e":"extracellular space"},
"metabolites":[
{"id":"glc__D_e","name":"D-Glucose","compartment":"e","charge":0,"formula":"C6H12O6"},
{"id":"glc__D_c","name":"D-Glucose","compartment":"c","charge":0,"formula":"C6H12O6"}
],
"reactions":[
{"id":"EX_glc__D_e","name":"Glucose exchange","metabolites":{"glc__D_e":-1.0},"lower_bound":-1000.0,"upper_bound":1000.0,"gene_reaction_rule":""},
{"id":"GLCt","name":"Glucose transport","metabolites":{"glc__D_e":-1.0,"glc__D_c":1.0},"lower_bound":0.0,"upper_bound":1000.0,"gene_reaction_rule":"b1234"},
{"id":"BIOMASS","name":"Biomass","metabolites":{"glc__D_c":-1.0},"lower_bound":0.0,"upper_bound":1000.0,"objective_coefficient":1.0,"gene_reaction_rule":""}
]
}"#;

    #[test]
    fn json_metabolite() {
        let data = r#"{
"id":"glc__D_e",
"name":"D-Glucose",
"compartment":"e",
"charge":0,
"formula":"C6H12O6",
"annotation":{"sbo":"SBO:0000247"}
}"#;
        let met: JsonMetabolite = serde_json::from_str(data).unwrap();
        let model_met = Metabolite::from(met);
        assert_eq!(model_met.id, "glc__D_e");
        assert_eq!(model_met.name.unwrap(), "D-Glucose");
        assert_eq!(model_met.compartment.unwrap(), "e");
        assert_eq!(model_met.charge, 0);
        assert_eq!(model_met.formula.unwrap(), "C6H12O6");
    }

    #[test]
    fn json_conversion() {
        let json_model: JsonModel = serde_json::from_str(TOY_MODEL).unwrap();
        let model = Model::from_json(json_model).unwrap();

        assert_eq!(model.id.as_deref(), Some("toy"));
        assert_eq!(model.version.as_deref(), Some("1"));
        assert_eq!(model.reactions.len(), 3);
        assert_eq!(model.metabolites.len(), 2);

        let exchange = &model.reactions["EX_glc__D_e"];
        assert!((exchange.lower_bound - -1000.).abs() < 1e-25);
        assert!((exchange.upper_bound - 1000.).abs() < 1e-25);

        // Only reactions with a nonzero coefficient enter the objective
        assert_eq!(model.objective.len(), 1);
        assert!((model.objective["BIOMASS"] - 1.0).abs() < 1e-25);
    }

    #[test]
    fn id_falls_back_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("community_member.json");
        let anonymous = TOY_MODEL.replace("\"id\":\"toy\",", "");
        File::create(&path)
            .unwrap()
            .write_all(anonymous.as_bytes())
            .unwrap();
        let model = Model::read_json(&path).unwrap();
        assert_eq!(model.id.as_deref(), Some("community_member"));
    }

    #[test]
    fn read_models_dir_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b_model.json", "a_model.json", ".hidden.json", "notes.txt"] {
            File::create(dir.path().join(name))
                .unwrap()
                .write_all(TOY_MODEL.as_bytes())
                .unwrap();
        }
        let models = read_models_dir(dir.path()).unwrap();
        assert_eq!(models.len(), 2);
        // Embedded ids win, but ordering follows file names
        assert_eq!(models[0].id.as_deref(), Some("toy"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Model::read_json("/nonexistent/model.json").unwrap_err();
        assert!(matches!(err, JsonError::UnableToRead { .. }));
    }
}
