//! Community growth and secretion simulation (stage one)
//!
//! Grows every community model in a shared medium, collects the secretion
//! profiles of the growers, and enriches the medium with the secreted
//! compounds for the next iteration. Community simulations begin from the
//! initial environment medium; each iteration persists the enriched medium,
//! the growth values, and the secretion profiles.

use std::path::PathBuf;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::configuration::CONFIGURATION;
use crate::io::json::{read_models_dir, JsonError};
use crate::io::table::{
    write_growths, write_medium, write_secretions, read_medium, SecretionRecord, TableError,
};
use crate::metabolic_model::model::{Medium, Model};
use crate::optimize::fba::{secretion_profile, slim_optimize, FbaError};
use crate::pipeline::Layout;

/// Settings for the growth simulation stage
#[derive(Debug, Clone)]
pub struct SimulationSettings {
    /// Number of growth iterations to run
    pub iterations: usize,
    /// Initial medium file; defaults to `media/initial_medium.csv`
    pub initial_medium: Option<PathBuf>,
    /// Optional supplement medium merged in before a chosen iteration
    pub supplement: Option<PathBuf>,
    /// Iteration before which the supplement is merged
    pub supplement_at: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings {
            iterations: 5,
            initial_medium: None,
            supplement: None,
            supplement_at: 4,
        }
    }
}

/// Result of one community growth iteration
#[derive(Debug, Clone)]
pub struct IterationOutcome {
    /// Growth value per growing model
    pub growths: IndexMap<String, f64>,
    /// Secretion profiles of all growing models
    pub secretions: Vec<SecretionRecord>,
    /// The iteration medium enriched with every secreted compound
    pub next_medium: Medium,
}

/// Grow every model in the given medium and gather secretion profiles
///
/// Each model sees only the medium compounds it has an exchange for, every
/// granted compound at the configured allowance. Models that are infeasible
/// or fall below the growth threshold are skipped for this iteration.
pub fn grow_community(
    models: &[Model],
    medium: &Medium,
) -> Result<IterationOutcome, SimulateError> {
    let (medium_flux, growth_threshold) = {
        let configuration = CONFIGURATION.read().unwrap();
        (configuration.medium_flux, configuration.growth_threshold)
    };

    let mut growths = IndexMap::new();
    let mut secretions = Vec::new();
    let mut next_medium = medium.clone();
    for model in models {
        let id = model.id.clone().unwrap_or_default();
        let mut candidate = model.clone();
        let specific = candidate.specific_medium(medium, medium_flux);
        candidate.apply_medium(&specific);

        let growth = match slim_optimize(&candidate) {
            Ok(growth) => growth,
            Err(FbaError::MissingObjective { model }) => {
                warn!(model = model.as_str(), "model has no objective, skipping");
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        match growth {
            Some(value) if value > growth_threshold => {
                let profile = secretion_profile(&candidate, value)?;
                for (metabolite, _) in &profile {
                    // Secreted compounds enter the next medium at the full
                    // allowance, refreshing any earlier entry
                    next_medium.insert(metabolite.clone(), medium_flux);
                }
                for (metabolite, flux) in profile {
                    secretions.push(SecretionRecord {
                        model: id.clone(),
                        metabolite,
                        flux,
                    });
                }
                growths.insert(id, value);
            }
            _ => {
                debug!(model = id.as_str(), "no growth in this medium");
            }
        }
    }
    Ok(IterationOutcome {
        growths,
        secretions,
        next_medium,
    })
}

/// Run the whole growth simulation stage against a pipeline layout
pub fn run_stage(layout: &Layout, settings: &SimulationSettings) -> Result<(), SimulateError> {
    layout
        .ensure_target_dirs()
        .map_err(|source| SimulateError::CreateDirs {
            path: layout.target_dir(),
            source,
        })?;

    let models = read_models_dir(layout.models_dir())?;
    info!(models = models.len(), "loaded community models");

    let initial_medium = settings
        .initial_medium
        .clone()
        .unwrap_or_else(|| layout.initial_medium_file());
    let mut medium = read_medium(&initial_medium)?;
    let supplement = settings
        .supplement
        .as_ref()
        .map(read_medium)
        .transpose()?;

    for iteration in 1..=settings.iterations {
        if iteration == settings.supplement_at {
            if let Some(ref extra) = supplement {
                info!(iteration, compounds = extra.len(), "merging supplement medium");
                // Iteration compounds take precedence over the supplement
                let mut merged = extra.clone();
                merged.extend(medium.clone());
                medium = merged;
            }
        }
        let outcome = grow_community(&models, &medium)?;
        write_medium(layout.medium_file(iteration), &outcome.next_medium)?;
        write_growths(layout.growths_file(iteration), &outcome.growths)?;
        write_secretions(layout.secretions_file(iteration), &outcome.secretions)?;
        info!(
            iteration,
            growing = outcome.growths.len(),
            medium_compounds = outcome.next_medium.len(),
            "growth iteration complete"
        );
        medium = outcome.next_medium;
    }
    Ok(())
}

#[derive(Error, Debug)]
pub enum SimulateError {
    #[error(transparent)]
    Json(#[from] JsonError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Fba(#[from] FbaError),
    #[error("unable to create output directories under {path}: {source}")]
    CreateDirs {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::metabolite::MetaboliteBuilder;
    use crate::metabolic_model::reaction::ReactionBuilder;

    /// A minimal model that eats `food`, grows, and must secrete `product`
    fn chain_model(id: &str, food: &str, product: &str) -> Model {
        let food_e = format!("{food}_e");
        let product_e = format!("{product}_e");
        let mut model = Model::new_empty();
        model.id = Some(id.to_string());
        for (met, compartment) in [
            (food_e.as_str(), "e"),
            ("fuel_c", "c"),
            ("made_c", "c"),
            (product_e.as_str(), "e"),
        ] {
            model.add_metabolite(
                MetaboliteBuilder::default()
                    .id(met.to_string())
                    .compartment(Some(compartment.to_string()))
                    .build()
                    .unwrap(),
            );
        }
        model.add_reaction(
            ReactionBuilder::default()
                .id(format!("EX_{food_e}"))
                .metabolites(IndexMap::from([(food_e.clone(), -1.0)]))
                .build()
                .unwrap(),
        );
        model.add_reaction(
            ReactionBuilder::default()
                .id("UPTAKE".to_string())
                .metabolites(IndexMap::from([
                    (food_e.clone(), -1.0),
                    ("fuel_c".to_string(), 1.0),
                ]))
                .lower_bound(0.)
                .build()
                .unwrap(),
        );
        model.add_reaction(
            ReactionBuilder::default()
                .id("BIOMASS".to_string())
                .metabolites(IndexMap::from([
                    ("fuel_c".to_string(), -1.0),
                    ("made_c".to_string(), 1.0),
                ]))
                .lower_bound(0.)
                .build()
                .unwrap(),
        );
        model.add_reaction(
            ReactionBuilder::default()
                .id("EXPORT".to_string())
                .metabolites(IndexMap::from([
                    ("made_c".to_string(), -1.0),
                    (product_e.clone(), 1.0),
                ]))
                .lower_bound(0.)
                .build()
                .unwrap(),
        );
        model.add_reaction(
            ReactionBuilder::default()
                .id(format!("EX_{product_e}"))
                .metabolites(IndexMap::from([(product_e.clone(), -1.0)]))
                .lower_bound(0.)
                .build()
                .unwrap(),
        );
        model.objective.insert("BIOMASS".to_string(), 1.0);
        model
    }

    #[test]
    fn cross_feeding_unlocks_the_consumer() {
        let models = vec![
            chain_model("producer", "glc", "aa"),
            chain_model("consumer", "aa", "waste"),
        ];
        let medium = Medium::from([("EX_glc_e".to_string(), 1000.0)]);

        let first = grow_community(&models, &medium).unwrap();
        assert_eq!(
            first.growths.keys().collect::<Vec<_>>(),
            vec!["producer"]
        );
        assert!(first
            .secretions
            .iter()
            .any(|record| record.model == "producer" && record.metabolite == "EX_aa_e"));
        assert!(first.next_medium.contains_key("EX_aa_e"));

        // The secreted amino acid now feeds the consumer
        let second = grow_community(&models, &first.next_medium).unwrap();
        assert!(second.growths.contains_key("producer"));
        assert!(second.growths.contains_key("consumer"));
        assert!(second.next_medium.contains_key("EX_waste_e"));
    }

    #[test]
    fn empty_community_yields_empty_outcome() {
        let medium = Medium::from([("EX_glc_e".to_string(), 1000.0)]);
        let outcome = grow_community(&[], &medium).unwrap();
        assert!(outcome.growths.is_empty());
        assert!(outcome.secretions.is_empty());
        assert_eq!(outcome.next_medium, medium);
    }

    #[test]
    fn model_without_objective_is_skipped() {
        let mut broken = chain_model("broken", "glc", "aa");
        broken.objective.clear();
        let medium = Medium::from([("EX_glc_e".to_string(), 1000.0)]);
        let outcome = grow_community(&[broken], &medium).unwrap();
        assert!(outcome.growths.is_empty());
    }
}
