//! This module provides the Model struct for representing an entire metabolic model

use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::Reaction;

use indexmap::IndexMap;

/// Compartment id conventionally used for the extracellular space
pub const EXTRACELLULAR_COMPARTMENT: &str = "e";

/// A growth medium: exchange reaction ids mapped to uptake flux allowances
pub type Medium = IndexMap<String, f64>;

/// Represents a Genome Scale Metabolic Model
#[derive(Clone, Debug)]
pub struct Model {
    /// Map of reaction ids to Reaction objects
    pub reactions: IndexMap<String, Reaction>,
    /// Map of metabolite ids to Metabolite objects
    pub metabolites: IndexMap<String, Metabolite>,
    /// Map of reaction ids to objective function coefficients
    pub objective: IndexMap<String, f64>,
    /// Id associated with the Model
    pub id: Option<String>,
    /// Compartments in the model
    ///
    /// An IndexMap<String, String> of {short name: long name}
    pub compartments: Option<IndexMap<String, String>>,
    /// A version identifier for the Model, stored as a string
    pub version: Option<String>,
}

impl Model {
    pub fn new_empty() -> Self {
        Model {
            reactions: IndexMap::new(),
            metabolites: IndexMap::new(),
            objective: IndexMap::new(),
            id: None,
            compartments: None,
            version: None,
        }
    }

    /// Add a reaction to the model
    pub fn add_reaction(&mut self, reaction: Reaction) {
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
    }

    /// Add a metabolite to the model
    pub fn add_metabolite(&mut self, metabolite: Metabolite) {
        let id = metabolite.id.clone();
        self.metabolites.insert(id, metabolite);
    }

    /// Whether the given reaction is an exchange with the extracellular
    /// environment
    ///
    /// A reaction qualifies when it moves a single metabolite across the model
    /// boundary and that metabolite is extracellular (or the reaction follows
    /// the conventional `EX_` id prefix).
    pub fn is_exchange(&self, reaction: &Reaction) -> bool {
        let Some(metabolite_id) = reaction.boundary_metabolite() else {
            return false;
        };
        if reaction.id.starts_with("EX_") {
            return true;
        }
        self.metabolites
            .get(metabolite_id)
            .map(|m| m.in_compartment(EXTRACELLULAR_COMPARTMENT))
            .unwrap_or(false)
    }

    /// All exchange reactions of the model
    pub fn exchanges(&self) -> impl Iterator<Item = &Reaction> {
        self.reactions
            .values()
            .filter(|reaction| self.is_exchange(reaction))
    }

    /// Ids of all exchange reactions of the model
    pub fn exchange_ids(&self) -> Vec<String> {
        self.exchanges().map(|reaction| reaction.id.clone()).collect()
    }

    /// Restrict a community medium to the exchanges this model actually has,
    /// granting each the given uptake allowance
    pub fn specific_medium(&self, medium: &Medium, flux: f64) -> Medium {
        self.exchanges()
            .filter(|reaction| medium.contains_key(&reaction.id))
            .map(|reaction| (reaction.id.clone(), flux))
            .collect()
    }

    /// Apply a medium to the model by adjusting exchange reaction bounds
    ///
    /// Exchanges present in the medium may take up the stated flux allowance;
    /// all other exchanges are closed to uptake. Secretion bounds are left
    /// untouched.
    pub fn apply_medium(&mut self, medium: &Medium) {
        let exchange_ids = self.exchange_ids();
        for id in exchange_ids {
            let allowance = medium.get(&id).copied();
            if let Some(reaction) = self.reactions.get_mut(&id) {
                match allowance {
                    Some(flux) => reaction.allow_uptake(flux),
                    None => reaction.close_uptake(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::metabolite::MetaboliteBuilder;
    use crate::metabolic_model::reaction::ReactionBuilder;
    use indexmap::IndexMap;

    fn setup_model() -> Model {
        let mut model = Model::new_empty();
        model.id = Some("toy".to_string());
        model.add_metabolite(
            MetaboliteBuilder::default()
                .id("glc__D_e".to_string())
                .compartment(Some("e".to_string()))
                .build()
                .unwrap(),
        );
        model.add_metabolite(
            MetaboliteBuilder::default()
                .id("glc__D_c".to_string())
                .compartment(Some("c".to_string()))
                .build()
                .unwrap(),
        );
        model.add_reaction(
            ReactionBuilder::default()
                .id("EX_glc__D_e".to_string())
                .metabolites(IndexMap::from([("glc__D_e".to_string(), -1.0)]))
                .build()
                .unwrap(),
        );
        model.add_reaction(
            ReactionBuilder::default()
                .id("GLCt".to_string())
                .metabolites(IndexMap::from([
                    ("glc__D_e".to_string(), -1.0),
                    ("glc__D_c".to_string(), 1.0),
                ]))
                .build()
                .unwrap(),
        );
        model
    }

    #[test]
    fn exchange_detection() {
        let model = setup_model();
        assert_eq!(model.exchange_ids(), vec!["EX_glc__D_e".to_string()]);
    }

    #[test]
    fn sink_without_prefix_is_exchange() {
        let mut model = setup_model();
        model.add_metabolite(
            MetaboliteBuilder::default()
                .id("ac_e".to_string())
                .compartment(Some("e".to_string()))
                .build()
                .unwrap(),
        );
        model.add_reaction(
            ReactionBuilder::default()
                .id("ACOUT".to_string())
                .metabolites(IndexMap::from([("ac_e".to_string(), -1.0)]))
                .build()
                .unwrap(),
        );
        assert!(model
            .exchange_ids()
            .contains(&"ACOUT".to_string()));
    }

    #[test]
    fn specific_medium_restricts_to_model_exchanges() {
        let model = setup_model();
        let medium = Medium::from([
            ("EX_glc__D_e".to_string(), 10.0),
            ("EX_nh4_e".to_string(), 10.0),
        ]);
        let specific = model.specific_medium(&medium, 1000.);
        assert_eq!(specific.len(), 1);
        assert!((specific["EX_glc__D_e"] - 1000.).abs() < 1e-25);
    }

    #[test]
    fn apply_medium_sets_uptake_bounds() {
        let mut model = setup_model();
        model.add_metabolite(
            MetaboliteBuilder::default()
                .id("nh4_e".to_string())
                .compartment(Some("e".to_string()))
                .build()
                .unwrap(),
        );
        model.add_reaction(
            ReactionBuilder::default()
                .id("EX_nh4_e".to_string())
                .metabolites(IndexMap::from([("nh4_e".to_string(), -1.0)]))
                .build()
                .unwrap(),
        );

        let medium = Medium::from([("EX_glc__D_e".to_string(), 10.0)]);
        model.apply_medium(&medium);

        let granted = &model.reactions["EX_glc__D_e"];
        assert!((granted.lower_bound - -10.).abs() < 1e-25);
        // Exchanges absent from the medium are closed to uptake
        let closed = &model.reactions["EX_nh4_e"];
        assert!((closed.lower_bound - 0.).abs() < 1e-25);
        // Internal reactions keep their bounds
        let internal = &model.reactions["GLCt"];
        assert!((internal.lower_bound - -1000.).abs() < 1e-25);
    }
}
