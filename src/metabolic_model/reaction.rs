//! This module provides a struct for representing reactions

use crate::configuration::CONFIGURATION;
use derive_builder::Builder;
use indexmap::IndexMap;

/// Represents a reaction in the metabolic model
#[derive(Builder, Debug, Clone)]
pub struct Reaction {
    /// Used to identify the reaction
    pub id: String,
    /// Metabolite stoichiometry of the reaction
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Lower flux bound
    #[builder(default = "CONFIGURATION.read().unwrap().lower_bound")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "CONFIGURATION.read().unwrap().upper_bound")]
    pub upper_bound: f64,
    /// Reaction subsystem
    #[builder(default = "None")]
    pub subsystem: Option<String>,
}

impl Reaction {
    /// Whether this is a boundary reaction, moving a single metabolite across
    /// the model boundary
    pub fn is_boundary(&self) -> bool {
        self.metabolites.len() == 1
    }

    /// The single metabolite of a boundary reaction, None for internal
    /// reactions
    pub fn boundary_metabolite(&self) -> Option<&str> {
        if !self.is_boundary() {
            return None;
        }
        self.metabolites.keys().next().map(|s| s.as_str())
    }

    /// Close the reaction to uptake, leaving secretion unaffected
    ///
    /// # Note:
    /// Negative flux through a boundary reaction is uptake, positive flux is
    /// secretion.
    pub fn close_uptake(&mut self) {
        if self.lower_bound < 0. {
            self.lower_bound = 0.;
        }
    }

    /// Allow uptake of up to `flux` units through this reaction
    pub fn allow_uptake(&mut self, flux: f64) {
        self.lower_bound = -flux.abs();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_detection() {
        let exchange = ReactionBuilder::default()
            .id("EX_glc__D_e".to_string())
            .metabolites(IndexMap::from([("glc__D_e".to_string(), -1.0)]))
            .build()
            .unwrap();
        assert!(exchange.is_boundary());
        assert_eq!(exchange.boundary_metabolite(), Some("glc__D_e"));

        let internal = ReactionBuilder::default()
            .id("PFK".to_string())
            .metabolites(IndexMap::from([
                ("atp_c".to_string(), -1.0),
                ("adp_c".to_string(), 1.0),
            ]))
            .build()
            .unwrap();
        assert!(!internal.is_boundary());
        assert_eq!(internal.boundary_metabolite(), None);
    }

    #[test]
    fn uptake_bounds() {
        let mut exchange = ReactionBuilder::default()
            .id("EX_glc__D_e".to_string())
            .metabolites(IndexMap::from([("glc__D_e".to_string(), -1.0)]))
            .build()
            .unwrap();
        assert!((exchange.lower_bound - -1000.).abs() < 1e-25);

        exchange.close_uptake();
        assert!((exchange.lower_bound - 0.).abs() < 1e-25);
        assert!((exchange.upper_bound - 1000.).abs() < 1e-25);

        exchange.allow_uptake(10.);
        assert!((exchange.lower_bound - -10.).abs() < 1e-25);
    }
}
