//! Flux balance analysis over a metabolic model
//!
//! Builds the steady-state linear program (one flux variable per reaction,
//! one mass balance constraint per metabolite) and exposes the two
//! operations the pipeline needs: the plain growth optimum, and the
//! variability-based secretion profile.

use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::configuration::CONFIGURATION;
use crate::metabolic_model::model::Model;
use crate::optimize::problem::{ObjectiveSense, Problem, ProblemError};

/// Build the steady-state flux problem for a model
///
/// Variables are reaction fluxes bounded by the reaction bounds; every
/// metabolite contributes a mass balance equality. The objective is given
/// explicitly so callers can optimize biomass or a single exchange flux.
fn steady_state_problem(
    model: &Model,
    sense: ObjectiveSense,
    objective: &IndexMap<String, f64>,
) -> Result<Problem, ProblemError> {
    let mut problem = Problem::new(sense);
    for (id, reaction) in &model.reactions {
        let coefficient = objective.get(id).copied().unwrap_or(0.);
        problem.add_variable(id, coefficient, reaction.lower_bound, reaction.upper_bound)?;
    }
    let mut balances: IndexMap<&str, (Vec<&str>, Vec<f64>)> = IndexMap::new();
    for (reaction_id, reaction) in &model.reactions {
        for (metabolite_id, stoichiometry) in &reaction.metabolites {
            let (variables, coefficients) = balances.entry(metabolite_id.as_str()).or_default();
            variables.push(reaction_id.as_str());
            coefficients.push(*stoichiometry);
        }
    }
    for (variables, coefficients) in balances.values() {
        problem.add_equality_constraint(variables, coefficients, 0.)?;
    }
    Ok(problem)
}

/// Maximize the model objective and return only its optimal value
///
/// Returns `None` when the problem is infeasible or unbounded, which the
/// pipeline treats the same as no growth.
pub fn slim_optimize(model: &Model) -> Result<Option<f64>, FbaError> {
    if model.objective.is_empty() {
        return Err(FbaError::MissingObjective {
            model: model.id.clone().unwrap_or_default(),
        });
    }
    let problem = steady_state_problem(model, ObjectiveSense::Maximize, &model.objective)?;
    match problem.solve() {
        Ok(solution) => Ok(Some(solution.objective_value)),
        Err(ProblemError::Infeasible) => {
            debug!(model = model.id.as_deref().unwrap_or(""), "model infeasible");
            Ok(None)
        }
        Err(ProblemError::Unbounded) => {
            warn!(
                model = model.id.as_deref().unwrap_or(""),
                "growth objective unbounded"
            );
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Compute the secretion profile of a model near its growth optimum
///
/// For every exchange reaction the minimum flux is computed while growth is
/// held at `fva_fraction` of `optimum`. Exchanges whose minimum flux exceeds
/// the tolerance are necessarily secreting and enter the profile with that
/// guaranteed flux.
pub fn secretion_profile(
    model: &Model,
    optimum: f64,
) -> Result<IndexMap<String, f64>, FbaError> {
    let (fraction, tolerance) = {
        let configuration = CONFIGURATION.read().unwrap();
        (configuration.fva_fraction, configuration.tolerance)
    };
    let growth_floor = fraction * optimum;
    let objective_variables: Vec<&str> = model.objective.keys().map(|k| k.as_str()).collect();
    let objective_coefficients: Vec<f64> = model.objective.values().copied().collect();

    let mut profile = IndexMap::new();
    for exchange_id in model.exchange_ids() {
        let flux_objective = IndexMap::from([(exchange_id.clone(), 1.0)]);
        let mut problem =
            steady_state_problem(model, ObjectiveSense::Minimize, &flux_objective)?;
        problem.add_inequality_constraint(
            &objective_variables,
            &objective_coefficients,
            growth_floor,
            f64::INFINITY,
        )?;
        let minimum = match problem.solve() {
            Ok(solution) => solution.objective_value,
            Err(ProblemError::Infeasible) | Err(ProblemError::Unbounded) => {
                warn!(
                    model = model.id.as_deref().unwrap_or(""),
                    exchange = exchange_id.as_str(),
                    "flux variability sub-problem unsolvable, skipping exchange"
                );
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        if minimum > tolerance {
            profile.insert(exchange_id, minimum);
        }
    }
    Ok(profile)
}

#[derive(Error, Debug)]
pub enum FbaError {
    #[error("model {model} has no objective reactions")]
    MissingObjective { model: String },
    #[error(transparent)]
    Problem(#[from] ProblemError),
}
