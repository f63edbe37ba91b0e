//! Provides a struct representing a linear optimization problem
//!
//! Thin id-keyed layer over the microlp simplex solver: variables are
//! addressed by reaction id, constraints are built from id/coefficient
//! slices, and solver outcomes are mapped onto typed errors.

use indexmap::IndexMap;
use microlp::{ComparisonOp, OptimizationDirection, Variable};
use thiserror::Error;

/// Sense of the optimization objective
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ObjectiveSense {
    Maximize,
    Minimize,
}

impl From<ObjectiveSense> for OptimizationDirection {
    fn from(sense: ObjectiveSense) -> Self {
        match sense {
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
        }
    }
}

/// A linear optimization problem
pub struct Problem {
    inner: microlp::Problem,
    /// Map of variable ids to solver variables
    variables: IndexMap<String, Variable>,
}

impl Problem {
    // region Creation Functions
    /// Create a new optimization problem
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            inner: microlp::Problem::new(sense.into()),
            variables: IndexMap::new(),
        }
    }

    /// Create a new maximization problem
    pub fn new_maximization() -> Self {
        Self::new(ObjectiveSense::Maximize)
    }

    /// Create a new minimization problem
    pub fn new_minimization() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }
    // endregion Creation Functions

    // region Adding Variables
    /// Add a bounded continuous variable with the given objective coefficient
    pub fn add_variable(
        &mut self,
        id: &str,
        objective_coefficient: f64,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        if self.variables.contains_key(id) {
            return Err(ProblemError::VariableIdAlreadyExists);
        }
        if lower_bound > upper_bound {
            return Err(ProblemError::InvalidVariableBounds);
        }
        let variable = self
            .inner
            .add_var(objective_coefficient, (lower_bound, upper_bound));
        self.variables.insert(id.to_string(), variable);
        Ok(())
    }

    // endregion Adding Variables

    // region Adding Constraints
    /// Add an equality constraint over the given variables
    pub fn add_equality_constraint(
        &mut self,
        variables: &[&str],
        coefficients: &[f64],
        equals: f64,
    ) -> Result<(), ProblemError> {
        let expr = self.linear_expression(variables, coefficients)?;
        self.inner
            .add_constraint(expr.as_slice(), ComparisonOp::Eq, equals);
        Ok(())
    }

    /// Add an inequality constraint over the given variables
    ///
    /// Infinite bounds are permitted and simply drop the corresponding side.
    pub fn add_inequality_constraint(
        &mut self,
        variables: &[&str],
        coefficients: &[f64],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        if lower_bound > upper_bound {
            return Err(ProblemError::InvalidConstraintBounds);
        }
        let expr = self.linear_expression(variables, coefficients)?;
        if lower_bound.is_finite() {
            self.inner
                .add_constraint(expr.as_slice(), ComparisonOp::Ge, lower_bound);
        }
        if upper_bound.is_finite() {
            self.inner
                .add_constraint(expr.as_slice(), ComparisonOp::Le, upper_bound);
        }
        Ok(())
    }

    fn linear_expression(
        &self,
        variables: &[&str],
        coefficients: &[f64],
    ) -> Result<Vec<(Variable, f64)>, ProblemError> {
        if variables.len() != coefficients.len() {
            return Err(ProblemError::MismatchedConstraintTerms);
        }
        variables
            .iter()
            .zip(coefficients)
            .map(|(id, coef)| {
                self.variables
                    .get(*id)
                    .map(|variable| (*variable, *coef))
                    .ok_or(ProblemError::NonExistentVariable)
            })
            .collect()
    }
    // endregion Adding Constraints

    // region Solving
    /// Solve the problem, consuming it
    pub fn solve(self) -> Result<ProblemSolution, ProblemError> {
        match self.inner.solve() {
            Ok(solution) => {
                let variable_values = self
                    .variables
                    .iter()
                    .map(|(id, variable)| (id.clone(), solution[*variable]))
                    .collect();
                Ok(ProblemSolution {
                    objective_value: solution.objective(),
                    variable_values,
                })
            }
            Err(microlp::Error::Infeasible) => Err(ProblemError::Infeasible),
            Err(microlp::Error::Unbounded) => Err(ProblemError::Unbounded),
            Err(err) => Err(ProblemError::Solver(err.to_string())),
        }
    }
    // endregion Solving
}

/// Struct representing the solution to an optimization problem
///
/// Only optimal solves produce a solution; infeasible and unbounded outcomes
/// surface as [`ProblemError`] variants instead.
#[derive(Debug, Clone)]
pub struct ProblemSolution {
    /// Optimized value of the objective
    pub objective_value: f64,
    /// Values of the variables at the optimum, keyed by variable id
    pub variable_values: IndexMap<String, f64>,
}

impl ProblemSolution {
    /// Value of a single variable at the optimum
    pub fn value(&self, id: &str) -> Option<f64> {
        self.variable_values.get(id).copied()
    }
}

/// Errors associated with the Problem
#[derive(Error, Debug, Clone)]
pub enum ProblemError {
    /// Error when trying to add a variable with the same id as an existing variable
    #[error("Tried to add a variable with the same id as an existing variable")]
    VariableIdAlreadyExists,
    /// Error when trying to add a variable with invalid bounds
    #[error("Tried to add a variable with lower_bound>upper_bound")]
    InvalidVariableBounds,
    /// Error when trying to add an inequality constraint with invalid bounds
    #[error("Tried to add an inequality constraint with lower_bound > upper_bound")]
    InvalidConstraintBounds,
    /// Error when a constraint names a variable that is not in the problem
    #[error("Tried to add a constraint with variables not in the problem")]
    NonExistentVariable,
    /// Error when variable and coefficient slices differ in length
    #[error("Constraint variable and coefficient slices differ in length")]
    MismatchedConstraintTerms,
    /// The problem has no feasible solution
    #[error("The problem is infeasible")]
    Infeasible,
    /// The objective is unbounded
    #[error("The problem is unbounded")]
    Unbounded,
    /// Any other solver failure
    #[error("Solver failure: {0}")]
    Solver(String),
}
