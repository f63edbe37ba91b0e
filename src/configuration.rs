use std::sync::{LazyLock, RwLock};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

/// Process-wide simulation defaults.
pub struct Configuration {
    /// Default lower flux bound for reactions without an explicit bound
    pub lower_bound: f64,
    /// Default upper flux bound for reactions without an explicit bound
    pub upper_bound: f64,
    /// Numerical tolerance below which a flux is considered zero
    pub tolerance: f64,
    /// Uptake allowance granted to every compound present in a medium
    pub medium_flux: f64,
    /// Minimum objective value for a model to count as growing
    pub growth_threshold: f64,
    /// Fraction of the growth optimum enforced during flux variability analysis
    pub fva_fraction: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            tolerance: 1e-07,
            medium_flux: 1000.,
            growth_threshold: 1e-06,
            fva_fraction: 0.9,
        }
    }
}
