//! Module for reading models and pipeline artifacts

pub mod json;
pub mod table;
