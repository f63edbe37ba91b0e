//! Module for constructing and solving the flux optimization problems

pub mod fba;
pub mod problem;
