//! Prediction of trophic interactions among microbial community members from
//! constraint based genome-scale metabolic models (GSMMs).
//!
//! The crate implements a three stage batch pipeline:
//! 1. [`simulate`] grows every community member in a shared medium, collects
//!    secretion profiles, and enriches the medium with the secreted compounds
//!    for further growth iterations.
//! 2. [`network`] matches secreted compounds against uptake capabilities to
//!    build a directed trophic interaction graph.
//! 3. [`motifs`] decomposes the graph into small exudate-seeded sub-networks.
//!
//! Each stage consumes the previous stage's on-disk output; [`pipeline`]
//! provides the directory layout and a sequential wrapper over all three.

pub mod configuration;
pub mod io;
pub mod metabolic_model;
pub mod motifs;
pub mod network;
pub mod optimize;
pub mod pipeline;
pub mod simulate;
