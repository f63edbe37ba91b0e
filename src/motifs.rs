//! Motif extraction from the trophic network (stage three)
//!
//! Deconstructs the interaction graph into sub-networks that stem from a
//! root exudate, through models as proxies, to other metabolites. Paths of
//! node-length three (`exudate - model - metabolite`) and five
//! (`exudate - model - metabolite - model - metabolite`) are additionally
//! tabulated with the differential abundance classification of the models
//! involved.

use std::collections::hash_map::RandomState;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use indexmap::IndexMap;
use petgraph::algo::all_simple_paths;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::io::table::{
    read_classifications, read_edges, read_exudates, write_records, TableError,
};
use crate::network::TrophicNetwork;
use crate::pipeline::Layout;

/// Shortest motif worth keeping: exudate, model, metabolite
pub const MIN_PATH_NODES: usize = 3;
/// Longest motif enumerated
pub const MAX_PATH_NODES: usize = 6;
/// Node-length of a pair motif (one model between two compounds)
pub const PAIR_MOTIF_NODES: usize = 3;
/// Node-length of a chain motif (two models linked by an intermediate)
pub const CHAIN_MOTIF_NODES: usize = 5;

/// Placeholder classification for models without an entry
const UNCLASSIFIED: &str = "NA";

/// Settings for the motif extraction stage
#[derive(Debug, Clone, Default)]
pub struct MotifSettings {
    /// Exudate list; defaults to `media/exudates.csv`
    pub exudates: Option<PathBuf>,
    /// Optional differential abundance classification table
    pub classification: Option<PathBuf>,
}

/// All motif paths stemming from one exudate
#[derive(Serialize, Debug, Clone)]
pub struct ExudatePaths {
    pub exudate: String,
    pub paths: Vec<Vec<String>>,
}

/// A pair motif: exudate feeds a model which yields a metabolite
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PairMotifRecord {
    pub exudate: String,
    pub model: String,
    pub metabolite: String,
    pub classification: String,
}

/// A chain motif: two models linked through an intermediate metabolite
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ChainMotifRecord {
    pub exudate: String,
    pub model1: String,
    pub metabolite1: String,
    pub model2: String,
    pub metabolite2: String,
    pub classification1: String,
    pub classification2: String,
}

/// Enumerate every simple path stemming from the exudate with node-length
/// between [`MIN_PATH_NODES`] and [`MAX_PATH_NODES`]
///
/// An exudate absent from the network yields no paths. Because the network
/// is bipartite, odd positions along a path are always models and even
/// positions compounds.
pub fn exudate_paths(network: &TrophicNetwork, exudate: &str) -> Vec<Vec<String>> {
    let Some(start) = network.node_index(exudate) else {
        debug!(exudate, "exudate absent from the network");
        return Vec::new();
    };
    let graph = network.graph();
    let mut paths = Vec::new();
    for target in graph.node_indices() {
        if target == start {
            continue;
        }
        for path in all_simple_paths::<Vec<_>, _, RandomState>(
            graph,
            start,
            target,
            MIN_PATH_NODES - 2,
            Some(MAX_PATH_NODES - 2),
        ) {
            paths.push(
                path.into_iter()
                    .map(|index| network.node_id(index).to_string())
                    .collect(),
            );
        }
    }
    paths
}

fn classification_of(classifications: &IndexMap<String, String>, model: &str) -> String {
    classifications
        .get(model)
        .cloned()
        .unwrap_or_else(|| UNCLASSIFIED.to_string())
}

/// Tabulate the pair motifs among the paths of one exudate
pub fn pair_motifs(
    exudate: &ExudatePaths,
    classifications: &IndexMap<String, String>,
) -> Vec<PairMotifRecord> {
    exudate
        .paths
        .iter()
        .filter(|path| path.len() == PAIR_MOTIF_NODES)
        .map(|path| PairMotifRecord {
            exudate: path[0].clone(),
            model: path[1].clone(),
            metabolite: path[2].clone(),
            classification: classification_of(classifications, &path[1]),
        })
        .collect()
}

/// Tabulate the chain motifs among the paths of one exudate
pub fn chain_motifs(
    exudate: &ExudatePaths,
    classifications: &IndexMap<String, String>,
) -> Vec<ChainMotifRecord> {
    exudate
        .paths
        .iter()
        .filter(|path| path.len() == CHAIN_MOTIF_NODES)
        .map(|path| ChainMotifRecord {
            exudate: path[0].clone(),
            model1: path[1].clone(),
            metabolite1: path[2].clone(),
            model2: path[3].clone(),
            metabolite2: path[4].clone(),
            classification1: classification_of(classifications, &path[1]),
            classification2: classification_of(classifications, &path[3]),
        })
        .collect()
}

/// Run the whole motif extraction stage against a pipeline layout
pub fn run_stage(layout: &Layout, settings: &MotifSettings) -> Result<(), MotifError> {
    layout
        .ensure_target_dirs()
        .map_err(|source| MotifError::CreateDirs {
            path: layout.target_dir(),
            source,
        })?;

    let edges = read_edges(layout.network_edges_file())?;
    let network = TrophicNetwork::from_edges(&edges);

    let exudates_path = settings
        .exudates
        .clone()
        .unwrap_or_else(|| layout.exudates_file());
    let exudates = if exudates_path.exists() {
        read_exudates(&exudates_path)?
    } else {
        debug!(path = %exudates_path.display(), "no exudate list, nothing to extract");
        Vec::new()
    };

    let classification_path = settings
        .classification
        .clone()
        .unwrap_or_else(|| layout.classification_file());
    let classifications = if classification_path.exists() {
        read_classifications(&classification_path)?
    } else {
        IndexMap::new()
    };

    let mut pairs = Vec::new();
    let mut chains = Vec::new();
    for exudate in &exudates {
        let found = ExudatePaths {
            exudate: exudate.clone(),
            paths: exudate_paths(&network, exudate),
        };
        info!(
            exudate = exudate.as_str(),
            paths = found.paths.len(),
            "enumerated motif paths"
        );
        let path = layout.exudate_paths_file(exudate);
        let file = File::create(&path).map_err(|source| MotifError::WriteArtifact {
            path: path.clone(),
            source,
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), &found).map_err(|source| {
            MotifError::SerializeArtifact {
                path: path.clone(),
                source,
            }
        })?;
        pairs.extend(pair_motifs(&found, &classifications));
        chains.extend(chain_motifs(&found, &classifications));
    }

    write_records(layout.pair_motifs_file(), &pairs)?;
    write_records(layout.chain_motifs_file(), &chains)?;
    info!(
        pair_motifs = pairs.len(),
        chain_motifs = chains.len(),
        "motif tables written"
    );
    Ok(())
}

#[derive(Error, Debug)]
pub enum MotifError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("unable to prepare output directories under {path}: {source}")]
    CreateDirs {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unable to write motif artifact {path}: {source}")]
    WriteArtifact {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unable to serialize motif artifact {path}: {source}")]
    SerializeArtifact {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::table::EdgeRecord;

    /// glc feeds alpha; alpha secretes acetate which feeds beta; beta
    /// secretes formate
    fn toy_network() -> TrophicNetwork {
        let edges = [
            ("EX_glc_e", "alpha"),
            ("EX_ac_e", "alpha"),
            ("EX_ac_e", "beta"),
            ("alpha", "EX_ac_e"),
            ("beta", "EX_for_e"),
        ]
        .map(|(from, to)| EdgeRecord {
            from: from.to_string(),
            to: to.to_string(),
        });
        TrophicNetwork::from_edges(&edges)
    }

    #[test]
    fn paths_stay_within_length_bounds() {
        let network = toy_network();
        let paths = exudate_paths(&network, "EX_glc_e");
        assert!(!paths.is_empty());
        for path in &paths {
            assert!(path.len() >= MIN_PATH_NODES && path.len() <= MAX_PATH_NODES);
            assert_eq!(path[0], "EX_glc_e");
        }
        // The full cross-feeding chain is found
        assert!(paths.contains(&vec![
            "EX_glc_e".to_string(),
            "alpha".to_string(),
            "EX_ac_e".to_string(),
            "beta".to_string(),
            "EX_for_e".to_string(),
        ]));
    }

    #[test]
    fn absent_exudate_yields_no_paths() {
        let network = toy_network();
        assert!(exudate_paths(&network, "EX_cit_e").is_empty());
    }

    #[test]
    fn pair_and_chain_motifs_are_tabulated() {
        let network = toy_network();
        let found = ExudatePaths {
            exudate: "EX_glc_e".to_string(),
            paths: exudate_paths(&network, "EX_glc_e"),
        };
        let classifications =
            IndexMap::from([("alpha".to_string(), "BjSA".to_string())]);

        let pairs = pair_motifs(&found, &classifications);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].model, "alpha");
        assert_eq!(pairs[0].metabolite, "EX_ac_e");
        assert_eq!(pairs[0].classification, "BjSA");

        let chains = chain_motifs(&found, &classifications);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].model2, "beta");
        assert_eq!(chains[0].classification2, "NA");
    }

    #[test]
    fn motifs_are_contained_in_the_network() {
        let network = toy_network();
        let paths = exudate_paths(&network, "EX_glc_e");
        for path in &paths {
            for pair in path.windows(2) {
                assert!(network.contains_edge(&pair[0], &pair[1]));
            }
        }
    }
}
