//! Trophic interaction network construction (stage two)
//!
//! Matches the secretion profiles gathered by the growth simulation against
//! the uptake capabilities of the community models. The result is a directed
//! bipartite graph: a `compound -> model` edge means the model can take the
//! compound up from the shared environment, a `model -> compound` edge means
//! the model was observed secreting it.

use std::path::PathBuf;

use indexmap::{IndexMap, IndexSet};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use thiserror::Error;
use tracing::{info, warn};

use crate::io::json::{read_models_dir, JsonError};
use crate::io::table::{
    read_medium, read_organic_filter, read_secretions_dir, write_edges, EdgeRecord, TableError,
};
use crate::metabolic_model::model::{Medium, Model};
use crate::pipeline::Layout;

/// Settings for the network construction stage
#[derive(Debug, Clone, Default)]
pub struct NetworkSettings {
    /// Final enriched medium; defaults to the highest-numbered medium the
    /// simulation stage wrote
    pub final_medium: Option<PathBuf>,
    /// Organic compound filter applied to secretions; defaults to
    /// `organic_metabolites.csv` at the base directory when that file exists
    pub organic_filter: Option<PathBuf>,
}

/// The directed trophic interaction graph
///
/// Nodes carry model ids or exchange compound ids; edges are unlabelled and
/// deduplicated. Insertion order is preserved so serialized edge lists are
/// reproducible.
#[derive(Debug, Default)]
pub struct TrophicNetwork {
    graph: DiGraph<String, ()>,
    indices: IndexMap<String, NodeIndex>,
}

impl TrophicNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, id: &str) -> NodeIndex {
        if let Some(index) = self.indices.get(id) {
            return *index;
        }
        let index = self.graph.add_node(id.to_string());
        self.indices.insert(id.to_string(), index);
        index
    }

    /// Add a directed edge, ignoring duplicates
    pub fn add_edge(&mut self, from: &str, to: &str) {
        let from = self.node(from);
        let to = self.node(to);
        self.graph.update_edge(from, to, ());
    }

    /// Rebuild a network from a serialized edge list
    pub fn from_edges(records: &[EdgeRecord]) -> Self {
        let mut network = Self::new();
        for record in records {
            network.add_edge(&record.from, &record.to);
        }
        network
    }

    /// The edge list in insertion order
    pub fn edges(&self) -> Vec<EdgeRecord> {
        self.graph
            .edge_references()
            .map(|edge| EdgeRecord {
                from: self.graph[edge.source()].clone(),
                to: self.graph[edge.target()].clone(),
            })
            .collect()
    }

    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        match (self.indices.get(from), self.indices.get(to)) {
            (Some(from), Some(to)) => self.graph.contains_edge(*from, *to),
            _ => false,
        }
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.indices.get(id).copied()
    }

    pub fn node_id(&self, index: NodeIndex) -> &str {
        &self.graph[index]
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.indices.keys().map(|id| id.as_str())
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn graph(&self) -> &DiGraph<String, ()> {
        &self.graph
    }
}

/// Union each model's secreted compounds across all simulation iterations
pub fn collect_secretions(layout: &Layout) -> Result<IndexMap<String, IndexSet<String>>, NetworkError> {
    let records = read_secretions_dir(layout.secretions_dir())?;
    let mut secreted: IndexMap<String, IndexSet<String>> = IndexMap::new();
    for record in records {
        secreted
            .entry(record.model)
            .or_default()
            .insert(record.metabolite);
    }
    Ok(secreted)
}

/// Build the trophic network from secretions, uptake capability, and the
/// final medium
///
/// Only models that secreted at least once participate. Uptake capability is
/// the intersection of a model's exchanges with the final medium; the
/// optional organic filter prunes sink and inorganic compounds from the
/// secretion side.
pub fn build_network(
    models: &[Model],
    secreted: &IndexMap<String, IndexSet<String>>,
    final_medium: &Medium,
    organic: Option<&IndexSet<String>>,
) -> TrophicNetwork {
    let mut network = TrophicNetwork::new();
    let mut participants: Vec<&Model> = models
        .iter()
        .filter(|model| {
            model
                .id
                .as_ref()
                .is_some_and(|id| secreted.contains_key(id))
        })
        .collect();
    participants.sort_by(|a, b| a.id.cmp(&b.id));

    // Uptake edges first, then secretion edges, keeping the serialized edge
    // list aligned with how the tables were gathered
    for model in &participants {
        let id = model.id.as_deref().unwrap_or_default();
        for exchange in model.exchange_ids() {
            if final_medium.contains_key(&exchange) {
                network.add_edge(&exchange, id);
            }
        }
    }
    for model in &participants {
        let id = model.id.as_deref().unwrap_or_default();
        let Some(compounds) = secreted.get(id) else {
            continue;
        };
        for compound in compounds {
            if organic.map(|filter| filter.contains(compound)).unwrap_or(true) {
                network.add_edge(id, compound);
            }
        }
    }
    network
}

/// Run the whole network construction stage against a pipeline layout
pub fn run_stage(layout: &Layout, settings: &NetworkSettings) -> Result<(), NetworkError> {
    layout
        .ensure_target_dirs()
        .map_err(|source| NetworkError::CreateDirs {
            path: layout.target_dir(),
            source,
        })?;

    let models = read_models_dir(layout.models_dir())?;
    let secreted = collect_secretions(layout)?;

    let final_medium_path = match settings.final_medium.clone() {
        Some(path) => Some(path),
        None => layout.latest_medium_file().map_err(|source| {
            NetworkError::ScanMedia {
                path: layout.target_media_dir(),
                source,
            }
        })?,
    };
    let final_medium = match final_medium_path {
        Some(path) => read_medium(path)?,
        None => {
            warn!("no medium produced by the simulation stage, network will be empty");
            Medium::new()
        }
    };

    let organic_path = settings.organic_filter.clone().or_else(|| {
        let path = layout.organic_file();
        path.exists().then_some(path)
    });
    let organic = organic_path
        .as_ref()
        .map(read_organic_filter)
        .transpose()?;

    let network = build_network(&models, &secreted, &final_medium, organic.as_ref());
    info!(
        nodes = network.node_count(),
        edges = network.edge_count(),
        "trophic network constructed"
    );
    write_edges(layout.network_edges_file(), &network.edges())?;
    Ok(())
}

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error(transparent)]
    Json(#[from] JsonError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("unable to prepare output directories under {path}: {source}")]
    CreateDirs {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unable to scan media directory {path}: {source}")]
    ScanMedia {
        path: PathBuf,
        source: std::io::Error,
    },
}
