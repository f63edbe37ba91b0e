//! Directory layout and the sequential pipeline wrapper
//!
//! All three stages hang off a single base directory: `media/` and `models/`
//! hold the inputs, everything the pipeline produces lands under `target/`.
//! The wrapper runs the stages strictly in order; each stage only reads what
//! the previous one has already persisted.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::motifs::{self, MotifError, MotifSettings};
use crate::network::{self, NetworkError, NetworkSettings};
use crate::simulate::{self, SimulateError, SimulationSettings};

/// The on-disk layout of one pipeline run
#[derive(Debug, Clone)]
pub struct Layout {
    base: PathBuf,
}

impl Layout {
    pub fn new<P: AsRef<Path>>(base: P) -> Self {
        Layout {
            base: base.as_ref().to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> PathBuf {
        self.base.clone()
    }

    // region input locations
    pub fn media_dir(&self) -> PathBuf {
        self.base.join("media")
    }

    pub fn models_dir(&self) -> PathBuf {
        self.base.join("models")
    }

    pub fn initial_medium_file(&self) -> PathBuf {
        self.media_dir().join("initial_medium.csv")
    }

    pub fn exudates_file(&self) -> PathBuf {
        self.media_dir().join("exudates.csv")
    }

    pub fn classification_file(&self) -> PathBuf {
        self.base.join("classification.csv")
    }

    pub fn organic_file(&self) -> PathBuf {
        self.base.join("organic_metabolites.csv")
    }
    // endregion input locations

    // region output locations
    pub fn target_dir(&self) -> PathBuf {
        self.base.join("target")
    }

    pub fn target_media_dir(&self) -> PathBuf {
        self.target_dir().join("media")
    }

    pub fn growths_dir(&self) -> PathBuf {
        self.target_dir().join("growths")
    }

    pub fn secretions_dir(&self) -> PathBuf {
        self.target_dir().join("secretions")
    }

    pub fn network_dir(&self) -> PathBuf {
        self.target_dir().join("network")
    }

    pub fn paths_dir(&self) -> PathBuf {
        self.target_dir().join("paths")
    }

    pub fn medium_file(&self, iteration: usize) -> PathBuf {
        self.target_media_dir().join(format!("medium_{iteration}.csv"))
    }

    pub fn growths_file(&self, iteration: usize) -> PathBuf {
        self.growths_dir().join(format!("growths_{iteration}.csv"))
    }

    pub fn secretions_file(&self, iteration: usize) -> PathBuf {
        self.secretions_dir()
            .join(format!("secretion_{iteration}.csv"))
    }

    pub fn network_edges_file(&self) -> PathBuf {
        self.network_dir().join("network_edges.csv")
    }

    pub fn exudate_paths_file(&self, exudate: &str) -> PathBuf {
        self.paths_dir().join(format!("{exudate}.json"))
    }

    pub fn pair_motifs_file(&self) -> PathBuf {
        self.paths_dir().join("pair_motifs.csv")
    }

    pub fn chain_motifs_file(&self) -> PathBuf {
        self.paths_dir().join("chain_motifs.csv")
    }
    // endregion output locations

    /// Create every output directory the stages write into
    pub fn ensure_target_dirs(&self) -> Result<(), std::io::Error> {
        for dir in [
            self.target_media_dir(),
            self.growths_dir(),
            self.secretions_dir(),
            self.network_dir(),
            self.paths_dir(),
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// The highest-numbered medium the simulation stage wrote, if any
    pub fn latest_medium_file(&self) -> Result<Option<PathBuf>, std::io::Error> {
        let mut latest: Option<(usize, PathBuf)> = None;
        for entry in fs::read_dir(self.target_media_dir())? {
            let path = entry?.path();
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            let Some(iteration) = name
                .strip_prefix("medium_")
                .and_then(|suffix| suffix.parse::<usize>().ok())
            else {
                continue;
            };
            if latest.as_ref().map(|(i, _)| iteration > *i).unwrap_or(true) {
                latest = Some((iteration, path));
            }
        }
        Ok(latest.map(|(_, path)| path))
    }
}

/// Run all three stages in order against one layout
pub fn run(
    layout: &Layout,
    simulation: &SimulationSettings,
    network: &NetworkSettings,
    motifs: &MotifSettings,
) -> Result<(), PipelineError> {
    info!(base = %layout.base_dir().display(), "running growth simulation stage");
    simulate::run_stage(layout, simulation)?;
    info!("running network construction stage");
    network::run_stage(layout, network)?;
    info!("running motif extraction stage");
    motifs::run_stage(layout, motifs)?;
    info!("pipeline complete");
    Ok(())
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("growth simulation stage failed: {0}")]
    Simulate(#[from] SimulateError),
    #[error("network construction stage failed: {0}")]
    Network(#[from] NetworkError),
    #[error("motif extraction stage failed: {0}")]
    Motifs(#[from] MotifError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths_hang_off_base() {
        let layout = Layout::new("/data/community");
        assert_eq!(
            layout.medium_file(3),
            PathBuf::from("/data/community/target/media/medium_3.csv")
        );
        assert_eq!(
            layout.secretions_file(1),
            PathBuf::from("/data/community/target/secretions/secretion_1.csv")
        );
        assert_eq!(
            layout.exudate_paths_file("EX_glc__D_e"),
            PathBuf::from("/data/community/target/paths/EX_glc__D_e.json")
        );
    }

    #[test]
    fn latest_medium_picks_highest_iteration() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        layout.ensure_target_dirs().unwrap();
        for iteration in [1, 2, 10] {
            std::fs::write(layout.medium_file(iteration), "exchange,flux\n").unwrap();
        }
        std::fs::write(layout.target_media_dir().join("notes.txt"), "junk").unwrap();
        let latest = layout.latest_medium_file().unwrap().unwrap();
        assert_eq!(latest, layout.medium_file(10));
    }

    #[test]
    fn latest_medium_on_empty_dir_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        layout.ensure_target_dirs().unwrap();
        assert!(layout.latest_medium_file().unwrap().is_none());
    }
}
