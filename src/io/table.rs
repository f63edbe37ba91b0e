//! CSV records exchanged between pipeline stages
//!
//! Every artifact that crosses a stage boundary is a flat CSV table: media,
//! growth values, secretion profiles, and the trophic edge list. Readers and
//! writers live here so the stages only deal in domain types.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metabolic_model::model::Medium;

/// One compound of a growth medium
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MediumRecord {
    pub exchange: String,
    pub flux: f64,
}

/// Growth value of one model in one iteration
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GrowthRecord {
    pub model: String,
    pub growth: f64,
}

/// One secreted compound of one model in one iteration
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SecretionRecord {
    pub model: String,
    pub metabolite: String,
    pub flux: f64,
}

/// One directed edge of the trophic interaction network
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeRecord {
    pub from: String,
    pub to: String,
}

#[derive(Deserialize, Debug, Clone)]
struct ExudateRecord {
    metabolite: String,
}

#[derive(Deserialize, Debug, Clone)]
struct ClassificationRecord {
    model: String,
    classification: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
struct OrganicRecord {
    exchange: String,
    #[allow(dead_code)]
    formula: Option<String>,
}

// region media

pub fn read_medium<P: AsRef<Path>>(path: P) -> Result<Medium, TableError> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|source| TableError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    let mut medium = Medium::new();
    for record in reader.deserialize::<MediumRecord>() {
        let record = record.map_err(|source| TableError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        medium.insert(record.exchange, record.flux);
    }
    Ok(medium)
}

pub fn write_medium<P: AsRef<Path>>(path: P, medium: &Medium) -> Result<(), TableError> {
    let path = path.as_ref();
    let mut writer = csv_writer(path)?;
    for (exchange, flux) in medium {
        writer
            .serialize(MediumRecord {
                exchange: exchange.clone(),
                flux: *flux,
            })
            .map_err(|source| TableError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
    }
    writer.flush().map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// endregion media

// region growths and secretions

pub fn write_growths<P: AsRef<Path>>(
    path: P,
    growths: &IndexMap<String, f64>,
) -> Result<(), TableError> {
    let path = path.as_ref();
    let mut writer = csv_writer(path)?;
    for (model, growth) in growths {
        writer
            .serialize(GrowthRecord {
                model: model.clone(),
                growth: *growth,
            })
            .map_err(|source| TableError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
    }
    writer.flush().map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_secretions<P: AsRef<Path>>(
    path: P,
    secretions: &[SecretionRecord],
) -> Result<(), TableError> {
    write_records(path, secretions)
}

pub fn read_secretions<P: AsRef<Path>>(path: P) -> Result<Vec<SecretionRecord>, TableError> {
    read_records(path)
}

/// Read every secretion table in a directory, sorted by file name
///
/// Hidden files are skipped, matching the tolerance for editor droppings the
/// rest of the pipeline has.
pub fn read_secretions_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<SecretionRecord>, TableError> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|source| TableError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            let hidden = path
                .file_name()
                .map(|name| name.to_string_lossy().starts_with('.'))
                .unwrap_or(true);
            !hidden && path.extension().is_some_and(|ext| ext == "csv")
        })
        .collect();
    paths.sort();
    let mut records = Vec::new();
    for path in paths {
        records.extend(read_secretions(path)?);
    }
    Ok(records)
}

// endregion growths and secretions

// region network edges

pub fn write_edges<P: AsRef<Path>>(path: P, edges: &[EdgeRecord]) -> Result<(), TableError> {
    write_records(path, edges)
}

pub fn read_edges<P: AsRef<Path>>(path: P) -> Result<Vec<EdgeRecord>, TableError> {
    read_records(path)
}

// endregion network edges

// region analysis inputs

/// Read the exudate metabolite list (`metabolite` column)
pub fn read_exudates<P: AsRef<Path>>(path: P) -> Result<Vec<String>, TableError> {
    let records: Vec<ExudateRecord> = read_records(path)?;
    Ok(records.into_iter().map(|r| r.metabolite).collect())
}

/// Read differential abundance classifications (`model,classification`)
///
/// Models with an empty classification are omitted from the map.
pub fn read_classifications<P: AsRef<Path>>(
    path: P,
) -> Result<IndexMap<String, String>, TableError> {
    let records: Vec<ClassificationRecord> = read_records(path)?;
    Ok(records
        .into_iter()
        .filter_map(|r| r.classification.map(|c| (r.model, c)))
        .collect())
}

/// Read the organic compound filter (`exchange,formula`)
pub fn read_organic_filter<P: AsRef<Path>>(path: P) -> Result<IndexSet<String>, TableError> {
    let records: Vec<OrganicRecord> = read_records(path)?;
    Ok(records.into_iter().map(|r| r.exchange).collect())
}

// endregion analysis inputs

fn csv_writer(path: &Path) -> Result<csv::Writer<fs::File>, TableError> {
    csv::Writer::from_path(path).map_err(|source| TableError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize any record slice to a CSV table
pub fn write_records<P, T>(path: P, records: &[T]) -> Result<(), TableError>
where
    P: AsRef<Path>,
    T: Serialize,
{
    let path = path.as_ref();
    let mut writer = csv_writer(path)?;
    for record in records {
        writer.serialize(record).map_err(|source| TableError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    }
    writer.flush().map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_records<P, T>(path: P) -> Result<Vec<T>, TableError>
where
    P: AsRef<Path>,
    T: for<'de> Deserialize<'de>,
{
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|source| TableError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    let mut records = Vec::new();
    for record in reader.deserialize::<T>() {
        records.push(record.map_err(|source| TableError::Csv {
            path: path.to_path_buf(),
            source,
        })?);
    }
    Ok(records)
}

#[derive(Error, Debug)]
pub enum TableError {
    #[error("csv error at {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
