use crate::snapshot::{checksum, decode_index, encode_index, ModelSnapshot, SNAPSHOT_FORMAT_VERSION};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use prodsim_core::{EmbeddingProvider, Error, ProductRecord, Result, VectorIndex};
use prodsim_similarity::{EngineConfig, SimilarityEngine, TrainedModel};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Allowed per-component drift between snapshot vectors and index rows
const VECTOR_TOLERANCE: f32 = 1e-5;

/// The two coupled files a model is saved as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Metadata, vectors and declared dimension
    pub snapshot: PathBuf,
    /// Serialized search structure
    pub index: PathBuf,
}

impl ArtifactPaths {
    /// `models/similarity` becomes `models/similarity.snapshot` + `models/similarity.index`.
    pub fn from_base<P: AsRef<Path>>(base: P) -> Self {
        let base = base.as_ref();
        Self {
            snapshot: base.with_extension("snapshot"),
            index: base.with_extension("index"),
        }
    }
}

/// Write the engine's current model to the artifact pair derived from `path`.
///
/// The index is written first, then the snapshot, each through
/// temp-file-then-rename. If the snapshot write fails the index file is put
/// back the way it was. The snapshot records the index checksum, so a pair
/// torn by a crash between the two renames is rejected on load.
pub fn save<I, P>(engine: &SimilarityEngine<I>, path: P) -> Result<ArtifactPaths>
where
    I: VectorIndex + Serialize,
    P: AsRef<Path>,
{
    let model = engine.model().ok_or(Error::NotTrained)?;
    let paths = ArtifactPaths::from_base(path);

    let index_bytes = encode_index(model.index())?;
    let snapshot = ModelSnapshot::capture(&model, checksum(&index_bytes))?;
    let snapshot_bytes = snapshot.encode()?;

    if let Some(parent) = paths.snapshot.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Persistence(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }
    }

    let previous_index = read_optional(&paths.index)?;
    write_atomic(&paths.index, &index_bytes)?;
    if let Err(e) = write_atomic(&paths.snapshot, &snapshot_bytes) {
        roll_back(&paths.index, previous_index);
        return Err(e);
    }

    info!(
        "Model saved to {:?} ({} products, dimension {})",
        paths.snapshot,
        model.len(),
        model.dimension()
    );
    Ok(paths)
}

/// Read and cross-check the artifact pair derived from `path`.
pub fn read_model<I, P>(path: P) -> Result<TrainedModel<I>>
where
    I: VectorIndex + DeserializeOwned,
    P: AsRef<Path>,
{
    let paths = ArtifactPaths::from_base(path);
    let snapshot_bytes = read_required(&paths.snapshot)?;
    let index_bytes = read_required(&paths.index)?;

    let snapshot = ModelSnapshot::decode(&snapshot_bytes)?;
    if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(Error::CorruptState(format!(
            "unsupported snapshot format version {}",
            snapshot.format_version
        )));
    }
    if checksum(&index_bytes) != snapshot.index_checksum {
        return Err(Error::CorruptState(format!(
            "{} was not written together with {}",
            paths.index.display(),
            paths.snapshot.display()
        )));
    }

    let index: I = decode_index(&index_bytes)?;
    index.validate()?;
    if !index.is_built() {
        return Err(Error::CorruptState("index artifact is not built".to_string()));
    }
    if !index.is_empty() && index.dimension() == 0 {
        return Err(Error::CorruptState(
            "index artifact holds zero-dimensional vectors".to_string(),
        ));
    }
    if snapshot.entries.len() != index.len() {
        return Err(Error::CorruptState(format!(
            "snapshot has {} entries but index holds {} vectors",
            snapshot.entries.len(),
            index.len()
        )));
    }
    if snapshot.dimension != index.dimension() {
        return Err(Error::CorruptState(format!(
            "snapshot declares dimension {} but index has dimension {}",
            snapshot.dimension,
            index.dimension()
        )));
    }
    if let Some(position) = snapshot
        .entries
        .iter()
        .position(|e| e.vector.len() != snapshot.dimension)
    {
        return Err(Error::CorruptState(format!(
            "snapshot vector at position {} does not have dimension {}",
            position, snapshot.dimension
        )));
    }
    for (position, entry) in snapshot.entries.iter().enumerate() {
        let stored = index.vector(position).ok_or_else(|| {
            Error::CorruptState(format!("index has no vector at position {}", position))
        })?;
        let agrees = stored
            .iter()
            .zip(&entry.vector)
            .all(|(a, b)| (a - b).abs() <= VECTOR_TOLERANCE);
        if !agrees {
            return Err(Error::CorruptState(format!(
                "snapshot vector at position {} differs from the index",
                position
            )));
        }
    }

    let metadata = snapshot.entries.into_iter().map(|e| e.metadata).collect();
    TrainedModel::new(index, metadata)
}

/// Build a trained engine from disk.
pub fn load<I, P>(
    path: P,
    provider: Arc<dyn EmbeddingProvider>,
    config: EngineConfig,
) -> Result<SimilarityEngine<I>>
where
    I: VectorIndex + DeserializeOwned,
    P: AsRef<Path>,
{
    let model = read_model(path.as_ref())?;
    info!(
        "Model loaded from {:?} ({} products, dimension {})",
        path.as_ref(),
        model.len(),
        model.dimension()
    );
    Ok(SimilarityEngine::with_model(provider, config, model))
}

/// Replace the model of a running engine with the one on disk.
///
/// On any error the engine keeps its current model.
pub async fn load_into<I, P>(engine: &SimilarityEngine<I>, path: P) -> Result<()>
where
    I: VectorIndex + DeserializeOwned,
    P: AsRef<Path>,
{
    let model = read_model(path)?;
    engine.restore(model).await
}

/// Train on `records` and persist the result.
pub async fn train_and_save<I, P>(
    engine: &SimilarityEngine<I>,
    records: &[ProductRecord],
    path: P,
) -> Result<ArtifactPaths>
where
    I: VectorIndex + Serialize,
    P: AsRef<Path>,
{
    engine.train(records).await?;
    save(engine, path)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| f.write_all(bytes))
        .map_err(|e| Error::Persistence(format!("cannot write {}: {}", path.display(), e)))
}

fn read_required(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::Persistence(format!("cannot read {}: {}", path.display(), e)))
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::Persistence(format!(
            "cannot read {}: {}",
            path.display(),
            e
        ))),
    }
}

fn roll_back(index_path: &Path, previous: Option<Vec<u8>>) {
    let outcome = match previous {
        Some(bytes) => write_atomic(index_path, &bytes),
        None => fs::remove_file(index_path).map_err(|e| {
            Error::Persistence(format!("cannot remove {}: {}", index_path.display(), e))
        }),
    };
    if let Err(e) = outcome {
        warn!("Could not roll back {:?} after failed save: {}", index_path, e);
    }
}
