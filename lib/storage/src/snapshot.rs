// On-disk artifact formats for a trained model
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use prodsim_core::{Error, MetadataEntry, Result, VectorIndex};
use prodsim_similarity::TrainedModel;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Artifact A: ordered `(metadata, vector)` pairs plus the declared dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub format_version: u32,
    pub dimension: usize,
    pub created_at: u64,
    /// SHA-256 of the index artifact written alongside this snapshot
    pub index_checksum: String,
    pub entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub metadata: MetadataEntry,
    pub vector: Vec<f32>,
}

impl ModelSnapshot {
    /// Capture `model` in position order.
    pub fn capture<I: VectorIndex>(model: &TrainedModel<I>, index_checksum: String) -> Result<Self> {
        let index = model.index();
        let entries = model
            .metadata()
            .iter()
            .enumerate()
            .map(|(position, metadata)| {
                let vector = index.vector(position).ok_or_else(|| {
                    Error::CorruptState(format!("no stored vector at position {}", position))
                })?;
                Ok(SnapshotEntry {
                    metadata: metadata.clone(),
                    vector: vector.to_vec(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            dimension: index.dimension(),
            created_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            index_checksum,
            entries,
        })
    }

    /// Gzip-compressed JSON.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        serde_json::to_writer(&mut encoder, self)
            .map_err(|e| Error::Persistence(format!("cannot encode snapshot: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| Error::Persistence(format!("cannot compress snapshot: {}", e)))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_reader(GzDecoder::new(bytes))
            .map_err(|e| Error::CorruptState(format!("unreadable snapshot artifact: {}", e)))
    }
}

/// Artifact B: the bincode-encoded index.
pub fn encode_index<I: Serialize>(index: &I) -> Result<Vec<u8>> {
    bincode::serialize(index).map_err(|e| Error::Persistence(format!("cannot encode index: {}", e)))
}

pub fn decode_index<I: DeserializeOwned>(bytes: &[u8]) -> Result<I> {
    bincode::deserialize(bytes)
        .map_err(|e| Error::CorruptState(format!("unreadable index artifact: {}", e)))
}

/// Hex SHA-256 of `bytes`.
pub fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
