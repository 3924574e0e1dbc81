//! Saving and loading trained similarity models.
//!
//! A model is stored as two coupled artifacts: a compressed snapshot of
//! metadata and vectors, and the serialized index. They are written and read
//! as a pair and cross-checked on load.

pub mod persistence;
pub mod snapshot;

pub use persistence::{load, load_into, read_model, save, train_and_save, ArtifactPaths};
pub use snapshot::{ModelSnapshot, SnapshotEntry, SNAPSHOT_FORMAT_VERSION};
