//! # prodsim
//!
//! Product similarity search over a catalog.
//!
//! Each product record is composed into a short descriptive text, embedded
//! through a pluggable provider, and stored in an exact inner-product index.
//! The engine answers "more like this product" and "products matching this
//! text" queries, and a trained model can be saved and reloaded as a pair of
//! artifacts.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! prodsim train --catalog products.json --model models/similarity
//! prodsim similar --model models/similarity --id 42 -k 5
//! prodsim search --model models/similarity --text "hydrating face cream"
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use prodsim::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> prodsim::Result<()> {
//! let engine = SimilarityEngine::new(Arc::new(HashingEmbedder::default()), EngineConfig::default());
//! let catalog = vec![
//!     ProductRecord::new(1u64).with_name("red lipstick").with_category("makeup"),
//!     ProductRecord::new(2u64).with_name("red lip gloss").with_category("makeup"),
//!     ProductRecord::new(3u64).with_name("running shoes").with_category("footwear"),
//! ];
//! train_and_save(&engine, &catalog, "models/similarity").await?;
//!
//! for (product, score) in engine.find_similar_by_record(&catalog[0], 2).await? {
//!     println!("{} {:.3}", product.id, score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - `prodsim-core` - records, text composition, vectors, the index, embedding providers
//! - `prodsim-similarity` - the engine and the Ollama provider
//! - `prodsim-storage` - saving and loading trained models

pub mod catalog;

pub use prodsim_core::{
    compose, EmbeddingProvider, Error, FlatIndex, HashingEmbedder, MetadataEntry, ProductId,
    ProductRecord, Result, SearchHit, Vector, VectorIndex,
};

pub use prodsim_similarity::{
    EngineConfig, OllamaEmbedder, SimilarProduct, SimilarityEngine, TrainedModel,
};

pub use prodsim_storage::{load, load_into, save, train_and_save, ArtifactPaths};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        compose, load, load_into, save, train_and_save, ArtifactPaths, EmbeddingProvider,
        EngineConfig, Error, HashingEmbedder, MetadataEntry, OllamaEmbedder, ProductId,
        ProductRecord, Result, SimilarityEngine,
    };
}
