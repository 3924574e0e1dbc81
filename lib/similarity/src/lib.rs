//! # prodsim Similarity
//!
//! The similarity engine: catalog records in, ranked lookalikes out.
//!
//! ## Features
//!
//! - **Training**: one batched embedding call per catalog, exact index build
//! - **Queries**: by record (self-excluded), by stored product id, by free text
//! - **Atomic retrain**: readers see the old or the new model, never a partial one
//! - **Timeouts**: query embedding calls are bounded by a configurable deadline
//!
//! ## Example
//!
//! ```rust,no_run
//! use prodsim_core::{HashingEmbedder, ProductRecord};
//! use prodsim_similarity::{EngineConfig, SimilarityEngine};
//! use std::sync::Arc;
//!
//! # async fn run() -> prodsim_core::Result<()> {
//! let engine = SimilarityEngine::new(Arc::new(HashingEmbedder::default()), EngineConfig::default());
//! engine
//!     .train(&[
//!         ProductRecord::new(1u64).with_name("red lipstick"),
//!         ProductRecord::new(2u64).with_name("red lip gloss"),
//!         ProductRecord::new(3u64).with_name("running shoes"),
//!     ])
//!     .await?;
//!
//! let similar = engine.find_similar_by_text("glossy red lips", 2).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Record    │────>│  Composer   │────>│  Embedding  │
//! │  (catalog)  │     │ (record→txt)│     │  Provider   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                     ┌─────────────┐     ┌──────┴──────┐
//!                     │ Self-filter │<────│ Vector Index│
//!                     │  + top-k    │     │ (k+1 search)│
//!                     └─────────────┘     └─────────────┘
//! ```

pub mod config;
pub mod engine;
pub mod ollama;

pub use config::{EngineConfig, DEFAULT_QUERY_TIMEOUT_SECS};
pub use engine::{SimilarProduct, SimilarityEngine, TrainedModel};
pub use ollama::{OllamaEmbedder, DEFAULT_OLLAMA_DIM, DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL};
