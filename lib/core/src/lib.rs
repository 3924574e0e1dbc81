//! # prodsim Core
//!
//! Core library for the prodsim product similarity engine.
//!
//! This crate provides the building blocks the engine wires together:
//!
//! - [`ProductRecord`] / [`MetadataEntry`] - catalog rows and their stored projection
//! - [`compose`] - deterministic record-to-text flattening
//! - [`EmbeddingProvider`] - the injected text encoder, plus [`HashingEmbedder`]
//! - [`Vector`] - dense vector with SIMD dot product and normalization
//! - [`VectorIndex`] / [`FlatIndex`] - exact top-k inner-product search
//!
//! ## Example
//!
//! ```rust
//! use prodsim_core::{FlatIndex, Vector, VectorIndex};
//!
//! let index = FlatIndex::from_vectors(vec![
//!     Vector::new(vec![1.0, 0.0]),
//!     Vector::new(vec![0.0, 1.0]),
//! ])
//! .unwrap();
//!
//! let hits = index.search(&Vector::new(vec![0.9, 0.1]), 1).unwrap();
//! assert_eq!(hits[0].position, 0);
//! ```

pub mod compose;
pub mod embedder;
pub mod error;
pub mod index;
pub mod product;
pub mod vector;

/// Inner-product kernels
///
/// Hardware-accelerated where available:
/// - AVX2/FMA on x86_64
/// - NEON on ARM64/Apple Silicon
pub mod simd;

pub use compose::{compose, DESCRIPTION_CHAR_LIMIT};
pub use embedder::{EmbeddingProvider, HashingEmbedder, DEFAULT_HASHING_DIM};
pub use error::{Error, Result};
pub use index::{FlatIndex, SearchHit, VectorIndex};
pub use product::{MetadataEntry, ProductId, ProductRecord};
pub use vector::Vector;
