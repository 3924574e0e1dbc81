use crate::{Error, Result, Vector};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Below this many stored vectors scoring stays on the calling thread.
const PARALLEL_THRESHOLD: usize = 4096;

/// One search result: stored position and cosine score in `[-1, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub position: usize,
    pub score: f32,
}

/// Top-k inner-product index over unit vectors.
///
/// Created empty, populated once by [`build`](VectorIndex::build), then
/// read-only. Position `i` is the `i`-th vector handed to `build`.
pub trait VectorIndex: Default + Send + Sync {
    /// Normalize and store `vectors`. All must share the first vector's dimension.
    fn build(&mut self, vectors: Vec<Vector>) -> Result<()>;

    /// Best `k` hits for `query` (normalized here), score descending, ties by
    /// ascending position.
    fn search(&self, query: &Vector, k: usize) -> Result<Vec<SearchHit>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dimension(&self) -> usize;

    fn is_built(&self) -> bool;

    /// The stored (normalized) vector at `position`.
    fn vector(&self, position: usize) -> Option<&[f32]>;

    /// Internal consistency check, run after deserialization.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Exact brute-force index with contiguous storage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlatIndex {
    dim: usize,
    count: usize,
    /// `count * dim` floats, row-major
    data: Vec<f32>,
    built: bool,
}

impl FlatIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build in one step.
    pub fn from_vectors(vectors: Vec<Vector>) -> Result<Self> {
        let mut index = Self::new();
        index.build(vectors)?;
        Ok(index)
    }

    #[inline]
    fn row(&self, position: usize) -> &[f32] {
        let start = position * self.dim;
        &self.data[start..start + self.dim]
    }

    fn scores(&self, query: &[f32]) -> Vec<f32> {
        if self.count >= PARALLEL_THRESHOLD {
            self.data
                .par_chunks_exact(self.dim)
                .map(|row| crate::simd::dot_product(query, row))
                .collect()
        } else {
            self.data
                .chunks_exact(self.dim)
                .map(|row| crate::simd::dot_product(query, row))
                .collect()
        }
    }
}

impl VectorIndex for FlatIndex {
    fn build(&mut self, vectors: Vec<Vector>) -> Result<()> {
        if self.built {
            return Err(Error::IndexAlreadyBuilt);
        }

        let dim = vectors.first().map(Vector::dim).unwrap_or(0);
        if !vectors.is_empty() && dim == 0 {
            return Err(Error::InvalidConfig(
                "cannot index zero-dimensional vectors".to_string(),
            ));
        }
        if let Some(bad) = vectors.iter().find(|v| v.dim() != dim) {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: bad.dim(),
            });
        }
        if let Some(position) = vectors.iter().position(|v| !is_finite(v)) {
            return Err(Error::Embedding(format!(
                "vector at position {} has a non-finite component",
                position
            )));
        }

        let mut data = Vec::with_capacity(vectors.len() * dim);
        for mut vector in vectors.into_iter() {
            vector.normalize();
            data.extend_from_slice(vector.as_slice());
        }

        self.count = if dim == 0 { 0 } else { data.len() / dim };
        self.dim = dim;
        self.data = data;
        self.built = true;
        Ok(())
    }

    fn search(&self, query: &Vector, k: usize) -> Result<Vec<SearchHit>> {
        if !self.built {
            return Err(Error::IndexNotBuilt);
        }
        if self.count == 0 || k == 0 {
            return Ok(Vec::new());
        }
        if query.dim() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: query.dim(),
            });
        }

        if !is_finite(query) {
            return Err(Error::Embedding(
                "query vector has a non-finite component".to_string(),
            ));
        }

        let query = query.normalized();
        let scores = self.scores(query.as_slice());
        Ok(top_k(&scores, k))
    }

    fn len(&self) -> usize {
        self.count
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_built(&self) -> bool {
        self.built
    }

    fn vector(&self, position: usize) -> Option<&[f32]> {
        (position < self.count).then(|| self.row(position))
    }

    fn validate(&self) -> Result<()> {
        if self.count > 0 && self.dim == 0 {
            return Err(Error::CorruptState(format!(
                "index holds {} zero-dimensional vectors",
                self.count
            )));
        }
        let expected = self.count.checked_mul(self.dim).ok_or_else(|| {
            Error::CorruptState(format!(
                "index declares {} vectors of dimension {}, which overflows",
                self.count, self.dim
            ))
        })?;
        if self.data.len() != expected {
            return Err(Error::CorruptState(format!(
                "index holds {} floats, expected {} vectors of dimension {}",
                self.data.len(),
                self.count,
                self.dim
            )));
        }
        if self.count > 0 && !self.built {
            return Err(Error::CorruptState(
                "index has vectors but is not marked built".to_string(),
            ));
        }
        if let Some(offset) = self.data.iter().position(|x| !x.is_finite()) {
            return Err(Error::CorruptState(format!(
                "index vector at position {} has a non-finite component",
                offset / self.dim
            )));
        }
        Ok(())
    }
}

#[inline]
fn is_finite(vector: &Vector) -> bool {
    vector.as_slice().iter().all(|x| x.is_finite())
}

/// Heap entry; `Greater` means a better hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ranked {
    score: OrderedFloat<f32>,
    position: usize,
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| other.position.cmp(&self.position))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Select the best `k` scores with a bounded min-heap.
fn top_k(scores: &[f32], k: usize) -> Vec<SearchHit> {
    let mut heap: BinaryHeap<Reverse<Ranked>> = BinaryHeap::with_capacity(k + 1);

    for (position, &score) in scores.iter().enumerate() {
        // NaN can only come from overflowing components; rank it last.
        let score = if score.is_nan() { -1.0 } else { score.clamp(-1.0, 1.0) };
        let candidate = Ranked {
            score: OrderedFloat(score),
            position,
        };
        if heap.len() < k {
            heap.push(Reverse(candidate));
        } else if let Some(Reverse(worst)) = heap.peek() {
            if candidate > *worst {
                heap.pop();
                heap.push(Reverse(candidate));
            }
        }
    }

    // Ascending by Reverse is descending by rank.
    heap.into_sorted_vec()
        .into_iter()
        .map(|Reverse(r)| SearchHit {
            position: r.position,
            score: r.score.into_inner(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn v(data: &[f32]) -> Vector {
        Vector::from_slice(data)
    }

    #[test]
    fn test_search_before_build() {
        let index = FlatIndex::new();
        assert!(matches!(
            index.search(&v(&[1.0, 0.0]), 3),
            Err(Error::IndexNotBuilt)
        ));
    }

    #[test]
    fn test_build_dimension_mismatch() {
        let mut index = FlatIndex::new();
        let err = index
            .build(vec![v(&[1.0, 0.0]), v(&[1.0, 0.0, 0.0])])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch { expected: 2, actual: 3 }
        ));
        assert!(!index.is_built());
    }

    #[test]
    fn test_build_twice_rejected() {
        let mut index = FlatIndex::from_vectors(vec![v(&[1.0, 0.0])]).unwrap();
        assert!(matches!(
            index.build(vec![v(&[0.0, 1.0])]),
            Err(Error::IndexAlreadyBuilt)
        ));
    }

    #[test]
    fn test_zero_dimensional_vectors_rejected() {
        assert!(matches!(
            FlatIndex::from_vectors(vec![v(&[]), v(&[])]),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_build_searches_empty() {
        let index = FlatIndex::from_vectors(Vec::new()).unwrap();
        assert!(index.is_built());
        assert!(index.search(&v(&[1.0]), 5).unwrap().is_empty());
    }

    #[test]
    fn test_vectors_are_normalized_on_build() {
        let index = FlatIndex::from_vectors(vec![v(&[3.0, 4.0])]).unwrap();
        let stored = index.vector(0).unwrap();
        assert!((stored[0] - 0.6).abs() < 1e-6);
        assert!((stored[1] - 0.8).abs() < 1e-6);
        assert!(index.vector(1).is_none());
    }

    #[test]
    fn test_ranking_and_scores() {
        let index = FlatIndex::from_vectors(vec![
            v(&[0.0, 1.0]),
            v(&[1.0, 0.0]),
            v(&[1.0, 1.0]),
            v(&[-1.0, 0.0]),
        ])
        .unwrap();

        // Unnormalized query; the index normalizes it.
        let hits = index.search(&v(&[5.0, 0.0]), 4).unwrap();
        let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions, vec![1, 2, 0, 3]);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert!((hits[3].score + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ties_break_by_position() {
        let index = FlatIndex::from_vectors(vec![
            v(&[0.0, 1.0]),
            v(&[1.0, 0.0]),
            v(&[2.0, 0.0]),
            v(&[1.0, 0.0]),
        ])
        .unwrap();

        let hits = index.search(&v(&[1.0, 0.0]), 2).unwrap();
        assert_eq!(hits[0].position, 1);
        assert_eq!(hits[1].position, 2);
    }

    #[test]
    fn test_zero_vector_never_matches_positively() {
        let index = FlatIndex::from_vectors(vec![v(&[0.0, 0.0]), v(&[1.0, 0.0])]).unwrap();
        let hits = index.search(&v(&[1.0, 0.0]), 2).unwrap();
        assert_eq!(hits[0].position, 1);
        assert_eq!(hits[1].score, 0.0);
    }

    #[test]
    fn test_k_larger_than_population() {
        let index = FlatIndex::from_vectors(vec![v(&[1.0, 0.0]), v(&[0.0, 1.0])]).unwrap();
        assert_eq!(index.search(&v(&[1.0, 1.0]), 10).unwrap().len(), 2);
        assert!(index.search(&v(&[1.0, 1.0]), 0).unwrap().is_empty());
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = FlatIndex::from_vectors(vec![v(&[1.0, 0.0])]).unwrap();
        assert!(matches!(
            index.search(&v(&[1.0, 0.0, 0.0]), 1),
            Err(Error::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_matches_full_sort_on_random_data() {
        let mut rng = rand::rng();
        let dim = 24;
        let vectors: Vec<Vector> = (0..PARALLEL_THRESHOLD + 100)
            .map(|_| Vector::new((0..dim).map(|_| rng.random_range(-1.0f32..1.0)).collect()))
            .collect();
        let query = Vector::new((0..dim).map(|_| rng.random_range(-1.0f32..1.0)).collect());

        let index = FlatIndex::from_vectors(vectors).unwrap();
        let hits = index.search(&query, 25).unwrap();

        let normalized = query.normalized();
        let mut expected: Vec<(usize, f32)> = (0..index.len())
            .map(|i| (i, crate::simd::dot_product(normalized.as_slice(), index.vector(i).unwrap())))
            .collect();
        expected.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        assert_eq!(hits.len(), 25);
        for (hit, (position, score)) in hits.iter().zip(expected.iter()) {
            assert_eq!(hit.position, *position);
            assert!((hit.score - score.clamp(-1.0, 1.0)).abs() < 1e-6);
        }
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(hits.iter().all(|h| (-1.0..=1.0).contains(&h.score)));
    }

    #[test]
    fn test_non_finite_components_rejected() {
        assert!(matches!(
            FlatIndex::from_vectors(vec![v(&[1.0, 0.0]), v(&[f32::NAN, 1.0])]),
            Err(Error::Embedding(_))
        ));
        assert!(matches!(
            FlatIndex::from_vectors(vec![v(&[f32::INFINITY, 0.0])]),
            Err(Error::Embedding(_))
        ));

        let index = FlatIndex::from_vectors(vec![v(&[1.0, 0.0]), v(&[0.0, 1.0])]).unwrap();
        assert!(matches!(
            index.search(&v(&[f32::NAN, 1.0]), 2),
            Err(Error::Embedding(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_dimension_with_vectors() {
        let index = FlatIndex {
            dim: 0,
            count: 2,
            data: Vec::new(),
            built: true,
        };
        assert!(matches!(index.validate(), Err(Error::CorruptState(_))));
    }

    #[test]
    fn test_validate_rejects_overflowing_shape() {
        let index = FlatIndex {
            dim: 2,
            count: usize::MAX,
            data: Vec::new(),
            built: true,
        };
        assert!(matches!(index.validate(), Err(Error::CorruptState(_))));
    }

    #[test]
    fn test_validate_rejects_non_finite_storage() {
        let mut index = FlatIndex::from_vectors(vec![v(&[1.0, 0.0]), v(&[0.0, 1.0])]).unwrap();
        index.data[3] = f32::NAN;
        assert!(matches!(index.validate(), Err(Error::CorruptState(_))));
    }

    #[test]
    fn test_validate_detects_truncated_storage() {
        let mut index = FlatIndex::from_vectors(vec![v(&[1.0, 0.0]), v(&[0.0, 1.0])]).unwrap();
        assert!(index.validate().is_ok());
        index.data.pop();
        assert!(matches!(index.validate(), Err(Error::CorruptState(_))));
    }
}
