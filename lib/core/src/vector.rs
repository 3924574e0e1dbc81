use serde::{Deserialize, Serialize};

/// A dense embedding vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn from_slice(data: &[f32]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        crate::simd::norm(&self.data)
    }

    /// Inner product; equals cosine similarity when both vectors are unit length.
    #[inline]
    pub fn dot(&self, other: &Vector) -> f32 {
        crate::simd::dot_product(&self.data, &other.data)
    }

    /// Scale to unit L2 norm in place.
    ///
    /// A zero (or non-finite) norm leaves the vector untouched: a zero
    /// embedding is an encoder anomaly and stays visible as such, scoring 0
    /// against everything.
    #[inline]
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 && norm.is_finite() {
            crate::simd::scale_in_place(&mut self.data, 1.0 / norm);
        }
    }

    #[inline]
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut v = self.clone();
        v.normalize();
        v
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Vector::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_normalize_unit_length() {
        let v = Vector::new(vec![3.0, 4.0]).normalized();
        assert!((v.norm() - 1.0).abs() < 1e-6);
        assert!((v.as_slice()[0] - 0.6).abs() < 1e-6);
        assert!((v.as_slice()[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let dim = rng.random_range(1..300);
            let data: Vec<f32> = (0..dim).map(|_| rng.random_range(-10.0f32..10.0)).collect();
            let once = Vector::new(data).normalized();
            let twice = once.normalized();
            for (a, b) in once.as_slice().iter().zip(twice.as_slice()) {
                assert!((a - b).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_zero_vector_left_as_is() {
        let v = Vector::new(vec![0.0, 0.0, 0.0]).normalized();
        assert_eq!(v.as_slice(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_dot_of_unit_vectors_is_cosine() {
        let a = Vector::new(vec![1.0, 0.0]);
        let b = Vector::new(vec![1.0, 1.0]).normalized();
        assert!((a.dot(&b) - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let v = Vector::new(vec![1.0, 2.5]);
        assert_eq!(serde_json::to_string(&v).unwrap(), "[1.0,2.5]");
    }
}
