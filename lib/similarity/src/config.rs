use std::time::Duration;

/// Deadline for the single embedding call a query makes
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Runtime knobs for [`SimilarityEngine`](crate::SimilarityEngine)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Applied to the embedding call of `find_similar_by_record` and
    /// `find_similar_by_text`. `None` waits indefinitely.
    pub query_timeout: Option<Duration>,
    /// Applied to the batch embedding call of `train`. `None` waits indefinitely.
    pub train_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            query_timeout: Some(Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS)),
            train_timeout: None,
        }
    }
}

impl EngineConfig {
    pub fn with_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_train_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.train_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.query_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.train_timeout, None);
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::default()
            .with_query_timeout(None)
            .with_train_timeout(Some(Duration::from_secs(600)));
        assert_eq!(config.query_timeout, None);
        assert_eq!(config.train_timeout, Some(Duration::from_secs(600)));
    }
}
