use crate::config::EngineConfig;
use ahash::AHashMap;
use parking_lot::RwLock;
use prodsim_core::{
    compose, EmbeddingProvider, Error, FlatIndex, MetadataEntry, ProductId, ProductRecord,
    Result, SearchHit, Vector, VectorIndex,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A ranked hit: stored metadata and cosine score
pub type SimilarProduct = (MetadataEntry, f32);

/// An index together with the metadata of every stored position.
///
/// Immutable once constructed; the engine swaps whole models.
#[derive(Debug)]
pub struct TrainedModel<I: VectorIndex = FlatIndex> {
    index: I,
    metadata: Vec<MetadataEntry>,
    positions: AHashMap<ProductId, usize>,
}

impl<I: VectorIndex> TrainedModel<I> {
    /// Pair a built index with its metadata; positions must line up one to one.
    pub fn new(index: I, metadata: Vec<MetadataEntry>) -> Result<Self> {
        if !index.is_built() {
            return Err(Error::IndexNotBuilt);
        }
        if index.len() != metadata.len() {
            return Err(Error::CorruptState(format!(
                "index holds {} vectors but metadata has {} entries",
                index.len(),
                metadata.len()
            )));
        }

        let mut positions = AHashMap::with_capacity(metadata.len());
        for (position, entry) in metadata.iter().enumerate() {
            positions.entry(entry.id.clone()).or_insert(position);
        }

        Ok(Self {
            index,
            metadata,
            positions,
        })
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn metadata(&self) -> &[MetadataEntry] {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    /// First stored position of `id`.
    pub fn position_of(&self, id: &ProductId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Resolve hits to metadata, drop `exclude`, order by score and cut to `k`.
    fn collect(
        &self,
        hits: Vec<SearchHit>,
        exclude: Option<&ProductId>,
        k: usize,
    ) -> Result<Vec<SimilarProduct>> {
        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            let entry = self.metadata.get(hit.position).ok_or_else(|| {
                Error::CorruptState(format!(
                    "index returned position {} beyond {} metadata entries",
                    hit.position,
                    self.metadata.len()
                ))
            })?;
            if exclude == Some(&entry.id) {
                continue;
            }
            results.push((entry.clone(), hit.score));
        }

        // Stable, so equal scores keep index order.
        results.sort_by(|a, b| b.1.total_cmp(&a.1));
        results.truncate(k);
        Ok(results)
    }
}

/// Product similarity engine
///
/// Composes records into text, embeds them through the injected provider and
/// answers lookalike queries from an exact inner-product index. Queries run
/// concurrently against an immutable model snapshot; `train` and `restore`
/// are serialized and publish a fully built model in one pointer swap, so a
/// reader sees either the old or the new model.
pub struct SimilarityEngine<I: VectorIndex = FlatIndex> {
    provider: Arc<dyn EmbeddingProvider>,
    config: EngineConfig,
    model: RwLock<Option<Arc<TrainedModel<I>>>>,
    writer: tokio::sync::Mutex<()>,
}

impl SimilarityEngine<FlatIndex> {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: EngineConfig) -> Self {
        Self::with_index(provider, config)
    }
}

impl<I: VectorIndex> SimilarityEngine<I> {
    /// Engine backed by a custom index implementation.
    pub fn with_index(provider: Arc<dyn EmbeddingProvider>, config: EngineConfig) -> Self {
        Self {
            provider,
            config,
            model: RwLock::new(None),
            writer: tokio::sync::Mutex::new(()),
        }
    }

    /// Engine that starts out trained with `model`.
    pub fn with_model(
        provider: Arc<dyn EmbeddingProvider>,
        config: EngineConfig,
        model: TrainedModel<I>,
    ) -> Self {
        let engine = Self::with_index(provider, config);
        *engine.model.write() = Some(Arc::new(model));
        engine
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.model.read().is_some()
    }

    /// The current model snapshot, if trained.
    pub fn model(&self) -> Option<Arc<TrainedModel<I>>> {
        self.model.read().clone()
    }

    /// Number of indexed products (0 when untrained).
    pub fn len(&self) -> usize {
        self.model().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimension(&self) -> Option<usize> {
        self.model().map(|m| m.dimension())
    }

    /// Metadata of every indexed product in index order.
    pub fn metadata(&self) -> Vec<MetadataEntry> {
        self.model()
            .map(|m| m.metadata().to_vec())
            .unwrap_or_default()
    }

    /// Embed the whole catalog in one batch and replace the current model.
    ///
    /// On any failure the previous model (if any) stays in place.
    pub async fn train(&self, records: &[ProductRecord]) -> Result<()> {
        if records.is_empty() {
            return Err(Error::EmptyCatalog);
        }

        let _guard = self.writer.lock().await;
        info!(
            "Training similarity model on {} products with '{}' embeddings",
            records.len(),
            self.provider.name()
        );
        warn_on_duplicate_ids(records);

        let texts: Vec<String> = records.iter().map(compose).collect();
        let metadata: Vec<MetadataEntry> = records.iter().map(ProductRecord::metadata).collect();

        debug!("Generating embeddings for {} texts", texts.len());
        let vectors = self.embed(&texts, self.config.train_timeout).await?;

        debug!("Building index");
        let mut index = I::default();
        index.build(vectors)?;
        let model = TrainedModel::new(index, metadata)?;
        let dimension = model.dimension();

        *self.model.write() = Some(Arc::new(model));
        info!(
            "Training completed: {} products, dimension {}",
            records.len(),
            dimension
        );
        Ok(())
    }

    /// Install an already built model (e.g. one read from disk).
    pub async fn restore(&self, model: TrainedModel<I>) -> Result<()> {
        let _guard = self.writer.lock().await;
        info!(
            "Restoring similarity model: {} products, dimension {}",
            model.len(),
            model.dimension()
        );
        *self.model.write() = Some(Arc::new(model));
        Ok(())
    }

    /// Products most similar to `target`, never including `target` itself.
    ///
    /// Fewer than `k` results is normal for small catalogs.
    pub async fn find_similar_by_record(
        &self,
        target: &ProductRecord,
        k: usize,
    ) -> Result<Vec<SimilarProduct>> {
        let model = self.trained()?;
        let query = self.embed_query(compose(target)).await?;
        // One extra slot for the target matching itself.
        let hits = model.index.search(&query, k.saturating_add(1))?;
        model.collect(hits, Some(&target.id), k)
    }

    /// Products most similar to free text.
    pub async fn find_similar_by_text(&self, query: &str, k: usize) -> Result<Vec<SimilarProduct>> {
        let model = self.trained()?;
        let query = self.embed_query(query.to_string()).await?;
        let hits = model.index.search(&query, k)?;
        model.collect(hits, None, k)
    }

    /// Products most similar to an already indexed product, using its
    /// stored vector. Makes no embedding call.
    pub fn find_similar_by_id(&self, id: &ProductId, k: usize) -> Result<Vec<SimilarProduct>> {
        let model = self.trained()?;
        let position = model
            .position_of(id)
            .ok_or_else(|| Error::ProductNotFound(id.to_string()))?;
        let query = model
            .index
            .vector(position)
            .map(Vector::from_slice)
            .ok_or_else(|| {
                Error::CorruptState(format!("no stored vector at position {}", position))
            })?;
        let hits = model.index.search(&query, k.saturating_add(1))?;
        model.collect(hits, Some(id), k)
    }

    fn trained(&self) -> Result<Arc<TrainedModel<I>>> {
        self.model().ok_or(Error::NotTrained)
    }

    async fn embed_query(&self, text: String) -> Result<Vector> {
        let texts = [text];
        let mut vectors = self.embed(&texts, self.config.query_timeout).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::Embedding("provider returned no vector for query".to_string()))
    }

    async fn embed(&self, texts: &[String], timeout: Option<Duration>) -> Result<Vec<Vector>> {
        let call = self.provider.embed_batch(texts);
        let vectors = match timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| Error::Timeout(limit))??,
            None => call.await?,
        };

        if vectors.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "provider '{}' returned {} vectors for {} texts",
                self.provider.name(),
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }
}

fn warn_on_duplicate_ids(records: &[ProductRecord]) {
    let mut seen = ahash::AHashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(&record.id) {
            warn!(
                "Duplicate product id {} in catalog; every copy is excluded from its own results",
                record.id
            );
        }
    }
}
