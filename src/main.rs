use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use prodsim::catalog::load_catalog;
use prodsim::{
    load, train_and_save, EmbeddingProvider, EngineConfig, HashingEmbedder, MetadataEntry,
    OllamaEmbedder, ProductId, ProductRecord, SimilarProduct, SimilarityEngine,
};
use prodsim_core::DEFAULT_HASHING_DIM;
use prodsim_similarity::{
    DEFAULT_OLLAMA_DIM, DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL, DEFAULT_QUERY_TIMEOUT_SECS,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Product similarity search over a catalog
#[derive(Parser, Debug)]
#[command(name = "prodsim")]
#[command(about = "Find similar products in a catalog", long_about = None)]
struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(flatten)]
    provider: ProviderArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train on a catalog and save the model
    Train {
        /// JSON array or JSON Lines file of product records
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long, env = "PRODSIM_MODEL")]
        model: PathBuf,
    },
    /// Products similar to a stored product or to a record file
    Similar {
        #[arg(long, env = "PRODSIM_MODEL")]
        model: PathBuf,
        /// Identifier of a product in the trained catalog
        #[arg(long, conflicts_with = "record", required_unless_present = "record")]
        id: Option<String>,
        /// JSON file holding a single product record
        #[arg(long)]
        record: Option<PathBuf>,
        #[arg(short, default_value_t = 5)]
        k: usize,
    },
    /// Products matching a free-text query
    Search {
        #[arg(long, env = "PRODSIM_MODEL")]
        model: PathBuf,
        #[arg(long)]
        text: String,
        #[arg(short, default_value_t = 5)]
        k: usize,
    },
    /// Show the size and dimension of a saved model
    Info {
        #[arg(long, env = "PRODSIM_MODEL")]
        model: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ProviderKind {
    Hashing,
    Ollama,
}

#[derive(Args, Debug)]
struct ProviderArgs {
    /// Embedding provider
    #[arg(long, global = true, value_enum, env = "PRODSIM_PROVIDER", default_value = "hashing")]
    provider: ProviderKind,

    /// Vector dimension (defaults to the provider's native dimension)
    #[arg(long, global = true, env = "PRODSIM_DIM")]
    dim: Option<usize>,

    #[arg(long, global = true, env = "OLLAMA_URL", default_value = DEFAULT_OLLAMA_URL)]
    ollama_url: String,

    #[arg(long, global = true, env = "OLLAMA_MODEL", default_value = DEFAULT_OLLAMA_MODEL)]
    ollama_model: String,

    /// Seconds to wait for a query embedding (0 disables the limit)
    #[arg(long, global = true, env = "PRODSIM_QUERY_TIMEOUT", default_value_t = DEFAULT_QUERY_TIMEOUT_SECS)]
    query_timeout: u64,
}

impl ProviderArgs {
    fn build(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        let provider: Arc<dyn EmbeddingProvider> = match self.provider {
            ProviderKind::Hashing => Arc::new(HashingEmbedder::new(
                self.dim.unwrap_or(DEFAULT_HASHING_DIM),
            )?),
            ProviderKind::Ollama => Arc::new(OllamaEmbedder::new(
                &self.ollama_url,
                self.ollama_model.clone(),
                self.dim.unwrap_or(DEFAULT_OLLAMA_DIM),
            )?),
        };
        Ok(provider)
    }

    fn engine_config(&self) -> EngineConfig {
        let timeout = (self.query_timeout > 0).then(|| Duration::from_secs(self.query_timeout));
        EngineConfig::default().with_query_timeout(timeout)
    }
}

#[derive(Serialize)]
struct Hit<'a> {
    #[serde(flatten)]
    product: &'a MetadataEntry,
    score: f32,
}

#[derive(Serialize)]
struct ModelInfo {
    products: usize,
    dimension: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting prodsim v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Train { catalog, model } => {
            let records = load_catalog(catalog)?;
            let engine = SimilarityEngine::new(cli.provider.build()?, cli.provider.engine_config());
            let paths = train_and_save(&engine, &records, model)
                .await
                .context("Training failed")?;
            print_json(&serde_json::json!({
                "products": engine.len(),
                "dimension": engine.dimension(),
                "snapshot": paths.snapshot,
                "index": paths.index,
            }))?;
        }
        Commands::Similar { model, id, record, k } => {
            let engine = open(&cli.provider, model)?;
            let results = match (id, record) {
                (Some(id), _) => engine.find_similar_by_id(&ProductId::parse(id), *k)?,
                (None, Some(path)) => {
                    let record = read_record(path)?;
                    engine.find_similar_by_record(&record, *k).await?
                }
                (None, None) => anyhow::bail!("either --id or --record is required"),
            };
            print_hits(&results)?;
        }
        Commands::Search { model, text, k } => {
            let engine = open(&cli.provider, model)?;
            let results = engine.find_similar_by_text(text, *k).await?;
            print_hits(&results)?;
        }
        Commands::Info { model } => {
            let engine = open(&cli.provider, model)?;
            print_json(&ModelInfo {
                products: engine.len(),
                dimension: engine.dimension(),
            })?;
        }
    }

    Ok(())
}

fn open(provider: &ProviderArgs, model: &Path) -> Result<SimilarityEngine> {
    load(model, provider.build()?, provider.engine_config())
        .with_context(|| format!("Failed to load model {}", model.display()))
}

fn read_record(path: &Path) -> Result<ProductRecord> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read record {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid product record in {}", path.display()))
}

fn print_hits(results: &[SimilarProduct]) -> Result<()> {
    let hits: Vec<Hit<'_>> = results
        .iter()
        .map(|(product, score)| Hit { product, score: *score })
        .collect();
    print_json(&hits)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
