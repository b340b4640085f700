use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::error;

use vector_ingest::config::{provider_api_key_from_env, DEFAULT_WEAVIATE_URL};
use vector_ingest::telemetry::init_tracing;
use vector_ingest::{run_import, AppError, Dependencies, IngestConfig, Provider};
use vector_ingest_pipeline::loader::{DEFAULT_BATCH_SIZE, DEFAULT_COLLECTION, DEFAULT_VECTOR_SLOT};
use vector_ingest_pipeline::router::{default_tenant_pool, DEFAULT_ROUTING_PROPERTY};
use vector_ingest_shared::ImportSummary;

/// Exit code for a run stopped by Ctrl-C.
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "vector-ingest")]
#[command(about = "Load a pre-vectorized archive into a Weaviate collection", long_about = None)]
struct Cli {
    /// Weaviate URL
    #[arg(long, env = "WEAVIATE_URL", default_value = DEFAULT_WEAVIATE_URL)]
    weaviate_url: String,

    /// Weaviate API key
    #[arg(long, env = "WEAVIATE_API_KEY", hide_env_values = true)]
    weaviate_api_key: Option<String>,

    /// Embedding provider the dataset was vectorized with
    #[arg(long, env = "INGEST_PROVIDER", value_enum, default_value_t = Provider::Ollama)]
    provider: Provider,

    /// Archive to load (defaults to the provider's dataset under data/)
    #[arg(long, env = "INGEST_ARCHIVE")]
    archive: Option<PathBuf>,

    /// Target collection
    #[arg(long, env = "INGEST_COLLECTION", default_value = DEFAULT_COLLECTION)]
    collection: String,

    /// Records per batch
    #[arg(long, env = "INGEST_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Vector slot sent to the store
    #[arg(long, default_value = DEFAULT_VECTOR_SLOT)]
    vector_slot: String,

    /// Route objects to tenants (defaults to the collection's setting)
    #[arg(long, env = "INGEST_MULTI_TENANCY", action = clap::ArgAction::Set)]
    multi_tenancy: Option<bool>,

    /// Property the tenant is derived from
    #[arg(long, default_value = DEFAULT_ROUTING_PROPERTY)]
    routing_property: String,

    /// Tenant labels, comma separated (defaults to tenant_0..tenant_4)
    #[arg(long, value_delimiter = ',')]
    tenant_pool: Vec<String>,

    /// Number of failed objects listed in the summary
    #[arg(long, default_value_t = 3)]
    failure_preview: usize,

    /// Log progress every N records (0 to disable)
    #[arg(long, default_value_t = 1000)]
    progress_every: usize,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn into_config(self) -> IngestConfig {
        let defaults = IngestConfig::default();
        let provider = self.provider;
        let mut config = IngestConfig {
            weaviate_url: self.weaviate_url,
            weaviate_api_key: self.weaviate_api_key,
            provider_api_key: None,
            request_timeout: Duration::from_secs(self.timeout_secs),
            provider,
            archive_path: self
                .archive
                .unwrap_or_else(|| provider.default_archive()),
            collection: self.collection,
            batch_size: self.batch_size,
            vector_slot: self.vector_slot,
            multi_tenancy: self.multi_tenancy,
            routing_property: self.routing_property,
            tenant_pool: if self.tenant_pool.is_empty() {
                default_tenant_pool()
            } else {
                self.tenant_pool
            },
            failure_preview: self.failure_preview,
            progress_every: self.progress_every,
            channel_buffer_size: defaults.channel_buffer_size,
        };
        config.provider_api_key = provider_api_key_from_env(&config);
        config
    }
}

async fn run(config: IngestConfig) -> Result<ImportSummary, AppError> {
    if !config.archive_path.exists() {
        return Err(AppError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("archive {} not found", config.archive_path.display()),
        )));
    }

    let deps = Dependencies::new(&config).await?;
    run_import(deps, &config).await
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let json = cli.json;
    let config = cli.into_config();

    match run(config).await {
        Ok(summary) => {
            if json {
                match serde_json::to_string_pretty(&summary) {
                    Ok(body) => println!("{}", body),
                    Err(e) => error!(error = %e, "Failed to serialize summary"),
                }
            } else {
                println!("{}", summary);
            }

            if summary.is_complete() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_INTERRUPTED)
            }
        }
        Err(e) => {
            error!(stage = e.stage(), error = %e, "Import failed");
            eprintln!("Import failed during {}: {}", e.stage(), e);
            ExitCode::FAILURE
        }
    }
}
