use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use jobradar_core::service::ServedResult;
use jobradar_core::{Aggregator, JobCache, NullStore, RefreshService};
use jobradar_db::{Database, DatabaseConfig};
use jobradar_sources::{ReqwestFetcher, default_sources};

#[derive(Parser)]
#[command(name = "jobradar", version, about = "Job posting aggregator")]
struct Cli {
    /// Cache directory (overrides JOBRADAR_CACHE_DIR)
    #[arg(long, env = "JOBRADAR_CACHE_DIR", default_value = "cache")]
    cache_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the aggregation pipeline and print the result
    Scrape {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Bypass the cache and force a fresh run
        #[arg(long, default_value_t = false)]
        no_cache: bool,

        /// Overall run timeout in seconds
        #[arg(long, default_value_t = 120)]
        timeout: u64,
    },

    /// Run a fresh aggregation and reconcile the persistent store
    /// (requires DATABASE_URL)
    Reconcile {
        /// Overall run timeout in seconds
        #[arg(long, default_value_t = 120)]
        timeout: u64,
    },

    /// Inspect or clear the persistent result cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// List the registered sources
    Sources,
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Print cache status
    Status,
    /// Delete the cached entry (next run will be fresh)
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobradar=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cache = JobCache::in_dir(&cli.cache_dir);

    match cli.command {
        Commands::Scrape {
            format,
            no_cache,
            timeout,
        } => {
            let service = RefreshService::<NullStore>::new(build_aggregator(timeout)?, cache);
            let served = service.fetch(no_cache).await;
            report_errors(&served);
            match format {
                Format::Json => print_json(&served)?,
                Format::Csv => print_csv(&served)?,
            }
        }
        Commands::Reconcile { timeout } => {
            let db = connect_db().await?;
            let service =
                RefreshService::with_store(build_aggregator(timeout)?, cache, db.job_repo());
            let served = service.fetch(true).await;
            report_errors(&served);
            println!(
                "{} unique postings aggregated from {} failed / {} total sources",
                served.jobs.len(),
                served.errors.len(),
                service.source_names().len(),
            );
        }
        Commands::Cache { command } => match command {
            CacheCommands::Status => {
                let status = cache.status().await;
                println!("{}", serde_json::to_string_pretty(&status)?);
            }
            CacheCommands::Clear => {
                cache.invalidate().await.map_err(|e| anyhow::anyhow!(e))?;
                println!("Cache cleared");
            }
        },
        Commands::Sources => {
            let fetcher = ReqwestFetcher::new().map_err(|e| anyhow::anyhow!(e))?;
            for source in default_sources(&fetcher) {
                println!("{:<16} {}", source.name(), source.endpoint());
            }
        }
    }

    Ok(())
}

fn build_aggregator(timeout_secs: u64) -> Result<Aggregator> {
    let fetcher = ReqwestFetcher::new().map_err(|e| anyhow::anyhow!(e))?;
    Ok(Aggregator::new(default_sources(&fetcher))
        .with_timeout(Duration::from_secs(timeout_secs)))
}

/// Connect to PostgreSQL using DATABASE_URL and run migrations.
async fn connect_db() -> Result<Database> {
    let config = DatabaseConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    let db = Database::connect(&config)
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to connect to database")?;
    db.migrate().await.map_err(|e| anyhow::anyhow!(e))?;
    Ok(db)
}

fn report_errors(served: &ServedResult) {
    for error in &served.errors {
        tracing::warn!(source = %error.source, endpoint = %error.endpoint, "{}", error.message);
    }
}

fn print_json(served: &ServedResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&served.jobs)?);
    Ok(())
}

fn print_csv(served: &ServedResult) -> Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record([
        "id",
        "company_name",
        "job_title",
        "location",
        "publish_date",
        "url",
        "source",
        "contract_type",
    ])?;
    for job in &served.jobs {
        let publish_date = job
            .publish_date
            .map(|d| d.to_string())
            .unwrap_or_default();
        writer.write_record([
            job.id.as_str(),
            job.company_name.as_str(),
            job.job_title.as_str(),
            job.location.as_str(),
            publish_date.as_str(),
            job.url.as_str(),
            job.source.as_str(),
            job.contract_type.as_deref().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
