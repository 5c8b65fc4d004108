//! lor-federation: command-line front end to the aggregation core.
//!
//! ```text
//! lor-federation [--config lor.toml] [-v...] [--json-logs] <command>
//!
//!   search   [--search TEXT] [--subject CODE]... [--format CODE]...
//!            [--publisher ID] [--page N] [--size N] [--sort KEY]
//!   details  <source-id> <item-id>
//!   filters
//! ```
//!
//! Results go to stdout as pretty JSON, logs to stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lor_federation::model::{MediaType, Subject, Vocabulary};
use lor_federation::{
    Aggregator, CatalogClient, Config, InMemoryEngagement, PageSpec, SearchRequest, SortKey,
    StaticRegistry,
};

#[derive(Debug, Parser)]
#[command(name = "lor-federation", version, about = "Federated learning-object search")]
struct Cli {
    /// Config file.
    #[arg(long, global = true, env = "LOR_FEDERATION_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search all active sources and print one merged page.
    Search(SearchArgs),
    /// Print one item with its rating summary.
    Details { source_id: String, item_id: String },
    /// Print the supported filter values.
    Filters,
}

#[derive(Debug, clap::Args)]
struct SearchArgs {
    /// Free-text term; wrap phrases in double quotes.
    #[arg(long)]
    search: Option<String>,

    /// Subject code, e.g. MATHEMATIK. Repeatable.
    #[arg(long = "subject")]
    subjects: Vec<String>,

    /// Media type code, e.g. TEXT_BOOK. Repeatable.
    #[arg(long = "format")]
    formats: Vec<String>,

    /// Restrict to one source id.
    #[arg(long)]
    publisher: Option<String>,

    #[arg(long, default_value_t = 0)]
    page: u32,

    #[arg(long, default_value_t = lor_federation::model::DEFAULT_PAGE_SIZE)]
    size: u32,

    /// NEWEST, OLDEST, ALPHABETIC, MOST_VIEWED or a `property,direction` pair.
    #[arg(long)]
    sort: Option<SortKey>,
}

impl SearchArgs {
    fn request(&self) -> Result<SearchRequest> {
        let mut request = SearchRequest {
            search: self.search.clone(),
            publisher: self.publisher.clone(),
            ..SearchRequest::default()
        };
        for code in &self.subjects {
            request = request.with_subject(vocabulary_code::<Subject>(code)?);
        }
        for code in &self.formats {
            request = request.with_technical_format(vocabulary_code::<MediaType>(code)?);
        }
        Ok(request)
    }

    fn page(&self) -> PageSpec {
        let page = PageSpec::new(self.page, self.size);
        match self.sort {
            Some(key) => page.sorted(key),
            None => page,
        }
    }
}

fn vocabulary_code<V: Vocabulary>(code: &str) -> Result<V> {
    V::from_code(code).ok_or_else(|| anyhow!("unknown {} code: {code}", V::KIND))
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

fn init_tracing(cli: &Cli) {
    let filter = match cli.verbose {
        0 => "warn,lor_federation=info",
        1 => "info,lor_federation=debug",
        2 => "debug,lor_federation=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    debug!(sources = config.sources.len(), "configuration loaded");

    let aggregator = Aggregator::new(
        Arc::new(StaticRegistry::from_config(&config)),
        CatalogClient::from_config(&config).context("building HTTP client")?,
        Arc::new(InMemoryEngagement::new()),
    );

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(async {
        match &cli.command {
            Command::Search(args) => {
                let page = aggregator
                    .search(&args.request()?, &args.page())
                    .await
                    .context("search failed")?;
                print_json(&page)
            }
            Command::Details { source_id, item_id } => {
                let details = aggregator
                    .details(source_id, item_id, None)
                    .await
                    .with_context(|| format!("details of {source_id}/{item_id}"))?;
                print_json(&details)
            }
            Command::Filters => {
                let catalog = aggregator.filters().await.context("collecting filters")?;
                print_json(&catalog)
            }
        }
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
