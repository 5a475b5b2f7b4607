//! PaperLens: command-line entry point.
//! Analyzes one paper (a local PDF or an arXiv link) and prints the result as JSON.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use paperlens_analysis::{AnalysisHints, Analyzer, InMemoryPaperStore, Orchestrator, PaperInput};
use paperlens_ingestion::sources::ArxivClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "paperlens", version, about = "Chunked LLM analysis of research papers")]
struct Cli {
    /// Path to a PDF file, or an arXiv URL / identifier
    input: String,

    /// Title to use instead of the extracted or arXiv one
    #[arg(long)]
    title: Option<String>,

    /// Authors to use instead of the extracted or arXiv ones
    #[arg(long)]
    authors: Option<String>,

    /// Config file (defaults to $PAPERLENS_CONFIG or ./paperlens.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the JSON result here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Skip the extra title-generation call
    #[arg(long)]
    no_title: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("paperlens=debug,info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::load()?,
    };

    let backend = paperlens_llm::router::build_backend(&config.backend_config())?;

    let mut analysis_config = config.analysis_config();
    if cli.no_title {
        analysis_config.generate_title = false;
    }

    let analyzer = Analyzer::new(
        Orchestrator::new(backend, analysis_config),
        Arc::new(ArxivClient::new()?),
        Arc::new(InMemoryPaperStore::new()),
    );

    let input = resolve_input(&cli.input)?;
    let hints = AnalysisHints { title: cli.title, authors: cli.authors };

    let analyzed = analyzer.analyze(input, hints).await?;
    info!(
        paper_id = %analyzed.paper.id,
        chunks = analyzed.analysis.chunk_count,
        tokens = analyzed.analysis.total_tokens,
        cost_usd = analyzed.analysis.estimated_cost,
        elapsed = %analyzed.analysis.analysis_time,
        "Analysis complete"
    );

    let json = serde_json::to_string_pretty(&analyzed)?;
    match &cli.output {
        Some(path) => {
            std::fs::write(path, json)?;
            info!(path = %path.display(), "Result written");
        }
        None => println!("{json}"),
    }

    Ok(())
}

/// An existing file is read as a PDF; anything else goes to the arXiv resolver.
fn resolve_input(raw: &str) -> anyhow::Result<PaperInput> {
    let path = Path::new(raw);
    if path.is_file() {
        let bytes = std::fs::read(path)?;
        info!(path = %path.display(), bytes = bytes.len(), "Reading local PDF");
        return Ok(PaperInput::Pdf(bytes));
    }
    Ok(PaperInput::Arxiv(raw.to_string()))
}
