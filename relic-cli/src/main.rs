//! Relic CLI: detect the primary object in an image and optionally
//! research its historical evolution.

use anyhow::bail;
use clap::{Parser, ValueEnum};
use relic::{Detector, ImageSource, PipelineConfig, Researcher, WebSearch};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Supported web-search backends for the research step.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum SearchBackend {
    /// DuckDuckGo Lite (no API key required)
    #[default]
    Duckduckgo,
    /// Tavily (requires an API key)
    Tavily,
}

/// Relic CLI - object recognition and historical research
#[derive(Parser, Debug)]
#[command(name = "relic")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Image to analyze: a local path or an HTTP(S) URL
    image: ImageSource,

    /// Also research the detected object's historical milestones
    #[arg(short, long)]
    research: bool,

    /// Vision model used for detection
    #[arg(short, long)]
    model: Option<String>,

    /// Text model used for research synthesis
    #[arg(long)]
    text_model: Option<String>,

    /// Base URL of the chat-completions API
    #[arg(long)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Web-search backend for the research step
    #[arg(long, value_enum, default_value_t = SearchBackend::Duckduckgo)]
    search: SearchBackend,

    /// Tavily API key (only for the tavily backend)
    #[arg(long, env = "TAVILY_API_KEY")]
    tavily_key: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("relic=debug,relic_cli=debug")
    } else {
        EnvFilter::new("relic=warn,relic_cli=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn build_search(args: &Args, max_results: usize) -> anyhow::Result<WebSearch> {
    let search = match args.search {
        SearchBackend::Duckduckgo => WebSearch::duckduckgo(),
        SearchBackend::Tavily => match &args.tavily_key {
            Some(key) => WebSearch::tavily(key),
            None => bail!("the tavily backend requires --tavily-key or TAVILY_API_KEY"),
        },
    };
    Ok(search.with_max_results(max_results))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = PipelineConfig::from_env()?;
    if let Some(model) = args.model.clone() {
        config.vision_model = model;
    }
    if let Some(model) = args.text_model.clone() {
        config.text_model = model;
    }
    if let Some(base_url) = args.base_url.clone() {
        config.base_url = base_url;
    }
    if args.timeout.is_some() {
        config.timeout_secs = args.timeout;
    }

    let detector = Detector::new(&config);
    let result = detector.detect(&args.image).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if args.research {
        let search = build_search(&args, config.max_search_results)?;
        let researcher = Researcher::new(&config, search);
        let report = researcher.research(&result).await;
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
