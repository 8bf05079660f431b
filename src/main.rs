use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use script_guard::{render_report, Catalog, Engine, EngineConfig};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Report,
}

#[derive(Parser)]
#[command(
    name = "script-guard",
    about = "Score and normalize short-form video scripts",
    version
)]
struct Cli {
    /// File paths to analyze (reads stdin if none provided)
    files: Vec<PathBuf>,

    /// Content niche the script targets
    #[arg(long, default_value = "geral")]
    niche: String,

    /// JSON file overriding engine thresholds and penalties
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Print the normalized script instead of the analysis
    #[arg(long)]
    optimize: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let engine = Engine::new(Catalog::builtin(), config);

    if cli.files.is_empty() {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("reading stdin")?;
        emit(&engine, &cli, &input)?;
    } else {
        for path in &cli.files {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            emit(&engine, &cli, &text)?;
        }
    }
    Ok(())
}

fn emit(engine: &Engine<'_>, cli: &Cli, text: &str) -> Result<()> {
    if cli.optimize {
        println!("{}", engine.optimize(text));
        return Ok(());
    }
    let analysis = engine.analyze(text, &cli.niche);
    match cli.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&analysis)?),
        Format::Report => print!("{}", render_report(&analysis)),
    }
    Ok(())
}
