use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sdlerd::{LayoutConfig, analyze_with, export_schema};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Extracted entities
    Entities,
    /// Grid-based ER diagram
    Erd,
    /// Circular node graph
    Graph,
    /// Entities plus both layouts
    All,
    /// Entities written back as SDL
    Sdl,
}

#[derive(Parser)]
#[command(name = "sdlerd")]
#[command(version)]
#[command(about = "Derive ER diagrams and node graphs from GraphQL @model schemas", long_about = None)]
struct Cli {
    /// Input .graphql schema file
    input: PathBuf,

    /// What to emit
    #[arg(short, long, value_enum, default_value_t = Format::All)]
    format: Format,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file with layout settings (missing keys keep their defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,

    /// Log pipeline details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "sdlerd=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let source = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;

    let config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            LayoutConfig::from_json(&json)
                .with_context(|| format!("Invalid layout config {}", path.display()))?
        }
        None => LayoutConfig::default(),
    };

    let analysis = analyze_with(&source, &config)?;

    let rendered = match cli.format {
        Format::Entities => to_json(&analysis.entities, cli.compact)?,
        Format::Erd => to_json(&analysis.erd, cli.compact)?,
        Format::Graph => to_json(&analysis.graph, cli.compact)?,
        Format::All => to_json(&analysis, cli.compact)?,
        Format::Sdl => export_schema(&analysis.entities),
    };

    match &cli.output {
        Some(path) => fs::write(path, &rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", rendered.trim_end()),
    }

    Ok(())
}

fn to_json<T: Serialize>(value: &T, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(json)
}
