//! Scheme Get CLI
//!
//! Loads a scheme descriptor and a JSON document, then prints the value at a
//! dotted path coerced through the scheme.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use scheme_model::config::OutputFormat;
use scheme_model::{Model, ModelConfig, Scheme, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scheme-get")]
#[command(about = "Read a dotted path from a JSON document through a scheme")]
struct Cli {
    /// Scheme descriptor (JSON)
    #[arg(short, long)]
    scheme: PathBuf,

    /// Data document (JSON object); starts empty when omitted
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Assignment applied before reading, as PATH=JSON (repeatable)
    #[arg(long = "set", value_name = "PATH=JSON")]
    assignments: Vec<String>,

    /// Skip validation of the coerced value
    #[arg(long)]
    no_validate: bool,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,

    /// Dotted path to read
    path: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ModelConfig::load_from(cli.config.as_deref()).context("loading config")?;

    let text = fs::read_to_string(&cli.scheme)
        .with_context(|| format!("reading scheme {}", cli.scheme.display()))?;
    let scheme = Scheme::from_json_str(&text)?;

    let mut model = match &cli.data {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading data {}", path.display()))?;
            let Value::Object(data) = serde_json::from_str::<Value>(&text)? else {
                bail!("data document {} is not a JSON object", path.display());
            };
            let mut model = Model::with_data(scheme, data);
            model.set_validate_scheme(config.model.validate_scheme);
            model
        }
        None => Model::with_config(scheme, &config),
    };

    if cli.no_validate {
        model.set_validate_scheme(false);
    }

    for assignment in &cli.assignments {
        let (path, json) = assignment
            .split_once('=')
            .with_context(|| format!("expected PATH=JSON, got '{}'", assignment))?;
        let value: Value = serde_json::from_str(json)
            .with_context(|| format!("parsing value for '{}'", path))?;
        model.set(path, value);
    }

    match model.get_json(&cli.path)? {
        Some(json) => {
            let compact = cli.compact || config.output.format == OutputFormat::Compact;
            let rendered = if compact {
                serde_json::to_string(&json)?
            } else {
                serde_json::to_string_pretty(&json)?
            };
            println!("{}", rendered);
        }
        None => eprintln!("undefined"),
    }

    Ok(())
}
