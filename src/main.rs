//! breach-render: render compliance breaches through rule templates

use anyhow::{Context, Result};
use breach_render::{
    cli::{self, RenderOptions, SchemaKind},
    config::{self, Validatable},
    render::OutputFormat,
};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io::{self, Write as _};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "breach-render")]
#[command(version)]
#[command(about = "Render compliance breaches through rule templates", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Success
    1  Templates failed validation, or an error occurred

EXAMPLES:
    # Render breaches for terminal output
    breach-render render --template rules.yaml --breaches breaches.json

    # Render with JSON-specific templates and collected facts
    breach-render render -t rules.yaml -b breaches.json --facts facts.json --format json --json

    # Check templates before committing them
    breach-render validate --template rules.yaml")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the renderer configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments for the `render` subcommand
#[derive(Parser)]
struct RenderArgs {
    /// Template file (one template, or templates keyed by check name)
    #[arg(short, long)]
    template: PathBuf,

    /// JSON file with the breaches to render
    #[arg(short, long)]
    breaches: PathBuf,

    /// JSON object of collected facts, keyed by fact id
    #[arg(long)]
    facts: Option<PathBuf>,

    /// Output format selecting format-specific templates (pretty, table, json, junit, ...)
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Print rendered breaches as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render breaches through their templates
    Render(RenderArgs),

    /// Compile every template in a file and report errors
    Validate {
        /// Template file to check
        #[arg(short, long)]
        template: PathBuf,
    },

    /// List the template function library
    Functions,

    /// Print a JSON Schema for template or config files
    Schema {
        /// Which schema to print
        #[arg(value_enum, default_value_t = SchemaKind::Template)]
        kind: SchemaKind,
    },

    /// Print an example template file
    Example,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(io::stderr))
        .init();

    let (renderer_config, loaded_from) = config::load_or_default(cli.config.as_deref());
    if let Some(path) = &loaded_from {
        tracing::info!("Using config {}", path.display());
    }
    let config_errors = renderer_config.validate();
    if !config_errors.is_empty() {
        for error in &config_errors {
            tracing::error!("{error}");
        }
        anyhow::bail!("invalid renderer configuration");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Render(args) => {
            let opts = RenderOptions {
                template: args.template,
                breaches: args.breaches,
                facts: args.facts,
                format: args.format.unwrap_or_else(|| renderer_config.default_format.clone()),
                json: args.json,
                limits: renderer_config.limits.clone(),
            };
            cli::run_render(&opts, &mut out)?;
        }
        Commands::Validate { template } => {
            if !cli::run_validate(&template, &mut out)? {
                out.flush()?;
                std::process::exit(1);
            }
        }
        Commands::Functions => cli::run_functions(&mut out)?,
        Commands::Schema { kind } => cli::run_schema(kind, &mut out)?,
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "breach-render", &mut out);
        }
        Commands::Example => {
            out.write_all(config::generate_example_templates().as_bytes())
                .context("writing example")?;
        }
    }
    out.flush()?;
    Ok(())
}
