//! `render` command handler.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::{load_template_file, BreachTemplate, EvalLimits};
use crate::facts::FactStore;
use crate::funcs::FuncRegistry;
use crate::model::parse_breaches;
use crate::render::{BreachRenderer, OutputFormat, RenderJob};

/// Inputs of the `render` command.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Template file: one template, or templates keyed by check name
    pub template: PathBuf,
    /// JSON file holding the breaches to render
    pub breaches: PathBuf,
    /// JSON object of collected facts, keyed by fact id
    pub facts: Option<PathBuf>,
    pub format: OutputFormat,
    /// Emit the rendered breaches as JSON instead of one line each
    pub json: bool,
    pub limits: EvalLimits,
}

/// Render every breach and write the result.
///
/// Breaches whose check has no template pass through unchanged.
pub fn run_render(opts: &RenderOptions, out: &mut dyn Write) -> Result<()> {
    let templates = load_template_file(&opts.template)
        .with_context(|| format!("loading templates from {}", opts.template.display()))?;

    let raw = std::fs::read_to_string(&opts.breaches)
        .with_context(|| format!("reading {}", opts.breaches.display()))?;
    let breaches = parse_breaches(&raw).with_context(|| format!("parsing {}", opts.breaches.display()))?;

    let facts = match &opts.facts {
        Some(path) => {
            let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            FactStore::from_json_str(&raw).with_context(|| format!("parsing {}", path.display()))?
        }
        None => FactStore::new(),
    };
    info!(
        breaches = breaches.len(),
        templates = templates.len(),
        facts = facts.len(),
        "loaded inputs"
    );

    let unconfigured = BreachTemplate::default();
    let jobs: Vec<RenderJob<'_>> = breaches
        .iter()
        .map(|breach| {
            let template = templates.template_for(breach.check_name()).unwrap_or_else(|| {
                debug!(check = breach.check_name(), "no template for check");
                &unconfigured
            });
            RenderJob::new(breach, template)
        })
        .collect();

    let funcs = FuncRegistry::builtin();
    let renderer = BreachRenderer::new(&funcs, &facts).with_limits(opts.limits.clone());
    let rendered = renderer.render_batch(&jobs, &opts.format);

    if opts.json {
        serde_json::to_writer_pretty(&mut *out, &rendered).context("writing JSON output")?;
        writeln!(out)?;
    } else {
        for breach in &rendered {
            writeln!(out, "{breach}")?;
        }
    }
    Ok(())
}
