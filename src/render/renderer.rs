//! Breach rendering: resolve, evaluate, rebuild the same shape.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::format::OutputFormat;
use super::resolver::{resolve, Resolution};
use super::sink::BreachSink;
use crate::config::{BreachTemplate, EvalLimits};
use crate::facts::FactSource;
use crate::funcs::FuncRegistry;
use crate::model::{Breach, KeyValueBreach, KeyValuesBreach, RemediatorHandle, ValueBreach};
use crate::template::{Evaluator, TemplateContext};

/// One breach to render, with its template and remediator.
#[derive(Debug, Clone)]
pub struct RenderJob<'a> {
    pub breach: &'a Breach,
    pub template: &'a BreachTemplate,
    pub remediator: Option<RemediatorHandle>,
}

impl<'a> RenderJob<'a> {
    pub fn new(breach: &'a Breach, template: &'a BreachTemplate) -> Self {
        Self {
            breach,
            template,
            remediator: None,
        }
    }

    #[must_use]
    pub fn with_remediator(mut self, remediator: RemediatorHandle) -> Self {
        self.remediator = Some(remediator);
        self
    }
}

/// Turns analyser breaches into display-ready breaches of the same shape.
///
/// The input breach is never modified; a new breach carrying the rendered
/// text is added to the sink, preceded by a synthetic breach for every
/// template that failed to compile or execute.
#[derive(Debug, Clone)]
pub struct BreachRenderer<'a> {
    evaluator: Evaluator<'a>,
}

impl<'a> BreachRenderer<'a> {
    pub fn new(funcs: &'a FuncRegistry, facts: &'a dyn FactSource) -> Self {
        Self {
            evaluator: Evaluator::new(funcs, facts),
        }
    }

    #[must_use]
    pub fn with_limits(self, limits: EvalLimits) -> Self {
        Self {
            evaluator: self.evaluator.with_limits(limits),
        }
    }

    pub fn evaluator(&self) -> &Evaluator<'a> {
        &self.evaluator
    }

    /// Render `breach` for `format` and add the result to `sink`.
    pub fn render(
        &self,
        breach: &Breach,
        template: &BreachTemplate,
        format: &OutputFormat,
        remediator: Option<RemediatorHandle>,
        sink: &mut dyn BreachSink,
    ) {
        let resolution = resolve(template, format);
        debug!(
            check = breach.check_name(),
            breach_type = %breach.breach_type(),
            mode = %resolution,
            "resolved breach template"
        );

        let mut rendered = match resolution {
            Resolution::Raw => breach.clone(),
            Resolution::PerFormat { source, .. } | Resolution::Single(source) => {
                let ctx = context(breach, template, format);
                let value = self.evaluator.evaluate(source, &ctx, sink);
                rebuild_enhanced(breach, value)
            }
            Resolution::Legacy => self.render_legacy(breach, template, format, sink),
        };
        rendered.set_remediator(remediator);
        sink.add_breach(rendered);
    }

    /// Render one breach into a fresh list: failures first, then the breach.
    pub fn render_one(
        &self,
        breach: &Breach,
        template: &BreachTemplate,
        format: &OutputFormat,
        remediator: Option<RemediatorHandle>,
    ) -> Vec<Breach> {
        let mut out = Vec::new();
        self.render(breach, template, format, remediator, &mut out);
        out
    }

    /// Render many breaches in parallel, keeping input order in the output.
    pub fn render_batch(&self, jobs: &[RenderJob<'_>], format: &OutputFormat) -> Vec<Breach> {
        info!(count = jobs.len(), %format, "rendering breaches");
        let rendered: Vec<Vec<Breach>> = jobs
            .par_iter()
            .map(|job| self.render_one(job.breach, job.template, format, job.remediator.clone()))
            .collect();
        rendered.into_iter().flatten().collect()
    }

    fn render_legacy(
        &self,
        breach: &Breach,
        template: &BreachTemplate,
        format: &OutputFormat,
        sink: &mut dyn BreachSink,
    ) -> Breach {
        if let Some(expected) = template.breach_type {
            if expected != breach.breach_type() {
                warn!(
                    check = breach.check_name(),
                    expected = %expected,
                    actual = %breach.breach_type(),
                    "breach template type does not match breach"
                );
            }
        }

        let ctx = context(breach, template, format);
        let mut eval = |field: &str, source: &str, current: &mut String| {
            if source.is_empty() {
                return;
            }
            debug!(check = breach.check_name(), field, "evaluating legacy template field");
            *current = self.evaluator.evaluate(source, &ctx, sink);
        };

        let mut rendered = breach.clone();
        match &mut rendered {
            Breach::Value(b) => {
                eval("value-label", &template.value_label, &mut b.value_label);
                eval("value", &template.value, &mut b.value);
            }
            Breach::KeyValue(b) => {
                eval("key-label", &template.key_label, &mut b.key_label);
                eval("key", &template.key, &mut b.key);
                eval("value-label", &template.value_label, &mut b.value_label);
                eval("value", &template.value, &mut b.value);
            }
            Breach::KeyValues(b) => {
                eval("key-label", &template.key_label, &mut b.key_label);
                eval("key", &template.key, &mut b.key);
                eval("value-label", &template.value_label, &mut b.value_label);
            }
        }
        rendered
    }
}

fn context<'b>(breach: &'b Breach, template: &'b BreachTemplate, format: &OutputFormat) -> TemplateContext<'b> {
    TemplateContext::new(breach, format.clone()).with_context(&template.context)
}

/// New breach of the same variant with `value` as its primary text.
///
/// A key-values breach collapses to a single rendered value.
fn rebuild_enhanced(breach: &Breach, value: String) -> Breach {
    match breach {
        Breach::Value(b) => ValueBreach {
            meta: b.meta.clone(),
            value_label: String::new(),
            value,
        }
        .into(),
        Breach::KeyValue(b) => KeyValueBreach {
            value,
            ..b.clone()
        }
        .into(),
        Breach::KeyValues(b) => KeyValuesBreach {
            values: vec![value],
            ..b.clone()
        }
        .into(),
    }
}
