//! Compiled templates and the fault-tolerant evaluator.

use tracing::{debug, warn};

use super::context::TemplateContext;
use super::error::TemplateError;
use super::exec::{execute, Env};
use super::parse::{parse, Node, Parsed};
use crate::config::EvalLimits;
use crate::facts::FactSource;
use crate::funcs::{CallContext, FuncRegistry};
use crate::model::{Breach, BreachMeta, ValueBreach};
use crate::render::BreachSink;

/// Name given to every breach template in error messages.
pub const TEMPLATE_NAME: &str = "breach";

/// Name of the sub-template used when none matches the output format.
const DEFAULT_DEFINE: &str = "default";

/// A compiled template source.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    name: String,
    parsed: Parsed,
}

impl Template {
    pub fn compile(name: &str, source: &str, funcs: &FuncRegistry) -> Result<Self, TemplateError> {
        let parsed = parse(name, source, funcs)?;
        Ok(Self {
            name: name.to_string(),
            parsed,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the `define`d and `block` sub-templates.
    pub fn defined_templates(&self) -> impl Iterator<Item = &str> {
        self.parsed.defines.keys().map(String::as_str)
    }

    /// Body to run for `format`.
    ///
    /// A source made only of `define` blocks runs the block named after the
    /// output format, falling back to `default`.
    fn entry(&self, format: &str) -> &[Node] {
        let blank = self
            .parsed
            .root
            .iter()
            .all(|node| matches!(node, Node::Text(t) if t.trim().is_empty()));
        if !blank || self.parsed.defines.is_empty() {
            return &self.parsed.root;
        }
        self.parsed
            .defines
            .get(format)
            .or_else(|| self.parsed.defines.get(DEFAULT_DEFINE))
            .map_or(&self.parsed.root, Vec::as_slice)
    }

    pub fn execute(
        &self,
        ctx: &TemplateContext<'_>,
        funcs: &FuncRegistry,
        facts: &dyn FactSource,
        limits: &EvalLimits,
    ) -> Result<String, TemplateError> {
        let env = Env {
            funcs,
            call: CallContext::new(facts),
            limits,
        };
        let entry = self.entry(ctx.output_format.as_str());
        execute(&self.name, &self.parsed, entry, &ctx.to_value(), &env)
    }
}

/// Compiles and executes template sources against a shared function
/// library and fact store.
///
/// Holds only shared references, so one evaluator can serve many threads.
#[derive(Clone)]
pub struct Evaluator<'a> {
    funcs: &'a FuncRegistry,
    facts: &'a dyn FactSource,
    limits: EvalLimits,
}

impl<'a> Evaluator<'a> {
    pub fn new(funcs: &'a FuncRegistry, facts: &'a dyn FactSource) -> Self {
        Self {
            funcs,
            facts,
            limits: EvalLimits::default(),
        }
    }

    #[must_use]
    pub fn with_limits(mut self, limits: EvalLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn funcs(&self) -> &'a FuncRegistry {
        self.funcs
    }

    pub fn limits(&self) -> &EvalLimits {
        &self.limits
    }

    pub fn compile(&self, source: &str) -> Result<Template, TemplateError> {
        Template::compile(TEMPLATE_NAME, source, self.funcs)
    }

    /// Compile and execute `source`, returning any failure.
    pub fn try_evaluate(&self, source: &str, ctx: &TemplateContext<'_>) -> Result<String, TemplateError> {
        let template = self.compile(source)?;
        template.execute(ctx, self.funcs, self.facts, &self.limits)
    }

    /// Compile and execute `source`, never failing.
    ///
    /// On a compile or execution failure a synthetic breach describing it is
    /// added to `sink` and the unrendered `source` is returned.
    pub fn evaluate(&self, source: &str, ctx: &TemplateContext<'_>, sink: &mut dyn BreachSink) -> String {
        match self.try_evaluate(source, ctx) {
            Ok(rendered) => {
                debug!(check = %ctx.check_name, "rendered breach template");
                rendered
            }
            Err(err) => {
                warn!(check = %ctx.check_name, class = %err.class(), "{err}");
                sink.add_breach(failure_breach(&err, ctx));
                source.to_string()
            }
        }
    }
}

impl std::fmt::Debug for Evaluator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("funcs", &self.funcs.len())
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

/// Value breach reporting a template failure for the check in `ctx`.
pub fn failure_breach(err: &TemplateError, ctx: &TemplateContext<'_>) -> Breach {
    ValueBreach {
        meta: BreachMeta {
            check_type: ctx.check_type.clone(),
            check_name: ctx.check_name.clone(),
            severity: ctx.severity,
            ..BreachMeta::default()
        },
        value_label: err.class().label().to_string(),
        value: err.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::NoFacts;
    use crate::model::Severity;
    use crate::render::OutputFormat;

    fn ctx() -> TemplateContext<'static> {
        TemplateContext {
            severity: Severity::High,
            check_name: "security-check".into(),
            check_type: "file".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_evaluate_renders_context() {
        let funcs = FuncRegistry::builtin();
        let eval = Evaluator::new(&funcs, &NoFacts);
        let mut sink: Vec<Breach> = Vec::new();
        let out = eval.evaluate("{{ .CheckName }} ({{ .Severity | upper }})", &ctx(), &mut sink);
        assert_eq!(out, "security-check (HIGH)");
        assert!(sink.is_empty());
    }

    #[test]
    fn test_compile_failure_reports_and_passes_through() {
        let funcs = FuncRegistry::builtin();
        let eval = Evaluator::new(&funcs, &NoFacts);
        let mut sink: Vec<Breach> = Vec::new();
        let source = "{{ .Breach.Value | }}";
        assert_eq!(eval.evaluate(source, &ctx(), &mut sink), source);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].value_label(), "unable to parse breach template");
        assert_eq!(sink[0].check_name(), "security-check");
        assert_eq!(sink[0].severity(), Severity::High);
    }

    #[test]
    fn test_execution_failure_reports_and_passes_through() {
        let funcs = FuncRegistry::builtin();
        let eval = Evaluator::new(&funcs, &NoFacts);
        let mut sink: Vec<Breach> = Vec::new();
        let source = "{{ .Breach.Value }}";
        assert_eq!(eval.evaluate(source, &ctx(), &mut sink), source);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].value_label(), "unable to render breach template");
    }

    #[test]
    fn test_format_named_defines() {
        let funcs = FuncRegistry::builtin();
        let eval = Evaluator::new(&funcs, &NoFacts);
        let source = r#"
{{ define "json" }}{"check":"{{ .CheckName }}"}{{ end }}
{{ define "default" }}{{ .CheckName }}{{ end }}
"#;
        let mut json_ctx = ctx();
        json_ctx.output_format = OutputFormat::Json;
        assert_eq!(eval.try_evaluate(source, &json_ctx).unwrap(), r#"{"check":"security-check"}"#);
        assert_eq!(eval.try_evaluate(source, &ctx()).unwrap(), "security-check");
    }

    #[test]
    fn test_template_reports_defines() {
        let funcs = FuncRegistry::builtin();
        let t = Template::compile("t", r#"{{ define "a" }}{{ end }}{{ block "b" . }}{{ end }}"#, &funcs).unwrap();
        assert_eq!(t.defined_templates().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(t.name(), "t");
    }
}
