//! Configuration types for breach rendering.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::model::BreachType;
use crate::render::OutputFormat;

// ============================================================================
// Breach templates
// ============================================================================

/// How a rule's breaches are rendered.
///
/// Either the legacy per-field sources (`key-label`, `key`, `value-label`,
/// `value`) or an enhanced whole-breach `template`, optionally keyed by
/// output format in `templates`.
///
/// ```yaml
/// templates:
///   json: '{"file":"{{ .Breach.Key }}"}'
///   default: "{{ .Breach.Key }}: {{ .Breach.Value }}"
/// context:
///   docs: https://example.com/rules/config
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "kebab-case")]
pub struct BreachTemplate {
    /// Breach shape the legacy fields are written for
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub breach_type: Option<BreachType>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub key_label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value_label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    /// Whole-breach template used for every output format
    #[serde(skip_serializing_if = "String::is_empty")]
    pub template: String,
    /// Whole-breach templates keyed by output format, with `default` as fallback
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub templates: BTreeMap<String, String>,
    /// Extra data exposed to templates as `.Context`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, JsonValue>,
}

impl BreachTemplate {
    /// Whether anything at all is configured.
    pub fn is_configured(&self) -> bool {
        self.breach_type.is_some()
            || !self.template.is_empty()
            || !self.templates.is_empty()
            || self.has_legacy_fields()
    }

    pub fn has_legacy_fields(&self) -> bool {
        !(self.key_label.is_empty()
            && self.key.is_empty()
            && self.value_label.is_empty()
            && self.value.is_empty())
    }

    /// Every non-empty template source, with the config path it came from.
    pub fn sources(&self) -> Vec<(String, &str)> {
        let fields = [
            ("key-label", &self.key_label),
            ("key", &self.key),
            ("value-label", &self.value_label),
            ("value", &self.value),
            ("template", &self.template),
        ];
        let mut sources: Vec<(String, &str)> = fields
            .into_iter()
            .filter(|(_, source)| !source.is_empty())
            .map(|(field, source)| (field.to_string(), source.as_str()))
            .collect();
        sources.extend(
            self.templates
                .iter()
                .filter(|(_, source)| !source.is_empty())
                .map(|(format, source)| (format!("templates.{format}"), source.as_str())),
        );
        sources
    }
}

/// Contents of a template file.
///
/// A file holds either one template applied to every breach, or templates
/// keyed by check name in file order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TemplateFile {
    Single(BreachTemplate),
    Rules(IndexMap<String, BreachTemplate>),
}

impl TemplateFile {
    /// Template for breaches produced by `check_name`, if any.
    pub fn template_for(&self, check_name: &str) -> Option<&BreachTemplate> {
        match self {
            Self::Single(template) => Some(template),
            Self::Rules(rules) => rules.get(check_name),
        }
    }

    /// All templates with their rule name (empty for a single template).
    pub fn iter(&self) -> Box<dyn Iterator<Item = (&str, &BreachTemplate)> + '_> {
        match self {
            Self::Single(template) => Box::new(std::iter::once(("", template))),
            Self::Rules(rules) => Box::new(rules.iter().map(|(name, t)| (name.as_str(), t))),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Rules(rules) => rules.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Renderer configuration
// ============================================================================

/// Renderer settings, loaded from `.breach-render.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "kebab-case")]
pub struct RendererConfig {
    /// Output format used when none is given on the command line
    #[schemars(with = "String")]
    pub default_format: OutputFormat,
    /// Resource ceilings for template evaluation
    pub limits: EvalLimits,
}

/// Resource ceilings applied while executing a template.
///
/// Exceeding one is an execution failure, reported like any other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "kebab-case")]
pub struct EvalLimits {
    /// Iterations allowed in a single `range` (unbounded if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_range_iterations: Option<usize>,
    /// Rendered output size in bytes (unbounded if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_bytes: Option<usize>,
    /// Nesting depth of `template` calls
    #[schemars(range(min = 1))]
    pub max_exec_depth: usize,
}

/// Nested `template` call depth allowed by default.
pub const DEFAULT_MAX_EXEC_DEPTH: usize = 100;

impl Default for EvalLimits {
    fn default() -> Self {
        Self {
            max_range_iterations: None,
            max_output_bytes: None,
            max_exec_depth: DEFAULT_MAX_EXEC_DEPTH,
        }
    }
}

impl EvalLimits {
    /// Limits with no ceiling beyond the default template depth.
    pub fn unbounded() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_max_range_iterations(mut self, max: usize) -> Self {
        self.max_range_iterations = Some(max);
        self
    }

    #[must_use]
    pub const fn with_max_output_bytes(mut self, max: usize) -> Self {
        self.max_output_bytes = Some(max);
        self
    }

    #[must_use]
    pub const fn with_max_exec_depth(mut self, max: usize) -> Self {
        self.max_exec_depth = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_field_names() {
        let yaml = r#"
type: key-value
key-label: File
key: "{{ .Breach.Key }}"
value-label: Error
value: "{{ .Breach.Value | upper }}"
context:
  docs: https://example.com
"#;
        let template: BreachTemplate = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(template.breach_type, Some(BreachType::KeyValue));
        assert_eq!(template.key_label, "File");
        assert_eq!(template.value, "{{ .Breach.Value | upper }}");
        assert_eq!(template.context["docs"], serde_json::json!("https://example.com"));
        assert!(template.is_configured());
        assert!(template.has_legacy_fields());
    }

    #[test]
    fn test_empty_template_is_unconfigured() {
        let template: BreachTemplate = serde_yaml::from_str("{}").unwrap();
        assert!(!template.is_configured());
        assert!(template.sources().is_empty());
    }

    #[test]
    fn test_sources_lists_templates_entries() {
        let template = BreachTemplate {
            value: "v".into(),
            templates: BTreeMap::from([
                ("json".to_string(), "j".to_string()),
                ("table".to_string(), String::new()),
            ]),
            ..Default::default()
        };
        let sources = template.sources();
        assert_eq!(
            sources,
            vec![("value".to_string(), "v"), ("templates.json".to_string(), "j")]
        );
    }

    #[test]
    fn test_renderer_config_defaults() {
        let config: RendererConfig = serde_yaml::from_str("limits:\n  max-output-bytes: 4096\n").unwrap();
        assert_eq!(config.default_format, OutputFormat::Pretty);
        assert_eq!(config.limits.max_output_bytes, Some(4096));
        assert_eq!(config.limits.max_exec_depth, DEFAULT_MAX_EXEC_DEPTH);
        assert_eq!(config.limits.max_range_iterations, None);
    }

    #[test]
    fn test_template_file_lookup() {
        let rules = IndexMap::from([
            ("config-check".to_string(), BreachTemplate::default()),
            ("deps-check".to_string(), BreachTemplate::default()),
        ]);
        let file = TemplateFile::Rules(rules);
        assert!(file.template_for("deps-check").is_some());
        assert!(file.template_for("other").is_none());
        let names: Vec<&str> = file.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["config-check", "deps-check"]);

        let single = TemplateFile::Single(BreachTemplate::default());
        assert!(single.template_for("anything").is_some());
        assert_eq!(single.len(), 1);
    }
}
