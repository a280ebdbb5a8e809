//! Configuration validation.
//!
//! Template sources are compiled against the built-in function library, so
//! a broken template is caught before it turns into a synthetic breach.

use super::types::{BreachTemplate, EvalLimits, RendererConfig, TemplateFile};
use crate::funcs::FuncRegistry;
use crate::model::BreachType;
use crate::template::{Template, TEMPLATE_NAME};

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn nested(self, prefix: &str) -> Self {
        if prefix.is_empty() {
            return self;
        }
        Self {
            field: format!("{prefix}.{}", self.field),
            message: self.message,
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

impl BreachTemplate {
    /// Validate against a specific function library.
    pub fn validate_with(&self, funcs: &FuncRegistry) -> Vec<ConfigError> {
        let mut errors: Vec<ConfigError> = self
            .sources()
            .into_iter()
            .filter_map(|(field, source)| {
                Template::compile(TEMPLATE_NAME, source, funcs)
                    .err()
                    .map(|e| ConfigError::new(field, e.to_string()))
            })
            .collect();

        if self.templates.keys().any(|k| k.trim().is_empty()) {
            errors.push(ConfigError::new("templates", "output format keys must not be empty"));
        }

        if self.breach_type == Some(BreachType::Value) && !(self.key.is_empty() && self.key_label.is_empty()) {
            errors.push(ConfigError::new(
                "type",
                "value breaches have no key; key and key-label would be ignored",
            ));
        }
        errors
    }
}

impl Validatable for BreachTemplate {
    fn validate(&self) -> Vec<ConfigError> {
        self.validate_with(&FuncRegistry::builtin())
    }
}

impl Validatable for TemplateFile {
    fn validate(&self) -> Vec<ConfigError> {
        let funcs = FuncRegistry::builtin();
        self.iter()
            .flat_map(|(name, template)| {
                template
                    .validate_with(&funcs)
                    .into_iter()
                    .map(move |e| e.nested(name))
            })
            .collect()
    }
}

impl Validatable for EvalLimits {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.max_exec_depth == 0 {
            errors.push(ConfigError::new("limits.max-exec-depth", "must be at least 1"));
        }
        if self.max_output_bytes == Some(0) {
            errors.push(ConfigError::new(
                "limits.max-output-bytes",
                "must be greater than 0 (omit it for no limit)",
            ));
        }
        errors
    }
}

impl Validatable for RendererConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = self.limits.validate();
        if self.default_format.as_str().trim().is_empty() {
            errors.push(ConfigError::new("default-format", "must not be empty"));
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use std::collections::BTreeMap;

    #[test]
    fn test_valid_template() {
        let template = BreachTemplate {
            key: "{{ .Breach.Key }}".into(),
            value: "{{ .Breach.Value | upper }}".into(),
            ..Default::default()
        };
        assert!(template.is_valid());
    }

    #[test]
    fn test_broken_sources_are_reported_by_field() {
        let template = BreachTemplate {
            value: "{{ .Breach.Value | }}".into(),
            templates: BTreeMap::from([("json".to_string(), "{{ uppr .CheckName }}".to_string())]),
            ..Default::default()
        };
        let errors = template.validate();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "value");
        assert_eq!(errors[1].field, "templates.json");
        assert!(errors[1].message.contains("did you mean \"upper\""));
    }

    #[test]
    fn test_empty_format_key() {
        let template = BreachTemplate {
            templates: BTreeMap::from([(" ".to_string(), "x".to_string())]),
            ..Default::default()
        };
        let errors = template.validate();
        assert_eq!(errors, vec![ConfigError::new("templates", "output format keys must not be empty")]);
    }

    #[test]
    fn test_custom_format_key_is_allowed() {
        let template = BreachTemplate {
            templates: BTreeMap::from([("sarif".to_string(), "{{ .CheckName }}".to_string())]),
            ..Default::default()
        };
        assert!(template.is_valid());
    }

    #[test]
    fn test_rule_errors_are_prefixed() {
        let file = TemplateFile::Rules(IndexMap::from([(
            "config-check".to_string(),
            BreachTemplate {
                template: "{{ end }}".into(),
                ..Default::default()
            },
        )]));
        let errors = file.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "config-check.template");
        assert!(errors[0].to_string().starts_with("config-check.template: template: breach:1:"));
    }

    #[test]
    fn test_limits() {
        assert!(EvalLimits::default().is_valid());
        let limits = EvalLimits::default().with_max_exec_depth(0).with_max_output_bytes(0);
        assert_eq!(limits.validate().len(), 2);
        let config = RendererConfig {
            limits,
            ..Default::default()
        };
        assert!(!config.is_valid());
    }
}
