//! Template and renderer configuration.
//!
//! - [`BreachTemplate`]: how one rule's breaches are rendered, deserialized
//!   from the rule's YAML configuration
//! - [`TemplateFile`]: a file holding one template or templates per check
//! - [`RendererConfig`] and [`EvalLimits`]: renderer settings and the
//!   resource ceilings applied while executing templates
//!
//! ```
//! use breach_render::config::{file::load_templates_str, Validatable};
//!
//! let file = load_templates_str(
//!     "config-check:\n  value: \"{{ .Breach.Value | upper }}\"\n",
//! ).unwrap();
//! assert!(file.is_valid());
//! assert!(file.template_for("config-check").is_some());
//! ```

pub mod file;
mod types;
mod validation;

pub use types::{BreachTemplate, EvalLimits, RendererConfig, TemplateFile, DEFAULT_MAX_EXEC_DEPTH};
pub use validation::{ConfigError, Validatable};

pub use file::{
    discover_renderer_config, generate_example_templates, load_or_default, load_renderer_config,
    load_template_file, load_templates_str, ConfigFileError,
};

/// JSON Schema for the [`BreachTemplate`] configuration format.
///
/// Editors can use it to validate and complete rule template files.
#[must_use]
pub fn generate_json_schema() -> String {
    let schema = schemars::schema_for!(BreachTemplate);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

/// JSON Schema for [`RendererConfig`] files.
#[must_use]
pub fn generate_renderer_config_schema() -> String {
    let schema = schemars::schema_for!(RendererConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_names_yaml_fields() {
        let schema: serde_json::Value = serde_json::from_str(&generate_json_schema()).unwrap();
        let props = schema["properties"].as_object().unwrap();
        for key in ["type", "key-label", "key", "value-label", "value", "template", "templates", "context"] {
            assert!(props.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn test_renderer_schema() {
        let schema = generate_renderer_config_schema();
        assert!(schema.contains("default-format"));
        assert!(schema.contains("max-exec-depth"));
    }
}
