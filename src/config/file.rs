//! Loading template files and renderer configuration.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use super::types::{BreachTemplate, RendererConfig, TemplateFile};

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Renderer config file names, in search order.
const CONFIG_FILE_NAMES: &[&str] = &[".breach-render.yaml", ".breach-render.yml", "breach-render.yaml"];

/// Top-level keys that mark a file as a single template.
const TEMPLATE_KEYS: &[&str] = &[
    "type",
    "key-label",
    "key",
    "value-label",
    "value",
    "template",
    "templates",
    "context",
];

/// Find the renderer config file.
///
/// Search order: the explicit path, the current directory, then the user
/// config directory (`~/.config/breach-render/`).
#[must_use]
pub fn discover_renderer_config(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    if let Some(path) = std::env::current_dir()
        .ok()
        .and_then(|cwd| find_config_in_dir(&cwd))
    {
        return Some(path);
    }

    dirs::config_dir().and_then(|dir| find_config_in_dir(&dir.join("breach-render")))
}

fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Error type for config file operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigFileError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

fn read(path: &Path) -> Result<String, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a template file: a single template, or templates keyed by check name.
pub fn load_templates_str(content: &str) -> Result<TemplateFile, ConfigFileError> {
    let doc: serde_yaml::Value = serde_yaml::from_str(content)?;
    let is_single = match &doc {
        serde_yaml::Value::Null => true,
        serde_yaml::Value::Mapping(map) => map.is_empty() || map.keys().any(is_template_key),
        _ => false,
    };
    if is_single {
        let template: BreachTemplate = match doc {
            serde_yaml::Value::Null => BreachTemplate::default(),
            doc => serde_yaml::from_value(doc)?,
        };
        return Ok(TemplateFile::Single(template));
    }
    let rules: IndexMap<String, BreachTemplate> = serde_yaml::from_value(doc)?;
    debug!(rules = rules.len(), "loaded rule templates");
    Ok(TemplateFile::Rules(rules))
}

fn is_template_key(key: &serde_yaml::Value) -> bool {
    key.as_str().is_some_and(|k| TEMPLATE_KEYS.contains(&k))
}

/// Load a template file from disk.
pub fn load_template_file(path: &Path) -> Result<TemplateFile, ConfigFileError> {
    load_templates_str(&read(path)?)
}

/// Load renderer settings from a YAML file.
pub fn load_renderer_config(path: &Path) -> Result<RendererConfig, ConfigFileError> {
    let content = read(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Load the discovered renderer config, or defaults when there is none.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (RendererConfig, Option<PathBuf>) {
    discover_renderer_config(explicit_path).map_or_else(
        || (RendererConfig::default(), None),
        |path| match load_renderer_config(&path) {
            Ok(config) => (config, Some(path)),
            Err(e) => {
                warn!("Failed to load config from {}: {}", path.display(), e);
                (RendererConfig::default(), None)
            }
        },
    )
}

/// Example template file covering both template styles.
#[must_use]
pub fn generate_example_templates() -> String {
    r#"# breach-render templates, keyed by check name.

config-check:
  # Legacy style: each field rendered on its own.
  type: key-value
  key-label: File
  key: "{{ .Breach.Key }}"
  value-label: Error
  value: "{{ .Breach.Value | upper }}"

deps-check:
  # Enhanced style: one template per output format.
  templates:
    json: '{"package":"{{ .Breach.Key }}","count":{{ len .Breach.Values }}}'
    default: >-
      {{ .Breach.Key }}: {{ len .Breach.Values }}
      {{ pluralize (len .Breach.Values) "version" "versions" }} ({{ join ", " .Breach.Values }})
  context:
    docs: https://example.com/rules/deps
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BreachType;
    use tempfile::TempDir;

    #[test]
    fn test_single_template_file() {
        let file = load_templates_str("template: \"{{ .Breach.Value }}\"\n").unwrap();
        let TemplateFile::Single(template) = file else {
            panic!("expected a single template");
        };
        assert_eq!(template.template, "{{ .Breach.Value }}");
    }

    #[test]
    fn test_rule_map_keeps_order() {
        let yaml = "zeta:\n  value: z\nalpha:\n  template: a\n";
        let file = load_templates_str(yaml).unwrap();
        let names: Vec<&str> = file.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(file.template_for("alpha").unwrap().template, "a");
    }

    #[test]
    fn test_empty_file_is_unconfigured_single() {
        let file = load_templates_str("").unwrap();
        assert_eq!(file, TemplateFile::Single(BreachTemplate::default()));
    }

    #[test]
    fn test_example_templates_parse() {
        let file = load_templates_str(&generate_example_templates()).unwrap();
        assert_eq!(file.len(), 2);
        let config = file.template_for("config-check").unwrap();
        assert_eq!(config.breach_type, Some(BreachType::KeyValue));
        assert!(file.template_for("deps-check").unwrap().templates.contains_key("json"));
    }

    #[test]
    fn test_load_template_file_not_found() {
        let err = load_template_file(Path::new("/nonexistent/rules.yaml")).unwrap_err();
        assert!(matches!(err, ConfigFileError::NotFound(_)));
    }

    #[test]
    fn test_load_renderer_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".breach-render.yaml");
        std::fs::write(&path, "default-format: json\nlimits:\n  max-range-iterations: 10\n").unwrap();

        let config = load_renderer_config(&path).unwrap();
        assert_eq!(config.default_format.as_str(), "json");
        assert_eq!(config.limits.max_range_iterations, Some(10));

        assert_eq!(find_config_in_dir(dir.path()), Some(path.clone()));
        let (loaded, from) = load_or_default(Some(&path));
        assert_eq!(loaded, config);
        assert_eq!(from, Some(path));
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.yaml");
        std::fs::write(&path, "templates: [unclosed").unwrap();
        assert!(matches!(
            load_template_file(&path).unwrap_err(),
            ConfigFileError::Parse(_)
        ));
    }
}
