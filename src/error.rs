//! Error types for breach-render.
//!
//! Template failures met while rendering never surface here: the renderer
//! reports them as synthetic breaches. These errors cover loading inputs
//! (templates, breaches, facts) and strict compilation for validation.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigFileError;
use crate::template::TemplateError;

/// Main error type for breach-render operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BreachError {
    /// A template failed to compile or execute
    #[error("Template error: {context}")]
    Template {
        context: String,
        #[source]
        source: TemplateError,
    },

    /// Input data could not be parsed
    #[error("Failed to parse input: {context}")]
    Parse {
        context: String,
        #[source]
        source: ParseErrorKind,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Specific parse error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid YAML: {0}")]
    InvalidYaml(String),

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Convenient Result type for breach-render operations
pub type Result<T> = std::result::Result<T, BreachError>;

impl BreachError {
    pub fn template(context: impl Into<String>, source: TemplateError) -> Self {
        Self::Template {
            context: context.into(),
            source,
        }
    }

    pub fn parse(context: impl Into<String>, source: ParseErrorKind) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::parse(
            "invalid value",
            ParseErrorKind::InvalidValue {
                field: field.into(),
                message: message.into(),
            },
        )
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: Some(path.into()),
            message: source.to_string(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<std::io::Error> for BreachError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for BreachError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse("JSON deserialization", ParseErrorKind::InvalidJson(err.to_string()))
    }
}

impl From<serde_yaml::Error> for BreachError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::parse("YAML deserialization", ParseErrorKind::InvalidYaml(err.to_string()))
    }
}

impl From<TemplateError> for BreachError {
    fn from(err: TemplateError) -> Self {
        Self::template(String::new(), err)
    }
}

impl From<ConfigFileError> for BreachError {
    fn from(err: ConfigFileError) -> Self {
        match err {
            ConfigFileError::Io { path, source } => Self::io(path, source),
            ConfigFileError::Parse(e) => e.into(),
            other => Self::Config(other.to_string()),
        }
    }
}

/// Extension trait for adding context to errors.
///
/// ```
/// use breach_render::error::{ErrorContext, Result};
///
/// fn read(path: &str) -> Result<String> {
///     std::fs::read_to_string(path).with_context(|| format!("reading {path}"))
/// }
/// assert!(read("/definitely/not/here").is_err());
/// ```
pub trait ErrorContext<T> {
    /// Prepend `context` to the error's existing context.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Like [`ErrorContext::context`], computing the string only on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<BreachError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

fn add_context_to_error(err: BreachError, new_ctx: &str) -> BreachError {
    match err {
        BreachError::Template { context, source } => BreachError::Template {
            context: chain_context(new_ctx, &context),
            source,
        },
        BreachError::Parse { context, source } => BreachError::Parse {
            context: chain_context(new_ctx, &context),
            source,
        },
        BreachError::Io {
            path,
            message,
            source,
        } => BreachError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        BreachError::Config(msg) => BreachError::Config(chain_context(new_ctx, &msg)),
    }
}

/// "`new`: `existing`", or just `new` when there is no existing context.
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::NoFacts;
    use crate::funcs::FuncRegistry;
    use crate::template::Evaluator;

    #[test]
    fn test_template_error_keeps_source() {
        let funcs = FuncRegistry::builtin();
        let eval = Evaluator::new(&funcs, &NoFacts);
        let err: BreachError = eval
            .compile("{{ if }}")
            .context("compiling rule template")
            .unwrap_err();
        let BreachError::Template { context, source } = &err else {
            panic!("expected a template error, got {err:?}");
        };
        assert_eq!(context, "compiling rule template");
        assert!(source.to_string().starts_with("template: breach:1:"));
    }

    #[test]
    fn test_io_error_mentions_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = BreachError::io("/path/to/breaches.json", io_err);
        assert!(err.to_string().contains("/path/to/breaches.json"));
    }

    #[test]
    fn test_context_chaining_multiple_levels() {
        fn inner() -> Result<()> {
            Err(BreachError::invalid_value("severity", "unknown"))
        }

        fn outer() -> Result<()> {
            inner().context("breach 3").context("loading breaches")
        }

        match outer() {
            Err(BreachError::Parse { context, .. }) => {
                assert_eq!(context, "loading breaches: breach 3: invalid value");
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_json_error_converts() {
        let err: BreachError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(
            err,
            BreachError::Parse {
                source: ParseErrorKind::InvalidJson(_),
                ..
            }
        ));
    }

    #[test]
    fn test_chain_context_helper() {
        assert_eq!(chain_context("new", ""), "new");
        assert_eq!(chain_context("outer", "middle: inner"), "outer: middle: inner");
    }
}
